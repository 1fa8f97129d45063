//! Full agent against a scripted SimSpark server on loopback.

use std::time::Duration;

use magma_core::channel::ChannelManager;
use magma_core::codec::MessageParser;
use magma_core::config::AgentCfg;
use magma_core::io::frame::{FrameReader, write_frame};
use magma_core::runtime::{AgentRuntime, StopReason};
use magma_rcss::{Dialect, RcssAgentModel, RcssParser, decision_maker};
use tokio::net::TcpListener;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

fn text(frame: &[u8]) -> String {
    String::from_utf8_lossy(frame).into_owned()
}

#[test]
fn parses_time_and_joint_message() {
    let p = RcssParser::new()
        .parse(b"(time (now 12.5))(HJ (n hj1)(ax 0.3))")
        .unwrap();
    assert_eq!(p.time(), 12.5);
    assert_eq!(p.joint_state("hj1").map(|j| j.position), Some(0.3));
}

async fn agent(dialect: Dialect) -> (TcpListener, AgentRuntime<RcssAgentModel>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let cfg = AgentCfg {
        port,
        player_no: 3,
        poll_timeout_ms: 20,
        ..AgentCfg::default()
    };

    let model = RcssAgentModel::new(&cfg, dialect.robot(&cfg));
    let decision_maker = decision_maker(&model).unwrap();
    let mut channels = ChannelManager::new();
    channels
        .register(Box::new(dialect.channel(&cfg)))
        .await
        .unwrap();

    (listener, AgentRuntime::new(&cfg, channels, model, decision_maker))
}

#[tokio::test]
async fn spark_handshake_over_tcp() {
    let (listener, mut runtime) = agent(Dialect::Spark).await;
    let trigger = runtime.shutdown_trigger();

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let (read_half, mut write_half) = socket.split();
        let mut frames = FrameReader::new(read_half);

        let create = text(frames.read_frame().await.unwrap());
        assert_eq!(create, "(scene rsg/agent/nao/nao_hetero.rsg 0)");

        write_frame(&mut write_half, b"(time (now 0.02))(GS (t 0.00)(pm BeforeKickOff))")
            .await
            .unwrap();
        let init = text(frames.read_frame().await.unwrap());
        assert_eq!(init, "(init (unum 3) (teamname magma))");

        write_frame(&mut write_half, b"(time (now 0.04))(GS (unum 3)(team left)(t 0.00)(pm BeforeKickOff))(HJ (n hj1)(ax 0.00))")
            .await
            .unwrap();
        let beam = text(frames.read_frame().await.unwrap());
        assert!(beam.starts_with("(he1 0.0)(he2 0.0)"), "{beam}");
        assert!(beam.contains("(beam -5.0 0.0 0.0)"), "{beam}");
        assert!(beam.ends_with("(syn)"), "{beam}");

        write_frame(&mut write_half, b"(time (now 0.06))").await.unwrap();
        let stand = text(frames.read_frame().await.unwrap());
        assert!(!stand.contains("beam"), "{stand}");
        assert!(stand.ends_with("(syn)"), "{stand}");

        assert!(trigger.trigger().await);
        let _ = frames.read_frame().await;
    });

    let summary = timeout(WAIT, runtime.run()).await.unwrap().unwrap();
    assert_eq!(summary.reason, StopReason::ShutdownRequested);
    assert_eq!(summary.perceptions, 3);
    assert_eq!(summary.decisions, 4);
    assert_eq!(summary.last_perception_time, 0.06);
    assert_eq!(runtime.model().play_mode(), "BeforeKickOff");
    assert_eq!(runtime.model().joint_position("hj1"), Some(0.0));

    timeout(WAIT, server).await.unwrap().unwrap();
}

#[tokio::test]
async fn smj_starts_with_init() {
    let (listener, mut runtime) = agent(Dialect::Smj).await;

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut frames = FrameReader::new(&mut socket);
        let init = text(frames.read_frame().await.unwrap());
        assert_eq!(init, "(init T1 magma 3)");
        // closing the connection ends the agent
    });

    let summary = timeout(WAIT, runtime.run()).await.unwrap().unwrap();
    assert_eq!(summary.reason, StopReason::ShutdownRequested);
    assert_eq!(summary.perceptions, 0);
    timeout(WAIT, server).await.unwrap().unwrap();
}
