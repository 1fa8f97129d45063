//! Loopback tests for the length-prefixed TCP channel.

mod common;

use std::time::Duration;

use common::{TagEncoder, TagParser, dead_addr, listener};
use magma_core::channel::{Channel, ChannelError, ChannelState, TcpLpmChannel};
use magma_core::io::frame::{FrameReader, write_frame};
use magma_core::io::input;
use magma_core::types::{Action, Effector, Perceptor};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

fn channel(addr: &str) -> TcpLpmChannel {
    TcpLpmChannel::new("test", addr, Box::new(TagParser), Box::new(TagEncoder))
}

async fn wait_until_stopped(channel: &TcpLpmChannel) {
    timeout(WAIT, async {
        while channel.is_running() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("receive task did not exit");
}

#[tokio::test]
async fn delivers_frames_in_order_and_sends_actions() {
    let (listener, addr) = listener().await;
    let (tx, mut rx) = input::channel(16);
    let mut channel = channel(&addr);

    channel.start(tx).await.unwrap();
    assert_eq!(channel.state(), ChannelState::Open);
    assert!(channel.is_running());

    let (mut server, _) = listener.accept().await.unwrap();
    let big = format!("(big {})", "x".repeat(20_000));
    write_frame(&mut server, b"(time (now 1.0))").await.unwrap();
    write_frame(&mut server, big.as_bytes()).await.unwrap();
    write_frame(&mut server, b"(time (now 2.0))(HJ (n hj1)(ax 0.5))").await.unwrap();

    let first = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(first.time(), 1.0);
    let second = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(second.get("big"), Some(&Perceptor::Text(big.clone())));
    let third = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(third.time(), 2.0);
    assert!(third.contains("HJ"));

    let mut action = Action::new();
    action.put("he1", Effector::Sync);
    action.put("syn", Effector::Sync);
    channel.send_action(&action).await.unwrap();

    let mut frames = FrameReader::new(&mut server);
    let payload = timeout(WAIT, frames.read_frame()).await.unwrap().unwrap();
    assert_eq!(payload, b"(he1)(syn)");

    channel.stop().await;
    assert_eq!(channel.state(), ChannelState::Idle);
    assert!(!channel.is_running());
}

#[tokio::test]
async fn connect_failure_surfaces_synchronously() {
    let addr = dead_addr().await;
    let (tx, _rx) = input::channel(4);
    let mut channel = channel(&addr);

    let err = channel.start(tx).await.unwrap_err();
    assert!(matches!(err, ChannelError::Connect { ref channel, .. } if channel == "test"));
    assert_eq!(channel.state(), ChannelState::Idle);
    assert!(!channel.is_running());
}

#[tokio::test]
async fn peer_close_pushes_one_sentinel() {
    let (listener, addr) = listener().await;
    let (tx, mut rx) = input::channel(4);
    let mut channel = channel(&addr);
    channel.start(tx).await.unwrap();

    let (mut server, _) = listener.accept().await.unwrap();
    write_frame(&mut server, b"(time (now 3.0))").await.unwrap();
    drop(server);

    let p = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert!(!p.is_shutdown_requested());
    let sentinel = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert!(sentinel.is_shutdown_requested());
    assert!(sentinel.is_empty());

    wait_until_stopped(&channel).await;
    assert!(rx.try_recv().is_err());

    channel.stop().await;
    assert_eq!(channel.state(), ChannelState::Idle);
}

#[tokio::test]
async fn malformed_message_is_skipped() {
    let (listener, addr) = listener().await;
    let (tx, mut rx) = input::channel(4);
    let mut channel = channel(&addr);
    channel.start(tx).await.unwrap();

    let (mut server, _) = listener.accept().await.unwrap();
    write_frame(&mut server, b"(time (now 1.0)").await.unwrap();
    write_frame(&mut server, b"(a))").await.unwrap();
    write_frame(&mut server, b"(time (now 4.0))").await.unwrap();

    let p = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(p.time(), 4.0);
    assert!(channel.is_running());

    channel.stop().await;
}

#[tokio::test]
async fn oversized_frame_ends_receive_loop() {
    let (listener, addr) = listener().await;
    let (tx, mut rx) = input::channel(4);
    let mut channel = channel(&addr).with_limits(64, 128);
    channel.start(tx).await.unwrap();

    let (mut server, _) = listener.accept().await.unwrap();
    write_frame(&mut server, &[b'x'; 256]).await.unwrap();

    let sentinel = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert!(sentinel.is_shutdown_requested());
    wait_until_stopped(&channel).await;
    channel.stop().await;
}

#[tokio::test]
async fn stop_joins_task_blocked_on_read() {
    let (listener, addr) = listener().await;
    let (tx, mut rx) = input::channel(4);
    let mut channel = channel(&addr);
    channel.start(tx).await.unwrap();
    let (_server, _) = listener.accept().await.unwrap();

    timeout(WAIT, channel.stop()).await.unwrap();
    assert!(!channel.is_running());
    assert_eq!(channel.state(), ChannelState::Idle);
    // a stop request is not a connection error: no sentinel
    assert!(rx.try_recv().is_err());

    // stopping an idle channel is a no-op
    channel.stop().await;
}

#[tokio::test]
async fn restart_after_stop() {
    let (listener, addr) = listener().await;
    let (tx, mut rx) = input::channel(4);
    let mut channel = channel(&addr);

    channel.start(tx.clone()).await.unwrap();
    let (_first, _) = listener.accept().await.unwrap();
    channel.stop().await;
    assert!(rx.try_recv().is_err());

    channel.start(tx).await.unwrap();
    let (mut server, _) = listener.accept().await.unwrap();
    write_frame(&mut server, b"(time (now 9.0))").await.unwrap();
    let p = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(p.time(), 9.0);
    channel.stop().await;
}

#[tokio::test]
async fn send_while_idle_is_a_no_op() {
    let mut channel = channel("127.0.0.1:1");
    let mut action = Action::new();
    action.put("syn", Effector::Sync);
    assert!(channel.send_action(&action).await.is_ok());
}
