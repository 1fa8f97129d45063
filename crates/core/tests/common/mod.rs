#![allow(dead_code)]

use magma_core::codec::{CodecError, MessageEncoder, MessageParser, sexpr};
use magma_core::model::AgentModel;
use magma_core::types::{Action, Effector, Perception, Perceptor};
use tokio::net::TcpListener;

/// Stores each top-level node under its tag; `(time (now t))` sets the perception time.
pub struct TagParser;

impl MessageParser for TagParser {
    fn parse(&mut self, msg: &[u8]) -> Result<Perception, CodecError> {
        let mut builder = Perception::builder();
        for node in sexpr::parse_bytes(msg)? {
            let Some(tag) = node.tag() else { continue };
            if tag == "time"
                && let Some(now) = node.find("now")
            {
                builder.set_time(now.f64_at(1)?);
            }
            builder.put(tag.to_owned(), Perceptor::Text(node.to_string()));
        }
        Ok(builder.build())
    }
}

/// Writes `(<effector>)` for every effector.
pub struct TagEncoder;

impl MessageEncoder for TagEncoder {
    fn encode(&self, action: &Action) -> Vec<u8> {
        action
            .iter()
            .map(|(name, _)| format!("({name})"))
            .collect::<String>()
            .into_bytes()
    }
}

/// Model that records updates and always answers with a sync effector.
#[derive(Debug, Default)]
pub struct TestModel {
    pub time: f64,
    pub updates: u32,
    pub waves: u32,
}

impl AgentModel for TestModel {
    fn update(&mut self, perception: &Perception) {
        self.time = perception.time();
        self.updates += 1;
    }

    fn generate_action(&mut self) -> Action {
        let mut action = Action::new();
        action.put("syn", Effector::Sync);
        action
    }

    fn time(&self) -> f64 {
        self.time
    }
}

pub async fn listener() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    (listener, addr)
}

/// An address nothing listens on.
pub async fn dead_addr() -> String {
    let (listener, addr) = listener().await;
    drop(listener);
    addr
}
