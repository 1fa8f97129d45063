pub mod sexpr;

pub use sexpr::{CodecError, SExpr};

use crate::types::{Action, Perception};

/// Translates one inbound payload of a protocol dialect into a perception.
pub trait MessageParser: Send {
    fn parse(&mut self, msg: &[u8]) -> Result<Perception, CodecError>;
}

/// Renders the effector commands of one cycle into an outbound payload.
pub trait MessageEncoder: Send {
    fn encode(&self, action: &Action) -> Vec<u8>;
}
