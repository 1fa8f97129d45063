//! RoboCup 3D soccer simulation dialect: perceptor parser, effector encoders,
//! virtual actuators, a minimal agent model and the simulator handshake.

pub mod actuators;
pub mod behaviors;
pub mod channel;
pub mod decision;
pub mod encoder;
pub mod model;
pub mod parser;

pub use channel::{Dialect, UnknownDialect, smj_channel, spark_channel};
pub use decision::{RcssPolicy, decision_maker};
pub use encoder::{SmjEncoder, SparkEncoder};
pub use model::{RcssAgentModel, RobotSpec};
pub use parser::RcssParser;
