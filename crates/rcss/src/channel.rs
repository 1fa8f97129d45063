use std::fmt;
use std::str::FromStr;

use magma_core::channel::TcpLpmChannel;
use magma_core::config::AgentCfg;

use crate::encoder::{SmjEncoder, SparkEncoder};
use crate::model::RobotSpec;
use crate::parser::RcssParser;

/// Server flavour the agent talks to. Both share the perceptor syntax and
/// differ in effector messages and robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// SimSpark with the heterogeneous Nao.
    Spark,
    /// MuJoCo based `rcsssmj` with the T1.
    Smj,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown protocol dialect {0:?}, expected spark or smj")]
pub struct UnknownDialect(pub String);

impl FromStr for Dialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spark" | "simspark" => Ok(Self::Spark),
            "smj" | "rcsssmj" => Ok(Self::Smj),
            _ => Err(UnknownDialect(s.to_owned())),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Spark => "spark",
            Self::Smj => "smj",
        })
    }
}

impl Dialect {
    pub fn robot(self, cfg: &AgentCfg) -> RobotSpec {
        match self {
            Self::Spark => RobotSpec::nao(cfg.model_type),
            Self::Smj => RobotSpec::t1(),
        }
    }

    pub fn channel(self, cfg: &AgentCfg) -> TcpLpmChannel {
        match self {
            Self::Spark => spark_channel(cfg),
            Self::Smj => smj_channel(cfg),
        }
    }
}

/// Channel to a SimSpark server.
pub fn spark_channel(cfg: &AgentCfg) -> TcpLpmChannel {
    TcpLpmChannel::new(
        "simspark",
        cfg.addr(),
        Box::new(RcssParser::new()),
        Box::new(SparkEncoder::new()),
    )
    .with_limits(cfg.receive_buffer_size, cfg.max_frame_len)
}

/// Channel to an `rcsssmj` server.
pub fn smj_channel(cfg: &AgentCfg) -> TcpLpmChannel {
    TcpLpmChannel::new(
        "rcsssmj",
        cfg.addr(),
        Box::new(RcssParser::new()),
        Box::new(SmjEncoder::new()),
    )
    .with_limits(cfg.receive_buffer_size, cfg.max_frame_len)
}
