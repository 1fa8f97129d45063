//! Communication channels: one background receiver per remote endpoint,
//! feeding the shared perception queue.

pub mod manager;
pub mod tcp_lpm;

use std::fmt;
use std::io;

use async_trait::async_trait;

use crate::io::frame::FrameError;
use crate::io::input::PerceptionSender;
use crate::types::Action;

pub use manager::ChannelManager;
pub use tcp_lpm::TcpLpmChannel;

/// Lifecycle of a channel: `Idle → Connecting → Open → Closing → Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelState {
    #[default]
    Idle,
    Connecting,
    Open,
    Closing,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("channel {channel}: connect to {addr} failed: {source}")]
    Connect {
        channel: String,
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("channel {channel}: send failed: {source}")]
    Send {
        channel: String,
        #[source]
        source: FrameError,
    },
    #[error("channel {0}: message parser lost after receive task failure")]
    ParserLost(String),
}

/// A bidirectional link to one remote peer.
///
/// `start` connects synchronously and spawns exactly one receive task that
/// pushes perceptions onto `queue`. Receive failures are reported as a single
/// shutdown sentinel on the queue, never as an error here. `send_action` is only
/// called from the runtime loop, which makes it the single writer.
#[async_trait]
pub trait Channel: Send {
    fn name(&self) -> &str;

    fn state(&self) -> ChannelState;

    async fn start(&mut self, queue: PerceptionSender) -> Result<(), ChannelError>;

    /// Stop the receive task and wait until it has exited. No-op when idle.
    async fn stop(&mut self);

    /// True while the receive task is alive.
    fn is_running(&self) -> bool;

    async fn send_action(&mut self, action: &Action) -> Result<(), ChannelError>;
}
