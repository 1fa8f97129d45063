use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{Channel, ChannelError, ChannelState};
use crate::codec::{MessageEncoder, MessageParser};
use crate::io::frame::{self, DEFAULT_BUFFER_SIZE, FrameReader};
use crate::io::input::{self, PerceptionSender};
use crate::types::{Action, Perception};

/// Largest frame accepted unless configured otherwise.
pub const DEFAULT_MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Background receive task. Hands the parser back on exit so the channel can be restarted.
struct Receiver {
    token: CancellationToken,
    handle: JoinHandle<Box<dyn MessageParser>>,
}

/// TCP channel exchanging length-prefixed messages.
pub struct TcpLpmChannel {
    name: String,
    addr: String,
    parser: Option<Box<dyn MessageParser>>,
    encoder: Box<dyn MessageEncoder>,
    receive_buffer_size: usize,
    max_frame_len: usize,
    state: ChannelState,
    writer: Option<OwnedWriteHalf>,
    receiver: Option<Receiver>,
}

impl TcpLpmChannel {
    pub fn new(
        name: impl Into<String>,
        addr: impl Into<String>,
        parser: Box<dyn MessageParser>,
        encoder: Box<dyn MessageEncoder>,
    ) -> Self {
        Self {
            name: name.into(),
            addr: addr.into(),
            parser: Some(parser),
            encoder,
            receive_buffer_size: DEFAULT_BUFFER_SIZE,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            state: ChannelState::Idle,
            writer: None,
            receiver: None,
        }
    }

    /// Initial receive buffer size and the largest frame accepted.
    pub fn with_limits(mut self, receive_buffer_size: usize, max_frame_len: usize) -> Self {
        self.receive_buffer_size = receive_buffer_size;
        self.max_frame_len = max_frame_len;
        self
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

#[async_trait]
impl Channel for TcpLpmChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> ChannelState {
        self.state
    }

    async fn start(&mut self, queue: PerceptionSender) -> Result<(), ChannelError> {
        if self.is_running() {
            return Ok(());
        }
        // A receive task that died on its own still has to be reaped.
        self.stop().await;

        let Some(parser) = self.parser.take() else {
            return Err(ChannelError::ParserLost(self.name.clone()));
        };

        self.state = ChannelState::Connecting;
        let stream = match TcpStream::connect(&self.addr).await {
            Ok(stream) => stream,
            Err(e) => {
                self.parser = Some(parser);
                self.state = ChannelState::Idle;
                return Err(ChannelError::Connect {
                    channel: self.name.clone(),
                    addr: self.addr.clone(),
                    source: e,
                });
            }
        };
        if let Err(e) = stream.set_nodelay(true) {
            tracing::warn!(channel = %self.name, error = %e, "failed to disable send coalescing");
        }

        let (read_half, write_half) = stream.into_split();
        let frames = FrameReader::with_capacity(read_half, self.receive_buffer_size, self.max_frame_len);
        let token = CancellationToken::new();
        let handle = tokio::spawn(receive_loop(
            self.name.clone(),
            frames,
            parser,
            queue,
            token.clone(),
        ));

        self.writer = Some(write_half);
        self.receiver = Some(Receiver { token, handle });
        self.state = ChannelState::Open;
        tracing::info!(channel = %self.name, addr = %self.addr, "channel open");
        Ok(())
    }

    async fn stop(&mut self) {
        let Some(receiver) = self.receiver.take() else {
            self.writer = None;
            self.state = ChannelState::Idle;
            return;
        };

        self.state = ChannelState::Closing;
        receiver.token.cancel();
        match receiver.handle.await {
            Ok(parser) => self.parser = Some(parser),
            Err(e) => {
                tracing::warn!(channel = %self.name, error = %e, "receive task ended abnormally")
            }
        }
        self.writer = None;
        self.state = ChannelState::Idle;
        tracing::info!(channel = %self.name, "channel stopped");
    }

    fn is_running(&self) -> bool {
        self.state == ChannelState::Open
            && self
                .receiver
                .as_ref()
                .is_some_and(|r| !r.handle.is_finished())
    }

    async fn send_action(&mut self, action: &Action) -> Result<(), ChannelError> {
        let Some(writer) = self.writer.as_mut() else {
            tracing::debug!(channel = %self.name, "not connected, action dropped");
            return Ok(());
        };
        let payload = self.encoder.encode(action);
        frame::write_frame(writer, &payload)
            .await
            .map_err(|e| ChannelError::Send {
                channel: self.name.clone(),
                source: e,
            })
    }
}

async fn receive_loop(
    name: String,
    mut frames: FrameReader<OwnedReadHalf>,
    mut parser: Box<dyn MessageParser>,
    queue: PerceptionSender,
    token: CancellationToken,
) -> Box<dyn MessageParser> {
    loop {
        let frame = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            frame = frames.read_frame() => frame,
        };

        let perception = match frame {
            Ok(payload) => match parser.parse(payload) {
                Ok(perception) => perception,
                Err(e) => {
                    tracing::warn!(channel = %name, error = %e, "dropping malformed message");
                    continue;
                }
            },
            Err(e) => {
                tracing::info!(channel = %name, error = %e, "receive loop ended, signalling shutdown");
                push(&queue, &token, Perception::shutdown()).await;
                break;
            }
        };

        if !push(&queue, &token, perception).await {
            break;
        }
    }
    parser
}

/// Enqueue unless the channel is being stopped or the consumer is gone.
async fn push(queue: &PerceptionSender, token: &CancellationToken, perception: Perception) -> bool {
    tokio::select! {
        biased;
        _ = token.cancelled() => false,
        sent = input::submit(queue, perception) => sent.is_ok(),
    }
}
