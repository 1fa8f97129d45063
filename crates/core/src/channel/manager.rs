use super::{Channel, ChannelError};
use crate::io::input::PerceptionSender;
use crate::types::Action;

/// Aggregates the channels of one agent. Startup is all-or-nothing.
#[derive(Default)]
pub struct ChannelManager {
    channels: Vec<Box<dyn Channel>>,
    queue: Option<PerceptionSender>,
}

impl ChannelManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a channel. When the manager is already running the channel is started
    /// right away; a failed start leaves it unregistered.
    pub async fn register(&mut self, mut channel: Box<dyn Channel>) -> Result<(), ChannelError> {
        if let Some(queue) = &self.queue {
            channel.start(queue.clone()).await?;
        }
        tracing::debug!(channel = %channel.name(), "channel registered");
        self.channels.push(channel);
        Ok(())
    }

    /// Start every registered channel. If one fails, the channels started before
    /// it are stopped again and the error is returned.
    pub async fn start(&mut self, queue: PerceptionSender) -> Result<(), ChannelError> {
        if self.queue.is_some() {
            return Ok(());
        }

        for i in 0..self.channels.len() {
            if let Err(e) = self.channels[i].start(queue.clone()).await {
                tracing::warn!(error = %e, "channel startup failed, unwinding");
                for started in self.channels[..i].iter_mut().rev() {
                    started.stop().await;
                }
                return Err(e);
            }
        }

        tracing::info!(channels = self.channels.len(), "channels started");
        self.queue = Some(queue);
        Ok(())
    }

    pub async fn stop(&mut self) {
        if self.queue.take().is_none() {
            return;
        }
        for channel in &mut self.channels {
            channel.stop().await;
        }
        tracing::info!("channels stopped");
    }

    pub fn is_running(&self) -> bool {
        self.queue.is_some()
    }

    /// True if at least one receive task is still alive.
    pub fn any_channel_running(&self) -> bool {
        self.channels.iter().any(|c| c.is_running())
    }

    /// Send the action through every channel. All channels are attempted;
    /// the first failure is returned.
    pub async fn send_action(&mut self, action: &Action) -> Result<(), ChannelError> {
        let mut first_error = None;
        for channel in &mut self.channels {
            if let Err(e) = channel.send_action(action).await {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.channels.iter().map(|c| c.name())
    }
}
