use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use super::shutdown::ShutdownTrigger;
use crate::channel::{ChannelError, ChannelManager};
use crate::config::AgentCfg;
use crate::decision::DecisionMaker;
use crate::io::input::{self, PerceptionReceiver, PerceptionSender};
use crate::model::AgentModel;
use crate::types::RuntimeStatus;

/// Why the runtime loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// A shutdown sentinel arrived: a channel lost its connection or an operator asked to stop.
    ShutdownRequested,
    /// No channel is running any more.
    ChannelsClosed,
}

/// Outcome of [`AgentRuntime::run`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub reason: StopReason,
    pub decisions: u64,
    pub perceptions: u64,
    pub last_perception_time: f64,
}

/// Single consumer of the perception queue. Owns the model and the decision
/// maker; the only writer to the channels.
pub struct AgentRuntime<M> {
    channels: ChannelManager,
    model: M,
    decision_maker: DecisionMaker<M>,
    queue_tx: PerceptionSender,
    queue_rx: PerceptionReceiver,
    poll_timeout: Duration,
    perceptions: u64,
    status_tx: watch::Sender<RuntimeStatus>,
}

impl<M: AgentModel> AgentRuntime<M> {
    pub fn new(
        cfg: &AgentCfg,
        channels: ChannelManager,
        model: M,
        decision_maker: DecisionMaker<M>,
    ) -> Self {
        let (queue_tx, queue_rx) = input::channel(cfg.queue_capacity);
        let (status_tx, _) = watch::channel(RuntimeStatus::default());
        Self {
            channels,
            model,
            decision_maker,
            queue_tx,
            queue_rx,
            poll_timeout: cfg.poll_timeout(),
            perceptions: 0,
            status_tx,
        }
    }

    pub fn shutdown_trigger(&self) -> ShutdownTrigger {
        ShutdownTrigger::new(self.queue_tx.clone())
    }

    /// Snapshot published after every cycle.
    pub fn status(&self) -> watch::Receiver<RuntimeStatus> {
        self.status_tx.subscribe()
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn decision_maker(&self) -> &DecisionMaker<M> {
        &self.decision_maker
    }

    pub fn channels(&self) -> &ChannelManager {
        &self.channels
    }

    /// Start the channels, run an initial cycle, then consume perceptions until
    /// a shutdown sentinel arrives or no channel is left running.
    /// Only a channel startup failure is returned as an error.
    pub async fn run(&mut self) -> Result<RunSummary, ChannelError> {
        self.channels.start(self.queue_tx.clone()).await?;
        tracing::info!(channels = self.channels.len(), "agent runtime started");

        // Handshake behaviors need to talk before the first perception arrives.
        self.act().await;

        let reason = loop {
            match tokio::time::timeout(self.poll_timeout, self.queue_rx.recv()).await {
                Err(_) => {
                    if !self.channels.is_empty() && !self.channels.any_channel_running() {
                        break StopReason::ChannelsClosed;
                    }
                }
                Ok(None) => break StopReason::ChannelsClosed,
                Ok(Some(perception)) if perception.is_shutdown_requested() => {
                    break StopReason::ShutdownRequested;
                }
                Ok(Some(perception)) => {
                    self.model.update(&perception);
                    self.perceptions += 1;
                    self.act().await;
                }
            }
        };

        self.channels.stop().await;
        self.decision_maker.abort();
        self.status_tx.send_modify(|s| {
            s.running = false;
            s.behavior_chain = self.decision_maker.chain_names();
        });

        let summary = RunSummary {
            reason,
            decisions: self.decision_maker.decisions(),
            perceptions: self.perceptions,
            last_perception_time: self.model.time(),
        };
        tracing::info!(
            reason = ?summary.reason,
            decisions = summary.decisions,
            perceptions = summary.perceptions,
            "agent runtime stopped"
        );
        Ok(summary)
    }

    /// One decide/act cycle.
    async fn act(&mut self) {
        self.decision_maker.decide(&mut self.model);
        let action = self.model.generate_action();
        if let Err(e) = self.channels.send_action(&action).await {
            tracing::warn!(error = %e, "failed to send action");
        }

        let status = RuntimeStatus {
            decisions: self.decision_maker.decisions(),
            perceptions: self.perceptions,
            perception_time: self.model.time(),
            behavior_chain: self.decision_maker.chain_names(),
            running: true,
        };
        self.status_tx.send_replace(status);
    }
}
