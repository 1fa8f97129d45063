use tokio::sync::mpsc;

use crate::types::Perception;

/// Perception queue sender. Receive tasks push translated messages here.
pub type PerceptionSender = mpsc::Sender<Perception>;
/// Perception queue receiver. The runtime loop is the only consumer.
pub type PerceptionReceiver = mpsc::Receiver<Perception>;

/// Create a bounded perception queue with the given buffer size.
pub fn channel(buffer: usize) -> (PerceptionSender, PerceptionReceiver) {
    mpsc::channel(buffer.max(1))
}

/// Push a perception, waiting for room if the queue is full.
pub async fn submit(
    tx: &PerceptionSender,
    perception: Perception,
) -> Result<(), mpsc::error::SendError<Perception>> {
    tx.send(perception).await
}

/// Push the shutdown sentinel.
pub async fn submit_shutdown(
    tx: &PerceptionSender,
) -> Result<(), mpsc::error::SendError<Perception>> {
    submit(tx, Perception::shutdown()).await
}
