use async_trait::async_trait;

use thiserror::Error;

use crate::notify::notify_model::MessagePayload;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Unknown destination: {0}")]
    UnknownDestination(String),
}

/// Delivery seam. Implementations render-for and talk to the actual chat
/// surface; the core fires and forgets. A failed delivery is logged by the
/// dispatcher and never retried, so implementations should do their own
/// buffering if they need it.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, destination: &str, payload: &MessagePayload) -> Result<(), SinkError>;
}
