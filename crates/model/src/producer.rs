use async_trait::async_trait;

use crate::error::ReplyError;
use crate::request::{Reply, ReplyRequest};

/// A type that produces assistant content for user submissions.
///
/// Producers only return content. Appending the resulting assistant
/// message to the log is the session manager's responsibility, so the
/// log invariants are enforced in one place.
///
/// Once the producer is created, it should behave like a stateless
/// object. It can still have internal state, but callers should not
/// rely on it, and the producer should be prepared for its result being
/// discarded when the session has been reset in the meantime.
#[async_trait]
pub trait ReplyProducer: Send + Sync {
    /// Produces the assistant reply for the given request.
    async fn produce(
        &self,
        request: ReplyRequest,
    ) -> Result<Reply, ReplyError>;
}
