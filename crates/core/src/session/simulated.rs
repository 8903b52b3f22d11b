use std::time::Duration;

use async_trait::async_trait;
use campus_chat_model::{Reply, ReplyError, ReplyProducer, ReplyRequest};
use tokio::time::sleep;

/// How long [`SimulatedReplier`] "thinks" before answering.
pub const SIMULATED_REPLY_DELAY: Duration = Duration::from_millis(1500);

/// The built-in reply producer used when no real one is configured.
///
/// It waits a fixed moment and answers with a canned reply that echoes
/// the prompt, which is enough for a hosting UI to exercise the whole
/// submit/await/append cycle without a backend.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimulatedReplier;

#[async_trait]
impl ReplyProducer for SimulatedReplier {
    async fn produce(
        &self,
        request: ReplyRequest,
    ) -> Result<Reply, ReplyError> {
        sleep(SIMULATED_REPLY_DELAY).await;
        Ok(Reply::text(format!(
            "Thanks for asking about \"{}\". The assistant service is not \
             connected yet, so this is a simulated reply.",
            request.prompt
        )))
    }
}
