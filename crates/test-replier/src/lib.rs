//! A local fake reply producer for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use campus_chat_model::{Reply, ReplyError, ReplyProducer, ReplyRequest};
use tokio::time::sleep;

pub use preset::*;

/// A scripted fake reply producer for testing purpose.
///
/// Before submitting anything, you need to set up the script, which is
/// how the producer should settle each request. Every call consumes the
/// next step, in order. When the script runs out, the producer settles
/// with an error.
///
/// # Note
///
/// This type is not meant for production use, the script is shared
/// behind a plain mutex. You should only use it for testing.
#[derive(Clone, Default)]
pub struct ScriptedReplier {
    script: Arc<Mutex<VecDeque<PresetReply>>>,
    delay: Option<Duration>,
}

impl ScriptedReplier {
    /// Appends a step to the script.
    pub fn add_step(&mut self, step: PresetReply) {
        self.script.lock().unwrap().push_back(step);
    }

    /// Sets an artificial delay applied before each settlement.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns the number of steps that have not been consumed yet.
    pub fn remaining_steps(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

#[async_trait]
impl ReplyProducer for ScriptedReplier {
    async fn produce(
        &self,
        _request: ReplyRequest,
    ) -> Result<Reply, ReplyError> {
        // Take the step up front so concurrent calls cannot observe the
        // same one.
        let step = self.script.lock().unwrap().pop_front();
        if let Some(delay) = self.delay {
            sleep(delay).await;
        }
        match step {
            Some(PresetReply::Reply(content)) => Ok(Reply::text(content)),
            Some(PresetReply::Failure(reason)) => Err(ReplyError::new(reason)),
            None => Err(ReplyError::new("no enough steps in the script")),
        }
    }
}
