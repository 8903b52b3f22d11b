use std::fmt::{self, Debug};
use std::sync::Arc;

use campus_chat_model::{
    Feedback, Message, MessageId, Reply, ReplyError, ReplyProducer,
    ReplyRequest, Role,
};
use tokio::sync::{mpsc, oneshot};
use tracing::Instrument;

use super::REPLY_FAILURE_TEXT;

/// The stage a session is in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionStage {
    /// The session accepts submissions.
    #[default]
    Idle,
    /// A reply is pending for the last submission. Further submissions
    /// are rejected until it settles.
    AwaitingReply,
}

/// A point-in-time view of a session, suitable for rendering.
#[derive(Clone, Debug)]
pub struct SessionSnapshot {
    /// The message log, in insertion order.
    pub messages: Vec<Message>,
    /// The current stage.
    pub stage: SessionStage,
    /// The pending input buffer.
    pub draft: String,
}

pub(crate) struct SessionState {
    pub(crate) replier: Arc<dyn ReplyProducer>,
    pub(crate) log: Vec<Message>,
    pub(crate) next_id: u64,
    pub(crate) draft: String,
    pub(crate) busy: bool,
    pub(crate) stage: SessionStage,
    /// Bumped on every reset. Settlements carrying an older generation
    /// belong to a superseded conversation and are discarded.
    pub(crate) generation: u64,
    pub(crate) greeting: String,

    pub(crate) on_message: Option<Box<dyn Fn(&Message) + Send + Sync>>,
    pub(crate) on_feedback:
        Option<Box<dyn Fn(MessageId, Feedback) + Send + Sync>>,
    pub(crate) on_reset: Option<Box<dyn Fn() + Send + Sync>>,
    pub(crate) on_idle: Option<Box<dyn Fn() + Send + Sync>>,
}

pub(crate) enum Command {
    Submit(String),
    SubmitDraft,
    Rate(MessageId, Feedback),
    Reset,
    ApplyQuickPrompt(String),
    SetBusy(bool),
    Snapshot(oneshot::Sender<SessionSnapshot>),
    ReplySettled {
        generation: u64,
        outcome: Result<Reply, ReplyError>,
    },
}

impl Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Submit(text) => {
                f.debug_tuple("Submit").field(text).finish()
            }
            Command::SubmitDraft => f.write_str("SubmitDraft"),
            Command::Rate(id, feedback) => {
                f.debug_tuple("Rate").field(id).field(feedback).finish()
            }
            Command::Reset => f.write_str("Reset"),
            Command::ApplyQuickPrompt(text) => {
                f.debug_tuple("ApplyQuickPrompt").field(text).finish()
            }
            Command::SetBusy(busy) => {
                f.debug_tuple("SetBusy").field(busy).finish()
            }
            Command::Snapshot(_) => f.write_str("Snapshot"),
            Command::ReplySettled {
                generation,
                outcome,
            } => f
                .debug_struct("ReplySettled")
                .field("generation", generation)
                .field("outcome", outcome)
                .finish(),
        }
    }
}

impl SessionState {
    pub(crate) fn handle_command(
        &mut self,
        cmd: Command,
        handle: &mpsc::WeakUnboundedSender<Command>,
    ) {
        match cmd {
            Command::Submit(text) => self.submit(text, handle),
            Command::SubmitDraft => {
                // The draft is cleared by `submit` only when the
                // submission is accepted.
                let text = self.draft.clone();
                self.submit(text, handle);
            }
            Command::Rate(id, feedback) => self.rate(id, feedback),
            Command::Reset => self.reset(),
            Command::ApplyQuickPrompt(text) => self.draft = text,
            Command::SetBusy(busy) => self.busy = busy,
            Command::Snapshot(tx) => {
                tx.send(self.snapshot()).ok();
            }
            Command::ReplySettled {
                generation,
                outcome,
            } => self.reply_settled(generation, outcome),
        }
    }

    fn submit(
        &mut self,
        text: String,
        handle: &mpsc::WeakUnboundedSender<Command>,
    ) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if self.stage == SessionStage::AwaitingReply {
            trace!("a reply is already pending, submission rejected");
            return;
        }
        if self.busy {
            trace!("session is marked busy, submission rejected");
            return;
        }

        self.draft.clear();
        self.push_message(Role::User, text);
        self.stage = SessionStage::AwaitingReply;

        let request = ReplyRequest {
            prompt: text.to_owned(),
            history: self.log.clone(),
        };
        let generation = self.generation;
        let replier = Arc::clone(&self.replier);
        let Some(settle_tx) = handle.upgrade() else {
            // Every handle is gone, nothing can observe the reply.
            return;
        };
        tokio::spawn(
            async move {
                let outcome = replier.produce(request).await;
                // The session may be gone by the time we settle.
                settle_tx
                    .send(Command::ReplySettled {
                        generation,
                        outcome,
                    })
                    .ok();
            }
            .instrument(trace_span!("produce reply", generation)),
        );
    }

    fn reply_settled(
        &mut self,
        generation: u64,
        outcome: Result<Reply, ReplyError>,
    ) {
        if generation != self.generation {
            debug!(
                generation,
                current = self.generation,
                "discarding settlement of a superseded submission"
            );
            return;
        }

        self.stage = SessionStage::Idle;
        match outcome {
            Ok(reply) => {
                self.push_message(Role::Assistant, reply.content);
            }
            Err(err) => {
                warn!("reply production failed: {err}");
                self.push_message(Role::Assistant, REPLY_FAILURE_TEXT);
            }
        }

        if let Some(on_idle) = &self.on_idle {
            on_idle();
        }
    }

    fn rate(&mut self, id: MessageId, feedback: Feedback) {
        let Some(msg) = self.log.iter_mut().find(|msg| msg.id == id) else {
            trace!(%id, "rating ignored, no such message");
            return;
        };
        if msg.role != Role::Assistant {
            trace!(%id, "rating ignored, not an assistant message");
            return;
        }
        msg.feedback = Some(feedback);
        if let Some(on_feedback) = &self.on_feedback {
            on_feedback(id, feedback);
        }
    }

    fn reset(&mut self) {
        // Whatever is in flight now belongs to a superseded
        // conversation.
        self.generation += 1;
        self.stage = SessionStage::Idle;
        self.draft.clear();

        if let Some(on_reset) = &self.on_reset {
            on_reset();
            return;
        }

        self.log.clear();
        let greeting = self.greeting.clone();
        self.push_message(Role::Assistant, greeting);
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            messages: self.log.clone(),
            stage: self.stage,
            draft: self.draft.clone(),
        }
    }

    /// Appends a message with a freshly issued identifier and notifies
    /// the message observer. This is the only way the log grows, so
    /// identifiers stay unique and monotonic.
    fn push_message<S: Into<String>>(&mut self, role: Role, content: S) {
        let id = MessageId::new(self.next_id);
        self.next_id += 1;

        let msg = Message::new(id, role, content);
        if let Some(on_message) = &self.on_message {
            on_message(&msg);
        }
        self.log.push(msg);
    }
}
