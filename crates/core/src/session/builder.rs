use std::sync::Arc;

use campus_chat_model::{
    Feedback, Message, MessageId, ReplyProducer, Role,
};

use super::simulated::SimulatedReplier;
use super::state::SessionState;
use super::{DEFAULT_GREETING, Session};

/// [`Session`] builder.
pub struct SessionBuilder {
    replier: Option<Arc<dyn ReplyProducer>>,
    greeting: String,
    initial_log: Vec<Message>,
    on_message: Option<Box<dyn Fn(&Message) + Send + Sync>>,
    on_feedback: Option<Box<dyn Fn(MessageId, Feedback) + Send + Sync>>,
    on_reset: Option<Box<dyn Fn() + Send + Sync>>,
    on_idle: Option<Box<dyn Fn() + Send + Sync>>,
}

impl SessionBuilder {
    /// Creates a builder with the default greeting and the built-in
    /// simulated replier.
    #[inline]
    pub fn new() -> Self {
        Self {
            replier: None,
            greeting: DEFAULT_GREETING.to_owned(),
            initial_log: vec![],
            on_message: None,
            on_feedback: None,
            on_reset: None,
            on_idle: None,
        }
    }

    /// Uses the specified reply producer instead of the built-in
    /// simulated one.
    #[inline]
    pub fn with_reply_producer<P: ReplyProducer + 'static>(
        mut self,
        replier: P,
    ) -> Self {
        self.replier = Some(Arc::new(replier));
        self
    }

    /// Sets the greeting that seeds fresh conversations.
    #[inline]
    pub fn with_greeting<S: Into<String>>(mut self, greeting: S) -> Self {
        self.greeting = greeting.into();
        self
    }

    /// Seeds the session with an existing log instead of the greeting.
    ///
    /// An empty log is ignored, a session always starts with at least
    /// one message. Freshly issued identifiers continue past the
    /// largest supplied one.
    #[inline]
    pub fn with_initial_log(mut self, messages: Vec<Message>) -> Self {
        self.initial_log = messages;
        self
    }

    /// Attaches a callback to be invoked for every message the session
    /// appends to the log. The seed log does not count.
    #[inline]
    pub fn on_message(
        mut self,
        on_message: impl Fn(&Message) + Send + Sync + 'static,
    ) -> Self {
        self.on_message = Some(Box::new(on_message));
        self
    }

    /// Attaches a callback to be invoked after a rating has been
    /// recorded on an assistant message.
    #[inline]
    pub fn on_feedback(
        mut self,
        on_feedback: impl Fn(MessageId, Feedback) + Send + Sync + 'static,
    ) -> Self {
        self.on_feedback = Some(Box::new(on_feedback));
        self
    }

    /// Attaches a callback to be invoked on reset instead of the
    /// built-in log reseed. Pending-reply state and the draft buffer
    /// are still cleared locally.
    #[inline]
    pub fn on_reset(
        mut self,
        on_reset: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.on_reset = Some(Box::new(on_reset));
        self
    }

    /// Attaches a callback to be invoked when a pending reply settles
    /// and the session returns to idle.
    #[inline]
    pub fn on_idle(
        mut self,
        on_idle: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.on_idle = Some(Box::new(on_idle));
        self
    }

    /// Builds the session and spawns its task.
    pub fn build(self) -> Session {
        let log = if self.initial_log.is_empty() {
            vec![Message::new(
                MessageId::new(1),
                Role::Assistant,
                self.greeting.clone(),
            )]
        } else {
            self.initial_log
        };
        let next_id =
            log.iter().map(|msg| msg.id.value()).max().unwrap_or(0) + 1;

        let state = SessionState {
            replier: self
                .replier
                .unwrap_or_else(|| Arc::new(SimulatedReplier)),
            log,
            next_id,
            draft: String::new(),
            busy: false,
            stage: Default::default(),
            generation: 0,
            greeting: self.greeting,
            on_message: self.on_message,
            on_feedback: self.on_feedback,
            on_reset: self.on_reset,
            on_idle: self.on_idle,
        };
        Session::spawn(state)
    }
}

impl Default for SessionBuilder {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
