use campus_chat_core::{Session, SessionBuilder, SessionSnapshot};
use campus_chat_model::{Feedback, Message, MessageId, ReplyProducer};

/// The greeting that opens every portal conversation.
pub const PORTAL_GREETING: &str = "Hi! I'm your campus assistant. I can \
    help with timetables, fee balances, course material and support \
    tickets.";

/// The quick prompts the portal chat page offers next to the input box.
pub const QUICK_PROMPTS: &[&str] = &[
    "Show my timetable for this week",
    "What is my current fee balance?",
    "Explain depth-first search with an example",
    "How do I raise a helpdesk ticket?",
];

/// An assistant chat builder.
///
/// See [`AssistantChat`].
pub struct AssistantChatBuilder {
    session_builder: SessionBuilder,
}

impl AssistantChatBuilder {
    /// Creates a builder seeded with the portal greeting, backed by the
    /// built-in simulated replier.
    pub fn new() -> Self {
        let session_builder =
            SessionBuilder::new().with_greeting(PORTAL_GREETING);
        Self { session_builder }
    }

    /// Uses the specified reply producer instead of the simulated one.
    #[inline]
    pub fn with_reply_producer<P: ReplyProducer + 'static>(
        mut self,
        replier: P,
    ) -> Self {
        self.session_builder =
            self.session_builder.with_reply_producer(replier);
        self
    }

    /// Attaches a callback to be invoked for every appended message.
    #[inline]
    pub fn on_message(
        mut self,
        on_message: impl Fn(&Message) + Send + Sync + 'static,
    ) -> Self {
        self.session_builder = self.session_builder.on_message(on_message);
        self
    }

    /// Attaches a callback to be invoked after a rating is recorded.
    #[inline]
    pub fn on_feedback(
        mut self,
        on_feedback: impl Fn(MessageId, Feedback) + Send + Sync + 'static,
    ) -> Self {
        self.session_builder = self.session_builder.on_feedback(on_feedback);
        self
    }

    /// Attaches a callback to be invoked when a pending reply settles.
    #[inline]
    pub fn on_idle(
        mut self,
        on_idle: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.session_builder = self.session_builder.on_idle(on_idle);
        self
    }

    /// Builds a new chat.
    pub fn build(self) -> AssistantChat {
        AssistantChat {
            session: self.session_builder.build(),
        }
    }
}

impl Default for AssistantChatBuilder {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

/// An assistant chat preconfigured for the student portal, like the
/// chat panel on the portal's AI-assistant page.
///
/// This is basically a wrapper around [`Session`] that seeds the portal
/// greeting and exposes the page's quick prompts.
pub struct AssistantChat {
    session: Session,
}

impl AssistantChat {
    /// Returns the quick prompts to render next to the input box.
    #[inline]
    pub fn quick_prompts(&self) -> &'static [&'static str] {
        QUICK_PROMPTS
    }

    /// Copies the indexed quick prompt into the draft buffer without
    /// submitting it. Out-of-range indexes are ignored.
    pub fn apply_quick_prompt(&self, index: usize) {
        if let Some(prompt) = QUICK_PROMPTS.get(index) {
            self.session.apply_quick_prompt(*prompt);
        }
    }

    /// Sends a message to the assistant.
    #[inline]
    pub fn send_message(&self, message: &str) {
        self.session.submit(message);
    }

    /// Submits the current draft buffer, typically after a quick prompt
    /// was applied.
    #[inline]
    pub fn send_draft(&self) {
        self.session.submit_draft();
    }

    /// Rates an assistant reply.
    #[inline]
    pub fn rate_message(&self, id: MessageId, feedback: Feedback) {
        self.session.rate_message(id, feedback);
    }

    /// Starts a new conversation.
    #[inline]
    pub fn new_conversation(&self) {
        self.session.reset();
    }

    /// Returns a point-in-time view of the conversation.
    #[inline]
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot().await
    }
}
