mod builder;
mod simulated;
mod state;
#[cfg(test)]
mod tests;

use campus_chat_model::{Feedback, MessageId};
use tokio::sync::{mpsc, oneshot};
use tracing::Instrument;

pub use builder::SessionBuilder;
pub use simulated::{SIMULATED_REPLY_DELAY, SimulatedReplier};
pub use state::{SessionSnapshot, SessionStage};
use state::{Command, SessionState};

/// The greeting that seeds a fresh conversation.
pub const DEFAULT_GREETING: &str =
    "Hi! I'm your assistant. Ask me anything about your portal.";

/// The fixed assistant text appended to the log when reply production
/// fails.
pub const REPLY_FAILURE_TEXT: &str = "Sorry, something went wrong while \
    preparing a reply. Please try sending your question again.";

/// A handle to a conversational session.
///
/// The session state is owned by a background task, and the handle is
/// just a cheap-to-clone sender to it. Every operation except
/// [`Session::snapshot`] is fire-and-forget: it is dispatched in order
/// and applied with exclusive access to the log, so observers are never
/// handed mutable access to session state.
///
/// The background task exits once every handle has been dropped and any
/// in-flight reply has settled.
pub struct Session {
    cmd_tx: mpsc::UnboundedSender<Command>,
}

impl Session {
    /// Submits user text to the conversation.
    ///
    /// The text is trimmed first. The submission is silently rejected
    /// when the trimmed text is empty, when a reply is already pending,
    /// or when the session has been marked busy. An accepted submission
    /// appends a user message, clears the draft buffer and starts
    /// producing a reply.
    pub fn submit<S: Into<String>>(&self, text: S) {
        self.send(Command::Submit(text.into()));
    }

    /// Submits whatever is currently in the draft buffer.
    ///
    /// Follows the same rejection rules as [`Session::submit`].
    pub fn submit_draft(&self) {
        self.send(Command::SubmitDraft);
    }

    /// Rates a message in the log.
    ///
    /// Overwrites any previous rating on that message. Ratings are only
    /// recorded on assistant messages; unknown identifiers and other
    /// roles are ignored.
    pub fn rate_message(&self, id: MessageId, feedback: Feedback) {
        self.send(Command::Rate(id, feedback));
    }

    /// Starts a new conversation.
    ///
    /// Any pending reply is abandoned and the draft buffer is cleared.
    /// Unless a reset observer has been registered, the log is replaced
    /// with a single freshly timestamped greeting.
    pub fn reset(&self) {
        self.send(Command::Reset);
    }

    /// Replaces the draft buffer with the given text without
    /// submitting. The log is not touched.
    pub fn apply_quick_prompt<S: Into<String>>(&self, text: S) {
        self.send(Command::ApplyQuickPrompt(text.into()));
    }

    /// Marks the session busy or not busy.
    ///
    /// Submissions are rejected while the session is busy. This is a
    /// hook for the hosting UI, the session never sets it by itself.
    pub fn set_busy(&self, busy: bool) {
        self.send(Command::SetBusy(busy));
    }

    /// Returns a point-in-time view of the session.
    ///
    /// The snapshot reflects every operation dispatched on this handle
    /// before the call.
    pub async fn snapshot(&self) -> SessionSnapshot {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx));
        rx.await.expect("session task has been dropped too early")
    }

    #[inline]
    fn send(&self, cmd: Command) {
        self.cmd_tx
            .send(cmd)
            .expect("session task has been dropped too early");
    }
}

impl Session {
    pub(crate) fn spawn(state: SessionState) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        tokio::spawn(
            run_session(state, cmd_rx, cmd_tx.downgrade())
                .instrument(trace_span!("session")),
        );
        Self { cmd_tx }
    }
}

impl Clone for Session {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
        }
    }
}

/// The session task: drains the command queue with exclusive access to
/// the state. It only holds a weak sender, so the queue closes once the
/// last handle (or in-flight reply task) goes away.
async fn run_session(
    mut state: SessionState,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
    handle: mpsc::WeakUnboundedSender<Command>,
) {
    debug!("started");
    while let Some(cmd) = cmd_rx.recv().await {
        trace!("received command: {cmd:?}");
        state.handle_command(cmd, &handle);
    }
    debug!("will terminate");
}
