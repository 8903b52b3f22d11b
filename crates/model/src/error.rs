use thiserror::Error;

/// The error a reply producer settles with when it cannot produce a
/// reply.
///
/// There is a single failure kind on purpose: the session manager treats
/// every production failure the same way, by appending a fixed fallback
/// message to the log. The reason is only surfaced through logs.
#[derive(Clone, Debug, Error)]
#[error("reply production failed: {reason}")]
pub struct ReplyError {
    reason: String,
}

impl ReplyError {
    /// Creates an error with the specified reason.
    pub fn new<S: Into<String>>(reason: S) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Returns the reason of this error.
    #[inline]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}
