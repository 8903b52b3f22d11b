use crate::message::Message;

/// A request to be handled by a reply producer.
#[derive(Clone, Debug)]
pub struct ReplyRequest {
    /// The submitted user text, already trimmed.
    pub prompt: String,
    /// A snapshot of the session log at submission time, ending with the
    /// user turn that carries `prompt`.
    pub history: Vec<Message>,
}

/// The assistant content produced for one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    /// The assistant message text.
    pub content: String,
}

impl Reply {
    /// Creates a reply with the specified content.
    #[inline]
    pub fn text<S: Into<String>>(content: S) -> Self {
        Self {
            content: content.into(),
        }
    }
}
