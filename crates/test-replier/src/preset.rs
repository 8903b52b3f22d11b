use serde::{Deserialize, Serialize};

/// One scripted step of a [`crate::ScriptedReplier`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetReply {
    /// Settle successfully with the given assistant content.
    #[serde(rename = "reply")]
    Reply(String),
    /// Settle with a production failure carrying the given reason.
    #[serde(rename = "failure")]
    Failure(String),
}

impl PresetReply {
    /// Creates a successful step with the specified content.
    #[inline]
    pub fn reply<S: Into<String>>(content: S) -> Self {
        Self::Reply(content.into())
    }

    /// Creates a failing step with the specified reason.
    #[inline]
    pub fn failure<S: Into<String>>(reason: S) -> Self {
        Self::Failure(reason.into())
    }
}
