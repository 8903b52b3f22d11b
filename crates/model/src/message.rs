use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a message, unique within its session.
///
/// Identifiers are issued monotonically by the session manager, so
/// comparing two identifiers from the same session also compares their
/// insertion order.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct MessageId(u64);

impl MessageId {
    /// Creates a message identifier from its raw value.
    #[inline]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value of this identifier.
    #[inline]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The author of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// An instruction or notice that is not authored by either party.
    System,
    /// A message typed by the local user.
    User,
    /// A message produced on behalf of the assistant.
    Assistant,
}

impl Role {
    /// Returns the canonical string form of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user rating attached to an assistant message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feedback {
    /// The user found the reply helpful.
    Helpful,
    /// The user found the reply unhelpful.
    NotHelpful,
}

/// A single turn in a conversation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    /// Identifier of this message.
    pub id: MessageId,
    /// Who authored this message.
    pub role: Role,
    /// The textual content.
    pub content: String,
    /// When this message was created.
    pub created_at: DateTime<Utc>,
    /// The user rating. Only assistant messages ever carry one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
}

impl Message {
    /// Creates a message stamped with the current time and no feedback.
    pub fn new<S: Into<String>>(id: MessageId, role: Role, content: S) -> Self {
        Self {
            id,
            role,
            content: content.into(),
            created_at: Utc::now(),
            feedback: None,
        }
    }
}
