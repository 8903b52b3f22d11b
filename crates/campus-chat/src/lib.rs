//! An out-of-the-box assistant chat for the student portal.
//!
//! The crate includes a CLI chat for trying the assistant in the
//! terminal. And you can also use it as a library to bring the
//! conversational session into your own portal front-end.

#![deny(missing_docs)]

#[allow(unused_imports)]
#[macro_use]
extern crate tracing;

mod chat;

pub use chat::{
    AssistantChat, AssistantChatBuilder, PORTAL_GREETING, QUICK_PROMPTS,
};

/// Re-exports of [`campus_chat_core`] crate.
pub mod core {
    pub use campus_chat_core::*;
}

/// Re-exports of [`campus_chat_model`] crate.
pub mod model {
    pub use campus_chat_model::*;
}
