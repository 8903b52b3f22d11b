//! Core logic of the conversational session manager: the message log,
//! the submit/await-reply cycle, feedback annotations, and resets.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod session;

pub use session::{
    DEFAULT_GREETING, REPLY_FAILURE_TEXT, SIMULATED_REPLY_DELAY, Session,
    SessionBuilder, SessionSnapshot, SessionStage, SimulatedReplier,
};
