//! The shared vocabulary for conversational sessions.
//!
//! This crate establishes the data model that the session manager and
//! its collaborators agree on: the entries of a session's message log,
//! and the contract for reply producers that generate assistant content.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod message;
mod producer;
mod request;

pub use error::*;
pub use message::*;
pub use producer::*;
pub use request::*;
