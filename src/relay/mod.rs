//! The `relay` module holds the message relay itself.
//!
//! `Relay` owns the broker handle and the optional cloud sink and reacts to
//! the two events the client library reports: a connect result and an
//! inbound message.

pub mod engine;
pub mod handler;
pub mod message;

pub use engine::Relay;
pub use handler::EventHandler;
pub use message::Message;
