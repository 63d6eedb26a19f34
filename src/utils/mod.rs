//! The `utils` module collects the pieces shared across the relay:
//! the error types every fallible path returns and the logging setup.

pub mod error;
pub mod logging;

pub use error::{RelayError, SinkError};
