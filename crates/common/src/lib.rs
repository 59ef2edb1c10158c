//! Helpers shared by the error types of every parley crate.

pub mod error;

pub use error::FromMessage;
