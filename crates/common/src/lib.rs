//! Common types, protocol definitions, and errors shared across `passvault` crates.

pub mod error;
pub mod protocol;

pub use error::ServiceError;
