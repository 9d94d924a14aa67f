//! Shared types for the Facebook page publishing workspace

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
