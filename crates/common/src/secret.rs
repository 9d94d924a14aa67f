//! Secret wrapper for app secrets and access tokens
//!
//! Graph API credentials (the app secret and page/user access tokens)
//! end up in config structs that get logged via Debug. Wrapping them
//! keeps the raw value out of logs and zeroes the memory on drop.

use std::fmt;
use zeroize::Zeroize;

/// Sensitive string - redacted in Debug/Display/logs
pub struct Secret(String);

impl Secret {
    /// Wrap a sensitive value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the inner value (use sparingly, at the request boundary)
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl Clone for Secret {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}
