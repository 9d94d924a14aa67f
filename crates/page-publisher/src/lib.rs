//! Facebook Page publishing
//!
//! Page-level layer over `graph-client`: app-token generation, token
//! inspection, long-lived token exchange, page-token resolution, read
//! helpers, and the validated publish workflow.
//!
//! Publish flow:
//! 1. `PagePublisher::generate_app_token()` obtains an app token
//! 2. `inspect_token()` checks validity, scopes, and token ownership
//! 3. `generate_long_lived_user_access_token()` upgrades the credential
//! 4. USER tokens are swapped for the page-scoped token
//! 5. The photo set / video / status update is published
//!
//! `PagePublisher::publish()` runs the whole sequence; the first failure
//! aborts it with a typed [`PublishError`].

pub mod error;
pub mod inspect;
pub mod publisher;
pub mod workflow;

pub use error::{PublishError, Result};
pub use inspect::{TokenInspection, TokenType};
pub use publisher::PagePublisher;
pub use workflow::{PublishOutcome, PublishRequest, REQUIRED_PUBLISH_SCOPES};
