//! Facebook Graph API client
//!
//! Thin typed wrapper over the Graph API REST surface: signed requests,
//! cursor-based pagination, field-selection query building, batched
//! sub-requests, and photo/video/feed publishing. This crate is a
//! standalone library with no knowledge of pages or tokens beyond the
//! bearer credential it sends; page-level semantics live in
//! `page-publisher`.
//!
//! Request flow:
//! 1. Caller builds a `GraphClient` with an access token and API version
//! 2. Typed operations (`get`, `paginate`, `post_image`, ...) merge the
//!    credential into the query string and hit `{base_url}/v{version}/{path}`
//! 3. Non-2xx responses surface as `GraphError::Upstream` with the
//!    server's error message; nothing is retried

pub mod client;
pub mod error;
pub mod fields;
pub mod paging;
mod schedule;

pub use client::{BatchRequest, DEFAULT_BASE_URL, GraphClient, MediaResponse, param};
pub use error::{GraphError, Result};
pub use fields::{Field, render_fields};
pub use paging::{Cursor, GraphResponse};
