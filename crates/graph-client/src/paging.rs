//! Response envelope and cursor reshaping
//!
//! List endpoints return a `paging` object with absolute `next`/`previous`
//! URLs. `GraphResponse` reshapes those into relative path cursors so a
//! follow-up call can go back through `GraphClient::get` (which prepends
//! the base URL and version segment itself).

use serde_json::Value;

/// An opaque pagination cursor: a relative `path?query` usable as the
/// `path` argument of [`crate::GraphClient::get`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub path: String,
}

impl Cursor {
    /// Reshape an absolute paging URL into a relative cursor.
    ///
    /// Strips the scheme/host and a leading `v{major}.{minor}` version
    /// segment (the client re-adds its own), keeping the query string
    /// with its `after`/`before`/`limit` parameters intact. Returns
    /// `None` for unparseable URLs.
    pub(crate) fn from_paging_url(url: &str) -> Option<Cursor> {
        let parsed = reqwest::Url::parse(url).ok()?;
        let mut path = parsed.path().trim_start_matches('/').to_owned();
        if let Some((first, rest)) = path.split_once('/')
            && is_version_segment(first)
        {
            path = rest.to_owned();
        }
        let path = match parsed.query() {
            Some(query) => format!("{path}?{query}"),
            None => path,
        };
        Some(Cursor { path })
    }
}

fn is_version_segment(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit() || c == '.'))
}

/// A parsed Graph API response body with reshaped pagination cursors.
#[derive(Debug)]
pub struct GraphResponse {
    pub body: Value,
    pub next: Option<Cursor>,
    pub previous: Option<Cursor>,
}

impl GraphResponse {
    pub(crate) fn from_body(body: Value) -> Self {
        let next = paging_cursor(&body, "next");
        let previous = paging_cursor(&body, "previous");
        GraphResponse {
            body,
            next,
            previous,
        }
    }

    /// The `data` array of a list response; missing or non-array `data`
    /// is treated as an empty result set.
    pub fn data(&self) -> &[Value] {
        self.body
            .get("data")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Deserialize the body into an endpoint-specific struct.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> crate::Result<T> {
        serde_json::from_value(self.body.clone())
            .map_err(|e| crate::GraphError::Response(e.to_string()))
    }
}

fn paging_cursor(body: &Value, direction: &str) -> Option<Cursor> {
    body.get("paging")?
        .get(direction)?
        .as_str()
        .and_then(Cursor::from_paging_url)
}
