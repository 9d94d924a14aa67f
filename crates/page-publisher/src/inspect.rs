//! Token inspection via the `debug_token` endpoint
//!
//! The inspection result is derived per call and never cached: the
//! workflow reads it once, gates on validity/scopes/ownership, and
//! throws it away.

use serde::Deserialize;

/// Whether a credential is scoped to a single managed page or to a
/// user's overall account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenType {
    Page,
    User,
}

/// Decoded `debug_token` payload for one access token.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenInspection {
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    #[serde(default)]
    pub application: Option<String>,
    /// Unix seconds; 0 means a non-expiring token
    #[serde(default)]
    pub expires_at: Option<u64>,
    #[serde(default)]
    pub data_access_expires_at: Option<u64>,
    #[serde(default)]
    pub is_valid: bool,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    /// For PAGE tokens, the id of the page the token is bound to
    #[serde(default)]
    pub profile_id: Option<String>,
}

impl TokenInspection {
    /// Required scopes absent from the granted set, in required order.
    pub fn missing_scopes(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|scope| !self.scopes.iter().any(|granted| granted == *scope))
            .map(|scope| (*scope).to_owned())
            .collect()
    }
}

/// `debug_token` wraps the payload in a `data` object.
#[derive(Debug, Deserialize)]
pub(crate) struct InspectionEnvelope {
    pub data: TokenInspection,
}
