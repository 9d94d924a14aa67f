//! Page-level operations on top of the Graph client
//!
//! `PagePublisher` pairs a `GraphClient` with the app identity (app id +
//! app secret) needed for the OAuth grant endpoints. The held credential
//! starts as the caller's token and may be replaced twice during a
//! publish run: by the long-lived exchange and by page-token resolution.

use common::Secret;
use graph_client::{BatchRequest, Field, GraphClient, param, render_fields};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{PublishError, Result};
use crate::inspect::{InspectionEnvelope, TokenInspection};

const RECENT_POSTS_PAGE_LIMIT: u32 = 25;

/// Response of the `oauth/access_token` grant endpoints.
#[derive(Debug, Deserialize)]
struct TokenGrant {
    #[serde(default)]
    access_token: Option<String>,
}

/// `me?fields=id,name,accounts` — only the managed-pages part matters.
#[derive(Debug, Deserialize)]
struct MeResponse {
    #[serde(default)]
    accounts: Option<ManagedPages>,
}

#[derive(Debug, Deserialize)]
struct ManagedPages {
    #[serde(default)]
    data: Vec<ManagedPage>,
}

#[derive(Debug, Deserialize)]
struct ManagedPage {
    id: String,
    #[serde(default)]
    access_token: Option<String>,
}

/// Graph client specialized for posting to a managed Page.
#[derive(Debug)]
pub struct PagePublisher {
    graph: GraphClient,
    app_id: String,
    app_secret: Secret,
}

impl PagePublisher {
    /// Wrap a client (already holding the caller's access token) with
    /// the app identity used for OAuth grants.
    pub fn new(graph: GraphClient, app_id: impl Into<String>, app_secret: Secret) -> Self {
        PagePublisher {
            graph,
            app_id: app_id.into(),
            app_secret,
        }
    }

    /// The underlying Graph client.
    pub fn graph(&self) -> &GraphClient {
        &self.graph
    }

    /// Replace the held credential (after token exchange or page-token
    /// resolution).
    pub fn update_access_token(&mut self, access_token: impl Into<String>) {
        self.graph.update_access_token(access_token);
    }

    /// Obtain an app access token via the client-credentials grant.
    pub async fn generate_app_token(&self) -> Result<String> {
        let params = [
            param("client_id", self.app_id.as_str()),
            param("client_secret", self.app_secret.expose()),
            param("grant_type", "client_credentials"),
        ];
        let response = self
            .graph
            .get_unauthenticated("oauth/access_token", &params)
            .await?;
        let grant: TokenGrant = response.decode()?;
        grant.access_token.ok_or(PublishError::AppToken)
    }

    /// Inspect an access token via `debug_token`. The call is signed
    /// with the app token, not the held credential.
    pub async fn inspect_token(
        &self,
        input_token: &str,
        app_token: &str,
    ) -> Result<TokenInspection> {
        let params = [
            param("input_token", input_token),
            param("access_token", app_token),
        ];
        let response = self.graph.get_unauthenticated("debug_token", &params).await?;
        let envelope: InspectionEnvelope = response.decode()?;
        Ok(envelope.data)
    }

    /// Exchange the held credential for a long-lived one via the
    /// `fb_exchange_token` grant, replacing it on success. A 2xx
    /// response without a token keeps the current credential.
    pub async fn generate_long_lived_user_access_token(&mut self) -> Result<Option<String>> {
        let params = [
            param("grant_type", "fb_exchange_token"),
            param("client_id", self.app_id.as_str()),
            param("client_secret", self.app_secret.expose()),
            param("fb_exchange_token", self.graph.access_token()),
        ];
        let response = self
            .graph
            .get_unauthenticated("oauth/access_token", &params)
            .await?;
        let grant: TokenGrant = response.decode()?;

        match grant.access_token {
            Some(token) => {
                debug!("exchanged credential for a long-lived token");
                self.graph.update_access_token(token.clone());
                Ok(Some(token))
            }
            None => {
                warn!("token exchange returned no access_token, keeping current credential");
                Ok(None)
            }
        }
    }

    /// Resolve the page-scoped access token for one of the caller's
    /// managed pages.
    pub async fn get_page_access_token(&self, page_id: &str) -> Result<String> {
        let fields = [
            Field::from("id"),
            Field::from("name"),
            Field::from("accounts"),
        ];
        let params = [param("fields", render_fields(&fields))];
        let response = self.graph.get("me", &params).await?;
        let me: MeResponse = response.decode()?;

        me.accounts
            .map(|accounts| accounts.data)
            .unwrap_or_default()
            .into_iter()
            .find(|page| page.id == page_id)
            .and_then(|page| page.access_token)
            .ok_or_else(|| PublishError::PageNotFound(page_id.to_owned()))
    }

    /// Ids (and created times) of the page's most recent posts.
    pub async fn get_recent_post_ids(&self, page_id: &str, size: usize) -> Result<Vec<Value>> {
        let path = format!("{page_id}/posts");
        let fields = [Field::from("id"), Field::from("created_time")];
        let params = [
            param("limit", RECENT_POSTS_PAGE_LIMIT.to_string()),
            param("fields", render_fields(&fields)),
        ];
        Ok(self.graph.paginate(&path, &params, size).await?)
    }

    /// Full content of one post, attachments expanded.
    pub async fn get_post_content_by_id(&self, post_id: &str) -> Result<Value> {
        let fields = [
            Field::from("id"),
            Field::from("message"),
            Field::nested(
                "attachments",
                [
                    "media_type".into(),
                    "url".into(),
                    "media".into(),
                    "subattachments".into(),
                ],
            ),
        ];
        let params = [param("fields", render_fields(&fields))];
        let response = self.graph.get(post_id, &params).await?;
        Ok(response.body)
    }

    /// Content of several posts via one batched request.
    pub async fn get_post_content_by_ids(&self, post_ids: &[&str]) -> Result<Value> {
        let requests: Vec<BatchRequest> = post_ids
            .iter()
            .map(|post_id| BatchRequest::get(*post_id))
            .collect();
        Ok(self.graph.batch(&requests).await?)
    }
}
