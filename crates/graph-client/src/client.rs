//! Graph API client
//!
//! Holds the HTTP client, API version, and the current bearer credential.
//! Every operation merges the credential into the query string (the Graph
//! API takes `access_token` as a query parameter, not a header) and hits
//! `{base_url}/v{version}/{path}`. Failures map to `GraphError::Upstream`
//! with the server's message; nothing is retried.
//!
//! The credential is replaceable via `update_access_token` (`&mut self`),
//! so one client instance must not be shared across concurrent publish
//! workflows — each workflow owns its client for the duration of the run.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{GraphError, Result};
use crate::fields::{Field, render_fields};
use crate::paging::GraphResponse;
use crate::schedule;

/// Production Graph API host.
pub const DEFAULT_BASE_URL: &str = "https://graph.facebook.com";

/// Default per-page `limit` for paginated edges.
const DEFAULT_PAGE_LIMIT: u32 = 25;

const USER_AGENT: &str = "Facebook Graph Client";

/// Build one query parameter pair.
pub fn param(key: impl Into<String>, value: impl Into<String>) -> (String, String) {
    (key.into(), value.into())
}

/// Result of an unpublished photo or video upload. The `id` is later
/// attached to a feed post; uploads occasionally come back without one
/// and are skipped by callers.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub post_id: Option<String>,
}

/// One sub-request of a batched call.
#[derive(Debug, Clone, Serialize)]
pub struct BatchRequest {
    pub method: String,
    pub relative_url: String,
}

impl BatchRequest {
    /// A GET sub-request for the given relative URL.
    pub fn get(relative_url: impl Into<String>) -> Self {
        BatchRequest {
            method: "GET".into(),
            relative_url: relative_url.into(),
        }
    }
}

/// Typed Graph API client.
#[derive(Debug)]
pub struct GraphClient {
    http: reqwest::Client,
    base_url: String,
    version: String,
    access_token: String,
}

impl GraphClient {
    /// Create a client against the production Graph API host.
    pub fn new(access_token: impl Into<String>, version: impl Into<String>) -> Result<Self> {
        Self::with_base_url(access_token, version, DEFAULT_BASE_URL)
    }

    /// Create a client against an explicit base URL (tests point this at
    /// a mock server).
    pub fn with_base_url(
        access_token: impl Into<String>,
        version: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        let base_url = base_url.into();
        Ok(GraphClient {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            version: version.into(),
            access_token: access_token.into(),
        })
    }

    /// The credential currently used to sign requests.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Replace the held credential (after a token exchange or page-token
    /// resolution).
    pub fn update_access_token(&mut self, access_token: impl Into<String>) {
        self.access_token = access_token.into();
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(String, String)],
        token: Option<&str>,
    ) -> Result<Value> {
        let url = format!("{}/v{}/{}", self.base_url, self.version, path);
        let mut request = self.http.request(method.clone(), &url).query(params);
        if let Some(token) = token {
            request = request.query(&[("access_token", token)]);
        }

        debug!(%method, path, "issuing Graph API request");
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = upstream_message(&body);
            warn!(status = status.as_u16(), path, %message, "Graph API request failed");
            return Err(GraphError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| GraphError::Response(format!("invalid JSON body: {e}")))
    }

    /// GET an object or edge, reshaping pagination cursors for reuse.
    pub async fn get(&self, path: &str, params: &[(String, String)]) -> Result<GraphResponse> {
        let body = self
            .request(Method::GET, path, params, Some(self.access_token.as_str()))
            .await?;
        Ok(GraphResponse::from_body(body))
    }

    /// GET without merging the held credential. OAuth grant endpoints
    /// (`client_credentials`, `fb_exchange_token`) and `debug_token`
    /// supply their own `access_token`/secret parameters.
    pub async fn get_unauthenticated(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<GraphResponse> {
        let body = self.request(Method::GET, path, params, None).await?;
        Ok(GraphResponse::from_body(body))
    }

    /// Follow `next` cursors until `size` items are accumulated or the
    /// edge is exhausted. Returns at most `size` items in arrival order.
    /// Follow-up calls reuse the cursor's own query string (the upstream
    /// `next` URL already carries `limit` and `after`).
    pub async fn paginate(
        &self,
        path: &str,
        params: &[(String, String)],
        size: usize,
    ) -> Result<Vec<Value>> {
        if size == 0 {
            return Ok(Vec::new());
        }

        let mut page = self.get(path, params).await?;
        let mut items = page.data().to_vec();

        while items.len() < size {
            let Some(cursor) = page.next else { break };
            page = self.get(&cursor.path, &[]).await?;
            items.extend_from_slice(page.data());
        }

        items.truncate(size);
        Ok(items)
    }

    /// Read up to `size` items from the named edge of an object.
    pub async fn fetch(&self, id: &str, edge: &str, size: usize) -> Result<Vec<Value>> {
        let path = format!("{id}/{edge}");
        let params = [param("limit", DEFAULT_PAGE_LIMIT.to_string())];
        self.paginate(&path, &params, size).await
    }

    /// Query the `search` endpoint with a field selection.
    pub async fn search(
        &self,
        q: &str,
        object_type: &str,
        fields: &[Field],
        size: usize,
    ) -> Result<Vec<Value>> {
        let params = [
            param("q", q),
            param("type", object_type),
            param("fields", render_fields(fields)),
            param("limit", DEFAULT_PAGE_LIMIT.to_string()),
        ];
        self.paginate("search", &params, size).await
    }

    /// Upload a photo by URL to `{id}/photos`. Unpublished uploads
    /// (`published == false`) return a media id for later attachment.
    pub async fn post_image(
        &self,
        id: &str,
        caption: &str,
        url: &str,
        published: bool,
    ) -> Result<MediaResponse> {
        let params = [
            param("caption", caption),
            param("url", url),
            param("published", published.to_string()),
        ];
        let body = self
            .request(
                Method::POST,
                &format!("{id}/photos"),
                &params,
                Some(self.access_token.as_str()),
            )
            .await?;
        serde_json::from_value(body)
            .map_err(|e| GraphError::Response(format!("photo upload response: {e}")))
    }

    /// Upload a video by URL to `{id}/videos`. A `delay_ms` strictly
    /// inside the scheduling window defers publication; outside it the
    /// delay is silently ignored.
    pub async fn post_video(
        &self,
        id: &str,
        description: &str,
        file_url: &str,
        delay_ms: Option<i64>,
    ) -> Result<MediaResponse> {
        let mut params = vec![param("description", description), param("file_url", file_url)];
        append_schedule(&mut params, delay_ms);
        let body = self
            .request(
                Method::POST,
                &format!("{id}/videos"),
                &params,
                Some(self.access_token.as_str()),
            )
            .await?;
        serde_json::from_value(body)
            .map_err(|e| GraphError::Response(format!("video upload response: {e}")))
    }

    /// Publish a feed item to `{id}/feed`. Each media id is attached as
    /// an indexed `attached_media[i]` parameter; the same scheduling
    /// window as `post_video` applies.
    pub async fn post_feed(
        &self,
        id: &str,
        message: &str,
        link: Option<&str>,
        media_ids: &[String],
        delay_ms: Option<i64>,
    ) -> Result<Value> {
        let mut params = vec![param("message", message)];
        if let Some(link) = link {
            params.push(param("link", link));
        }
        for (index, media_id) in media_ids.iter().enumerate() {
            params.push(param(
                format!("attached_media[{index}]"),
                serde_json::json!({ "media_fbid": media_id }).to_string(),
            ));
        }
        append_schedule(&mut params, delay_ms);

        self.request(
            Method::POST,
            &format!("{id}/feed"),
            &params,
            Some(self.access_token.as_str()),
        )
        .await
    }

    /// Issue a sequence of sub-requests as a single batched POST.
    pub async fn batch(&self, requests: &[BatchRequest]) -> Result<Value> {
        let encoded = serde_json::to_string(requests)
            .map_err(|e| GraphError::Response(format!("encoding batch: {e}")))?;
        let params = [
            param("batch", encoded),
            // Included to strip header information from sub-responses
            param("include_headers", "false"),
        ];
        self.request(Method::POST, "", &params, Some(self.access_token.as_str()))
            .await
    }

    /// DELETE an object by id.
    pub async fn delete(&self, id: &str) -> Result<Value> {
        self.request(Method::DELETE, id, &[], Some(self.access_token.as_str()))
            .await
    }
}

fn append_schedule(params: &mut Vec<(String, String)>, delay_ms: Option<i64>) {
    if let Some(publish_time) = schedule::scheduled_publish_time(delay_ms) {
        params.push(param("published", "false"));
        params.push(param("scheduled_publish_time", publish_time.to_string()));
    }
}

/// Pull the human-readable message out of the Graph error envelope
/// `{"error": {"message": ...}}`, falling back to the raw body.
fn upstream_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct Envelope {
        error: Option<ErrorBody>,
    }
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    serde_json::from_str::<Envelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|error| error.message)
        .unwrap_or_else(|| {
            let mut message = body.trim().to_owned();
            message.truncate(200);
            message
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::{SystemTime, UNIX_EPOCH};
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> GraphClient {
        GraphClient::with_base_url("test-token", "8.0", server.uri()).unwrap()
    }

    #[tokio::test]
    async fn get_merges_access_token_into_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8.0/me"))
            .and(query_param("access_token", "test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "42"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let response = client.get("me", &[]).await.unwrap();
        assert_eq!(response.body["id"], "42");
    }

    #[tokio::test]
    async fn get_unauthenticated_omits_credential() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8.0/oauth/access_token"))
            .and(query_param("grant_type", "client_credentials"))
            .and(query_param_is_missing("access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "app"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let params = [param("grant_type", "client_credentials")];
        let response = client
            .get_unauthenticated("oauth/access_token", &params)
            .await
            .unwrap();
        assert_eq!(response.body["access_token"], "app");
    }

    #[tokio::test]
    async fn upstream_error_carries_status_and_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8.0/me"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"message": "Invalid OAuth access token.", "code": 190}
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.get("me", &[]).await.unwrap_err();
        match err {
            GraphError::Upstream { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid OAuth access token.");
            }
            other => panic!("expected Upstream, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn upstream_error_falls_back_to_raw_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8.0/me"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.get("me", &[]).await.unwrap_err();
        match err {
            GraphError::Upstream { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "upstream exploded");
            }
            other => panic!("expected Upstream, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn paginate_follows_cursors_in_arrival_order() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v8.0/1234/posts"))
            .and(query_param("limit", "2"))
            .and(query_param_is_missing("after"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": "p1"}, {"id": "p2"}],
                "paging": {
                    "next": format!("{}/v8.0/1234/posts?limit=2&after=cursor1", server.uri())
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v8.0/1234/posts"))
            .and(query_param("after", "cursor1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": "p3"}, {"id": "p4"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let items = client
            .paginate("1234/posts", &[param("limit", "2")], 3)
            .await
            .unwrap();

        let ids: Vec<_> = items.iter().map(|item| item["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["p1", "p2", "p3"], "at most `size` items, in arrival order");
    }

    #[tokio::test]
    async fn paginate_makes_no_followup_once_size_met() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8.0/1234/posts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": "p1"}, {"id": "p2"}],
                "paging": {
                    "next": format!("{}/v8.0/1234/posts?after=more", server.uri())
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let items = client.paginate("1234/posts", &[], 2).await.unwrap();
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn paginate_stops_at_exhausted_edge() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8.0/1234/posts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": "p1"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let items = client.paginate("1234/posts", &[], 10).await.unwrap();
        assert_eq!(items.len(), 1, "returns min(size, available)");
    }

    #[tokio::test]
    async fn paginate_size_zero_issues_no_calls() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .expect(0)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let items = client.paginate("1234/posts", &[], 0).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn paginate_tolerates_response_without_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8.0/1234/posts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let items = client.paginate("1234/posts", &[], 5).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn post_image_returns_media_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v8.0/99/photos"))
            .and(query_param("caption", "Image 1 of 1"))
            .and(query_param("url", "https://example.com/a.jpg"))
            .and(query_param("published", "false"))
            .and(query_param("access_token", "test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "111"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let media = client
            .post_image("99", "Image 1 of 1", "https://example.com/a.jpg", false)
            .await
            .unwrap();
        assert_eq!(media.id.as_deref(), Some("111"));
    }

    #[tokio::test]
    async fn post_feed_attaches_media_ids_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v8.0/99/feed"))
            .and(query_param("message", "hi"))
            .and(query_param("attached_media[0]", r#"{"media_fbid":"111"}"#))
            .and(query_param("attached_media[1]", r#"{"media_fbid":"222"}"#))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "99_777"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let post = client
            .post_feed("99", "hi", None, &["111".into(), "222".into()], None)
            .await
            .unwrap();
        assert_eq!(post["id"], "99_777");
    }

    #[tokio::test]
    async fn post_feed_ignores_delay_outside_window() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v8.0/99/feed"))
            .and(query_param_is_missing("published"))
            .and(query_param_is_missing("scheduled_publish_time"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "99_1"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        // One second is below the 10-minute minimum
        client
            .post_feed("99", "now", None, &[], Some(1000))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn post_video_schedules_delay_inside_window() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v8.0/99/videos"))
            .and(query_param("description", "clip"))
            .and(query_param("file_url", "https://example.com/v.mp4"))
            .and(query_param("published", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "vid1"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let one_hour_ms = 60 * 60 * 1000;
        let before = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();

        let media = client
            .post_video("99", "clip", "https://example.com/v.mp4", Some(one_hour_ms))
            .await
            .unwrap();
        assert_eq!(media.id.as_deref(), Some("vid1"));

        let requests = server.received_requests().await.unwrap();
        let scheduled: u64 = requests[0]
            .url
            .query_pairs()
            .find(|(key, _)| key == "scheduled_publish_time")
            .map(|(_, value)| value.parse().unwrap())
            .expect("scheduled_publish_time must be sent");
        assert!(
            scheduled >= before + 3600 && scheduled <= before + 3700,
            "scheduled_publish_time should be ~now + delay, got {scheduled}"
        );
    }

    #[tokio::test]
    async fn batch_sends_encoded_subrequests() {
        let requests = [BatchRequest::get("123_1"), BatchRequest::get("123_2")];
        let encoded = serde_json::to_string(&requests).unwrap();

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v8.0/"))
            .and(query_param("batch", encoded.as_str()))
            .and(query_param("include_headers", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"code": 200, "body": "{}"},
                {"code": 200, "body": "{}"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let result = client.batch(&requests).await.unwrap();
        assert_eq!(result.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn delete_issues_delete_for_object_id() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v8.0/obj1"))
            .and(query_param("access_token", "test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let result = client.delete("obj1").await.unwrap();
        assert_eq!(result["success"], true);
    }

    #[tokio::test]
    async fn update_access_token_replaces_credential() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8.0/me"))
            .and(query_param("access_token", "page-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "1"})))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = test_client(&server);
        client.update_access_token("page-token");
        assert_eq!(client.access_token(), "page-token");
        client.get("me", &[]).await.unwrap();
    }
}
