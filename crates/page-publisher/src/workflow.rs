//! Validated publish workflow
//!
//! A strictly ordered sequence: app token, caller-token inspection,
//! long-lived exchange, page-token resolution, then the actual publish.
//! The first failure aborts the remainder; there are no retries and no
//! cleanup of already-uploaded unpublished media.

use graph_client::MediaResponse;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{PublishError, Result};
use crate::inspect::TokenType;
use crate::publisher::PagePublisher;

/// Scopes a caller token must carry before any publish call is issued.
pub const REQUIRED_PUBLISH_SCOPES: [&str; 2] = ["pages_manage_posts", "pages_read_user_content"];

/// What to publish and where. Exactly one of `photo_urls`/`video_url`
/// is meaningful per call; both absent means a text-only post. The
/// caller's access token is the one the publisher's client was built
/// with.
#[derive(Debug, Clone, Default)]
pub struct PublishRequest {
    pub page_id: String,
    pub message: Option<String>,
    pub photo_urls: Vec<String>,
    pub video_url: Option<String>,
}

/// Result of a successful publish run.
#[derive(Debug)]
pub enum PublishOutcome {
    /// A video upload; photos and feed posting are skipped entirely.
    Video(MediaResponse),
    /// A feed post (text-only or with attached photos).
    Feed(Value),
}

impl PagePublisher {
    /// Validate the caller's credential and publish to the target page.
    ///
    /// Steps, in order, first failure aborts:
    /// 1. app token (client-credentials grant)
    /// 2. token inspection: validity, required scopes, page ownership
    /// 3. long-lived token exchange (unconditional)
    /// 4. page-token resolution for USER credentials
    /// 5. video upload, or photo uploads + one feed post
    pub async fn publish(&mut self, request: &PublishRequest) -> Result<PublishOutcome> {
        let app_token = self.generate_app_token().await?;

        let caller_token = self.graph().access_token().to_owned();
        let inspection = self.inspect_token(&caller_token, &app_token).await?;
        debug!(
            token_type = ?inspection.token_type,
            scopes = ?inspection.scopes,
            "inspected caller token"
        );

        if !inspection.is_valid {
            return Err(PublishError::InvalidToken);
        }
        if let Some(scope) = inspection
            .missing_scopes(&REQUIRED_PUBLISH_SCOPES)
            .into_iter()
            .next()
        {
            return Err(PublishError::MissingScope(scope));
        }
        if inspection.token_type == TokenType::Page {
            let token_page = inspection.profile_id.clone().unwrap_or_default();
            if token_page != request.page_id {
                return Err(PublishError::WrongTarget {
                    token_page,
                    target_page: request.page_id.clone(),
                });
            }
        }

        self.generate_long_lived_user_access_token().await?;

        if inspection.token_type == TokenType::User {
            let page_token = self.get_page_access_token(&request.page_id).await?;
            self.update_access_token(page_token);
        }

        let message = request.message.as_deref().unwrap_or("");

        if let Some(video_url) = &request.video_url {
            let media = self
                .graph()
                .post_video(&request.page_id, message, video_url, None)
                .await?;
            info!(video_id = ?media.id, page_id = %request.page_id, "published video");
            return Ok(PublishOutcome::Video(media));
        }

        // Sequential uploads: captions and the aggregate id list depend
        // on the input order.
        let total = request.photo_urls.len();
        let mut media_ids = Vec::with_capacity(total);
        for (index, url) in request.photo_urls.iter().enumerate() {
            let caption = format!("Image {} of {}", index + 1, total);
            let media = self
                .graph()
                .post_image(&request.page_id, &caption, url, false)
                .await?;
            match media.id {
                Some(id) => media_ids.push(id),
                None => warn!(url, "photo upload returned no media id, skipping"),
            }
        }

        let post = self
            .graph()
            .post_feed(&request.page_id, message, None, &media_ids, None)
            .await?;
        info!(
            post_id = ?post.get("id"),
            photos = media_ids.len(),
            page_id = %request.page_id,
            "published feed post"
        );
        Ok(PublishOutcome::Feed(post))
    }
}
