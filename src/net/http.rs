//! reqwest-backed [`CommunityApi`] implementation.
//!
//! Thin HTTP wrapper over the community REST routes. URL building and body
//! parsing are pure functions so they can be tested without a server.

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Method, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

use super::api::{ApiError, CommunityApi, Session, error_from_status};
use super::types::{ChatMessage, Community, CommunityDraft, CommunityPage, ImagePreview, Pagination, Post};
use crate::config::{ClientConfig, HttpTimeouts};

const REQUEST_ID_HEADER: &str = "x-request-id";

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpCommunityApi {
    http: reqwest::Client,
    base: Url,
    session: Session,
}

enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Multipart(Form),
}

impl HttpCommunityApi {
    /// Build a client rooted at `base_url` (for example `https://host/api`).
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse or the HTTP client
    /// fails to build.
    pub fn new(base_url: &str, session: Session, timeouts: HttpTimeouts) -> Result<Self, ApiError> {
        let base = parse_base_url(base_url)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base, session })
    }

    /// Build a client from parsed config, logging the session in when the
    /// config carries a token.
    ///
    /// # Errors
    ///
    /// See [`HttpCommunityApi::new`].
    pub fn from_config(config: &ClientConfig, session: Session) -> Result<Self, ApiError> {
        if let Some(token) = &config.token {
            session.login(token.clone());
        }
        Self::new(&config.api_base_url, session, config.timeouts)
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    async fn execute(
        &self,
        method: Method,
        segments: &[&str],
        query: Option<(&str, String)>,
        body: RequestBody,
    ) -> Result<(u16, String), ApiError> {
        let mut url = endpoint_url(&self.base, segments)?;
        if let Some((key, value)) = query {
            url.query_pairs_mut().append_pair(key, &value);
        }

        let request_id = Uuid::new_v4();
        debug!(%method, path = url.path(), %request_id, "api request");

        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .header(REQUEST_ID_HEADER, request_id.to_string());
        if let Some(token) = self.session.token() {
            request = request.bearer_auth(token);
        }
        request = match body {
            RequestBody::Empty => request,
            RequestBody::Json(value) => request.json(&value),
            RequestBody::Multipart(form) => request.multipart(form),
        };

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::NetworkError(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::NetworkError(e.to_string()))?;

        if !(200..300).contains(&status) {
            warn!(%method, path = url.path(), %request_id, status, "api request failed");
            return Err(error_from_status(status, &text));
        }
        Ok((status, text))
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: RequestBody,
    ) -> Result<T, ApiError> {
        let (status, text) = self.execute(method, segments, None, body).await?;
        decode(status, &text)
    }

    fn draft_body(draft: &CommunityDraft) -> Result<RequestBody, ApiError> {
        let json = serde_json::to_value(draft).map_err(|e| ApiError::ValidationFailed(e.to_string()))?;
        if !draft.has_images() {
            return Ok(RequestBody::Json(json));
        }
        let mut form = Form::new().text("data", json.to_string());
        if let Some(avatar) = &draft.avatar {
            form = form.part("avatar", image_part(avatar)?);
        }
        if let Some(cover) = &draft.cover_image {
            form = form.part("coverImage", image_part(cover)?);
        }
        Ok(RequestBody::Multipart(form))
    }
}

#[async_trait::async_trait]
impl CommunityApi for HttpCommunityApi {
    async fn list_communities(&self, page: u32) -> Result<CommunityPage, ApiError> {
        let (status, text) = self
            .execute(Method::GET, &["communities"], Some(("page", page.to_string())), RequestBody::Empty)
            .await?;
        parse_community_page(&text, page).map_err(|e| decode_error(status, &e))
    }

    async fn get_community(&self, id: &str) -> Result<Community, ApiError> {
        self.fetch(Method::GET, &["communities", id], RequestBody::Empty)
            .await
    }

    async fn create_community(&self, draft: &CommunityDraft) -> Result<Community, ApiError> {
        let body = Self::draft_body(draft)?;
        self.fetch(Method::POST, &["communities"], body).await
    }

    async fn update_community(&self, id: &str, draft: &CommunityDraft) -> Result<Community, ApiError> {
        let body = Self::draft_body(draft)?;
        self.fetch(Method::PUT, &["communities", id], body).await
    }

    async fn delete_community(&self, id: &str) -> Result<(), ApiError> {
        self.execute(Method::DELETE, &["communities", id], None, RequestBody::Empty)
            .await?;
        Ok(())
    }

    async fn join_community(&self, id: &str) -> Result<Community, ApiError> {
        self.fetch(Method::POST, &["communities", id, "join"], RequestBody::Empty)
            .await
    }

    async fn leave_community(&self, id: &str) -> Result<Community, ApiError> {
        self.fetch(Method::POST, &["communities", id, "leave"], RequestBody::Empty)
            .await
    }

    async fn community_posts(&self, id: &str) -> Result<Vec<Post>, ApiError> {
        self.fetch(Method::GET, &["communities", id, "posts"], RequestBody::Empty)
            .await
    }

    async fn community_chat(&self, id: &str) -> Result<Vec<ChatMessage>, ApiError> {
        self.fetch(Method::GET, &["communities", id, "chat"], RequestBody::Empty)
            .await
    }

    async fn send_message(&self, id: &str, content: &str) -> Result<ChatMessage, ApiError> {
        let body = RequestBody::Json(serde_json::json!({ "content": content }));
        self.fetch(Method::POST, &["communities", id, "chat"], body)
            .await
    }
}

// =============================================================================
// URLS
// =============================================================================

fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    let url = Url::parse(raw.trim()).map_err(|e| ApiError::InvalidBaseUrl(format!("{raw}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(ApiError::InvalidBaseUrl(raw.to_string()));
    }
    Ok(url)
}

/// Append path segments to the base URL, percent-encoding each one.
fn endpoint_url(base: &Url, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| ApiError::InvalidBaseUrl(base.to_string()))?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Ok(url)
}

// =============================================================================
// PARSING
// =============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum ListResponse {
    Paged {
        communities: Vec<Community>,
        #[serde(default)]
        pagination: Option<Pagination>,
    },
    Bare(Vec<Community>),
}

fn parse_community_page(json: &str, requested_page: u32) -> Result<CommunityPage, serde_json::Error> {
    let parsed: ListResponse = serde_json::from_str(json)?;
    Ok(match parsed {
        ListResponse::Paged { communities, pagination } => CommunityPage {
            communities,
            pagination: pagination.unwrap_or(Pagination { page: requested_page.max(1), page_count: 1 }),
        },
        ListResponse::Bare(communities) => CommunityPage { communities, pagination: Pagination::default() },
    })
}

fn decode<T: DeserializeOwned>(status: u16, text: &str) -> Result<T, ApiError> {
    serde_json::from_str(text).map_err(|e| decode_error(status, &e))
}

fn decode_error(status: u16, err: &serde_json::Error) -> ApiError {
    ApiError::ServerError { status, message: format!("invalid response body: {err}") }
}

fn image_part(image: &ImagePreview) -> Result<Part, ApiError> {
    Part::bytes(image.bytes.clone())
        .file_name(image.file_name.clone())
        .mime_str(&image.content_type)
        .map_err(|e| ApiError::ValidationFailed(format!("invalid image type '{}': {e}", image.content_type)))
}
