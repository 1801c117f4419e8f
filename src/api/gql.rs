//! GraphQL comments client
//!
//! Requests use a persisted query: the body names the operation and carries the
//! hash of a query the server already knows, plus the variables for one page.

use super::{CommentPage, CommentSource, PageRequest};
use crate::config::{ApiConfig, Config, RetryConfig};
use crate::error::{Error, Result};
use crate::retry::with_retry;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use serde_json::value::RawValue;

/// HTTP client for the comments endpoint
///
/// One instance is created per download and dropped with it; nothing here is
/// process-wide.
#[derive(Clone, Debug)]
pub struct GqlClient {
    http: reqwest::Client,
    api: ApiConfig,
    retry: RetryConfig,
}

impl GqlClient {
    /// Build a client from validated configuration
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.api.timeout)
            .user_agent(&config.api.user_agent)
            .build()?;
        Ok(Self {
            http,
            api: config.api.clone(),
            retry: config.retry.clone(),
        })
    }

    /// Request body for one page
    pub fn request_body(&self, video_id: &str, request: &PageRequest) -> serde_json::Value {
        let variables = match request {
            PageRequest::Start => json!({ "videoID": video_id, "contentOffsetSeconds": 0 }),
            PageRequest::Cursor(cursor) => json!({ "videoID": video_id, "cursor": cursor }),
        };
        json!([{
            "operationName": self.api.operation_name,
            "variables": variables,
            "extensions": {
                "persistedQuery": {
                    "version": 1,
                    "sha256Hash": self.api.persisted_query_hash,
                }
            }
        }])
    }

    /// Send one request, without retries
    async fn send(&self, video_id: &str, request: &PageRequest) -> Result<CommentPage> {
        let response = self
            .http
            .post(&self.api.endpoint)
            .header("Client-ID", &self.api.client_id)
            .json(&self.request_body(video_id, request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                url: self.api.endpoint.clone(),
            });
        }

        let body = response.bytes().await?;
        parse_page(&body, video_id)
    }
}

#[async_trait]
impl CommentSource for GqlClient {
    async fn fetch_page(&self, video_id: &str, request: &PageRequest) -> Result<CommentPage> {
        tracing::debug!(video_id, cursor = ?request.cursor(), "Requesting comment page");
        with_retry(&self.retry, || self.send(video_id, request)).await
    }
}

#[derive(Debug, Deserialize)]
struct GqlResponse {
    #[serde(default)]
    data: Option<ResponseData>,
    #[serde(default)]
    errors: Option<Vec<GqlError>>,
}

#[derive(Debug, Deserialize)]
struct GqlError {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    #[serde(default)]
    video: Option<Video>,
}

#[derive(Debug, Deserialize)]
struct Video {
    #[serde(default)]
    comments: Option<Comments>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Comments {
    #[serde(default)]
    edges: Option<Vec<Edge>>,
    #[serde(default)]
    page_info: Option<PageInfo>,
}

#[derive(Debug, Deserialize)]
struct Edge {
    #[serde(default)]
    cursor: Option<String>,
    node: Box<RawValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    #[serde(default)]
    has_next_page: Option<bool>,
}

/// Extract comments and the next cursor from a response body
///
/// The endpoint answers a batched request with an array of results and a
/// single request with a bare object; both are accepted.
pub fn parse_page(body: &[u8], video_id: &str) -> Result<CommentPage> {
    let malformed = |e: serde_json::Error| Error::MalformedResponse(e.to_string());

    let response: GqlResponse = if body.trim_ascii_start().starts_with(b"[") {
        serde_json::from_slice::<Vec<GqlResponse>>(body)
            .map_err(malformed)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::MalformedResponse("empty response array".into()))?
    } else {
        serde_json::from_slice(body).map_err(malformed)?
    };

    if let Some(errors) = response.errors.filter(|errors| !errors.is_empty()) {
        let messages: Vec<String> = errors
            .into_iter()
            .map(|e| e.message.unwrap_or_else(|| "unknown error".into()))
            .collect();
        return Err(Error::Api(messages.join("; ")));
    }

    let data = response
        .data
        .ok_or_else(|| Error::MalformedResponse("missing data".into()))?;
    let video = data
        .video
        .ok_or_else(|| Error::VideoNotFound(video_id.to_string()))?;
    let comments = video
        .comments
        .ok_or_else(|| Error::MalformedResponse("missing video.comments".into()))?;

    let has_next_page = comments
        .page_info
        .and_then(|info| info.has_next_page)
        .unwrap_or(true);
    let edges = comments.edges.unwrap_or_default();

    let next_cursor = if has_next_page {
        edges
            .last()
            .and_then(|edge| edge.cursor.clone())
            .filter(|cursor| !cursor.is_empty())
    } else {
        None
    };

    let mut page = CommentPage {
        comments: Vec::with_capacity(edges.len()),
        next_cursor,
    };
    for edge in edges {
        if !edge.node.get().starts_with('{') {
            return Err(Error::MalformedResponse(format!(
                "comment node is not an object: {}",
                edge.node.get()
            )));
        }
        page.comments.push(edge.node);
    }
    Ok(page)
}
