//! Scripted comment sources for downloader tests.

use crate::api::{CommentPage, CommentSource, PageRequest};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::value::RawValue;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Raw comment node with the given offset and creation time (seconds since epoch).
pub(crate) fn comment(text: &str, offset: f64, created_secs: i64) -> Box<RawValue> {
    let created_at = chrono::DateTime::from_timestamp(created_secs, 0)
        .unwrap()
        .to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let json = serde_json::json!({
        "id": text,
        "commenter": { "login": "bob", "displayName": "Bob" },
        "contentOffsetSeconds": offset,
        "createdAt": created_at,
        "message": { "fragments": [{ "text": text }], "isAction": false }
    });
    RawValue::from_string(json.to_string()).unwrap()
}

/// A page with the given comments and next cursor.
pub(crate) fn page(comments: Vec<Box<RawValue>>, next_cursor: Option<&str>) -> CommentPage {
    CommentPage {
        comments,
        next_cursor: next_cursor.map(str::to_string),
    }
}

/// Serves a fixed sequence of responses and records every request.
pub(crate) struct ScriptedSource {
    responses: Mutex<VecDeque<Result<CommentPage>>>,
    requests: Mutex<Vec<PageRequest>>,
    hang_when_exhausted: bool,
}

impl ScriptedSource {
    pub(crate) fn new(responses: Vec<Result<CommentPage>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
            hang_when_exhausted: false,
        }
    }

    /// Like `new`, but never answers once the script runs out.
    pub(crate) fn hanging(responses: Vec<Result<CommentPage>>) -> Self {
        Self {
            hang_when_exhausted: true,
            ..Self::new(responses)
        }
    }

    pub(crate) fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommentSource for ScriptedSource {
    async fn fetch_page(&self, _video_id: &str, request: &PageRequest) -> Result<CommentPage> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(response) => response,
            None if self.hang_when_exhausted => futures::future::pending().await,
            None => Err(Error::Api("script exhausted".into())),
        }
    }
}
