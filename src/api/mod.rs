//! Remote comments API
//!
//! The downloader only depends on [`CommentSource`]: one call fetches one page.
//! [`gql::GqlClient`] implements it against the GraphQL endpoint; tests plug in
//! scripted sources.

pub mod gql;

pub use gql::GqlClient;

use crate::error::Result;
use async_trait::async_trait;
use serde_json::value::RawValue;

/// Which page to ask for
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageRequest {
    /// First page, content offset zero
    Start,
    /// Page following the given cursor
    Cursor(String),
}

impl PageRequest {
    /// The cursor carried by this request, if any
    pub fn cursor(&self) -> Option<&str> {
        match self {
            PageRequest::Start => None,
            PageRequest::Cursor(cursor) => Some(cursor),
        }
    }
}

/// One page of comments
#[derive(Debug, Default)]
pub struct CommentPage {
    /// Comment nodes exactly as received, in API order
    pub comments: Vec<Box<RawValue>>,
    /// Cursor for the next page; `None` ends pagination
    pub next_cursor: Option<String>,
}

/// Something that serves comment pages for a video
#[async_trait]
pub trait CommentSource: Send + Sync {
    /// Fetch a single page
    ///
    /// Implementations own their retry policy; an error returned here is final
    /// for the download.
    async fn fetch_page(&self, video_id: &str, request: &PageRequest) -> Result<CommentPage>;
}

