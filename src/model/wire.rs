//! Comment records as the API sends them
//!
//! These structs mirror the GraphQL comment node. Fields the renderer does not
//! need (ids, colors, emote references) are ignored by serde.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::value::RawValue;
use std::time::Duration;

/// One comment node
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Server-side creation time
    pub created_at: DateTime<Utc>,
    /// Seconds into the video
    pub content_offset_seconds: f64,
    /// Absent for deleted or anonymized accounts
    #[serde(default)]
    pub commenter: Option<Commenter>,
    /// Message body and metadata
    pub message: CommentMessage,
}

/// Comment author
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commenter {
    /// Stable account handle
    #[serde(default)]
    pub login: Option<String>,
    /// Presentation name
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Message payload of a comment
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentMessage {
    /// Text pieces, concatenated without separator
    #[serde(default)]
    pub fragments: Option<Vec<Fragment>>,
    /// Sent with `/me`
    #[serde(default)]
    pub is_action: bool,
    /// Badges displayed next to the author
    #[serde(default)]
    pub user_badges: Option<Vec<UserBadge>>,
}

/// One text piece of a message
#[derive(Debug, Clone, Deserialize)]
pub struct Fragment {
    /// Fragment text
    #[serde(default)]
    pub text: Option<String>,
}

/// Badge reference
#[derive(Debug, Clone, Deserialize)]
pub struct UserBadge {
    /// Badge set identifier, e.g. "moderator"
    #[serde(rename = "setID", alias = "setId")]
    pub set_id: String,
    /// Badge version within the set
    #[serde(default)]
    pub version: Option<String>,
}

/// The two timing fields of a comment, read without parsing the rest
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentTimes {
    /// Server-side creation time
    pub created_at: DateTime<Utc>,
    /// Seconds into the video
    pub content_offset_seconds: f64,
}

impl CommentTimes {
    /// Read the timing fields from a raw comment node
    pub fn parse(raw: &RawValue) -> serde_json::Result<Self> {
        serde_json::from_str(raw.get())
    }

    /// Offset into the video, rounded to the millisecond
    pub fn content_offset(&self) -> Duration {
        offset_from_seconds(self.content_offset_seconds)
    }
}

/// Convert fractional seconds to a duration with millisecond precision
///
/// Rounds to the nearest millisecond; truncating would drift every timestamp
/// slightly negative. Negative and non-finite inputs clamp to zero.
pub fn offset_from_seconds(seconds: f64) -> Duration {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_millis((seconds * 1000.0).round() as u64)
}
