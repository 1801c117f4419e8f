//! Canonical chat message model
//!
//! [`wire`] holds the API's comment shape; [`Message`] is what the rest of the
//! crate works with. Conversion between the two happens only here, so the
//! renderer never sees wire-format details.

mod reader;
pub mod wire;

pub use reader::{JsonArrayReader, MessageReader, parse_messages};

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::time::Duration;

/// Role badges the renderer knows about
///
/// Any other badge set (bits, premium, sub-gifter, ...) is dropped during parsing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Badge {
    /// Platform administrator
    Admin,
    /// Platform staff
    Staff,
    /// Global moderator
    GlobalMod,
    /// Channel owner
    Broadcaster,
    /// Channel moderator
    Moderator,
    /// Channel subscriber
    Subscriber,
}

impl Badge {
    /// Map a badge set id to a known badge, ignoring ASCII case
    pub fn from_set_id(set_id: &str) -> Option<Self> {
        const VOCABULARY: [(&str, Badge); 6] = [
            ("admin", Badge::Admin),
            ("staff", Badge::Staff),
            ("global_mod", Badge::GlobalMod),
            ("broadcaster", Badge::Broadcaster),
            ("moderator", Badge::Moderator),
            ("subscriber", Badge::Subscriber),
        ];
        VOCABULARY
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(set_id))
            .map(|(_, badge)| *badge)
    }
}

/// Comment author identity
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commenter {
    /// Stable account handle
    pub login: String,
    /// Presentation name, trailing whitespace removed
    pub display_name: String,
}

/// One chat message
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    /// Server-side creation time
    pub created_at: DateTime<Utc>,
    /// Offset into the video, millisecond precision
    pub content_offset: Duration,
    /// `None` for deleted or anonymized accounts
    pub commenter: Option<Commenter>,
    /// All fragments joined without separator
    pub body: String,
    /// Sent with `/me`
    pub is_action: bool,
    /// Known role badges
    pub badges: BTreeSet<Badge>,
}

impl Message {
    /// Whether the author carries `badge`
    pub fn has_badge(&self, badge: Badge) -> bool {
        self.badges.contains(&badge)
    }
}

impl From<wire::Comment> for Message {
    fn from(comment: wire::Comment) -> Self {
        let body = comment
            .message
            .fragments
            .unwrap_or_default()
            .into_iter()
            .filter_map(|fragment| fragment.text)
            .collect::<String>();

        let badges = comment
            .message
            .user_badges
            .unwrap_or_default()
            .iter()
            .filter_map(|badge| Badge::from_set_id(&badge.set_id))
            .collect();

        let commenter = comment.commenter.map(|c| {
            let login = c.login.unwrap_or_default();
            let display_name = c
                .display_name
                .map(|name| name.trim_end().to_string())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| login.clone());
            Commenter {
                login,
                display_name,
            }
        });

        Self {
            created_at: comment.created_at,
            content_offset: wire::offset_from_seconds(comment.content_offset_seconds),
            commenter,
            body,
            is_action: comment.message.is_action,
            badges,
        }
    }
}
