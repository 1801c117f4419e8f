//! Transcript line rendering
//!
//! One message becomes one line:
//!
//! ```text
//! [01:02:05.400] @+Bob (robert99): hello there
//! [01:02:06.000] Alice waves
//! ```
//!
//! Badge characters, in order: `*` admin or staff, `#` broadcaster,
//! `@` moderator or global moderator, `+` subscriber.

use crate::config::TranscriptConfig;
use crate::model::{Badge, Commenter, Message};
use std::borrow::Cow;
use std::time::Duration;

/// Identity rendered for comments without a commenter
pub const UNKNOWN_COMMENTER: &str = "???";

/// Rendering switches
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    /// Prefix the identity with badge characters
    pub show_badges: bool,
    /// Append `.fff` to the timestamp
    pub include_milliseconds: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            show_badges: false,
            include_milliseconds: true,
        }
    }
}

impl From<&TranscriptConfig> for RenderOptions {
    fn from(config: &TranscriptConfig) -> Self {
        Self {
            show_badges: config.show_badges,
            include_milliseconds: config.include_milliseconds,
        }
    }
}

/// Format an offset as `HH:MM:SS` or `HH:MM:SS.fff`
///
/// Hours are zero-padded to two digits but not capped, so a 30 hour broadcast
/// renders as `30:00:00`.
pub fn format_offset(offset: Duration, include_milliseconds: bool) -> String {
    let total_ms = offset.as_millis();
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let seconds = (total_ms / 1000) % 60;
    if include_milliseconds {
        format!(
            "{:02}:{:02}:{:02}.{:03}",
            hours,
            minutes,
            seconds,
            total_ms % 1000
        )
    } else {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

/// Badge characters for a message, possibly empty
pub fn badge_prefix(message: &Message) -> String {
    let mut prefix = String::new();
    if message.has_badge(Badge::Admin) || message.has_badge(Badge::Staff) {
        prefix.push('*');
    }
    if message.has_badge(Badge::Broadcaster) {
        prefix.push('#');
    }
    if message.has_badge(Badge::Moderator) || message.has_badge(Badge::GlobalMod) {
        prefix.push('@');
    }
    if message.has_badge(Badge::Subscriber) {
        prefix.push('+');
    }
    prefix
}

/// `Name`, `Name (login)` or the unknown placeholder
pub fn identity(commenter: Option<&Commenter>) -> Cow<'_, str> {
    let Some(commenter) = commenter else {
        return Cow::Borrowed(UNKNOWN_COMMENTER);
    };
    let same_name = commenter.login.is_empty()
        || commenter.display_name.to_lowercase() == commenter.login.to_lowercase();
    if same_name {
        Cow::Borrowed(commenter.display_name.as_str())
    } else {
        Cow::Owned(format!("{} ({})", commenter.display_name, commenter.login))
    }
}

/// `body` with every line break (`\n`, `\r\n`, `\r`) folded into one space
pub fn single_line(body: &str) -> Cow<'_, str> {
    if !body.contains(['\r', '\n']) {
        return Cow::Borrowed(body);
    }
    let pieces: Vec<&str> = body
        .split(['\r', '\n'])
        .filter(|piece| !piece.is_empty())
        .collect();
    Cow::Owned(pieces.join(" "))
}

/// Render one message as a transcript line (without the newline)
///
/// Line breaks inside the body are folded so every message stays on one line.
pub fn render(message: &Message, options: &RenderOptions) -> String {
    let badges = if options.show_badges {
        badge_prefix(message)
    } else {
        String::new()
    };
    format!(
        "[{}] {}{}{} {}",
        format_offset(message.content_offset, options.include_milliseconds),
        badges,
        identity(message.commenter.as_ref()),
        if message.is_action { "" } else { ":" },
        single_line(&message.body)
    )
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeSet;

    fn message(display_name: &str, login: &str) -> Message {
        Message {
            created_at: Utc.with_ymd_and_hms(2021, 6, 1, 18, 0, 0).unwrap(),
            content_offset: Duration::from_millis(3_725_400),
            commenter: Some(Commenter {
                login: login.into(),
                display_name: display_name.into(),
            }),
            body: "hello there".into(),
            is_action: false,
            badges: BTreeSet::new(),
        }
    }

    #[test]
    fn offsets_format_with_and_without_milliseconds() {
        assert_eq!(format_offset(Duration::from_millis(3_725_400), true), "01:02:05.400");
        assert_eq!(format_offset(Duration::from_millis(3_725_400), false), "01:02:05");
        assert_eq!(format_offset(Duration::ZERO, true), "00:00:00.000");
    }

    #[test]
    fn hours_are_not_capped() {
        assert_eq!(format_offset(Duration::from_secs(30 * 3600 + 61), false), "30:01:01");
        assert_eq!(format_offset(Duration::from_secs(100 * 3600), false), "100:00:00");
    }

    #[test]
    fn matching_names_render_once() {
        let line = render(&message("Bob", "bob"), &RenderOptions::default());
        assert_eq!(line, "[01:02:05.400] Bob: hello there");
    }

    #[test]
    fn differing_names_show_login() {
        let line = render(&message("Bob", "robert99"), &RenderOptions::default());
        assert_eq!(line, "[01:02:05.400] Bob (robert99): hello there");
    }

    #[test]
    fn localized_display_name_shows_login() {
        let m = message("ボブ", "bob");
        assert_eq!(identity(m.commenter.as_ref()), "ボブ (bob)");
    }

    #[test]
    fn action_omits_colon() {
        let mut m = message("Bob", "bob");
        m.is_action = true;
        m.body = "waves".into();
        assert_eq!(render(&m, &RenderOptions::default()), "[01:02:05.400] Bob waves");
    }

    #[test]
    fn missing_commenter_renders_placeholder() {
        let mut m = message("Bob", "bob");
        m.commenter = None;
        assert_eq!(render(&m, &RenderOptions::default()), "[01:02:05.400] ???: hello there");
    }

    #[test]
    fn multi_line_body_renders_on_one_line() {
        let mut m = message("Bob", "bob");
        m.body = "first\nsecond\r\nthird\rfourth\n".into();

        let line = render(&m, &RenderOptions::default());

        assert_eq!(line, "[01:02:05.400] Bob: first second third fourth");
        assert_eq!(line.lines().count(), 1);
    }

    #[test]
    fn single_line_borrows_unbroken_text() {
        assert!(matches!(single_line("no breaks"), Cow::Borrowed("no breaks")));
        assert_eq!(single_line("a\n\nb"), "a b");
        assert_eq!(single_line("\n"), "");
    }

    #[test]
    fn badges_render_in_fixed_order_only_when_requested() {
        let mut m = message("Bob", "bob");
        m.badges = [Badge::Subscriber, Badge::Moderator].into_iter().collect();

        let with = RenderOptions {
            show_badges: true,
            include_milliseconds: false,
        };
        assert_eq!(render(&m, &with), "[01:02:05] @+Bob: hello there");

        let without = RenderOptions {
            show_badges: false,
            include_milliseconds: false,
        };
        assert_eq!(render(&m, &without), "[01:02:05] Bob: hello there");
    }

    #[test]
    fn every_badge_maps_to_its_character() {
        let mut m = message("Bob", "bob");
        let cases = [
            (vec![Badge::Admin], "*"),
            (vec![Badge::Staff], "*"),
            (vec![Badge::Admin, Badge::Staff], "*"),
            (vec![Badge::Broadcaster], "#"),
            (vec![Badge::GlobalMod], "@"),
            (vec![Badge::Moderator, Badge::GlobalMod], "@"),
            (vec![Badge::Subscriber, Badge::Broadcaster, Badge::Staff, Badge::Moderator], "*#@+"),
            (vec![], ""),
        ];
        for (badges, expected) in cases {
            m.badges = badges.iter().copied().collect();
            assert_eq!(badge_prefix(&m), expected, "badges {badges:?}");
        }
    }

    #[test]
    fn options_follow_transcript_config() {
        let config = TranscriptConfig {
            show_badges: true,
            include_milliseconds: false,
        };
        let options = RenderOptions::from(&config);
        assert!(options.show_badges);
        assert!(!options.include_milliseconds);
    }
}
