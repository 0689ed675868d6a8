use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use regex::Regex;
use relay_common::{RelayError, Result};
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// `h:mm AM/PM`; `%I` also accepts a single-digit hour.
const CLOCK_FORMAT: &str = "%I:%M %p";

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("line break pattern compiles"));

/// One chat post, normalized.
///
/// Only the hour and minute of `timestamp` come from the page; the date is
/// the one the transcript was requested for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub content: String,
    pub user: String,
    pub timestamp: DateTime<Utc>,
    pub url: String,
}

impl Message {
    /// Build a message from a raw HTML fragment and its block metadata.
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use relay_transcript::Message;
    ///
    /// let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    /// let msg = Message::normalize(
    ///     " fish &amp; chips<br/>twice ",
    ///     "alice",
    ///     "2:05 PM",
    ///     "https://chat.stackoverflow.com/transcript/11/2024/05/01",
    ///     date,
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(msg.content, "fish & chips\ntwice");
    /// assert_eq!(msg.to_string(), "*alice 14:05*:\nfish & chips\ntwice\n");
    /// ```
    pub fn normalize(
        raw_content: &str,
        user: &str,
        raw_timestamp: &str,
        url: &str,
        date: NaiveDate,
    ) -> Result<Self> {
        let time = parse_clock_time(raw_timestamp)?;
        Ok(Self::at(raw_content, user, time, url, date))
    }

    /// Like [`Message::normalize`] for a clock time that is already parsed.
    pub fn at(raw_content: &str, user: &str, time: NaiveTime, url: &str, date: NaiveDate) -> Self {
        Self {
            content: clean_content(raw_content),
            user: user.to_string(),
            timestamp: date.and_time(time).and_utc(),
            url: url.to_string(),
        }
    }
}

/// Line breaks to `\n`, entities decoded, whitespace trimmed. In that order.
pub fn clean_content(raw: &str) -> String {
    let with_newlines = LINE_BREAK.replace_all(raw, "\n");
    let decoded = html_escape::decode_html_entities(&with_newlines);
    decoded.trim().to_string()
}

/// Parse a page-local `h:mm AM/PM` clock time.
pub fn parse_clock_time(raw: &str) -> Result<NaiveTime> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, CLOCK_FORMAT).map_err(|e| RelayError::Parse {
        input: raw.to_string(),
        reason: e.to_string(),
    })
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "*{} {}*:\n{}\n",
            self.user,
            self.timestamp.format("%H:%M"),
            self.content
        )
    }
}

/// Messages serialize as their display text.
impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
