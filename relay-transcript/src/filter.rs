use crate::message::Message;
use chrono::{DateTime, TimeDelta, Utc};

/// Keep messages stamped at or after `now - 1h`, in their original order.
///
/// Timestamps carry the requested date rather than a date read from the
/// page, so a run shortly after midnight compares yesterday's late messages
/// as if they were today's.
pub fn last_hour(messages: Vec<Message>, now: DateTime<Utc>) -> Vec<Message> {
    since(messages, now - TimeDelta::hours(1))
}

pub fn since(messages: Vec<Message>, cutoff: DateTime<Utc>) -> Vec<Message> {
    let before = messages.len();
    let kept: Vec<Message> = messages
        .into_iter()
        .filter(|m| m.timestamp >= cutoff)
        .collect();
    tracing::debug!(%cutoff, before, kept = kept.len(), "transcript.filter.applied");
    kept
}
