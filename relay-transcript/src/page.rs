//! Walk a transcript page into [`TranscriptEntry`] values.
//!
//! A transcript groups consecutive posts into monologue blocks. Each block has
//! a signature with the author's name and, sometimes, a timestamp that applies
//! to every message until the next block that carries one. The walk is
//! synchronous and returns plain data, so the parsed DOM is dropped before
//! any partial message is fetched.

use crate::html::{Document, HtmlNode};
use relay_common::{RelayError, Result};

const TRANSCRIPT: &str = "#transcript";
const MONOLOGUE: &str = "div.monologue";
const USERNAME: &str = "div.signature div.username a";
const TIMESTAMP: &str = ".messages .timestamp";
const MESSAGE: &str = "div.message";
const PARTIAL: &str = ".partial";
const FULL_CONTENT: &str = ".content .full";
const CONTENT: &str = ".content";

const MESSAGE_ID_PREFIX: &str = "message-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryBody {
    /// Inner HTML taken straight from the page.
    Inline(String),
    /// Truncated on the page; the full text has to be fetched by id.
    Partial { message_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub user: String,
    /// Sticky timestamp text, `None` if no block before this one had one.
    pub timestamp: Option<String>,
    pub body: EntryBody,
}

/// Parse a transcript page and walk its monologue blocks.
///
/// A page without a `#transcript` container means the layout changed and is
/// reported as [`RelayError::Structure`]. Problems confined to one block or
/// one message are logged and skipped.
pub fn parse_transcript(raw_html: &str) -> Result<Vec<TranscriptEntry>> {
    let doc = Document::parse(raw_html);
    let transcript = doc
        .find_first(TRANSCRIPT)?
        .ok_or_else(|| RelayError::Structure(format!("no {TRANSCRIPT} container on page")))?;
    let blocks = transcript.find_all(MONOLOGUE)?;
    tracing::debug!(blocks = blocks.len(), "transcript.page.parsed");
    walk_monologues(&blocks)
}

/// Walk blocks in document order, carrying the sticky timestamp forward.
pub fn walk_monologues<N: HtmlNode>(blocks: &[N]) -> Result<Vec<TranscriptEntry>> {
    let mut sticky: Option<String> = None;
    let mut entries = Vec::new();

    for (index, block) in blocks.iter().enumerate() {
        // the timestamp advances even if the rest of the block is unreadable
        if let Some(ts) = block.find_first(TIMESTAMP)? {
            sticky = Some(ts.text().trim().to_string());
        }

        let user = match block_user(block)? {
            Some(user) => user,
            None => {
                tracing::warn!(
                    block = index,
                    error = %RelayError::Structure("no username link found".into()),
                    "transcript.block.skipped"
                );
                continue;
            }
        };

        for message in block.find_all(MESSAGE)? {
            match read_body(&message) {
                Ok(body) => entries.push(TranscriptEntry {
                    user: user.clone(),
                    timestamp: sticky.clone(),
                    body,
                }),
                Err(err) if !err.is_fatal() => {
                    tracing::warn!(
                        block = index,
                        user = %user,
                        message_id = %message.attribute("id").unwrap_or_default(),
                        error = %err,
                        "transcript.message.skipped"
                    );
                }
                Err(err) => return Err(err),
            }
        }
    }

    Ok(entries)
}

/// Link text as written; a blank name counts as missing.
fn block_user<N: HtmlNode>(block: &N) -> Result<Option<String>> {
    Ok(block
        .find_first(USERNAME)?
        .map(|a| a.text())
        .filter(|name| !name.trim().is_empty()))
}

fn read_body<N: HtmlNode>(message: &N) -> Result<EntryBody> {
    if message.contains(PARTIAL)? {
        let id = message
            .attribute("id")
            .ok_or_else(|| RelayError::Structure("partial message has no id".into()))?;
        let message_id = id.strip_prefix(MESSAGE_ID_PREFIX).unwrap_or(&id).trim();
        if message_id.is_empty() {
            return Err(RelayError::Structure(format!(
                "partial message id {id:?} is empty"
            )));
        }
        return Ok(EntryBody::Partial {
            message_id: message_id.to_string(),
        });
    }

    if let Some(full) = message.find_first(FULL_CONTENT)? {
        return Ok(EntryBody::Inline(full.inner_html()));
    }
    let content = message
        .find_first(CONTENT)?
        .ok_or_else(|| RelayError::Structure("message has no .content element".into()))?;
    Ok(EntryBody::Inline(content.inner_html()))
}
