//! Fetch a day's transcript and turn it into [`Message`] values.
//!
//! One GET for the page, then one GET per partial message, strictly in page
//! order. Any failed request aborts the scrape; nothing is retried and no
//! partial result is returned.
use crate::message::{Message, parse_clock_time};
use crate::page::{self, EntryBody};
use chrono::NaiveDate;
use relay_common::{RelayError, Result};
use relay_http::{HttpClient, RequestOpts};

#[derive(Clone, Debug)]
pub struct TranscriptScraper {
    http: HttpClient,
    room: u32,
}

impl TranscriptScraper {
    /// `http` must be anchored at the chat server, e.g.
    /// `https://chat.stackoverflow.com`.
    pub fn new(http: HttpClient, room: u32) -> Self {
        Self { http, room }
    }

    pub fn room(&self) -> u32 {
        self.room
    }

    fn transcript_path(&self, date: NaiveDate) -> String {
        format!("transcript/{}/{}", self.room, date.format("%Y/%m/%d"))
    }

    fn message_path(&self, message_id: &str) -> String {
        format!("messages/{}/{}", self.room, message_id)
    }

    /// Absolute URL of the transcript page for `date`.
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use relay_http::HttpClient;
    /// use relay_transcript::TranscriptScraper;
    ///
    /// let http = HttpClient::new("https://chat.stackoverflow.com").unwrap();
    /// let scraper = TranscriptScraper::new(http, 11);
    /// let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    /// assert_eq!(
    ///     scraper.transcript_url(date).unwrap(),
    ///     "https://chat.stackoverflow.com/transcript/11/2024/05/01"
    /// );
    /// ```
    pub fn transcript_url(&self, date: NaiveDate) -> Result<String> {
        self.http
            .base()
            .join(&self.transcript_path(date))
            .map(String::from)
            .map_err(|e| RelayError::Config(format!("invalid chat base URL: {e}")))
    }

    /// Scrape every message on the transcript page for `date`, in page order.
    pub async fn scrape(&self, date: NaiveDate) -> Result<Vec<Message>> {
        let url = self.transcript_url(date)?;
        tracing::info!(room = self.room, %date, "transcript.fetch");

        let html = self
            .http
            .get_text(&self.transcript_path(date), RequestOpts::default())
            .await?;
        let entries = page::parse_transcript(&html)?;

        let mut messages = Vec::with_capacity(entries.len());
        let mut skipped = 0usize;
        for entry in entries {
            let Some(timestamp) = entry.timestamp.as_deref() else {
                skipped += 1;
                tracing::warn!(
                    user = %entry.user,
                    "transcript.message.skipped: no timestamp seen before this message"
                );
                continue;
            };

            // a bad clock time skips the message before anything is fetched for it
            let time = match parse_clock_time(timestamp) {
                Ok(time) => time,
                Err(err) if !err.is_fatal() => {
                    skipped += 1;
                    tracing::warn!(
                        user = %entry.user,
                        error = %err,
                        "transcript.message.skipped"
                    );
                    continue;
                }
                Err(err) => return Err(err),
            };

            let raw = match &entry.body {
                EntryBody::Inline(html) => html.clone(),
                EntryBody::Partial { message_id } => {
                    tracing::debug!(%message_id, "transcript.partial.fetch");
                    self.http
                        .get_text(&self.message_path(message_id), RequestOpts::default())
                        .await?
                }
            };

            messages.push(Message::at(&raw, &entry.user, time, &url, date));
        }

        tracing::info!(
            room = self.room,
            messages = messages.len(),
            skipped,
            "transcript.scraped"
        );
        Ok(messages)
    }
}
