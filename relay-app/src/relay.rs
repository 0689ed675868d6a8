use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use relay_common::RelayError;
use relay_config::RelayConfig;
use relay_http::HttpClient;
use relay_notify::{DryRun, Notifier, SlackWebhook};
use relay_transcript::{TranscriptScraper, last_hour};
use serde_json::Value;

/// One scrape → filter → notify pass.
pub struct Relay {
    scraper: TranscriptScraper,
    notifier: Box<dyn Notifier>,
}

impl Relay {
    pub fn new(scraper: TranscriptScraper, notifier: Box<dyn Notifier>) -> Self {
        Self { scraper, notifier }
    }

    /// Wire the scraper and notifier from configuration.
    ///
    /// The webhook is only required when actually delivering; `dry_run`
    /// swaps in the logging notifier.
    pub fn from_config(cfg: &RelayConfig, dry_run: bool) -> relay_common::Result<Self> {
        let http = HttpClient::new(&cfg.chat_base)
            .map_err(|e| RelayError::Config(format!("chat_base: {e}")))?
            .with_timeout(cfg.timeout());

        let notifier: Box<dyn Notifier> = if dry_run {
            Box::new(DryRun)
        } else {
            Box::new(SlackWebhook::new(http.clone(), cfg.webhook_url()?))
        };

        Ok(Self::new(TranscriptScraper::new(http, cfg.room), notifier))
    }

    /// Relay the last hour of today's transcript.
    ///
    /// `event` comes from whatever triggered the run and is not interpreted.
    /// Returns the delivered messages as a pretty-printed JSON array of
    /// display strings. The first error aborts the run; messages already
    /// delivered stay delivered.
    pub async fn run(&self, event: &Value, now: DateTime<Utc>) -> Result<String> {
        tracing::debug!(%event, %now, "relay.invoked");

        let messages = self.scraper.scrape(now.date_naive()).await?;
        let scraped = messages.len();
        let recent = last_hour(messages, now);

        for message in &recent {
            self.notifier.notify(message).await.with_context(|| {
                format!(
                    "{} notifier failed for message by {}",
                    self.notifier.name(),
                    message.user
                )
            })?;
        }

        tracing::info!(
            room = self.scraper.room(),
            scraped,
            sent = recent.len(),
            notifier = self.notifier.name(),
            "relay.done"
        );

        Ok(serde_json::to_string_pretty(&recent)?)
    }
}
