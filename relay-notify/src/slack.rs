use crate::Notifier;
use async_trait::async_trait;
use relay_common::Result;
use relay_http::{HttpClient, RequestOpts};
use relay_transcript::Message;
use serde::Serialize;
use url::Url;

/// Body of an incoming-webhook call.
#[derive(Debug, Serialize)]
pub struct WebhookPayload<'a> {
    pub text: &'a str,
}

pub struct SlackWebhook {
    http: HttpClient,
    webhook: Url,
}

impl SlackWebhook {
    /// `http` may be anchored anywhere; the webhook URL is always used as-is.
    pub fn new(http: HttpClient, webhook: Url) -> Self {
        Self { http, webhook }
    }
}

#[async_trait]
impl Notifier for SlackWebhook {
    async fn notify(&self, message: &Message) -> Result<()> {
        let text = message.to_string();
        let reply = self
            .http
            .post_json_text(
                self.webhook.as_str(),
                &WebhookPayload { text: &text },
                RequestOpts {
                    allow_absolute: true,
                    sensitive: true,
                    ..Default::default()
                },
            )
            .await?;

        tracing::debug!(user = %message.user, reply = %reply.trim(), "notify.slack.sent");
        Ok(())
    }

    fn name(&self) -> &str {
        "slack"
    }
}
