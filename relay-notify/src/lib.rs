//! Delivery of relayed messages.
//!
//! [`Notifier`] is the seam the entry point talks to. [`SlackWebhook`] posts
//! to an incoming webhook; [`DryRun`] only logs what would have been sent.
use async_trait::async_trait;
use relay_common::Result;
use relay_transcript::Message;

pub mod dry_run;
pub mod slack;

pub use dry_run::DryRun;
pub use slack::SlackWebhook;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message. Failures are returned as-is, never retried.
    async fn notify(&self, message: &Message) -> Result<()>;

    /// Short label for logs.
    fn name(&self) -> &str;
}
