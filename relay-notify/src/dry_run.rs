use crate::Notifier;
use async_trait::async_trait;
use relay_common::Result;
use relay_transcript::Message;

/// Logs each message instead of delivering it.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRun;

#[async_trait]
impl Notifier for DryRun {
    async fn notify(&self, message: &Message) -> Result<()> {
        tracing::info!(
            user = %message.user,
            timestamp = %message.timestamp,
            text = %message,
            "notify.dry_run"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "dry-run"
    }
}
