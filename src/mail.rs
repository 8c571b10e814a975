use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

/// Addressing for an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Envelope {
    pub to: String,
    pub from: String,
    pub from_name: String,
    pub subject: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers `template` rendered with `data`. Not retried on failure.
    async fn send(
        &self,
        template: &str,
        data: serde_json::Value,
        envelope: Envelope,
    ) -> anyhow::Result<()>;
}

/// Writes outgoing mail to the log instead of a transport.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(
        &self,
        template: &str,
        data: serde_json::Value,
        envelope: Envelope,
    ) -> anyhow::Result<()> {
        info!(
            template,
            to = %envelope.to,
            from = %envelope.from,
            subject = %envelope.subject,
            data = %data,
            "mail dispatched"
        );
        Ok(())
    }
}
