pub mod messages;
pub mod slack;

use async_trait::async_trait;

pub use slack::SlackNotifier;

/// Outbound operator messages. Fire-and-forget: delivery problems are the
/// notifier's own business and never reach the engine.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str);
}

/// Writes notifications to the log. Used when no chat sink is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, text: &str) {
        log::info!("[notify] {}", text.replace('\n', " | "));
    }
}
