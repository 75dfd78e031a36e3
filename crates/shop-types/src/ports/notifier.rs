use async_trait::async_trait;

use crate::domain::notification::Notification;

#[derive(thiserror::Error, Debug)]
pub enum NotifyError {
    #[error("notifier unreachable: {0}")]
    Transport(String),
    #[error("notifier rejected message with status {0}")]
    Rejected(u16),
}

#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}
