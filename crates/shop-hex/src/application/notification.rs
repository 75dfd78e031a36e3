use std::sync::Arc;
use std::time::Duration;

use shop_types::domain::notification::Notification;
use shop_types::domain::order::Order;
use shop_types::ports::notifier::Notifier;
use tokio::task::JoinHandle;

pub const ORDER_CREATED_SUBJECT: &str = "New order created";

/// Fire-and-forget delivery of notifications. Each send runs in its own task
/// bounded by `timeout`; the outcome is only logged.
pub struct NotificationDispatcher<N: Notifier> {
    notifier: Arc<N>,
    recipient: String,
    timeout: Duration,
}

impl<N: Notifier> NotificationDispatcher<N> {
    pub fn new(notifier: N, recipient: impl Into<String>, timeout: Duration) -> Self {
        Self {
            notifier: Arc::new(notifier),
            recipient: recipient.into(),
            timeout,
        }
    }

    pub fn order_created(&self, order: &Order) -> JoinHandle<()> {
        self.dispatch(Notification {
            to: self.recipient.clone(),
            subject: ORDER_CREATED_SUBJECT.into(),
            text: format!(
                "An order was created for the following products:\n{}",
                order.summary()
            ),
        })
    }

    pub fn dispatch(&self, notification: Notification) -> JoinHandle<()> {
        let notifier = Arc::clone(&self.notifier);
        let timeout = self.timeout;
        tokio::spawn(async move {
            match tokio::time::timeout(timeout, notifier.notify(&notification)).await {
                Ok(Ok(())) => {
                    tracing::info!(to = %notification.to, subject = %notification.subject, "notification sent")
                }
                Ok(Err(err)) => tracing::warn!(error = %err, "notification failed"),
                Err(_) => tracing::warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "notification timed out"
                ),
            }
        })
    }
}
