use serde::{Deserialize, Serialize};

/// Payload accepted by the notification collaborator's `POST /notify`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub text: String,
}
