//! Outbound HTTP client for the gateway that fronts the notification and
//! stock-update services.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use shop_types::domain::notification::Notification;
use shop_types::ports::notifier::{Notifier, NotifyError};

#[derive(Clone)]
pub struct GatewayClientBuilder {
    base: Url,
    headers: HeaderMap,
    timeout: Option<Duration>,
    client: Option<reqwest::Client>,
}

#[derive(Clone)]
pub struct GatewayClient {
    base: Url,
    client: reqwest::Client,
}

impl GatewayClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Self::builder(base_url)?.build()
    }

    pub fn builder(base_url: &str) -> anyhow::Result<GatewayClientBuilder> {
        let mut base = Url::parse(base_url).context("invalid base url")?;
        // `Url::join` drops the last path segment unless it ends with '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(GatewayClientBuilder {
            base,
            headers: HeaderMap::new(),
            timeout: None,
            client: None,
        })
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base.join(path).context("failed to join url")
    }

    pub async fn notify(&self, notification: &Notification) -> anyhow::Result<MessageResponse> {
        let res = self
            .client
            .post(self.url("notify")?)
            .json(notification)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn update_stock(
        &self,
        product_id: &str,
        quantity: i64,
    ) -> anyhow::Result<MessageResponse> {
        let res = self
            .client
            .post(self.url("update-stock")?)
            .json(&UpdateStockRequest {
                product_id: product_id.to_string(),
                quantity,
            })
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }
}

#[async_trait]
impl Notifier for GatewayClient {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        match GatewayClient::notify(self, notification).await {
            Ok(res) => {
                tracing::debug!(message = %res.message, "notification accepted");
                Ok(())
            }
            Err(err) => match err.downcast_ref::<reqwest::Error>().and_then(|e| e.status()) {
                Some(status) => Err(NotifyError::Rejected(status.as_u16())),
                None => Err(NotifyError::Transport(format!("{err:#}"))),
            },
        }
    }
}

impl GatewayClientBuilder {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(
        mut self,
        key: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> anyhow::Result<Self> {
        let header_name =
            HeaderName::from_bytes(key.as_ref().as_bytes()).context("invalid header name")?;
        let header_value = HeaderValue::from_str(value.as_ref()).context("invalid header value")?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    pub fn with_reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> anyhow::Result<GatewayClient> {
        if let Some(client) = self.client {
            return Ok(GatewayClient {
                base: self.base,
                client,
            });
        }

        let mut builder = reqwest::Client::builder();
        if !self.headers.is_empty() {
            builder = builder.default_headers(self.headers);
        }
        if let Some(t) = self.timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build()?;
        Ok(GatewayClient {
            base: self.base,
            client,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStockRequest {
    pub product_id: String,
    pub quantity: i64,
}

/// `{ "message": ... }` body returned by both collaborators.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}
