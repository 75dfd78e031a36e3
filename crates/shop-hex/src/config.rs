use anyhow::Context;
use std::env;
use std::fmt;
use std::time::Duration;

const DEFAULT_PORT: &str = "5000";
const DEFAULT_GATEWAY_URL: &str = "http://localhost:8000";
const DEFAULT_NOTIFY_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_CLIENT_ORIGIN: &str = "http://localhost:3000";

/// Process configuration, read once at startup and handed to each component.
#[derive(Clone)]
pub struct Config {
    pub server_port: String,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub gateway_url: String,
    pub notify_recipient: String,
    pub notify_timeout: Duration,
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Missing required keys
    /// fail here rather than on first use.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| get(key).with_context(|| format!("{key} must be set"));

        let server_port = get("SERVER_PORT").unwrap_or_else(|| DEFAULT_PORT.into());
        let database_url = get("DATABASE_URL");
        let jwt_secret = require("JWT_SECRET")?;
        let gateway_url = get("GATEWAY_URL").unwrap_or_else(|| DEFAULT_GATEWAY_URL.into());
        let notify_recipient = require("NOTIFY_RECIPIENT")?;
        let notify_timeout = match get("NOTIFY_TIMEOUT_MS") {
            Some(raw) => Duration::from_millis(
                raw.trim()
                    .parse()
                    .with_context(|| format!("NOTIFY_TIMEOUT_MS is not an integer: {raw:?}"))?,
            ),
            None => Duration::from_millis(DEFAULT_NOTIFY_TIMEOUT_MS),
        };
        let allowed_origins = get("CLIENT_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_else(|| vec![DEFAULT_CLIENT_ORIGIN.to_string()]);

        Ok(Self {
            server_port,
            database_url,
            jwt_secret,
            gateway_url,
            notify_recipient,
            notify_timeout,
            allowed_origins,
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server_port", &self.server_port)
            .field("database_url", &self.database_url)
            .field("jwt_secret", &"<redacted>")
            .field("gateway_url", &self.gateway_url)
            .field("notify_recipient", &self.notify_recipient)
            .field("notify_timeout", &self.notify_timeout)
            .field("allowed_origins", &self.allowed_origins)
            .finish()
    }
}
