use shop_client::GatewayClient;
use shop_hex::application::notification::NotificationDispatcher;
use shop_hex::application::order_service::OrderService;
use shop_hex::application::stock_service::StockService;
use shop_hex::config::Config;
use shop_hex::inbound::http::auth::AuthKeys;
use shop_hex::inbound::http::{HttpServer, HttpServerConfig};
use shop_repo::{build_repo, Repo};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for DATABASE_URL / JWT_SECRET / SERVER_PORT when present.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let config = Config::from_env()?;
    tracing::debug!(?config, "configuration loaded");

    let repo: Repo = build_repo(config.database_url.as_deref()).await?;
    let gateway = GatewayClient::builder(&config.gateway_url)?
        .with_timeout(config.notify_timeout)
        .build()?;
    let notifications =
        NotificationDispatcher::new(gateway, config.notify_recipient.clone(), config.notify_timeout);

    let orders = OrderService::new(repo.clone(), notifications);
    let stock = StockService::new(repo);
    let auth = AuthKeys::new(&config.jwt_secret);

    let server_cfg = HttpServerConfig {
        port: config.server_port.clone(),
        allowed_origins: config.allowed_origins.clone(),
    };

    let http = HttpServer::new(orders, stock, auth, server_cfg).await?;
    http.run().await
}
