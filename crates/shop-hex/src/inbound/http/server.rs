use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, FromRef, Path, State},
    http::{header, HeaderValue, Method, StatusCode},
    routing::{get, patch},
    serve, Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::application::order_service::OrderService;
use crate::application::stock_service::StockService;
use crate::errors::AppError;
use crate::inbound::http::auth::{AdminUser, AuthKeys, AuthUser};
use shop_types::domain::order::Order;
use shop_types::domain::product::Product;
use shop_types::domain::request::{OrderRequest, StatusRequest, StockRequest};
use shop_types::ports::notifier::Notifier;
use shop_types::ports::order_repository::OrderRepository;
use shop_types::ports::product_repository::ProductRepository;

pub const MAX_BODY_BYTES: usize = 10 * 1024;

#[derive(Clone)]
pub struct HttpServerConfig {
    pub port: String,
    pub allowed_origins: Vec<String>,
}

/// Shared handler state.
pub struct AppState<S, N>
where
    S: OrderRepository + ProductRepository,
    N: Notifier,
{
    pub orders: Arc<OrderService<S, N>>,
    pub stock: Arc<StockService<S>>,
    pub auth: Arc<AuthKeys>,
}

impl<S, N> Clone for AppState<S, N>
where
    S: OrderRepository + ProductRepository,
    N: Notifier,
{
    fn clone(&self) -> Self {
        Self {
            orders: Arc::clone(&self.orders),
            stock: Arc::clone(&self.stock),
            auth: Arc::clone(&self.auth),
        }
    }
}

impl<S, N> FromRef<AppState<S, N>> for Arc<AuthKeys>
where
    S: OrderRepository + ProductRepository,
    N: Notifier,
{
    fn from_ref(state: &AppState<S, N>) -> Self {
        Arc::clone(&state.auth)
    }
}

#[derive(Clone)]
pub struct HttpServer<S, N>
where
    S: OrderRepository + ProductRepository,
    N: Notifier,
{
    pub state: AppState<S, N>,
    pub config: HttpServerConfig,
}

#[derive(Serialize)]
struct OrderResponse {
    message: String,
    order: Order,
}

#[derive(Serialize)]
struct ProductResponse {
    message: String,
    product: Product,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

fn malformed_body(rejection: JsonRejection) -> AppError {
    AppError::invalid("Malformed request body.", vec![rejection.body_text()])
}

impl<S, N> HttpServer<S, N>
where
    S: OrderRepository + ProductRepository,
    N: Notifier,
{
    pub async fn new(
        orders: OrderService<S, N>,
        stock: StockService<S>,
        auth: AuthKeys,
        config: HttpServerConfig,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            state: AppState {
                orders: Arc::new(orders),
                stock: Arc::new(stock),
                auth: Arc::new(auth),
            },
            config,
        })
    }

    pub fn router(&self) -> anyhow::Result<Router> {
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http_request",
                    %request_id,
                    method = %request.method(),
                    uri
                )
            })
            .on_request(
                |request: &axum::extract::Request<_>, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        method = %request.method(),
                        uri = %request.uri(),
                        "request"
                    );
                },
            )
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        status = %response.status(),
                        latency_ms = %latency.as_millis(),
                        "response"
                    );
                },
            );

        let origins = self
            .config
            .allowed_origins
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .with_context(|| format!("invalid CORS origin {o:?}"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        let cors = CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

        let app = Router::new()
            .route("/health", get(health))
            .route(
                "/api/orders",
                get(list_orders::<S, N>).post(create_order::<S, N>),
            )
            .route(
                "/api/orders/{id}",
                get(get_order::<S, N>).delete(delete_order::<S, N>),
            )
            .route("/api/orders/{id}/validate", patch(validate_order::<S, N>))
            .route("/api/orders/{id}/status", patch(update_status::<S, N>))
            .route("/api/products", get(list_products::<S, N>))
            .route("/api/products/{id}/stock", patch(update_stock::<S, N>))
            .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
            .layer(cors)
            .layer(SetResponseHeaderLayer::overriding(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::X_FRAME_OPTIONS,
                HeaderValue::from_static("DENY"),
            ))
            .layer(trace_layer)
            .with_state(self.state.clone());
        Ok(app)
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let app = self.router()?;
        let addr: SocketAddr = format!("0.0.0.0:{}", self.config.port).parse()?;
        tracing::info!("starting server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        serve(listener, app.into_make_service()).await?;
        Ok(())
    }
}

async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn create_order<S, N>(
    State(state): State<AppState<S, N>>,
    user: AuthUser,
    payload: Result<Json<OrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderResponse>), AppError>
where
    S: OrderRepository + ProductRepository,
    N: Notifier,
{
    let Json(request) = payload.map_err(malformed_body)?;
    let order = state.orders.create_order(&user.user_id, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(OrderResponse {
            message: "Order created successfully.".into(),
            order,
        }),
    ))
}

async fn list_orders<S, N>(
    State(state): State<AppState<S, N>>,
    _admin: AdminUser,
) -> Result<Json<Vec<Order>>, AppError>
where
    S: OrderRepository + ProductRepository,
    N: Notifier,
{
    Ok(Json(state.orders.list_orders().await?))
}

async fn get_order<S, N>(
    State(state): State<AppState<S, N>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<Order>, AppError>
where
    S: OrderRepository + ProductRepository,
    N: Notifier,
{
    Ok(Json(state.orders.get_order(&id).await?))
}

async fn delete_order<S, N>(
    State(state): State<AppState<S, N>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError>
where
    S: OrderRepository + ProductRepository,
    N: Notifier,
{
    state.orders.delete_order(&id).await?;
    Ok(Json(MessageResponse {
        message: "Order deleted successfully.".into(),
    }))
}

async fn validate_order<S, N>(
    State(state): State<AppState<S, N>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, AppError>
where
    S: OrderRepository + ProductRepository,
    N: Notifier,
{
    let order = state.orders.validate_order(&id).await?;
    Ok(Json(OrderResponse {
        message: format!("Order {id} validated."),
        order,
    }))
}

async fn update_status<S, N>(
    State(state): State<AppState<S, N>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<OrderResponse>, AppError>
where
    S: OrderRepository + ProductRepository,
    N: Notifier,
{
    let Json(request) = payload.map_err(malformed_body)?;
    let order = state.orders.update_status(&id, request).await?;
    Ok(Json(OrderResponse {
        message: "Status updated successfully.".into(),
        order,
    }))
}

async fn list_products<S, N>(
    State(state): State<AppState<S, N>>,
) -> Result<Json<Vec<Product>>, AppError>
where
    S: OrderRepository + ProductRepository,
    N: Notifier,
{
    Ok(Json(state.stock.list_products().await?))
}

async fn update_stock<S, N>(
    State(state): State<AppState<S, N>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    payload: Result<Json<StockRequest>, JsonRejection>,
) -> Result<Json<ProductResponse>, AppError>
where
    S: OrderRepository + ProductRepository,
    N: Notifier,
{
    let Json(request) = payload.map_err(malformed_body)?;
    let product = state.stock.update_product_stock(&id, request).await?;
    Ok(Json(ProductResponse {
        message: "Stock updated successfully.".into(),
        product,
    }))
}
