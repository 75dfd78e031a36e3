use std::collections::HashMap;

use crate::application::notification::NotificationDispatcher;
use crate::errors::AppError;
use shop_types::domain::id::ObjectId;
use shop_types::domain::order::{Order, OrderLine, OrderStatus};
use shop_types::domain::request::{OrderRequest, StatusRequest};
use shop_types::ports::notifier::Notifier;
use shop_types::ports::order_repository::OrderRepository;
use shop_types::ports::product_repository::ProductRepository;

pub struct OrderService<S, N>
where
    S: OrderRepository + ProductRepository,
    N: Notifier,
{
    store: S,
    notifications: NotificationDispatcher<N>,
}

fn parse_order_id(raw: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse(raw).map_err(|e| AppError::invalid("Invalid order id.", vec![e.to_string()]))
}

fn order_not_found(id: ObjectId) -> AppError {
    AppError::NotFound(format!("Order {id} not found."))
}

impl<S, N> OrderService<S, N>
where
    S: OrderRepository + ProductRepository,
    N: Notifier,
{
    pub fn new(store: S, notifications: NotificationDispatcher<N>) -> Self {
        Self {
            store,
            notifications,
        }
    }

    /// Validates the request, prices it against the catalog, persists it and
    /// queues a best-effort notification. The notification never affects
    /// the result.
    pub async fn create_order(&self, user_id: &str, request: OrderRequest) -> Result<Order, AppError> {
        let valid = request
            .validate()
            .map_err(|details| AppError::invalid("The order information is invalid.", details))?;

        let user_id = ObjectId::parse(user_id)
            .map_err(|_| AppError::Unauthenticated("User not authenticated.".into()))?;

        let ids = valid.product_ids();
        let products: HashMap<_, _> = self
            .store
            .find_products(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let missing: Vec<String> = valid
            .product_refs
            .iter()
            .filter(|(id, _)| !products.contains_key(id))
            .map(|(_, raw)| raw.clone())
            .collect();
        if !missing.is_empty() {
            tracing::info!(?missing, "order references unknown products");
            return Err(AppError::ProductsNotFound(missing));
        }

        let lines = valid
            .lines
            .iter()
            .filter_map(|(id, quantity)| {
                products.get(id).map(|p| OrderLine {
                    product_id: *id,
                    quantity: *quantity,
                    unit_price_cents: p.price_cents,
                })
            })
            .collect();

        let order = Order::new(
            user_id,
            lines,
            valid.shipping_address,
            valid.payment_method,
            valid.shipping_method,
        )?;
        let order = self.store.create(order).await?;
        tracing::info!(
            order_id = %order.id,
            user_id = %order.user_id,
            total_cents = order.total_cents,
            "order created"
        );

        let _ = self.notifications.order_created(&order);
        Ok(order)
    }

    pub async fn get_order(&self, id: &str) -> Result<Order, AppError> {
        let id = parse_order_id(id)?;
        self.store.get(id).await?.ok_or_else(|| order_not_found(id))
    }

    /// All orders in store order. Unpaginated.
    pub async fn list_orders(&self) -> Result<Vec<Order>, AppError> {
        Ok(self.store.list().await?)
    }

    /// Marks the order as being handled.
    pub async fn validate_order(&self, id: &str) -> Result<Order, AppError> {
        let id = parse_order_id(id)?;
        let order = self
            .store
            .update_status(id, OrderStatus::Processing)
            .await?
            .ok_or_else(|| order_not_found(id))?;
        tracing::info!(order_id = %id, "order validated");
        Ok(order)
    }

    /// Sets any status; there are no transition rules.
    pub async fn update_status(&self, id: &str, request: StatusRequest) -> Result<Order, AppError> {
        let id = parse_order_id(id)?;
        let status = request
            .validate()
            .map_err(|details| AppError::invalid("The provided status is invalid.", details))?;
        let order = self
            .store
            .update_status(id, status)
            .await?
            .ok_or_else(|| order_not_found(id))?;
        tracing::info!(order_id = %id, %status, "order status updated");
        Ok(order)
    }

    pub async fn delete_order(&self, id: &str) -> Result<(), AppError> {
        let id = parse_order_id(id)?;
        if self.store.delete(id).await? {
            tracing::info!(order_id = %id, "order deleted");
            Ok(())
        } else {
            Err(order_not_found(id))
        }
    }
}
