use async_trait::async_trait;
use dashmap::DashMap;
use shop_types::domain::id::ObjectId;
use shop_types::domain::order::{Order, OrderStatus};
use shop_types::domain::product::Product;
use shop_types::ports::order_repository::{OrderRepository, RepoError};
use shop_types::ports::product_repository::ProductRepository;
use std::sync::Arc;

#[derive(Clone)]
pub struct InMemoryRepo {
    pub orders: Arc<DashMap<ObjectId, Order>>,
    pub products: Arc<DashMap<ObjectId, Product>>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self {
            orders: Arc::new(DashMap::new()),
            products: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderRepository for InMemoryRepo {
    async fn create(&self, order: Order) -> Result<Order, RepoError> {
        self.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get(&self, id: ObjectId) -> Result<Option<Order>, RepoError> {
        Ok(self.orders.get(&id).map(|r| r.clone()))
    }

    async fn list(&self) -> Result<Vec<Order>, RepoError> {
        Ok(self.orders.iter().map(|kv| kv.value().clone()).collect())
    }

    async fn update_status(
        &self,
        id: ObjectId,
        status: OrderStatus,
    ) -> Result<Option<Order>, RepoError> {
        if let Some(mut v) = self.orders.get_mut(&id) {
            v.update_status(status);
            return Ok(Some(v.clone()));
        }
        Ok(None)
    }

    async fn delete(&self, id: ObjectId) -> Result<bool, RepoError> {
        Ok(self.orders.remove(&id).is_some())
    }
}

#[async_trait]
impl ProductRepository for InMemoryRepo {
    async fn insert_product(&self, product: Product) -> Result<Product, RepoError> {
        self.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn find_products(&self, ids: &[ObjectId]) -> Result<Vec<Product>, RepoError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.products.get(id).map(|r| r.clone()))
            .collect())
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepoError> {
        Ok(self.products.iter().map(|kv| kv.value().clone()).collect())
    }

    async fn update_stock(&self, id: ObjectId, stock: i64) -> Result<Option<Product>, RepoError> {
        if let Some(mut p) = self.products.get_mut(&id) {
            p.set_stock(stock);
            return Ok(Some(p.clone()));
        }
        Ok(None)
    }
}
