use async_trait::async_trait;

use crate::domain::id::ObjectId;
use crate::domain::product::Product;
use crate::ports::order_repository::RepoError;

/// Catalog access. The order flow only reads; stock updates are last write
/// wins.
#[async_trait]
pub trait ProductRepository: Send + Sync + 'static {
    /// Upserts by id: an existing product with the same id is replaced.
    async fn insert_product(&self, product: Product) -> Result<Product, RepoError>;
    /// Returns the products that exist among `ids`, in no particular order.
    async fn find_products(&self, ids: &[ObjectId]) -> Result<Vec<Product>, RepoError>;
    async fn list_products(&self) -> Result<Vec<Product>, RepoError>;
    async fn update_stock(&self, id: ObjectId, stock: i64) -> Result<Option<Product>, RepoError>;
}
