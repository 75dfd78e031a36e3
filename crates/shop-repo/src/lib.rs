#[cfg(not(any(feature = "memory", feature = "sqlite")))]
compile_error!("Enable a repo feature: `memory` or `sqlite`.");

use shop_types::domain::id::ObjectId;
use shop_types::domain::order::{Order, OrderStatus};
use shop_types::domain::product::Product;
use shop_types::ports::order_repository::{OrderRepository, RepoError};
use shop_types::ports::product_repository::ProductRepository;

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://shop.db";

/// Store selected at startup. Serves both orders and the product catalog.
#[derive(Clone)]
pub enum Repo {
    #[cfg(feature = "memory")]
    Memory(memory::InMemoryRepo),
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite::SqliteRepo),
}

pub async fn build_repo(url: Option<&str>) -> anyhow::Result<Repo> {
    Repo::build_repo(url).await
}

impl Repo {
    /// With the `memory` feature, no url means an in-memory store. Otherwise
    /// the url (or [`DEFAULT_DATABASE_URL`]) opens a SQLite database.
    pub async fn build_repo(database_url: Option<&str>) -> anyhow::Result<Self> {
        #[cfg(feature = "memory")]
        if database_url.is_none() {
            tracing::info!("using in-memory store");
            return Ok(Repo::Memory(memory::InMemoryRepo::new()));
        }

        Self::open_database(database_url.unwrap_or(DEFAULT_DATABASE_URL)).await
    }

    #[cfg(feature = "sqlite")]
    async fn open_database(url: &str) -> anyhow::Result<Self> {
        tracing::info!(url, "using sqlite store");
        Ok(Repo::Sqlite(sqlite::SqliteRepo::new(url).await?))
    }

    #[cfg(not(feature = "sqlite"))]
    async fn open_database(url: &str) -> anyhow::Result<Self> {
        anyhow::bail!("database url {url:?} given but the `sqlite` feature is disabled")
    }
}

macro_rules! dispatch {
    ($self:ident, $repo:ident => $call:expr) => {
        match $self {
            #[cfg(feature = "memory")]
            Repo::Memory($repo) => $call,
            #[cfg(feature = "sqlite")]
            Repo::Sqlite($repo) => $call,
        }
    };
}

#[async_trait::async_trait]
impl OrderRepository for Repo {
    async fn create(&self, order: Order) -> Result<Order, RepoError> {
        dispatch!(self, r => r.create(order).await)
    }

    async fn get(&self, id: ObjectId) -> Result<Option<Order>, RepoError> {
        dispatch!(self, r => r.get(id).await)
    }

    async fn list(&self) -> Result<Vec<Order>, RepoError> {
        dispatch!(self, r => r.list().await)
    }

    async fn update_status(
        &self,
        id: ObjectId,
        status: OrderStatus,
    ) -> Result<Option<Order>, RepoError> {
        dispatch!(self, r => r.update_status(id, status).await)
    }

    async fn delete(&self, id: ObjectId) -> Result<bool, RepoError> {
        dispatch!(self, r => r.delete(id).await)
    }
}

#[async_trait::async_trait]
impl ProductRepository for Repo {
    async fn insert_product(&self, product: Product) -> Result<Product, RepoError> {
        dispatch!(self, r => r.insert_product(product).await)
    }

    async fn find_products(&self, ids: &[ObjectId]) -> Result<Vec<Product>, RepoError> {
        dispatch!(self, r => r.find_products(ids).await)
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepoError> {
        dispatch!(self, r => r.list_products().await)
    }

    async fn update_stock(&self, id: ObjectId, stock: i64) -> Result<Option<Product>, RepoError> {
        dispatch!(self, r => r.update_stock(id, stock).await)
    }
}
