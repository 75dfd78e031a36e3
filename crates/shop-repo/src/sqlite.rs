use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shop_types::domain::id::ObjectId;
use shop_types::domain::order::{Order, OrderLine, OrderStatus, ShippingAddress};
use shop_types::domain::product::Product;
use shop_types::ports::order_repository::{OrderRepository, RepoError};
use shop_types::ports::product_repository::ProductRepository;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use std::str::FromStr;

const MIGRATIONS: [&str; 2] = [
    include_str!("../migrations/0001_create_orders.sql"),
    include_str!("../migrations/0002_create_products.sql"),
];

const ORDER_COLUMNS: &str = "id, user_id, items_json, total_cents, shipping_address_json, \
     payment_method, shipping_method, status, created_at, updated_at";

const PRODUCT_COLUMNS: &str = "id, name, price_cents, stock, updated_at";

#[derive(Clone)]
pub struct SqliteRepo {
    pool: SqlitePool,
}

fn db_err(e: impl ToString) -> RepoError {
    RepoError::DbError(e.to_string())
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, RepoError> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .map_err(db_err)?
        .with_timezone(&Utc))
}

#[derive(FromRow)]
struct DbOrder {
    id: String,
    user_id: String,
    items_json: String,
    total_cents: i64,
    shipping_address_json: String,
    payment_method: String,
    shipping_method: String,
    status: String,
    created_at: String,
    updated_at: String,
}

impl DbOrder {
    fn into_order(self) -> Result<Order, RepoError> {
        let items: Vec<OrderLine> = serde_json::from_str(&self.items_json).map_err(db_err)?;
        let shipping_address: ShippingAddress =
            serde_json::from_str(&self.shipping_address_json).map_err(db_err)?;
        Ok(Order {
            id: ObjectId::parse(&self.id).map_err(db_err)?,
            user_id: ObjectId::parse(&self.user_id).map_err(db_err)?,
            items,
            total_cents: self.total_cents,
            shipping_address,
            payment_method: self.payment_method.parse().map_err(db_err)?,
            shipping_method: self.shipping_method.parse().map_err(db_err)?,
            status: self.status.parse().map_err(db_err)?,
            created_at: parse_time(&self.created_at)?,
            updated_at: parse_time(&self.updated_at)?,
        })
    }
}

#[derive(FromRow)]
struct DbProduct {
    id: String,
    name: String,
    price_cents: i64,
    stock: i64,
    updated_at: String,
}

impl DbProduct {
    fn into_product(self) -> Result<Product, RepoError> {
        Ok(Product {
            id: ObjectId::parse(&self.id).map_err(db_err)?,
            name: self.name,
            price_cents: self.price_cents,
            stock: self.stock,
            updated_at: parse_time(&self.updated_at)?,
        })
    }
}

impl SqliteRepo {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        for ddl in MIGRATIONS {
            sqlx::query(ddl).execute(&pool).await?;
        }
        tracing::debug!(url = database_url, "sqlite store ready");

        Ok(Self { pool })
    }

    async fn get_product(&self, id: ObjectId) -> Result<Option<Product>, RepoError> {
        let row: Option<DbProduct> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(DbProduct::into_product).transpose()
    }
}

#[async_trait]
impl OrderRepository for SqliteRepo {
    async fn create(&self, order: Order) -> Result<Order, RepoError> {
        let items_json = serde_json::to_string(&order.items).map_err(db_err)?;
        let address_json = serde_json::to_string(&order.shipping_address).map_err(db_err)?;
        sqlx::query(&format!(
            "INSERT INTO orders ({ORDER_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(order.id.to_string())
        .bind(order.user_id.to_string())
        .bind(items_json)
        .bind(order.total_cents)
        .bind(address_json)
        .bind(order.payment_method.as_str())
        .bind(order.shipping_method.as_str())
        .bind(order.status.as_str())
        .bind(order.created_at.to_rfc3339())
        .bind(order.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(order)
    }

    async fn get(&self, id: ObjectId) -> Result<Option<Order>, RepoError> {
        let row: Option<DbOrder> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        row.map(DbOrder::into_order).transpose()
    }

    async fn list(&self) -> Result<Vec<Order>, RepoError> {
        let rows: Vec<DbOrder> = sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders"))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.into_iter()
            .map(DbOrder::into_order)
            .collect::<Result<Vec<_>, _>>()
    }

    async fn update_status(
        &self,
        id: ObjectId,
        status: OrderStatus,
    ) -> Result<Option<Order>, RepoError> {
        let updated = sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now().to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(id).await
    }

    async fn delete(&self, id: ObjectId) -> Result<bool, RepoError> {
        let res = sqlx::query("DELETE FROM orders WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(res.rows_affected() > 0)
    }
}

#[async_trait]
impl ProductRepository for SqliteRepo {
    async fn insert_product(&self, product: Product) -> Result<Product, RepoError> {
        sqlx::query(&format!(
            "INSERT INTO products ({PRODUCT_COLUMNS}) VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET name = excluded.name, \
             price_cents = excluded.price_cents, stock = excluded.stock, \
             updated_at = excluded.updated_at"
        ))
        .bind(product.id.to_string())
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(product)
    }

    async fn find_products(&self, ids: &[ObjectId]) -> Result<Vec<Product>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id IN ("
        ));
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id.to_string());
        }
        separated.push_unseparated(")");

        let rows: Vec<DbProduct> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.into_iter()
            .map(DbProduct::into_product)
            .collect::<Result<Vec<_>, _>>()
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepoError> {
        let rows: Vec<DbProduct> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products"))
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?;
        rows.into_iter()
            .map(DbProduct::into_product)
            .collect::<Result<Vec<_>, _>>()
    }

    async fn update_stock(&self, id: ObjectId, stock: i64) -> Result<Option<Product>, RepoError> {
        let updated = sqlx::query("UPDATE products SET stock = ?, updated_at = ? WHERE id = ?")
            .bind(stock)
            .bind(Utc::now().to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_product(id).await
    }
}
