use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::ObjectId;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ObjectId,
    pub name: String,
    pub price_cents: i64,
    pub stock: i64,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(name: impl Into<String>, price_cents: i64, stock: i64) -> anyhow::Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            anyhow::bail!("product name empty");
        }
        if price_cents < 0 {
            anyhow::bail!("price must be >= 0");
        }
        if stock < 0 {
            anyhow::bail!("stock must be >= 0");
        }
        Ok(Self {
            id: ObjectId::new(),
            name,
            price_cents,
            stock,
            updated_at: Utc::now(),
        })
    }

    pub fn with_id(mut self, id: ObjectId) -> Self {
        self.id = id;
        self
    }

    pub fn set_stock(&mut self, stock: i64) {
        self.stock = stock;
        self.updated_at = Utc::now();
    }
}
