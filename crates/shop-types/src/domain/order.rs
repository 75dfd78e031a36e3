use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::ObjectId;

/// Order lifecycle value. Any status may follow any other; there is no
/// transition graph.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    #[serde(alias = "En attente")]
    Pending,
    #[serde(alias = "En cours de traitement")]
    Processing,
    #[serde(alias = "Expédiée")]
    Shipped,
    #[serde(alias = "Délivrée")]
    Delivered,
    #[serde(alias = "Annulée")]
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    fn french_label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "En attente",
            OrderStatus::Processing => "En cours de traitement",
            OrderStatus::Shipped => "Expédiée",
            OrderStatus::Delivered => "Délivrée",
            OrderStatus::Cancelled => "Annulée",
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{field} must be one of [{allowed}], got {value:?}")]
pub struct UnknownVariant {
    pub field: &'static str,
    pub value: String,
    pub allowed: String,
}

impl FromStr for OrderStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s || st.french_label() == s)
            .ok_or_else(|| UnknownVariant {
                field: "status",
                value: s.to_string(),
                allowed: join_labels(OrderStatus::ALL.iter().map(|s| s.as_str())),
            })
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentMethod {
    #[serde(rename = "Carte bancaire")]
    CreditCard,
    #[serde(rename = "PayPal")]
    PayPal,
    #[serde(rename = "Virement")]
    BankTransfer,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [
        PaymentMethod::CreditCard,
        PaymentMethod::PayPal,
        PaymentMethod::BankTransfer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "Carte bancaire",
            PaymentMethod::PayPal => "PayPal",
            PaymentMethod::BankTransfer => "Virement",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                field: "paymentMethod",
                value: s.to_string(),
                allowed: join_labels(PaymentMethod::ALL.iter().map(|m| m.as_str())),
            })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ShippingMethod {
    Colissimo,
    Chronopost,
}

impl ShippingMethod {
    pub const ALL: [ShippingMethod; 2] = [ShippingMethod::Colissimo, ShippingMethod::Chronopost];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShippingMethod::Colissimo => "colissimo",
            ShippingMethod::Chronopost => "chronopost",
        }
    }
}

impl FromStr for ShippingMethod {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShippingMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                field: "shippingMethod",
                value: s.to_string(),
                allowed: join_labels(ShippingMethod::ALL.iter().map(|m| m.as_str())),
            })
    }
}

fn join_labels<'a>(labels: impl Iterator<Item = &'a str>) -> String {
    labels.collect::<Vec<_>>().join(", ")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

/// A resolved order line. The unit price is a copy taken when the order was
/// placed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ObjectId,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: ObjectId,
    pub user_id: ObjectId,
    pub items: Vec<OrderLine>,
    pub total_cents: i64,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub shipping_method: ShippingMethod,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        user_id: ObjectId,
        items: Vec<OrderLine>,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
        shipping_method: ShippingMethod,
    ) -> anyhow::Result<Self> {
        if items.is_empty() {
            anyhow::bail!("items empty");
        }
        for it in &items {
            if it.quantity == 0 {
                anyhow::bail!("item quantity must be > 0");
            }
            if it.unit_price_cents < 0 {
                anyhow::bail!("item price must be >= 0");
            }
        }
        let total = items
            .iter()
            .map(|it| i64::from(it.quantity) * it.unit_price_cents)
            .sum();
        let now = Utc::now();
        Ok(Self {
            id: ObjectId::new(),
            user_id,
            items,
            total_cents: total,
            shipping_address,
            payment_method,
            shipping_method,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update_status(&mut self, status: OrderStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Human-readable list of the ordered lines, one per row.
    pub fn summary(&self) -> String {
        self.items
            .iter()
            .map(|it| format!("Product ID: {}, Quantity: {}", it.product_id, it.quantity))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
