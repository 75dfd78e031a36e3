//! Unvalidated request payloads and their validation.
//!
//! Every field is optional on the wire, and scalar fields are kept as raw
//! JSON values, so that validation can report all violations at once
//! instead of failing on the first missing key or mistyped value.

use std::collections::HashSet;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::id::ObjectId;
use super::order::{OrderStatus, PaymentMethod, ShippingAddress, ShippingMethod};

pub const QUANTITY_RANGE: RangeInclusive<i64> = 1..=9999;

const STREET_LEN: RangeInclusive<usize> = 3..=120;
const CITY_LEN: RangeInclusive<usize> = 2..=60;
const POSTAL_CODE_LEN: RangeInclusive<usize> = 3..=20;
const COUNTRY_LEN: RangeInclusive<usize> = 2..=56;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Value>,
}

impl OrderLineRequest {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        Self {
            product_id: Some(Value::String(product_id.into())),
            quantity: Some(Value::from(quantity)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddressRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<Value>,
}

impl ShippingAddressRequest {
    pub fn new(
        street: impl Into<String>,
        city: impl Into<String>,
        postal_code: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            street: Some(Value::String(street.into())),
            city: Some(Value::String(city.into())),
            postal_code: Some(Value::String(postal_code.into())),
            country: Some(Value::String(country.into())),
        }
    }

    fn validate(&self, errors: &mut Vec<String>) -> Option<ShippingAddress> {
        let street = bounded_text("shippingAddress.street", &self.street, STREET_LEN, errors);
        let city = bounded_text("shippingAddress.city", &self.city, CITY_LEN, errors);
        let postal_code = bounded_text(
            "shippingAddress.postalCode",
            &self.postal_code,
            POSTAL_CODE_LEN,
            errors,
        );
        let country = bounded_text("shippingAddress.country", &self.country, COUNTRY_LEN, errors);
        Some(ShippingAddress {
            street: street?,
            city: city?,
            postal_code: postal_code?,
            country: country?,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<OrderLineRequest>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<ShippingAddressRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_method: Option<Value>,
}

/// An order request that passed validation. `lines` holds one entry per
/// distinct `(product, quantity)` pair, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidOrderRequest {
    pub lines: Vec<(ObjectId, u32)>,
    /// Distinct product ids, in first-seen order, with the text the caller
    /// sent for each.
    pub product_refs: Vec<(ObjectId, String)>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub shipping_method: ShippingMethod,
}

impl ValidOrderRequest {
    /// Distinct product ids, in first-seen order.
    pub fn product_ids(&self) -> Vec<ObjectId> {
        self.product_refs.iter().map(|(id, _)| *id).collect()
    }
}

impl OrderRequest {
    pub fn new(
        items: Vec<OrderLineRequest>,
        shipping_address: ShippingAddressRequest,
        payment_method: impl Into<String>,
        shipping_method: impl Into<String>,
    ) -> Self {
        Self {
            items: Some(items),
            shipping_address: Some(shipping_address),
            payment_method: Some(Value::String(payment_method.into())),
            shipping_method: Some(Value::String(shipping_method.into())),
        }
    }

    /// Checks every field and returns either the typed request or the full
    /// list of violations.
    pub fn validate(&self) -> Result<ValidOrderRequest, Vec<String>> {
        let mut errors = Vec::new();

        let lines = match &self.items {
            None => {
                errors.push("items is required".to_string());
                None
            }
            Some(items) if items.is_empty() => {
                errors.push("items must contain at least 1 item".to_string());
                None
            }
            Some(items) => {
                let parsed: Vec<_> = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| validate_line(i, item, &mut errors))
                    .collect();
                parsed.into_iter().collect::<Option<Vec<(ObjectId, u32, &str)>>>()
            }
        };

        let shipping_address = match &self.shipping_address {
            None => {
                errors.push("shippingAddress is required".to_string());
                None
            }
            Some(address) => address.validate(&mut errors),
        };

        let payment_method = required_variant::<PaymentMethod>(
            "paymentMethod",
            &self.payment_method,
            &mut errors,
        );
        let shipping_method = required_variant::<ShippingMethod>(
            "shippingMethod",
            &self.shipping_method,
            &mut errors,
        );

        match (lines, shipping_address, payment_method, shipping_method) {
            (Some(lines), Some(shipping_address), Some(payment_method), Some(shipping_method))
                if errors.is_empty() =>
            {
                let mut seen_ids = HashSet::new();
                let product_refs = lines
                    .iter()
                    .filter(|(id, _, _)| seen_ids.insert(*id))
                    .map(|(id, _, raw)| (*id, raw.to_string()))
                    .collect();
                let mut seen = HashSet::new();
                let lines = lines
                    .into_iter()
                    .map(|(id, quantity, _)| (id, quantity))
                    .filter(|pair| seen.insert(*pair))
                    .collect();
                Ok(ValidOrderRequest {
                    lines,
                    product_refs,
                    shipping_address,
                    payment_method,
                    shipping_method,
                })
            }
            _ => Err(errors),
        }
    }
}

fn validate_line<'a>(
    index: usize,
    item: &'a OrderLineRequest,
    errors: &mut Vec<String>,
) -> Option<(ObjectId, u32, &'a str)> {
    let product_id = required_text(&format!("items[{index}].productId"), &item.product_id, errors)
        .and_then(|raw| match ObjectId::parse(raw) {
            Ok(id) => Some((id, raw)),
            Err(_) => {
                errors.push(format!(
                    "items[{index}].productId must be a 24-character hexadecimal id"
                ));
                None
            }
        });

    let quantity = required_integer(&format!("items[{index}].quantity"), &item.quantity, errors)
        .and_then(|q| {
            if QUANTITY_RANGE.contains(&q) {
                u32::try_from(q).ok()
            } else {
                errors.push(format!(
                    "items[{index}].quantity must be between {} and {}",
                    QUANTITY_RANGE.start(),
                    QUANTITY_RANGE.end()
                ));
                None
            }
        });

    let (id, raw) = product_id?;
    Some((id, quantity?, raw))
}

fn required_text<'a>(
    field: &str,
    value: &'a Option<Value>,
    errors: &mut Vec<String>,
) -> Option<&'a str> {
    match value {
        None => {
            errors.push(format!("{field} is required"));
            None
        }
        Some(Value::String(s)) => Some(s),
        Some(_) => {
            errors.push(format!("{field} must be a string"));
            None
        }
    }
}

enum Numeric {
    Integer(i64),
    Fraction,
    NotANumber,
}

/// Numbers and numeric strings are accepted; `2`, `"2"` and `2.0` are all
/// the integer 2.
fn numeric(value: &Value) -> Numeric {
    let float = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => return Numeric::Integer(i),
            None => n.as_f64(),
        },
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                return Numeric::Integer(i);
            }
            s.parse::<f64>().ok()
        }
        _ => None,
    };
    match float {
        Some(f) if !f.is_finite() => Numeric::NotANumber,
        Some(f) if f.fract() != 0.0 => Numeric::Fraction,
        // Saturates; out-of-range values then fail the caller's bounds check.
        Some(f) => Numeric::Integer(f as i64),
        None => Numeric::NotANumber,
    }
}

fn required_integer(field: &str, value: &Option<Value>, errors: &mut Vec<String>) -> Option<i64> {
    let Some(raw) = value else {
        errors.push(format!("{field} is required"));
        return None;
    };
    match numeric(raw) {
        Numeric::Integer(n) => Some(n),
        Numeric::Fraction => {
            errors.push(format!("{field} must be an integer"));
            None
        }
        Numeric::NotANumber => {
            errors.push(format!("{field} must be a number"));
            None
        }
    }
}

fn bounded_text(
    field: &str,
    value: &Option<Value>,
    bounds: RangeInclusive<usize>,
    errors: &mut Vec<String>,
) -> Option<String> {
    let trimmed = required_text(field, value, errors)?.trim();
    if bounds.contains(&trimmed.chars().count()) {
        Some(trimmed.to_string())
    } else {
        errors.push(format!(
            "{field} must be between {} and {} characters",
            bounds.start(),
            bounds.end()
        ));
        None
    }
}

fn required_variant<T>(field: &str, value: &Option<Value>, errors: &mut Vec<String>) -> Option<T>
where
    T: std::str::FromStr<Err = super::order::UnknownVariant>,
{
    match required_text(field, value, errors)?.parse::<T>() {
        Ok(v) => Some(v),
        Err(e) => {
            errors.push(e.to_string());
            None
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
}

impl StatusRequest {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: Some(Value::String(status.into())),
        }
    }

    pub fn validate(&self) -> Result<OrderStatus, Vec<String>> {
        let mut errors = Vec::new();
        required_variant::<OrderStatus>("status", &self.status, &mut errors).ok_or(errors)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<Value>,
}

impl StockRequest {
    pub fn new(stock: i64) -> Self {
        Self {
            stock: Some(Value::from(stock)),
        }
    }

    pub fn validate(&self) -> Result<i64, Vec<String>> {
        let mut errors = Vec::new();
        match required_integer("stock", &self.stock, &mut errors) {
            Some(s) if s < 0 => Err(vec!["stock must be greater than or equal to 0".to_string()]),
            Some(s) => Ok(s),
            None => Err(errors),
        }
    }
}
