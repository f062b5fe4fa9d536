//! # Store Data Model
//!
//! Catalog and order types shared by the store, the HTTP API, the bot and the
//! storefront client.
//!
//! Order items are snapshots: name, image and unit price are copied from the
//! product when the order is placed, so later catalog edits never change a
//! historical order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Product categories offered by the store
///
/// Serialized with the Arabic label used by the storefront; parsing, JSON
/// included, also accepts the English name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Category {
    #[serde(rename = "حلق")]
    Earrings,
    #[serde(rename = "خاتم")]
    Rings,
    #[serde(rename = "قلادة")]
    Necklaces,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Earrings, Category::Rings, Category::Necklaces];

    /// Label stored in the database and shown to customers
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Earrings => "حلق",
            Category::Rings => "خاتم",
            Category::Necklaces => "قلادة",
        }
    }

    pub fn english_name(&self) -> &'static str {
        match self {
            Category::Earrings => "earrings",
            Category::Rings => "rings",
            Category::Necklaces => "necklaces",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Category::Earrings => "✨",
            Category::Rings => "💍",
            Category::Necklaces => "📿",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Category::ALL
            .into_iter()
            .find(|category| {
                category.as_str() == needle || category.english_name().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| needle.to_string())
    }
}

impl TryFrom<String> for Category {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value
            .parse()
            .map_err(|unknown| format!("unknown category: {unknown}"))
    }
}

/// A catalog product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: Category,
    /// Ordered image references; the first one is the primary image
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Image used in order snapshots and notifications
    pub fn primary_image(&self) -> &str {
        self.images.first().map(String::as_str).unwrap_or("")
    }
}

/// Payload for creating a product
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub category: Category,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Partial product update; absent fields keep their current value
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<Category>,
    pub images: Option<Vec<String>>,
}

/// Order lifecycle, only ever advanced forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Processed,
    Shipped,
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Processed,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Processed => "Processed",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
        }
    }

    /// Staying on the same status is allowed, moving backwards is not
    pub fn can_move_to(&self, next: OrderStatus) -> bool {
        next >= *self
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| s.to_string())
    }
}

/// Snapshot of a product inside an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Weak reference: the product may be deleted later
    pub product_id: String,
    pub product_name: String,
    pub product_image: String,
    pub quantity: i64,
    /// Unit price at order time
    pub price: f64,
}

impl OrderItem {
    pub fn snapshot(product: &Product, quantity: i64) -> Self {
        Self {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            product_image: product.primary_image().to_string(),
            quantity,
            price: product.price,
        }
    }

    pub fn line_total(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

/// A customer order with its line items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub customer_name: String,
    pub phone_number: String,
    pub address: String,
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram_chat_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Order {
    /// Sum of the item line totals
    pub fn items_total(items: &[OrderItem]) -> f64 {
        items.iter().map(OrderItem::line_total).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parsing_accepts_arabic_and_english() {
        assert_eq!("حلق".parse::<Category>(), Ok(Category::Earrings));
        assert_eq!("Rings".parse::<Category>(), Ok(Category::Rings));
        assert_eq!(" necklaces ".parse::<Category>(), Ok(Category::Necklaces));
        assert!("bracelets".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_serializes_with_arabic_label() {
        let json = serde_json::to_string(&Category::Rings).unwrap();
        assert_eq!(json, "\"خاتم\"");
    }

    #[test]
    fn test_category_deserializes_from_either_name() {
        let arabic: Category = serde_json::from_str("\"قلادة\"").unwrap();
        let english: Category = serde_json::from_str("\"Rings\"").unwrap();

        assert_eq!(arabic, Category::Necklaces);
        assert_eq!(english, Category::Rings);
        assert!(serde_json::from_str::<Category>("\"bracelets\"").is_err());
    }

    #[test]
    fn test_status_only_moves_forward() {
        assert!(OrderStatus::Pending.can_move_to(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_move_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Delivered.can_move_to(OrderStatus::Processed));
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("Processed".parse::<OrderStatus>(), Ok(OrderStatus::Processed));
        assert!("Cancelled".parse::<OrderStatus>().is_err());
    }
}
