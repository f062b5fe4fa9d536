//! # Order Intake Module
//!
//! The one path by which an order enters the store, shared by the HTTP API,
//! the bot and the storefront client: validate the request, resolve and
//! snapshot the product, persist header and items in one transaction, then
//! queue the admin notification without waiting for it.

use chrono::Utc;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::IntakeSettings;
use crate::db;
use crate::errors::{OrderError, ValidationError};
use crate::models::{Order, OrderItem, OrderStatus, Product};
use crate::notification::NotificationQueue;

/// Field validation rules, identical for every entry point
#[derive(Debug, Clone)]
pub struct IntakeRules {
    phone_regex: Regex,
    min_name_chars: usize,
    min_address_chars: usize,
    max_quantity: i64,
}

impl IntakeRules {
    pub fn from_settings(settings: &IntakeSettings) -> anyhow::Result<Self> {
        let phone_regex = compile_phone_pattern(&settings.phone_pattern)
            .map_err(|e| anyhow::anyhow!("Invalid phone pattern {}: {e}", settings.phone_pattern))?;

        Ok(Self {
            phone_regex,
            min_name_chars: settings.min_name_chars,
            min_address_chars: settings.min_address_chars,
            max_quantity: settings.max_quantity,
        })
    }

    pub fn max_quantity(&self) -> i64 {
        self.max_quantity
    }

    /// Returns the trimmed name
    pub fn validate_name(&self, name: &str) -> Result<String, ValidationError> {
        let trimmed = name.trim();
        if trimmed.chars().count() < self.min_name_chars {
            return Err(ValidationError::NameTooShort);
        }
        Ok(trimmed.to_string())
    }

    pub fn validate_phone(&self, phone: &str) -> Result<String, ValidationError> {
        let trimmed = phone.trim();
        if !self.phone_regex.is_match(trimmed) {
            return Err(ValidationError::InvalidPhone);
        }
        Ok(trimmed.to_string())
    }

    pub fn validate_address(&self, address: &str) -> Result<String, ValidationError> {
        let trimmed = address.trim();
        if trimmed.chars().count() < self.min_address_chars {
            return Err(ValidationError::AddressTooShort);
        }
        Ok(trimmed.to_string())
    }

    pub fn validate_quantity(&self, quantity: i64) -> Result<i64, ValidationError> {
        if !(1..=self.max_quantity).contains(&quantity) {
            return Err(ValidationError::QuantityOutOfRange);
        }
        Ok(quantity)
    }

    /// Parse a quantity typed by a customer
    pub fn parse_quantity(&self, input: &str) -> Result<i64, ValidationError> {
        let quantity = input
            .trim()
            .parse::<i64>()
            .map_err(|_| ValidationError::QuantityNotANumber)?;
        self.validate_quantity(quantity)
    }
}

/// Phone patterns match ASCII digits only, so `\d` never accepts ٠-٩
fn compile_phone_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).unicode(false).build()
}

impl Default for IntakeRules {
    fn default() -> Self {
        let settings = IntakeSettings::default();
        Self {
            phone_regex: compile_phone_pattern(&settings.phone_pattern)
                .expect("Default phone pattern should be valid"),
            min_name_chars: settings.min_name_chars,
            min_address_chars: settings.min_address_chars,
            max_quantity: settings.max_quantity,
        }
    }
}

/// Canonical order payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderIntakeRequest {
    pub customer_name: String,
    pub phone_number: String,
    pub address: String,
    pub product_id: String,
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram_chat_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl OrderIntakeRequest {
    /// Check every field and return a copy with trimmed values
    pub fn validate(&self, rules: &IntakeRules) -> Result<Self, ValidationError> {
        let product_id = self.product_id.trim();
        if product_id.is_empty() {
            return Err(ValidationError::MissingProduct);
        }

        Ok(Self {
            customer_name: rules.validate_name(&self.customer_name)?,
            phone_number: rules.validate_phone(&self.phone_number)?,
            address: rules.validate_address(&self.address)?,
            product_id: product_id.to_string(),
            quantity: rules.validate_quantity(self.quantity)?,
            telegram_chat_id: self.telegram_chat_id,
            notes: self
                .notes
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        })
    }

    /// Build a pending order priced from the product snapshot
    pub fn into_order(self, id: String, product: &Product) -> Order {
        let items = vec![OrderItem::snapshot(product, self.quantity)];
        Order {
            id,
            customer_name: self.customer_name,
            phone_number: self.phone_number,
            address: self.address,
            total_amount: Order::items_total(&items),
            items,
            status: OrderStatus::Pending,
            order_date: Utc::now(),
            telegram_chat_id: self.telegram_chat_id,
            notes: self.notes,
        }
    }
}

/// Creates orders against the store and feeds the notification queue
#[derive(Clone)]
pub struct OrderIntake {
    pool: SqlitePool,
    rules: IntakeRules,
    notifications: NotificationQueue,
}

impl OrderIntake {
    pub fn new(pool: SqlitePool, rules: IntakeRules, notifications: NotificationQueue) -> Self {
        Self {
            pool,
            rules,
            notifications,
        }
    }

    pub fn rules(&self) -> &IntakeRules {
        &self.rules
    }

    pub async fn create_order(&self, request: OrderIntakeRequest) -> Result<Order, OrderError> {
        let request = request.validate(&self.rules).inspect_err(|e| {
            warn!(product_id = %request.product_id, error = %e, "Order rejected by validation");
        })?;

        let product = db::get_product_by_id(&self.pool, &request.product_id)
            .await?
            .ok_or_else(|| OrderError::ProductNotFound(request.product_id.clone()))?;

        let order = request.into_order(Uuid::new_v4().to_string(), &product);
        db::insert_order(&self.pool, &order).await?;

        info!(
            order_id = %order.id,
            product_id = %product.id,
            total = order.total_amount,
            "Order created"
        );

        self.notifications.enqueue(order.clone());
        Ok(order)
    }
}
