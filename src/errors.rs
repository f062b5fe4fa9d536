//! # Error Types Module
//!
//! Domain errors for order intake and notification delivery. Validation
//! errors carry the localization key of the message shown to the customer.

use thiserror::Error;

/// Rejected user input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("customer name is too short")]
    NameTooShort,
    #[error("phone number does not match the expected format")]
    InvalidPhone,
    #[error("address is too short")]
    AddressTooShort,
    #[error("quantity is not a whole number")]
    QuantityNotANumber,
    #[error("quantity is outside the accepted range")]
    QuantityOutOfRange,
    #[error("product id is missing")]
    MissingProduct,
    #[error("product name is required")]
    ProductNameMissing,
    #[error("product price must be positive")]
    ProductPriceInvalid,
    #[error("product needs at least one image")]
    ProductImagesMissing,
    #[error("unknown order status: {0}")]
    UnknownStatus(String),
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("order status cannot move back from {from} to {to}")]
    StatusRegression { from: String, to: String },
    #[error("malformed request: {0}")]
    MalformedRequest(String),
}

impl ValidationError {
    /// Localization key for the customer-facing message
    pub fn key(&self) -> &'static str {
        match self {
            ValidationError::NameTooShort => "error-name-too-short",
            ValidationError::InvalidPhone => "error-phone-invalid",
            ValidationError::AddressTooShort => "error-address-too-short",
            ValidationError::QuantityNotANumber => "error-quantity-not-number",
            ValidationError::QuantityOutOfRange => "error-quantity-range",
            ValidationError::MissingProduct => "error-product-missing",
            ValidationError::ProductNameMissing => "error-product-name",
            ValidationError::ProductPriceInvalid => "error-product-price",
            ValidationError::ProductImagesMissing => "error-product-images",
            ValidationError::UnknownStatus(_) => "error-status-invalid",
            ValidationError::UnknownCategory(_) => "error-category-invalid",
            ValidationError::StatusRegression { .. } => "error-status-regression",
            ValidationError::MalformedRequest(_) => "error-fields-required",
        }
    }
}

/// Failure of the order intake protocol
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("product not found: {0}")]
    ProductNotFound(String),
    #[error("order could not be persisted: {0:#}")]
    Persistence(#[from] anyhow::Error),
}

impl OrderError {
    pub fn key(&self) -> &'static str {
        match self {
            OrderError::Validation(e) => e.key(),
            OrderError::ProductNotFound(_) => "error-product-not-found",
            OrderError::Persistence(_) => "error-order-failed",
        }
    }
}

/// Failure to deliver a new-order notification; never fails the order
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}
