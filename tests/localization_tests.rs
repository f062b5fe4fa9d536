//! # Localization Tests
//!
//! Message lookup, argument formatting and language fallback for the bundled
//! Arabic and English locales.

use elegance_store::localization::{t_args_lang, t_lang, LocalizationManager};
use std::collections::HashMap;

/// Every key the code looks up must exist in both locales
const REQUIRED_KEYS: &[&str] = &[
    "welcome-title",
    "help-commands",
    "products-title",
    "products-more",
    "search-empty",
    "order-ask-name",
    "order-ask-phone",
    "order-ask-address",
    "order-ask-quantity",
    "order-confirmed",
    "order-summary",
    "order-cancelled",
    "error-name-too-short",
    "error-phone-invalid",
    "error-address-too-short",
    "error-quantity-not-number",
    "error-quantity-range",
    "error-product-missing",
    "error-product-name",
    "error-product-price",
    "error-product-images",
    "error-status-invalid",
    "error-category-invalid",
    "error-status-regression",
    "error-fields-required",
    "error-product-not-found",
    "error-order-not-found",
    "error-order-failed",
    "error-unauthorized",
    "error-internal",
    "error-route-not-found",
    "api-order-created",
    "notify-title",
    "notify-customer",
];

fn setup_localization() -> LocalizationManager {
    LocalizationManager::new().expect("Failed to create localization manager")
}

#[test]
fn test_required_keys_exist_in_all_locales() {
    let manager = setup_localization();

    for language in ["ar", "en"] {
        for key in REQUIRED_KEYS {
            let message = manager.get_message_in_language(key, language, None);
            assert!(
                !message.starts_with("Missing"),
                "{key} missing in {language}"
            );
        }
    }
}

#[test]
fn test_get_message_nonexistent_key() {
    let manager = setup_localization();

    let message = manager.get_message_in_language("nonexistent-key", "en", None);
    assert!(message.starts_with("Missing translation:"));
}

#[test]
fn test_unsupported_language_falls_back_to_arabic() {
    let manager = setup_localization();

    assert!(!manager.is_language_supported("fr"));
    let message = manager.get_message_in_language("order-cancelled", "fr", None);
    assert!(message.contains("تم إلغاء الطلب"));
}

#[test]
fn test_resolve_language_from_telegram_codes() {
    let manager = setup_localization();

    assert_eq!(manager.resolve_language(Some("en-US")), "en");
    assert_eq!(manager.resolve_language(Some("AR")), "ar");
    assert_eq!(manager.resolve_language(Some("de")), "ar");
    assert_eq!(manager.resolve_language(None), "ar");
}

#[test]
fn test_get_message_with_args() {
    let manager = setup_localization();

    let mut args = HashMap::new();
    args.insert("count", "7".to_string());

    let message = manager.get_message_in_language("products-more", "en", Some(&args));
    assert!(message.contains('7'));
}

#[test]
fn test_messages_have_no_isolation_marks() {
    let message = t_args_lang("search-title", &[("query", "خاتم")], Some("en"));
    assert_eq!(message, "🔍 Search results for \"خاتم\":");
}

#[test]
fn test_store_name_term_is_resolved() {
    let message = t_lang("welcome-title", Some("en"));
    assert!(message.contains("Elegance Stainless Store"));
}
