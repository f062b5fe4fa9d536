//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, KeyboardRemove,
};

use crate::localization::t_args_lang;
use crate::models::Product;

/// Prefix of the callback data carried by "order this product" buttons
pub const ORDER_CALLBACK_PREFIX: &str = "order:";

const BUTTON_LABEL_CHARS: usize = 30;

/// Format products as a numbered list starting at 1
pub fn format_product_list(products: &[Product], language_code: Option<&str>) -> String {
    let mut result = String::new();

    for (i, product) in products.iter().enumerate() {
        let price = format_price(product.price);
        result.push_str(&format!(
            "{}. {} {}\n   {}\n",
            i + 1,
            product.category.emoji(),
            product.name,
            t_args_lang("product-price", &[("price", price.as_str())], language_code)
        ));
        if !product.description.is_empty() {
            result.push_str(&format!("   📝 {}\n", product.description));
        }
    }

    result
}

/// Prices are shown without decimals when they are whole amounts
pub fn format_price(price: f64) -> String {
    if price.fract() == 0.0 {
        format!("{price:.0}")
    } else {
        format!("{price:.2}")
    }
}

pub fn order_callback_data(product: &Product) -> String {
    format!("{ORDER_CALLBACK_PREFIX}{}", product.id)
}

/// One "order" button per product
pub fn create_order_keyboard(products: &[Product], language_code: Option<&str>) -> InlineKeyboardMarkup {
    let buttons = products
        .iter()
        .map(|product| {
            let name: String = if product.name.chars().count() > BUTTON_LABEL_CHARS {
                let short: String = product.name.chars().take(BUTTON_LABEL_CHARS - 3).collect();
                format!("{short}...")
            } else {
                product.name.clone()
            };
            vec![InlineKeyboardButton::callback(
                t_args_lang("order-button", &[("product", name.as_str())], language_code),
                order_callback_data(product),
            )]
        })
        .collect::<Vec<_>>();

    InlineKeyboardMarkup::new(buttons)
}

/// Reply keyboard offering the cancel keyword during an order
pub fn create_cancel_keyboard(cancel_keyword: &str) -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![KeyboardButton::new(cancel_keyword)]])
}

pub fn remove_keyboard() -> KeyboardRemove {
    KeyboardRemove::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use chrono::Utc;
    use teloxide::types::InlineKeyboardButtonKind;

    fn product(id: &str, name: &str, price: f64) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            description: "Stainless steel".to_string(),
            price,
            category: Category::Rings,
            images: vec![],
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_price_formatting() {
        assert_eq!(format_price(150.0), "150");
        assert_eq!(format_price(99.5), "99.50");
    }

    #[test]
    fn test_product_list_is_numbered() {
        let list = format_product_list(
            &[product("a", "Ring", 150.0), product("b", "Chain", 80.0)],
            Some("en"),
        );

        assert!(list.starts_with("1. 💍 Ring"));
        assert!(list.contains("2. 💍 Chain"));
        assert!(list.contains("150 EGP"));
    }

    #[test]
    fn test_order_keyboard_carries_product_ids() {
        let keyboard = create_order_keyboard(&[product("p-7", "Ring", 150.0)], Some("en"));

        let button = &keyboard.inline_keyboard[0][0];
        assert_eq!(
            button.kind,
            InlineKeyboardButtonKind::CallbackData("order:p-7".to_string())
        );
    }

    #[test]
    fn test_long_names_are_shortened_on_buttons() {
        let long_name = "ق".repeat(50);
        let keyboard = create_order_keyboard(&[product("p", &long_name, 10.0)], Some("en"));

        assert!(keyboard.inline_keyboard[0][0].text.ends_with("..."));
    }
}
