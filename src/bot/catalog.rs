//! Catalog commands: welcome, help, listings, categories, offers, contact and search

use anyhow::Result;
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::debug;

use crate::db;
use crate::localization::{t_args_lang, t_lang};
use crate::models::{Category, Product};

use super::engine::{BotEngine, Reply};
use super::ui_builder::{create_order_keyboard, format_product_list};

/// Answer a slash command other than `/order_` and `/cancel`
pub async fn handle_command(
    engine: &BotEngine,
    command: &str,
    language_code: Option<&str>,
) -> Result<Vec<Reply>> {
    debug!(command = %command, "Catalog command");

    let replies = match command {
        "/start" => vec![welcome(language_code)],
        "/help" => vec![help(&engine.settings.cancel_keyword, language_code)],
        "/contact" => vec![contact(engine, language_code)],
        "/products" => vec![list_products(&engine.pool, engine.settings.list_limit, language_code).await?],
        "/categories" => vec![categories(language_code)],
        "/offers" => vec![offers(&engine.pool, engine.settings.offers_max_price, language_code).await?],
        other => match other.strip_prefix("/category_") {
            Some(name) => vec![category_products(&engine.pool, name, language_code).await?],
            None => vec![Reply::text(t_lang("unknown-command", language_code))],
        },
    };

    Ok(replies)
}

pub fn welcome(language_code: Option<&str>) -> Reply {
    Reply::text(
        [
            t_lang("welcome-title", language_code),
            t_lang("welcome-description", language_code),
            t_lang("welcome-categories", language_code),
            t_lang("welcome-commands", language_code),
            t_lang("welcome-final", language_code),
        ]
        .join("\n\n"),
    )
}

pub fn help(cancel_keyword: &str, language_code: Option<&str>) -> Reply {
    Reply::text(
        [
            t_lang("help-title", language_code),
            t_lang("help-commands", language_code),
            t_args_lang("help-tips", &[("cancel", cancel_keyword)], language_code),
            t_lang("help-final", language_code),
        ]
        .join("\n\n"),
    )
}

fn contact(engine: &BotEngine, language_code: Option<&str>) -> Reply {
    let contact = &engine.contact;
    Reply::text(format!(
        "{}\n\n{}\n\n{}",
        t_lang("contact-title", language_code),
        t_args_lang(
            "contact-details",
            &[
                ("phone", contact.phone.as_str()),
                ("email", contact.email.as_str()),
                ("hours", contact.working_hours.as_str()),
            ],
            language_code,
        ),
        t_lang("contact-final", language_code)
    ))
}

/// Listing with an order button per product
fn listing(title: String, products: &[Product], footer: Option<String>, language_code: Option<&str>) -> Reply {
    let mut text = format!("{title}\n\n{}", format_product_list(products, language_code));
    if let Some(footer) = footer {
        text.push('\n');
        text.push_str(&footer);
    }
    Reply::with_markup(text.trim_end(), create_order_keyboard(products, language_code))
}

/// First `limit` products of the catalog, numbered for `/order_<n>`
pub async fn list_products(pool: &SqlitePool, limit: usize, language_code: Option<&str>) -> Result<Reply> {
    let products = db::get_all_products(pool).await?;
    if products.is_empty() {
        return Ok(Reply::text(t_lang("products-empty", language_code)));
    }

    let shown = &products[..products.len().min(limit)];
    let mut footer = String::new();
    if products.len() > shown.len() {
        let rest = (products.len() - shown.len()).to_string();
        footer.push_str(&t_args_lang("products-more", &[("count", rest.as_str())], language_code));
        footer.push_str("\n\n");
    }
    footer.push_str(&t_lang("products-order-hint", language_code));

    Ok(listing(
        t_lang("products-title", language_code),
        shown,
        Some(footer),
        language_code,
    ))
}

pub fn categories(language_code: Option<&str>) -> Reply {
    let lines = Category::ALL
        .iter()
        .map(|category| format!("{} {} /category_{}", category.emoji(), category, category.as_str()))
        .collect::<Vec<_>>()
        .join("\n");

    Reply::text(format!("{}\n\n{}", t_lang("categories-title", language_code), lines))
}

pub async fn category_products(pool: &SqlitePool, name: &str, language_code: Option<&str>) -> Result<Reply> {
    let Ok(category) = Category::from_str(name) else {
        return Ok(Reply::text(t_args_lang("category-unknown", &[("category", name)], language_code)));
    };

    let products = db::get_products_by_category(pool, category).await?;
    if products.is_empty() {
        return Ok(Reply::text(t_args_lang(
            "category-empty",
            &[("category", category.as_str())],
            language_code,
        )));
    }

    Ok(listing(
        t_args_lang("category-title", &[("category", category.as_str())], language_code),
        &products,
        None,
        language_code,
    ))
}

/// Products cheaper than `max_price`
pub async fn offers(pool: &SqlitePool, max_price: f64, language_code: Option<&str>) -> Result<Reply> {
    let products = db::get_products_by_max_price(pool, max_price).await?;
    if products.is_empty() {
        return Ok(Reply::text(t_lang("offers-empty", language_code)));
    }

    Ok(listing(t_lang("offers-title", language_code), &products, None, language_code))
}

/// Free-text search over product names and descriptions
pub async fn search(
    pool: &SqlitePool,
    query: &str,
    limit: usize,
    language_code: Option<&str>,
) -> Result<Vec<Reply>> {
    let products = db::search_products(pool, query).await?;
    if products.is_empty() {
        return Ok(vec![Reply::text(t_args_lang(
            "search-empty",
            &[("query", query)],
            language_code,
        ))]);
    }

    let shown = &products[..products.len().min(limit)];
    let footer = (products.len() > shown.len()).then(|| {
        let rest = (products.len() - shown.len()).to_string();
        t_args_lang("search-more", &[("count", rest.as_str())], language_code)
    });

    Ok(vec![listing(
        t_args_lang("search-title", &[("query", query)], language_code),
        shown,
        footer,
        language_code,
    )])
}
