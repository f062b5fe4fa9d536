//! # Configuration Module
//!
//! Runtime settings for the store: database location, HTTP port, Telegram
//! credentials, intake validation rules and the contact details the bot hands
//! out. Every section has a `Default` holding the reference values, and
//! `AppConfig::from_env` overrides them from the environment.

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://./database/store.db";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";
pub const DEFAULT_PHONE_PATTERN: &str = r"^(010|011|012|015)[0-9]{8}$";
pub const DEFAULT_CANCEL_KEYWORD: &str = "إلغاء الطلب";
pub const DEFAULT_OFFERS_MAX_PRICE: f64 = 200.0;
pub const DEFAULT_LANGUAGE: &str = "ar";

/// Validation thresholds shared by every order entry point
#[derive(Debug, Clone)]
pub struct IntakeSettings {
    /// Regex a phone number must match in full
    pub phone_pattern: String,
    /// Minimum customer name length in characters (after trimming)
    pub min_name_chars: usize,
    /// Minimum address length in characters (after trimming)
    pub min_address_chars: usize,
    /// Largest quantity accepted for a single order
    pub max_quantity: i64,
}

impl Default for IntakeSettings {
    fn default() -> Self {
        Self {
            phone_pattern: DEFAULT_PHONE_PATTERN.to_string(),
            min_name_chars: 2,
            min_address_chars: 10,
            max_quantity: 10,
        }
    }
}

/// Bot behaviour settings
#[derive(Debug, Clone)]
pub struct BotSettings {
    /// Text that aborts an order conversation at any step
    pub cancel_keyword: String,
    /// Products cheaper than this are listed by `/offers`
    pub offers_max_price: f64,
    /// Number of products shown by `/products`
    pub list_limit: usize,
    /// Number of products shown for a free-text search
    pub search_limit: usize,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            cancel_keyword: DEFAULT_CANCEL_KEYWORD.to_string(),
            offers_max_price: DEFAULT_OFFERS_MAX_PRICE,
            list_limit: 10,
            search_limit: 5,
        }
    }
}

/// Store contact details shown by `/contact`
#[derive(Debug, Clone)]
pub struct ContactInfo {
    pub phone: String,
    pub email: String,
    pub working_hours: String,
}

impl Default for ContactInfo {
    fn default() -> Self {
        Self {
            phone: "+20 123 456 7890".to_string(),
            email: "support@elegance-store.com".to_string(),
            working_hours: "السبت - الخميس، 9 صباحاً - 6 مساءً".to_string(),
        }
    }
}

/// Top-level application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    /// Origin allowed by CORS
    pub frontend_url: String,
    /// Bot is disabled when unset
    pub telegram_bot_token: Option<String>,
    /// Admin chat receiving new-order notifications; log-only when unset
    pub admin_chat_id: Option<i64>,
    /// Shared admin password; admin routes are open when unset
    pub admin_password: Option<String>,
    pub default_language: String,
    pub intake: IntakeSettings,
    pub bot: BotSettings,
    pub contact: ContactInfo,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            port: DEFAULT_PORT,
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            telegram_bot_token: None,
            admin_chat_id: None,
            admin_password: None,
            default_language: DEFAULT_LANGUAGE.to_string(),
            intake: IntakeSettings::default(),
            bot: BotSettings::default(),
            contact: ContactInfo::default(),
        }
    }
}

impl AppConfig {
    /// Build the configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            port: parse_var("PORT")?.unwrap_or(defaults.port),
            frontend_url: env::var("FRONTEND_URL").unwrap_or(defaults.frontend_url),
            telegram_bot_token: non_empty_var("TELEGRAM_BOT_TOKEN"),
            admin_chat_id: parse_var("ADMIN_CHAT_ID")?,
            admin_password: non_empty_var("ADMIN_PASSWORD"),
            default_language: env::var("DEFAULT_LANGUAGE").unwrap_or(defaults.default_language),
            intake: IntakeSettings {
                phone_pattern: env::var("PHONE_PATTERN")
                    .unwrap_or(defaults.intake.phone_pattern),
                ..defaults.intake
            },
            bot: BotSettings {
                cancel_keyword: env::var("CANCEL_KEYWORD")
                    .unwrap_or(defaults.bot.cancel_keyword),
                offers_max_price: parse_var("OFFERS_MAX_PRICE")?
                    .unwrap_or(defaults.bot.offers_max_price),
                ..defaults.bot
            },
            contact: ContactInfo {
                phone: env::var("CONTACT_PHONE").unwrap_or(defaults.contact.phone),
                email: env::var("CONTACT_EMAIL").unwrap_or(defaults.contact.email),
                working_hours: env::var("CONTACT_HOURS")
                    .unwrap_or(defaults.contact.working_hours),
            },
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_var<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match non_empty_var(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("Invalid value for {key}: {raw}")),
        None => Ok(None),
    }
}
