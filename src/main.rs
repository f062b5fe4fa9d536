use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use elegance_store::api::{self, AppState};
use elegance_store::bot::{self, BotEngine};
use elegance_store::config::AppConfig;
use elegance_store::db;
use elegance_store::notification::{LogNotifier, NotificationQueue, NotificationSink, TelegramNotifier};
use elegance_store::order_intake::{IntakeRules, OrderIntake};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // RUST_LOG controls verbosity; LOG_FORMAT=json switches to JSON lines
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json") {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("Starting Elegance Store");

    let config = AppConfig::from_env()?;

    info!(database_url = %config.database_url, "Initializing database");
    let pool = db::connect(&config.database_url).await?;
    db::init_database_schema(&pool).await?;

    let bot = config.telegram_bot_token.as_deref().map(Bot::new);
    if bot.is_none() {
        warn!("TELEGRAM_BOT_TOKEN not set, bot disabled");
    }

    let sink: Arc<dyn NotificationSink> = match (&bot, config.admin_chat_id) {
        (Some(bot), Some(admin_chat_id)) => Arc::new(TelegramNotifier::new(
            bot.clone(),
            admin_chat_id,
            Some(config.default_language.clone()),
        )),
        _ => {
            info!("No admin chat configured, new orders are logged only");
            Arc::new(LogNotifier)
        }
    };
    let (notifications, _worker) = NotificationQueue::spawn(sink);

    let rules = IntakeRules::from_settings(&config.intake)?;
    let intake = OrderIntake::new(pool.clone(), rules, notifications);

    if let Some(bot) = bot {
        let engine = BotEngine::new(
            pool.clone(),
            intake.clone(),
            config.bot.clone(),
            config.contact.clone(),
        );
        tokio::spawn(bot::run_dispatcher(bot, engine));
    }

    let state = AppState::new(
        pool,
        intake,
        config.admin_password.clone(),
        config.bot.offers_max_price,
    );
    let app = api::router(state).layer(api::cors_layer(&config.frontend_url)?);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down");
        })
        .await
        .context("HTTP server failed")?;

    Ok(())
}
