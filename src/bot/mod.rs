//! Bot module for handling Telegram interactions
//!
//! - `engine`: turns messages and button presses into replies
//! - `catalog`: product listings, search and informational commands
//! - `dialogue_manager`: the order conversation
//! - `ui_builder`: keyboards and message formatting
//! - `message_handler` / `callback_handler`: Telegram transport

pub mod callback_handler;
pub mod catalog;
pub mod dialogue_manager;
pub mod engine;
pub mod message_handler;
pub mod ui_builder;

use teloxide::prelude::*;
use tracing::info;

pub use callback_handler::callback_handler;
pub use engine::{BotEngine, Reply};
pub use message_handler::message_handler;

/// Run the Telegram dispatcher until Ctrl-C
pub async fn run_dispatcher(bot: Bot, engine: BotEngine) {
    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(message_handler))
        .branch(Update::filter_callback_query().endpoint(callback_handler));

    info!("Bot initialized, starting dispatcher");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![engine])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
