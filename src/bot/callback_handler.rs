//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use tracing::debug;

use super::engine::BotEngine;
use super::message_handler::send_replies;

/// Handle the "order this product" buttons under product listings
pub async fn callback_handler(bot: Bot, q: CallbackQuery, engine: BotEngine) -> Result<()> {
    debug!(user_id = %q.from.id, data = ?q.data, "Received callback query from user");

    // Stop the button's loading spinner first
    bot.answer_callback_query(q.id.clone()).await?;

    let (Some(data), Some(message)) = (q.data.as_deref(), q.message.as_ref()) else {
        return Ok(());
    };
    let chat_id = message.chat().id;
    let language_code = q.from.language_code.as_deref();

    let replies = engine.handle_callback(chat_id, data, language_code).await?;
    send_replies(&bot, chat_id, replies).await
}
