//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use teloxide::prelude::*;
use tracing::debug;

use crate::localization::t_lang;

use super::engine::{BotEngine, Reply};

/// Send the engine's replies to a chat, in order
pub async fn send_replies(bot: &Bot, chat_id: ChatId, replies: Vec<Reply>) -> Result<()> {
    for reply in replies {
        let request = bot.send_message(chat_id, reply.text);
        match reply.markup {
            Some(markup) => request.reply_markup(markup).await?,
            None => request.await?,
        };
    }
    Ok(())
}

pub async fn message_handler(bot: Bot, msg: Message, engine: BotEngine) -> Result<()> {
    // Extract user's language code from Telegram
    let language_code = msg
        .from
        .as_ref()
        .and_then(|user| user.language_code.as_deref());

    let replies = match msg.text() {
        Some(text) => {
            debug!(chat_id = %msg.chat.id, "Received text message");
            engine.handle_message(msg.chat.id, text, language_code).await?
        }
        None => {
            debug!(chat_id = %msg.chat.id, "Received unsupported message type");
            vec![Reply::text(t_lang("unsupported-message", language_code))]
        }
    };

    send_replies(&bot, msg.chat.id, replies).await
}
