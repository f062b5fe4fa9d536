//! Bot conversation engine.
//!
//! Turns one incoming chat message or button press into the replies to send.
//! The engine knows nothing about Telegram transport, so the whole bot can be
//! driven from tests with plain strings.

use anyhow::Result;
use sqlx::SqlitePool;
use std::sync::Arc;
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};
use teloxide::types::{ChatId, ReplyMarkup};
use tracing::{debug, error};

use crate::config::{BotSettings, ContactInfo};
use crate::db;
use crate::dialogue::{is_cancel, OrderDialogue, OrderDialogueState};
use crate::localization::t_lang;
use crate::order_intake::OrderIntake;

use super::catalog;
use super::dialogue_manager;
use super::ui_builder::ORDER_CALLBACK_PREFIX;

/// One outgoing message
#[derive(Debug, Clone)]
pub struct Reply {
    pub text: String,
    pub markup: Option<ReplyMarkup>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markup: None,
        }
    }

    pub fn with_markup(text: impl Into<String>, markup: impl Into<ReplyMarkup>) -> Self {
        Self {
            text: text.into(),
            markup: Some(markup.into()),
        }
    }
}

/// Catalog browsing and order conversations for every chat
#[derive(Clone)]
pub struct BotEngine {
    pub(crate) pool: SqlitePool,
    pub(crate) intake: OrderIntake,
    pub(crate) settings: BotSettings,
    pub(crate) contact: ContactInfo,
    conversations: Arc<InMemStorage<OrderDialogueState>>,
}

impl BotEngine {
    pub fn new(
        pool: SqlitePool,
        intake: OrderIntake,
        settings: BotSettings,
        contact: ContactInfo,
    ) -> Self {
        Self {
            pool,
            intake,
            settings,
            contact,
            conversations: InMemStorage::new(),
        }
    }

    /// Conversation storage shared with the dispatcher
    pub fn conversations(&self) -> Arc<InMemStorage<OrderDialogueState>> {
        Arc::clone(&self.conversations)
    }

    pub fn dialogue(&self, chat_id: ChatId) -> OrderDialogue {
        Dialogue::new(self.conversations(), chat_id)
    }

    /// Current conversation state of a chat
    pub async fn conversation_state(&self, chat_id: ChatId) -> Result<OrderDialogueState> {
        Ok(self.dialogue(chat_id).get().await?.unwrap_or_default())
    }

    /// Handle a text message
    pub async fn handle_message(
        &self,
        chat_id: ChatId,
        text: &str,
        language_code: Option<&str>,
    ) -> Result<Vec<Reply>> {
        let text = text.trim();
        let dialogue = self.dialogue(chat_id);
        let state = dialogue.get().await?.unwrap_or_default();
        debug!(chat_id = %chat_id, active = state.is_active(), "Handling message");

        if is_cancel(text, &self.settings.cancel_keyword) {
            return dialogue_manager::cancel_order(&dialogue, &state, language_code).await;
        }

        if let Some(command) = parse_command(text) {
            if let Some(index) = command.strip_prefix("/order_") {
                return dialogue_manager::start_order_by_index(self, &dialogue, index, language_code)
                    .await;
            }
            let replies = catalog::handle_command(self, command, language_code).await;
            return Ok(answer_catalog(replies, language_code));
        }

        if state.is_active() {
            return dialogue_manager::handle_order_input(self, &dialogue, state, text, language_code)
                .await;
        }

        let replies =
            catalog::search(&self.pool, text, self.settings.search_limit, language_code).await;
        Ok(answer_catalog(replies, language_code))
    }

    /// Handle an inline keyboard button press
    pub async fn handle_callback(
        &self,
        chat_id: ChatId,
        data: &str,
        language_code: Option<&str>,
    ) -> Result<Vec<Reply>> {
        debug!(chat_id = %chat_id, data = %data, "Handling callback");

        let Some(product_id) = data.strip_prefix(ORDER_CALLBACK_PREFIX) else {
            return Ok(vec![Reply::text(t_lang("unknown-command", language_code))]);
        };

        let dialogue = self.dialogue(chat_id);
        match db::get_product_by_id(&self.pool, product_id).await {
            Ok(Some(product)) => {
                dialogue_manager::start_order(self, &dialogue, product, language_code).await
            }
            Ok(None) => Ok(vec![Reply::text(t_lang("error-product-not-found", language_code))]),
            Err(e) => {
                error!(chat_id = %chat_id, error = %e, "Failed to load product for order button");
                Ok(vec![Reply::text(t_lang("catalog-error", language_code))])
            }
        }
    }
}

/// Replace store failures in catalog replies with an apology
fn answer_catalog(result: Result<Vec<Reply>>, language_code: Option<&str>) -> Vec<Reply> {
    result.unwrap_or_else(|e| {
        error!(error = %e, "Catalog request failed");
        vec![Reply::text(t_lang("catalog-error", language_code))]
    })
}

/// Command word without arguments or a `@botname` suffix
fn parse_command(text: &str) -> Option<&str> {
    if !text.starts_with('/') {
        return None;
    }
    let word = text.split_whitespace().next()?;
    word.split('@').next()
}
