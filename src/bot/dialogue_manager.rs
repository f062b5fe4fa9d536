//! Dialogue Manager module for driving the order conversation

use anyhow::Result;
use tracing::{error, info, warn};

use crate::db;
use crate::dialogue::{transition, OrderDialogue, OrderDialogueState, Transition};
use crate::localization::{t_args_lang, t_lang};
use crate::models::{Order, Product};
use crate::order_intake::OrderIntakeRequest;

use super::engine::{BotEngine, Reply};
use super::ui_builder::{create_cancel_keyboard, format_price, remove_keyboard};

/// Question asked in `state`
fn prompt(engine: &BotEngine, state: &OrderDialogueState, language_code: Option<&str>) -> String {
    match state {
        OrderDialogueState::WaitingQuantity { .. } => {
            let max = engine.intake.rules().max_quantity().to_string();
            t_args_lang("order-ask-quantity", &[("max", max.as_str())], language_code)
        }
        other => other
            .prompt_key()
            .map(|key| t_lang(key, language_code))
            .unwrap_or_default(),
    }
}

/// Begin an order for `product`, replacing any conversation in progress
pub async fn start_order(
    engine: &BotEngine,
    dialogue: &OrderDialogue,
    product: Product,
    language_code: Option<&str>,
) -> Result<Vec<Reply>> {
    info!(chat_id = %dialogue.chat_id(), product_id = %product.id, "Starting order conversation");

    let price = format_price(product.price);
    let intro = t_args_lang(
        "order-started",
        &[("product", product.name.as_str()), ("price", price.as_str())],
        language_code,
    );
    let hint = t_args_lang(
        "order-cancel-hint",
        &[("cancel", engine.settings.cancel_keyword.as_str())],
        language_code,
    );

    let state = OrderDialogueState::WaitingName { product };
    let text = format!("{intro}\n\n{}\n\n{hint}", prompt(engine, &state, language_code));
    dialogue.update(state).await?;

    Ok(vec![Reply::with_markup(
        text,
        create_cancel_keyboard(&engine.settings.cancel_keyword),
    )])
}

/// `/order_<n>`: order the n-th product of the `/products` listing
pub async fn start_order_by_index(
    engine: &BotEngine,
    dialogue: &OrderDialogue,
    index: &str,
    language_code: Option<&str>,
) -> Result<Vec<Reply>> {
    let position = match index.trim().parse::<usize>() {
        Ok(n) if n >= 1 => n - 1,
        _ => return Ok(vec![Reply::text(t_lang("order-invalid-index", language_code))]),
    };

    let products = match db::get_all_products(&engine.pool).await {
        Ok(products) => products,
        Err(e) => {
            error!(chat_id = %dialogue.chat_id(), error = %e, "Failed to load products for order");
            return Ok(vec![Reply::text(t_lang("catalog-error", language_code))]);
        }
    };

    match products.into_iter().nth(position) {
        Some(product) => start_order(engine, dialogue, product, language_code).await,
        None => Ok(vec![Reply::text(t_lang("order-invalid-index", language_code))]),
    }
}

/// Cancel keyword or `/cancel`
pub async fn cancel_order(
    dialogue: &OrderDialogue,
    state: &OrderDialogueState,
    language_code: Option<&str>,
) -> Result<Vec<Reply>> {
    if !state.is_active() {
        return Ok(vec![Reply::text(t_lang("order-nothing-to-cancel", language_code))]);
    }

    dialogue.exit().await?;
    info!(chat_id = %dialogue.chat_id(), "Order conversation cancelled");

    Ok(vec![Reply::with_markup(
        t_lang("order-cancelled", language_code),
        remove_keyboard(),
    )])
}

/// Feed a customer answer to the active conversation
pub async fn handle_order_input(
    engine: &BotEngine,
    dialogue: &OrderDialogue,
    state: OrderDialogueState,
    input: &str,
    language_code: Option<&str>,
) -> Result<Vec<Reply>> {
    let chat_id = dialogue.chat_id();
    let step = transition(
        &state,
        input,
        engine.intake.rules(),
        &engine.settings.cancel_keyword,
        chat_id.0,
    );

    match step {
        Transition::Next(next) => {
            let question = prompt(engine, &next, language_code);
            dialogue.update(next).await?;
            Ok(vec![Reply::text(question)])
        }
        Transition::Retry(e) => {
            warn!(chat_id = %chat_id, error = %e, "Order input rejected");
            Ok(vec![Reply::text(format!(
                "{}\n\n{}",
                t_lang(e.key(), language_code),
                prompt(engine, &state, language_code)
            ))])
        }
        Transition::Submit(request) => submit(engine, dialogue, request, language_code).await,
        Transition::Cancelled => cancel_order(dialogue, &state, language_code).await,
        Transition::Inactive => Ok(Vec::new()),
    }
}

/// Create the order and end the conversation whatever the outcome
async fn submit(
    engine: &BotEngine,
    dialogue: &OrderDialogue,
    request: OrderIntakeRequest,
    language_code: Option<&str>,
) -> Result<Vec<Reply>> {
    let chat_id = dialogue.chat_id();
    let result = engine.intake.create_order(request).await;
    dialogue.exit().await?;

    let text = match result {
        Ok(order) => {
            info!(chat_id = %chat_id, order_id = %order.id, "Order placed from chat");
            confirmation(&order, language_code)
        }
        Err(e) => {
            error!(chat_id = %chat_id, error = %e, "Order submission failed");
            t_lang(e.key(), language_code)
        }
    };

    Ok(vec![Reply::with_markup(text, remove_keyboard())])
}

fn confirmation(order: &Order, language_code: Option<&str>) -> String {
    let (product, quantity) = order
        .items
        .first()
        .map(|item| (item.product_name.clone(), item.quantity.to_string()))
        .unwrap_or_default();
    let total = format_price(order.total_amount);

    [
        t_lang("order-confirmed", language_code),
        t_args_lang(
            "order-summary",
            &[
                ("order_id", order.id.as_str()),
                ("product", product.as_str()),
                ("quantity", quantity.as_str()),
                ("total", total.as_str()),
            ],
            language_code,
        ),
        t_lang("order-confirmed-final", language_code),
    ]
    .join("\n\n")
}
