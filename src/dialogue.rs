//! Order conversation state and its transition function.
//!
//! `transition` is pure: it never touches the store or Telegram, which keeps
//! the whole conversation testable without a bot.

use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

use crate::errors::ValidationError;
use crate::models::Product;
use crate::order_intake::{IntakeRules, OrderIntakeRequest};

/// Where a chat is in the order conversation
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum OrderDialogueState {
    #[default]
    Idle,
    WaitingName {
        product: Product,
    },
    WaitingPhone {
        product: Product,
        customer_name: String,
    },
    WaitingAddress {
        product: Product,
        customer_name: String,
        phone_number: String,
    },
    WaitingQuantity {
        product: Product,
        customer_name: String,
        phone_number: String,
        address: String,
    },
}

impl OrderDialogueState {
    pub fn is_active(&self) -> bool {
        !matches!(self, OrderDialogueState::Idle)
    }

    /// Localization key of the question asked in this state
    pub fn prompt_key(&self) -> Option<&'static str> {
        match self {
            OrderDialogueState::Idle => None,
            OrderDialogueState::WaitingName { .. } => Some("order-ask-name"),
            OrderDialogueState::WaitingPhone { .. } => Some("order-ask-phone"),
            OrderDialogueState::WaitingAddress { .. } => Some("order-ask-address"),
            OrderDialogueState::WaitingQuantity { .. } => Some("order-ask-quantity"),
        }
    }

    pub fn product(&self) -> Option<&Product> {
        match self {
            OrderDialogueState::Idle => None,
            OrderDialogueState::WaitingName { product }
            | OrderDialogueState::WaitingPhone { product, .. }
            | OrderDialogueState::WaitingAddress { product, .. }
            | OrderDialogueState::WaitingQuantity { product, .. } => Some(product),
        }
    }
}

/// Result of feeding one customer message to the conversation
#[derive(Clone, Debug, PartialEq)]
pub enum Transition {
    /// Input accepted, ask the next question
    Next(OrderDialogueState),
    /// Input rejected, stay in the same state
    Retry(ValidationError),
    /// All fields collected
    Submit(OrderIntakeRequest),
    Cancelled,
    /// No conversation in progress
    Inactive,
}

pub type OrderDialogue = Dialogue<OrderDialogueState, InMemStorage<OrderDialogueState>>;

/// True when `input` aborts the conversation
pub fn is_cancel(input: &str, cancel_keyword: &str) -> bool {
    let input = input.trim();
    input == cancel_keyword.trim() || input == "/cancel"
}

pub fn transition(
    state: &OrderDialogueState,
    input: &str,
    rules: &IntakeRules,
    cancel_keyword: &str,
    chat_id: i64,
) -> Transition {
    if !state.is_active() {
        return Transition::Inactive;
    }
    if is_cancel(input, cancel_keyword) {
        return Transition::Cancelled;
    }

    match state {
        OrderDialogueState::Idle => Transition::Inactive,
        OrderDialogueState::WaitingName { product } => match rules.validate_name(input) {
            Ok(customer_name) => Transition::Next(OrderDialogueState::WaitingPhone {
                product: product.clone(),
                customer_name,
            }),
            Err(e) => Transition::Retry(e),
        },
        OrderDialogueState::WaitingPhone {
            product,
            customer_name,
        } => match rules.validate_phone(input) {
            Ok(phone_number) => Transition::Next(OrderDialogueState::WaitingAddress {
                product: product.clone(),
                customer_name: customer_name.clone(),
                phone_number,
            }),
            Err(e) => Transition::Retry(e),
        },
        OrderDialogueState::WaitingAddress {
            product,
            customer_name,
            phone_number,
        } => match rules.validate_address(input) {
            Ok(address) => Transition::Next(OrderDialogueState::WaitingQuantity {
                product: product.clone(),
                customer_name: customer_name.clone(),
                phone_number: phone_number.clone(),
                address,
            }),
            Err(e) => Transition::Retry(e),
        },
        OrderDialogueState::WaitingQuantity {
            product,
            customer_name,
            phone_number,
            address,
        } => match rules.parse_quantity(input) {
            Ok(quantity) => Transition::Submit(OrderIntakeRequest {
                customer_name: customer_name.clone(),
                phone_number: phone_number.clone(),
                address: address.clone(),
                product_id: product.id.clone(),
                quantity,
                telegram_chat_id: Some(chat_id),
                notes: None,
            }),
            Err(e) => Transition::Retry(e),
        },
    }
}
