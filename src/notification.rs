//! # Notification Module
//!
//! Delivers a summary of every new order to the store admin. Delivery runs on
//! a background worker fed by an unbounded queue: enqueueing never blocks the
//! order that triggered it, and a failed delivery is logged and dropped.

use async_trait::async_trait;
use std::sync::Arc;
use teloxide::prelude::*;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::errors::NotificationError;
use crate::localization::{t_args_lang, t_lang};
use crate::models::Order;

/// Destination for new-order notifications
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, order: &Order) -> Result<(), NotificationError>;
}

/// Build the admin-facing summary of an order
pub fn format_order_summary(order: &Order, language_code: Option<&str>) -> String {
    let total = format!("{:.2}", order.total_amount);
    let mut sections = vec![
        t_lang("notify-title", language_code),
        t_args_lang(
            "notify-customer",
            &[
                ("name", order.customer_name.as_str()),
                ("phone", order.phone_number.as_str()),
                ("address", order.address.as_str()),
                ("total", total.as_str()),
            ],
            language_code,
        ),
    ];

    let mut items = t_lang("notify-items", language_code);
    for item in &order.items {
        items.push_str(&format!(
            "\n• {} × {} ({:.2})",
            item.product_name, item.quantity, item.price
        ));
    }
    sections.push(items);

    let date = order.order_date.format("%Y-%m-%d %H:%M").to_string();
    sections.push(t_args_lang(
        "notify-footer",
        &[("date", date.as_str()), ("order_id", order.id.as_str())],
        language_code,
    ));

    if let Some(notes) = order.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        sections.push(t_args_lang("notify-notes", &[("notes", notes)], language_code));
    }

    sections.join("\n\n")
}

/// Sends the summary to an admin Telegram chat
pub struct TelegramNotifier {
    bot: Bot,
    admin_chat: ChatId,
    language_code: Option<String>,
}

impl TelegramNotifier {
    pub fn new(bot: Bot, admin_chat_id: i64, language_code: Option<String>) -> Self {
        Self {
            bot,
            admin_chat: ChatId(admin_chat_id),
            language_code,
        }
    }
}

#[async_trait]
impl NotificationSink for TelegramNotifier {
    async fn notify(&self, order: &Order) -> Result<(), NotificationError> {
        let summary = format_order_summary(order, self.language_code.as_deref());
        self.bot
            .send_message(self.admin_chat, summary)
            .await
            .map_err(|e| NotificationError::Delivery(e.to_string()))?;
        debug!(order_id = %order.id, chat_id = %self.admin_chat, "Admin notified");
        Ok(())
    }
}

/// Writes the summary to the log; used when no admin chat is configured
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn notify(&self, order: &Order) -> Result<(), NotificationError> {
        info!(
            order_id = %order.id,
            summary = %format_order_summary(order, None),
            "New order"
        );
        Ok(())
    }
}

/// Handle to the notification worker
#[derive(Clone)]
pub struct NotificationQueue {
    sender: mpsc::UnboundedSender<Order>,
}

impl NotificationQueue {
    /// Start a worker that delivers queued orders to `sink`
    pub fn spawn(sink: Arc<dyn NotificationSink>) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Order>();

        let worker = tokio::spawn(async move {
            while let Some(order) = receiver.recv().await {
                if let Err(e) = sink.notify(&order).await {
                    error!(order_id = %order.id, error = %e, "Failed to deliver order notification");
                }
            }
            debug!("Notification queue closed");
        });

        (Self { sender }, worker)
    }

    /// Queue an order for delivery without waiting for the outcome
    pub fn enqueue(&self, order: Order) {
        let order_id = order.id.clone();
        if self.sender.send(order).is_err() {
            error!(order_id = %order_id, "Notification worker is gone, dropping notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrderItem, OrderStatus};
    use chrono::Utc;

    fn sample_order() -> Order {
        Order {
            id: "order-1".to_string(),
            customer_name: "Mona".to_string(),
            phone_number: "01001234567".to_string(),
            address: "12 Nasr St, Cairo".to_string(),
            items: vec![OrderItem {
                product_id: "p1".to_string(),
                product_name: "Ring".to_string(),
                product_image: String::new(),
                quantity: 2,
                price: 150.0,
            }],
            total_amount: 300.0,
            status: OrderStatus::Pending,
            order_date: Utc::now(),
            telegram_chat_id: None,
            notes: Some("Gift wrap".to_string()),
        }
    }

    #[test]
    fn test_summary_contains_order_details() {
        let summary = format_order_summary(&sample_order(), Some("en"));

        assert!(summary.contains("Mona"));
        assert!(summary.contains("01001234567"));
        assert!(summary.contains("300.00"));
        assert!(summary.contains("Ring × 2"));
        assert!(summary.contains("order-1"));
        assert!(summary.contains("Gift wrap"));
    }

    #[test]
    fn test_summary_skips_empty_notes() {
        let mut order = sample_order();
        order.notes = None;
        let summary = format_order_summary(&order, Some("en"));

        assert!(!summary.contains("Notes"));
    }
}
