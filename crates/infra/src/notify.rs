//! Best-effort customer notifications.
//!
//! Notifications are a side channel: they run after the owning transaction
//! has committed, and a delivery failure is logged and swallowed. Nothing in
//! here can fail or roll back an order operation.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use lustre_core::OrderId;
use lustre_orders::{FulfillmentStatus, Order, PaymentMethod, PaymentStatus};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// What a notification says about an order, plus where it goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderNotice {
    pub order_id: OrderId,
    pub order_number: String,
    pub recipient_email: String,
    pub recipient_name: String,
    pub status: FulfillmentStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub item_count: usize,
    pub total: u64,
}

impl OrderNotice {
    pub fn new(order: &Order, recipient_email: impl Into<String>) -> Self {
        Self {
            order_id: order.id,
            order_number: order.order_number.to_string(),
            recipient_email: recipient_email.into(),
            recipient_name: order.shipping.name.clone(),
            status: order.status,
            payment_status: order.payment_status,
            payment_method: order.payment_method,
            item_count: order.items.len(),
            total: order.total,
        }
    }
}

/// Outbound email port.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_order_confirmation(&self, notice: &OrderNotice) -> Result<(), NotifyError>;

    async fn send_order_status_update(
        &self,
        notice: &OrderNotice,
        notes: &str,
    ) -> Result<(), NotifyError>;

    async fn send_payment_confirmation(&self, notice: &OrderNotice) -> Result<(), NotifyError>;
}

/// Notifier that only writes a log line per message.
///
/// Used when no mail transport is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_order_confirmation(&self, notice: &OrderNotice) -> Result<(), NotifyError> {
        info!(
            order_number = %notice.order_number,
            recipient = %notice.recipient_email,
            total = notice.total,
            "order confirmation"
        );
        Ok(())
    }

    async fn send_order_status_update(
        &self,
        notice: &OrderNotice,
        notes: &str,
    ) -> Result<(), NotifyError> {
        info!(
            order_number = %notice.order_number,
            recipient = %notice.recipient_email,
            status = %notice.status,
            notes,
            "order status update"
        );
        Ok(())
    }

    async fn send_payment_confirmation(&self, notice: &OrderNotice) -> Result<(), NotifyError> {
        info!(
            order_number = %notice.order_number,
            recipient = %notice.recipient_email,
            total = notice.total,
            "payment confirmation"
        );
        Ok(())
    }
}

/// A notification waiting to be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    OrderConfirmation(OrderNotice),
    StatusUpdate { notice: OrderNotice, notes: String },
    PaymentConfirmation(OrderNotice),
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::OrderConfirmation(_) => "order_confirmation",
            Notification::StatusUpdate { .. } => "status_update",
            Notification::PaymentConfirmation(_) => "payment_confirmation",
        }
    }

    pub fn notice(&self) -> &OrderNotice {
        match self {
            Notification::OrderConfirmation(n) | Notification::PaymentConfirmation(n) => n,
            Notification::StatusUpdate { notice, .. } => notice,
        }
    }
}

/// Delivers notifications through a [`Notifier`] without ever failing.
///
/// In detached mode each delivery runs on its own tokio task so the caller
/// returns as soon as its transaction has committed. Inline mode awaits the
/// delivery, which keeps tests deterministic.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    detached: bool,
}

impl NotificationDispatcher {
    pub fn detached(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            detached: true,
        }
    }

    pub fn inline(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            detached: false,
        }
    }

    pub async fn dispatch(&self, notification: Notification) {
        if self.detached {
            let notifier = Arc::clone(&self.notifier);
            tokio::spawn(async move {
                deliver(notifier.as_ref(), notification).await;
            });
        } else {
            deliver(self.notifier.as_ref(), notification).await;
        }
    }
}

impl core::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("detached", &self.detached)
            .finish_non_exhaustive()
    }
}

async fn deliver(notifier: &dyn Notifier, notification: Notification) {
    let result = match &notification {
        Notification::OrderConfirmation(notice) => notifier.send_order_confirmation(notice).await,
        Notification::StatusUpdate { notice, notes } => {
            notifier.send_order_status_update(notice, notes).await
        }
        Notification::PaymentConfirmation(notice) => {
            notifier.send_payment_confirmation(notice).await
        }
    };

    let notice = notification.notice();
    match result {
        Ok(()) => debug!(
            kind = notification.kind(),
            order_number = %notice.order_number,
            recipient = %notice.recipient_email,
            "notification delivered"
        ),
        Err(err) => warn!(
            kind = notification.kind(),
            order_number = %notice.order_number,
            recipient = %notice.recipient_email,
            error = %err,
            "notification failed"
        ),
    }
}
