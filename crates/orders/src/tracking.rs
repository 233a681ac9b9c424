//! Tracking ledger entries.
//!
//! Entries are insert-only and exist for audit/history display. Current status
//! is always read from the order itself, never derived from the ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lustre_core::{OrderId, UserId};

use crate::status::FulfillmentStatus;

/// Genesis note for orders placed by the customer.
pub const ORDER_PLACED_NOTE: &str = "Order placed";

/// Genesis note for orders entered by staff.
pub const OFFLINE_ORDER_NOTE: &str = "Offline order created";

/// Default note for a customer cancellation without a reason.
pub const CUSTOMER_CANCEL_NOTE: &str = "Cancelled by customer";

/// A persisted ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingEntry {
    pub id: i64,
    pub order_id: OrderId,
    pub status: FulfillmentStatus,
    pub notes: String,
    /// `None` for system actions.
    pub actor: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// A ledger entry waiting to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTrackingEntry {
    pub order_id: OrderId,
    pub status: FulfillmentStatus,
    pub notes: String,
    pub actor: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl NewTrackingEntry {
    /// Entry for an accepted status change.
    ///
    /// Blank notes fall back to a generated message naming the new status.
    pub fn for_transition(
        order_id: OrderId,
        status: FulfillmentStatus,
        notes: Option<&str>,
        actor: Option<UserId>,
        at: DateTime<Utc>,
    ) -> Self {
        let notes = match notes.map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => default_transition_note(status),
        };
        Self {
            order_id,
            status,
            notes,
            actor,
            created_at: at,
        }
    }
}

pub fn default_transition_note(status: FulfillmentStatus) -> String {
    format!("Order status updated to {status}")
}
