use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lustre_auth::Role;
use lustre_core::{ExpectedVersion, OrderId, UserId};
use lustre_orders::{NewOrder, NewTrackingEntry, Order, TrackingEntry};

use super::query::{OrderFilter, Page, Pagination};

/// Storage operation error.
///
/// These are **infrastructure errors** as opposed to domain errors; the
/// lifecycle engine translates them for callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write. Carries the field name
    /// (`order_number`, `email`, `phone`).
    #[error("unique constraint violated on {0}")]
    UniqueViolation(String),

    /// The row changed underneath an update.
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    /// The row exists but could not be decoded.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// Connection, pool or driver failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// A user account as far as order handling is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// An account waiting to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Account lookups and creation. Email and phone are unique.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<Account>, StoreError>;

    /// Exact match against the stored value.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn find_by_phone(&self, phone: &str) -> Result<Option<Account>, StoreError>;

    /// Insert an account. Violations of the email/phone uniqueness rules
    /// surface as [`StoreError::UniqueViolation`].
    async fn create(&self, account: NewAccount) -> Result<Account, StoreError>;
}

/// A single atomic unit of work over orders, their items and their ledger.
///
/// Nothing is visible to other readers until [`OrderTx::commit`] succeeds.
/// Dropping a transaction without committing rolls it back.
#[async_trait]
pub trait OrderTx: Send {
    /// Insert the order with its items and return it with its assigned id.
    ///
    /// A duplicate order number fails with
    /// `StoreError::UniqueViolation("order_number")`.
    async fn insert_order(&mut self, order: NewOrder) -> Result<Order, StoreError>;

    /// Load an order and hold it exclusively until the transaction ends.
    async fn lock_order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// Persist the mutable header fields (status, payment status,
    /// `updated_at`, version) of a locked order.
    async fn update_order(
        &mut self,
        order: &Order,
        expected: ExpectedVersion,
    ) -> Result<(), StoreError>;

    /// Append a ledger entry. Entries are never updated or deleted.
    async fn append_tracking(
        &mut self,
        entry: NewTrackingEntry,
    ) -> Result<TrackingEntry, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// Order persistence.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn OrderTx>, StoreError>;

    async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// All orders of one customer, newest first.
    async fn list_for_customer(&self, customer: UserId) -> Result<Vec<Order>, StoreError>;

    /// Filtered, paginated listing, newest first.
    async fn list(
        &self,
        filter: OrderFilter,
        pagination: Pagination,
    ) -> Result<Page<Order>, StoreError>;
}

/// Read side of the tracking ledger.
#[async_trait]
pub trait TrackingStore: Send + Sync {
    /// Entries of one order in insertion order.
    async fn history(&self, order_id: OrderId) -> Result<Vec<TrackingEntry>, StoreError>;
}

