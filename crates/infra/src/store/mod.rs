//! Persistence boundary for orders, the tracking ledger and accounts.
//!
//! The lifecycle engine only sees the traits in this module; in-memory
//! implementations back tests and local runs, Postgres backs production.

pub mod in_memory;
pub mod postgres;
pub mod query;
pub mod r#trait;

pub use in_memory::{InMemoryAccountStore, InMemoryOrderStore};
pub use postgres::{PostgresAccountStore, PostgresOrderStore, ensure_schema};
pub use query::{OrderFilter, Page, Pagination};
pub use r#trait::{
    Account, AccountStore, NewAccount, OrderStore, OrderTx, StoreError, TrackingStore,
};
