//! Infrastructure layer: storage, customer resolution, notifications, config
//! and the order lifecycle engine that composes them.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod notify;
pub mod resolver;
pub mod store;

#[cfg(test)]
mod testing;

pub use config::{AppConfig, ConfigError, StorageConfig};
pub use error::LifecycleError;
pub use lifecycle::{
    LifecyclePorts, OfflineOrderOutcome, OrderDetail, OrderLifecycle, PlaceOfflineOrder,
    PlaceOrder,
};
pub use notify::{LogNotifier, Notification, NotificationDispatcher, Notifier, NotifyError, OrderNotice};
pub use resolver::{ContactInfo, CustomerLookup, CustomerRef, CustomerResolver, ResolvedCustomer};
