//! Storage, notifier and engine wiring.
//!
//! In-memory stores back local runs and tests; Postgres is used when
//! `USE_PERSISTENT_STORES=true`.

use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use lustre_infra::store::{
    InMemoryAccountStore, InMemoryOrderStore, PostgresAccountStore, PostgresOrderStore,
    ensure_schema,
};
use lustre_infra::{
    AppConfig, LifecyclePorts, LogNotifier, NotificationDispatcher, Notifier, OrderLifecycle,
    StorageConfig,
};
use lustre_orders::ShippingPolicy;

#[derive(Clone, Debug)]
pub struct AppServices {
    pub lifecycle: OrderLifecycle,
}

impl AppServices {
    pub fn new(lifecycle: OrderLifecycle) -> Self {
        Self { lifecycle }
    }

    /// In-memory wiring (dev/test).
    pub fn in_memory(shipping: ShippingPolicy, notifications: NotificationDispatcher) -> Self {
        let orders = InMemoryOrderStore::new();
        let ports = LifecyclePorts {
            orders: Arc::new(orders.clone()),
            tracking: Arc::new(orders),
            accounts: Arc::new(InMemoryAccountStore::new()),
        };
        Self::new(OrderLifecycle::new(ports, notifications, shipping))
    }
}

/// Build services from configuration.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
    let notifications = if config.notifications_detached {
        NotificationDispatcher::detached(notifier)
    } else {
        NotificationDispatcher::inline(notifier)
    };

    match &config.storage {
        StorageConfig::InMemory => {
            info!("using in-memory stores");
            Ok(AppServices::in_memory(config.shipping, notifications))
        }
        StorageConfig::Postgres { database_url } => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(database_url)
                .await
                .context("failed to connect to Postgres")?;
            ensure_schema(&pool).await.context("failed to apply schema")?;
            info!("using Postgres stores");

            let orders = PostgresOrderStore::new(pool.clone());
            let ports = LifecyclePorts {
                orders: Arc::new(orders.clone()),
                tracking: Arc::new(orders),
                accounts: Arc::new(PostgresAccountStore::new(pool)),
            };
            Ok(AppServices::new(OrderLifecycle::new(
                ports,
                notifications,
                config.shipping,
            )))
        }
    }
}
