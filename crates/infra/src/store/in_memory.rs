use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use lustre_core::{ExpectedVersion, OrderId, UserId};
use lustre_orders::{NewOrder, NewTrackingEntry, Order, TrackingEntry};

use super::query::{OrderFilter, Page, Pagination};
use super::r#trait::{
    Account, AccountStore, NewAccount, OrderStore, OrderTx, StoreError, TrackingStore,
};

#[derive(Debug, Default, Clone)]
struct OrderState {
    orders: BTreeMap<OrderId, Order>,
    tracking: Vec<TrackingEntry>,
    last_order_id: i64,
    last_tracking_id: i64,
}

/// In-memory order store with transactional semantics.
///
/// A transaction holds the whole store exclusively and works on a staged copy
/// that replaces the live state on commit, so concurrent transitions on the
/// same order are serialized and an abandoned transaction leaves no trace.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default, Clone)]
pub struct InMemoryOrderStore {
    state: Arc<Mutex<OrderState>>,
    fail_tracking_appends: Arc<AtomicBool>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent ledger append fail with a backend error.
    pub fn fail_tracking_appends(&self, fail: bool) {
        self.fail_tracking_appends.store(fail, Ordering::SeqCst);
    }

    fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        orders
    }
}

struct InMemoryOrderTx {
    live: OwnedMutexGuard<OrderState>,
    staged: OrderState,
    fail_tracking_appends: bool,
}

#[async_trait]
impl OrderTx for InMemoryOrderTx {
    async fn insert_order(&mut self, order: NewOrder) -> Result<Order, StoreError> {
        if self
            .staged
            .orders
            .values()
            .any(|o| o.order_number == order.order_number)
        {
            return Err(StoreError::UniqueViolation("order_number".to_string()));
        }

        self.staged.last_order_id += 1;
        let stored = order.into_order(OrderId::new(self.staged.last_order_id));
        self.staged.orders.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn lock_order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.staged.orders.get(&id).cloned())
    }

    async fn update_order(
        &mut self,
        order: &Order,
        expected: ExpectedVersion,
    ) -> Result<(), StoreError> {
        let current = self
            .staged
            .orders
            .get_mut(&order.id)
            .ok_or_else(|| StoreError::Concurrency(format!("order {} disappeared", order.id)))?;

        expected
            .check(current.version)
            .map_err(|e| StoreError::Concurrency(e.to_string()))?;

        current.status = order.status;
        current.payment_status = order.payment_status;
        current.updated_at = order.updated_at;
        current.version = order.version;
        Ok(())
    }

    async fn append_tracking(
        &mut self,
        entry: NewTrackingEntry,
    ) -> Result<TrackingEntry, StoreError> {
        if self.fail_tracking_appends {
            return Err(StoreError::Backend("tracking append rejected".to_string()));
        }
        if !self.staged.orders.contains_key(&entry.order_id) {
            return Err(StoreError::Backend(format!(
                "tracking entry references unknown order {}",
                entry.order_id
            )));
        }

        self.staged.last_tracking_id += 1;
        let stored = TrackingEntry {
            id: self.staged.last_tracking_id,
            order_id: entry.order_id,
            status: entry.status,
            notes: entry.notes,
            actor: entry.actor,
            created_at: entry.created_at,
        };
        self.staged.tracking.push(stored.clone());
        Ok(stored)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let InMemoryOrderTx {
            mut live, staged, ..
        } = *self;
        *live = staged;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn begin(&self) -> Result<Box<dyn OrderTx>, StoreError> {
        let live = Arc::clone(&self.state).lock_owned().await;
        let staged = live.clone();
        Ok(Box::new(InMemoryOrderTx {
            live,
            staged,
            fail_tracking_appends: self.fail_tracking_appends.load(Ordering::SeqCst),
        }))
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.state.lock().await.orders.get(&id).cloned())
    }

    async fn list_for_customer(&self, customer: UserId) -> Result<Vec<Order>, StoreError> {
        let state = self.state.lock().await;
        let mine = state
            .orders
            .values()
            .filter(|o| o.customer_id == customer)
            .cloned()
            .collect();
        Ok(Self::newest_first(mine))
    }

    async fn list(
        &self,
        filter: OrderFilter,
        pagination: Pagination,
    ) -> Result<Page<Order>, StoreError> {
        let state = self.state.lock().await;
        let matching: Vec<Order> = state
            .orders
            .values()
            .filter(|o| filter.matches(o.status, o.payment_status, o.channel))
            .cloned()
            .collect();
        let total = matching.len() as u64;

        let offset = usize::try_from(pagination.offset()).unwrap_or(usize::MAX);
        let items = Self::newest_first(matching)
            .into_iter()
            .skip(offset)
            .take(pagination.limit as usize)
            .collect();

        Ok(Page {
            items,
            total,
            page: pagination.page,
            limit: pagination.limit,
        })
    }
}

#[async_trait]
impl TrackingStore for InMemoryOrderStore {
    async fn history(&self, order_id: OrderId) -> Result<Vec<TrackingEntry>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .tracking
            .iter()
            .filter(|e| e.order_id == order_id)
            .cloned()
            .collect())
    }
}

/// In-memory account store enforcing email and phone uniqueness.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    accounts: RwLock<Vec<Account>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<Account>>, StoreError> {
        self.accounts
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<Account>, StoreError> {
        Ok(self.read()?.iter().find(|a| a.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.read()?.iter().find(|a| a.email == email).cloned())
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<Account>, StoreError> {
        Ok(self
            .read()?
            .iter()
            .find(|a| a.phone.as_deref() == Some(phone))
            .cloned())
    }

    async fn create(&self, account: NewAccount) -> Result<Account, StoreError> {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        if accounts.iter().any(|a| a.email == account.email) {
            return Err(StoreError::UniqueViolation("email".to_string()));
        }
        if let Some(phone) = &account.phone {
            if accounts.iter().any(|a| a.phone.as_ref() == Some(phone)) {
                return Err(StoreError::UniqueViolation("phone".to_string()));
            }
        }

        let id = accounts.iter().map(|a| a.id.get()).max().unwrap_or(0) + 1;
        let stored = Account {
            id: UserId::new(id),
            name: account.name,
            email: account.email,
            phone: account.phone,
            password_hash: account.password_hash,
            role: account.role,
            created_at: account.created_at,
        };
        accounts.push(stored.clone());
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use chrono::Utc;
    use lustre_auth::Role;
    use lustre_orders::FulfillmentStatus;

    fn account(email: &str, phone: Option<&str>) -> NewAccount {
        NewAccount {
            name: "Meera".to_string(),
            email: email.to_string(),
            phone: phone.map(str::to_string),
            password_hash: "$argon2id$stub".to_string(),
            role: Role::CUSTOMER,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn email_lookup_is_exact_and_duplicates_are_rejected() {
        let store = InMemoryAccountStore::new();
        let created = store
            .create(account("meera@example.com", Some("9000000001")))
            .await
            .unwrap();

        let found = store.find_by_email("meera@example.com").await.unwrap();
        assert_eq!(found.map(|a| a.id), Some(created.id));
        assert!(store.find_by_email("MEERA@example.com").await.unwrap().is_none());

        let dup_email = store.create(account("meera@example.com", None)).await;
        assert_eq!(dup_email, Err(StoreError::UniqueViolation("email".to_string())));

        let dup_phone = store
            .create(account("other@example.com", Some("9000000001")))
            .await;
        assert_eq!(dup_phone, Err(StoreError::UniqueViolation("phone".to_string())));
    }

    #[tokio::test]
    async fn uncommitted_transaction_leaves_no_trace() {
        let store = InMemoryOrderStore::new();
        let id = {
            let mut tx = store.begin().await.unwrap();
            let order = tx
                .insert_order(testing::new_order(UserId::new(3), "ORD-1-001"))
                .await
                .unwrap();
            let entry = NewTrackingEntry::for_transition(
                order.id,
                FulfillmentStatus::Pending,
                None,
                None,
                order.created_at,
            );
            tx.append_tracking(entry).await.unwrap();
            order.id
        };
        assert!(store.get(id).await.unwrap().is_none());
        assert!(store.history(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_order_number_is_a_unique_violation() {
        let store = InMemoryOrderStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_order(testing::new_order(UserId::new(3), "ORD-1-001"))
            .await
            .unwrap();
        let dup = tx
            .insert_order(testing::new_order(UserId::new(4), "ORD-1-001"))
            .await;
        assert_eq!(dup, Err(StoreError::UniqueViolation("order_number".to_string())));
    }

    #[tokio::test]
    async fn stale_version_is_rejected() {
        let store = InMemoryOrderStore::new();
        let mut tx = store.begin().await.unwrap();
        let order = tx
            .insert_order(testing::new_order(UserId::new(3), "ORD-1-002"))
            .await
            .unwrap();
        let result = tx.update_order(&order, ExpectedVersion::Exact(7)).await;
        assert!(matches!(result, Err(StoreError::Concurrency(_))));
    }
}
