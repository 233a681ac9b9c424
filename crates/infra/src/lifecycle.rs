//! Order lifecycle engine (application-level orchestration).
//!
//! ```text
//! create:  (offline: resolve customer) → build order → insert order + genesis
//!          ledger entry in one transaction → confirmation notification
//! status:  lock order → state-machine guard → persist status → append ledger
//!          entry → commit → status notification
//! payment: lock order → persist payment status → commit → payment
//!          notification iff the order just became paid
//! ```
//!
//! Every read-modify-write runs inside one [`OrderTx`]. An error before
//! `commit` drops the transaction, which rolls back the status write and the
//! ledger append together. Notifications only run after a successful commit.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{Span, info, instrument, warn};

use lustre_core::{ExpectedVersion, OrderId, UserId};
use lustre_orders::tracking::CUSTOMER_CANCEL_NOTE;
use lustre_orders::{
    FulfillmentStatus, LineItemInput, NewOrder, NewTrackingEntry, Order, OrderChannel,
    OrderDraft, OrderNumber, PaymentMethod, PaymentStatus, ShippingAddress, ShippingCharge,
    ShippingPolicy, TrackingEntry,
};

use crate::error::LifecycleError;
use crate::notify::{Notification, NotificationDispatcher, OrderNotice};
use crate::resolver::{CustomerLookup, CustomerRef, CustomerResolver, is_placeholder_phone};
use crate::store::{Account, AccountStore, OrderFilter, OrderStore, Page, Pagination, TrackingStore};

/// Checkout request from an authenticated customer.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceOrder {
    pub items: Vec<LineItemInput>,
    pub shipping: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

/// Order entered by staff on behalf of a walk-in or phone customer.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceOfflineOrder {
    pub customer: CustomerRef,
    pub items: Vec<LineItemInput>,
    pub shipping: ShippingAddress,
    /// Overrides the store shipping policy when set.
    pub shipping_cost: Option<u64>,
    pub payment_method: PaymentMethod,
    pub status: Option<FulfillmentStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub notes: Option<String>,
}

/// An order together with its tracking history (oldest first).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderDetail {
    pub order: Order,
    pub tracking: Vec<TrackingEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OfflineOrderOutcome {
    pub detail: OrderDetail,
    pub customer: Account,
    pub customer_created: bool,
}

/// Storage ports used by the engine.
#[derive(Clone)]
pub struct LifecyclePorts {
    pub orders: Arc<dyn OrderStore>,
    pub tracking: Arc<dyn TrackingStore>,
    pub accounts: Arc<dyn AccountStore>,
}

/// The order lifecycle engine.
///
/// Owns no state of its own; everything lives behind the injected ports, so
/// one instance can be shared by all request handlers.
#[derive(Clone)]
pub struct OrderLifecycle {
    orders: Arc<dyn OrderStore>,
    tracking: Arc<dyn TrackingStore>,
    accounts: Arc<dyn AccountStore>,
    resolver: CustomerResolver,
    notifications: NotificationDispatcher,
    shipping: ShippingPolicy,
}

impl OrderLifecycle {
    pub fn new(
        ports: LifecyclePorts,
        notifications: NotificationDispatcher,
        shipping: ShippingPolicy,
    ) -> Self {
        Self {
            resolver: CustomerResolver::new(Arc::clone(&ports.accounts)),
            orders: ports.orders,
            tracking: ports.tracking,
            accounts: ports.accounts,
            notifications,
            shipping,
        }
    }

    /// Place an order for the authenticated customer.
    #[instrument(
        skip(self, request),
        fields(customer_id = %customer, order_id = tracing::field::Empty, order_number = tracing::field::Empty),
        err
    )]
    pub async fn place_order(
        &self,
        customer: UserId,
        request: PlaceOrder,
    ) -> Result<OrderDetail, LifecycleError> {
        let now = Utc::now();
        let draft = OrderDraft {
            customer_id: customer,
            channel: OrderChannel::Online,
            items: request.items,
            shipping: request.shipping,
            shipping_cost: ShippingCharge::Policy(self.shipping),
            payment_method: request.payment_method,
            initial_status: FulfillmentStatus::Pending,
            initial_payment_status: PaymentStatus::Pending,
            notes: request.notes,
        };
        let new_order =
            NewOrder::place(draft, OrderNumber::generate(OrderChannel::Online, now), now)?;

        let detail = self.insert(new_order, Some(customer)).await?;
        self.notify_order_placed(&detail.order).await;
        Ok(detail)
    }

    /// Create an order on behalf of a customer, resolving or creating their
    /// account first.
    #[instrument(
        skip(self, request),
        fields(staff_id = %staff, order_id = tracing::field::Empty, order_number = tracing::field::Empty),
        err
    )]
    pub async fn place_offline_order(
        &self,
        staff: UserId,
        request: PlaceOfflineOrder,
    ) -> Result<OfflineOrderOutcome, LifecycleError> {
        let now = Utc::now();
        let shipping_cost = match request.shipping_cost {
            Some(amount) => ShippingCharge::Fixed(amount),
            None => ShippingCharge::Policy(self.shipping),
        };
        let initial_status = request.status.unwrap_or(FulfillmentStatus::Pending);

        // Nothing is created for the customer until the order itself is valid.
        let lookup = self.resolver.find(request.customer).await?;
        let shipping =
            with_contact_defaults(request.shipping, ContactDefaults::of_lookup(&lookup));
        NewOrder::precheck(&request.items, &shipping, shipping_cost, initial_status)?;

        let resolved = self.resolver.obtain(lookup, now).await?;
        let account = resolved.account;
        let shipping = with_contact_defaults(shipping, ContactDefaults::of_account(&account));
        let draft = OrderDraft {
            customer_id: account.id,
            channel: OrderChannel::Offline,
            items: request.items,
            shipping,
            shipping_cost,
            payment_method: request.payment_method,
            initial_status,
            initial_payment_status: request.payment_status.unwrap_or(PaymentStatus::Pending),
            notes: request.notes,
        };
        let new_order =
            NewOrder::place(draft, OrderNumber::generate(OrderChannel::Offline, now), now)?;

        let detail = self.insert(new_order, Some(staff)).await?;
        self.notify_order_placed(&detail.order).await;

        Ok(OfflineOrderOutcome {
            detail,
            customer: account,
            customer_created: resolved.created,
        })
    }

    /// Staff-driven fulfillment change.
    #[instrument(
        skip(self, notes),
        fields(order_id = %order_id, actor = %actor, from = tracing::field::Empty),
        err
    )]
    pub async fn update_status(
        &self,
        order_id: OrderId,
        next: FulfillmentStatus,
        notes: Option<String>,
        actor: UserId,
    ) -> Result<Order, LifecycleError> {
        let now = Utc::now();
        let mut tx = self.orders.begin().await?;
        let mut order = tx
            .lock_order(order_id)
            .await?
            .ok_or_else(|| LifecycleError::not_found("order"))?;

        let expected = ExpectedVersion::Exact(order.version);
        let previous = order.transition_to(next, now)?;
        Span::current().record("from", previous.as_str());

        tx.update_order(&order, expected).await?;
        let entry = tx
            .append_tracking(NewTrackingEntry::for_transition(
                order.id,
                order.status,
                notes.as_deref(),
                Some(actor),
                now,
            ))
            .await?;
        tx.commit().await?;

        info!(
            order_number = %order.order_number,
            from = %previous,
            to = %order.status,
            "order status updated"
        );
        self.notify(&order, |notice| Notification::StatusUpdate {
            notice,
            notes: entry.notes.clone(),
        })
        .await;
        Ok(order)
    }

    /// Record a payment status. Any status may follow any other; the payment
    /// confirmation goes out only when the order just became paid.
    #[instrument(skip(self), fields(order_id = %order_id), err)]
    pub async fn update_payment(
        &self,
        order_id: OrderId,
        next: PaymentStatus,
    ) -> Result<Order, LifecycleError> {
        let now = Utc::now();
        let mut tx = self.orders.begin().await?;
        let mut order = tx
            .lock_order(order_id)
            .await?
            .ok_or_else(|| LifecycleError::not_found("order"))?;

        let expected = ExpectedVersion::Exact(order.version);
        let transition = order.record_payment(next, now);
        tx.update_order(&order, expected).await?;
        tx.commit().await?;

        info!(
            order_number = %order.order_number,
            from = %transition.previous,
            to = %transition.current,
            "payment status updated"
        );
        if transition.confirms_payment() {
            self.notify(&order, Notification::PaymentConfirmation).await;
        }
        Ok(order)
    }

    /// Cancel a pending order on behalf of its owner.
    ///
    /// Orders owned by someone else are reported as not found.
    #[instrument(skip(self, reason), fields(order_id = %order_id, customer_id = %customer), err)]
    pub async fn cancel_by_customer(
        &self,
        order_id: OrderId,
        customer: UserId,
        reason: Option<String>,
    ) -> Result<Order, LifecycleError> {
        let now = Utc::now();
        let mut tx = self.orders.begin().await?;
        let mut order = tx
            .lock_order(order_id)
            .await?
            .ok_or_else(|| LifecycleError::not_found("order"))?;

        let expected = ExpectedVersion::Exact(order.version);
        let previous = order.cancel_by_customer(customer, now)?;

        tx.update_order(&order, expected).await?;
        let notes = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| CUSTOMER_CANCEL_NOTE.to_string());
        let entry = tx
            .append_tracking(NewTrackingEntry {
                order_id: order.id,
                status: order.status,
                notes,
                actor: Some(customer),
                created_at: now,
            })
            .await?;
        tx.commit().await?;

        info!(
            order_number = %order.order_number,
            from = %previous,
            "order cancelled by customer"
        );
        self.notify(&order, |notice| Notification::StatusUpdate {
            notice,
            notes: entry.notes.clone(),
        })
        .await;
        Ok(order)
    }

    /// Orders of one customer, newest first.
    pub async fn customer_orders(&self, customer: UserId) -> Result<Vec<Order>, LifecycleError> {
        Ok(self.orders.list_for_customer(customer).await?)
    }

    /// One of the customer's own orders with its history.
    pub async fn customer_order(
        &self,
        customer: UserId,
        order_id: OrderId,
    ) -> Result<OrderDetail, LifecycleError> {
        let detail = self.order_detail(order_id).await?;
        if !detail.order.is_owned_by(customer) {
            return Err(LifecycleError::not_found("order"));
        }
        Ok(detail)
    }

    pub async fn order_detail(&self, order_id: OrderId) -> Result<OrderDetail, LifecycleError> {
        let order = self
            .orders
            .get(order_id)
            .await?
            .ok_or_else(|| LifecycleError::not_found("order"))?;
        let tracking = self.tracking.history(order_id).await?;
        Ok(OrderDetail { order, tracking })
    }

    pub async fn list_orders(
        &self,
        filter: OrderFilter,
        pagination: Pagination,
    ) -> Result<Page<Order>, LifecycleError> {
        Ok(self.orders.list(filter, pagination).await?)
    }

    async fn insert(
        &self,
        new_order: NewOrder,
        actor: Option<UserId>,
    ) -> Result<OrderDetail, LifecycleError> {
        let mut tx = self.orders.begin().await?;
        let order = tx.insert_order(new_order).await?;
        let genesis = tx.append_tracking(order.genesis_entry(actor)).await?;
        tx.commit().await?;

        let span = Span::current();
        span.record("order_id", order.id.get());
        span.record("order_number", order.order_number.as_str());
        info!(
            order_id = %order.id,
            order_number = %order.order_number,
            channel = %order.channel,
            total = order.total,
            "order created"
        );

        Ok(OrderDetail {
            order,
            tracking: vec![genesis],
        })
    }

    async fn notify_order_placed(&self, order: &Order) {
        self.notify(order, Notification::OrderConfirmation).await;
    }

    async fn notify<F>(&self, order: &Order, build: F)
    where
        F: FnOnce(OrderNotice) -> Notification,
    {
        match self.recipient(order).await {
            Some(email) => {
                let notice = OrderNotice::new(order, email);
                self.notifications.dispatch(build(notice)).await;
            }
            None => info!(
                order_number = %order.order_number,
                "no contact email for order; notification skipped"
            ),
        }
    }

    /// Shipping email if present, else the account email.
    async fn recipient(&self, order: &Order) -> Option<String> {
        if let Some(email) = order.contact_email() {
            return Some(email.to_string());
        }
        match self.accounts.find_by_id(order.customer_id).await {
            Ok(account) => account.map(|a| a.email).filter(|e| !e.trim().is_empty()),
            Err(err) => {
                warn!(
                    order_number = %order.order_number,
                    error = %err,
                    "could not load customer account for notification"
                );
                None
            }
        }
    }
}

impl core::fmt::Debug for OrderLifecycle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OrderLifecycle")
            .field("shipping", &self.shipping)
            .field("notifications", &self.notifications)
            .finish_non_exhaustive()
    }
}

/// Contact details used to fill blanks in a staff-entered shipping address.
struct ContactDefaults<'a> {
    name: &'a str,
    email: &'a str,
    phone: Option<&'a str>,
}

impl<'a> ContactDefaults<'a> {
    fn of_account(account: &'a Account) -> Self {
        Self {
            name: &account.name,
            email: &account.email,
            phone: account.phone.as_deref().filter(|p| !is_placeholder_phone(p)),
        }
    }

    /// A missing customer's account will carry the normalized contact details.
    fn of_lookup(lookup: &'a CustomerLookup) -> Self {
        match lookup {
            CustomerLookup::Found(account) => Self::of_account(account),
            CustomerLookup::Missing(contact) => Self {
                name: &contact.name,
                email: &contact.email,
                phone: contact.phone.as_deref(),
            },
        }
    }
}

fn with_contact_defaults(
    mut shipping: ShippingAddress,
    defaults: ContactDefaults<'_>,
) -> ShippingAddress {
    if shipping.name.trim().is_empty() {
        shipping.name = defaults.name.to_string();
    }
    if shipping.email.as_deref().is_none_or(|e| e.trim().is_empty()) {
        shipping.email = Some(defaults.email.to_string());
    }
    if shipping.phone.trim().is_empty() {
        if let Some(phone) = defaults.phone {
            shipping.phone = phone.to_string();
        }
    }
    shipping
}
