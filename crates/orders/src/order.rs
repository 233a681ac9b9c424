use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lustre_core::{AggregateRoot, DomainError, OrderId, ProductId, UserId};

use crate::number::{OrderChannel, OrderNumber};
use crate::payment::{PaymentMethod, PaymentStatus, PaymentTransition};
use crate::shipping::ShippingCharge;
use crate::status::{FulfillmentStatus, TransitionError};
use crate::tracking::{NewTrackingEntry, OFFLINE_ORDER_NOTE, ORDER_PLACED_NOTE};

/// Shipping address snapshot taken at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: String,
    pub city: String,
    pub state: Option<String>,
    pub zip: Option<String>,
}

impl ShippingAddress {
    pub fn validate(&self) -> Result<(), DomainError> {
        let required = [
            ("shipping.name", &self.name),
            ("shipping.phone", &self.phone),
            ("shipping.address", &self.address),
            ("shipping.city", &self.city),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(DomainError::validation(format!("{field} is required")));
            }
        }
        if let Some(email) = &self.email {
            if !looks_like_email(email) {
                return Err(DomainError::validation("shipping.email is not a valid email address"));
            }
        }
        Ok(())
    }
}

pub fn looks_like_email(s: &str) -> bool {
    match s.trim().split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

/// Line item as supplied by a caller (catalog snapshot, not yet validated).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemInput {
    /// Externally supplied product reference; may be a client-side id.
    pub product_id: Option<i64>,
    pub name: String,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub metal_type: Option<String>,
    pub purity: Option<String>,
    pub weight_grams: Option<f64>,
    /// Unit price in smallest currency unit.
    pub price: u64,
    pub discount_price: Option<u64>,
    pub quantity: u32,
}

/// Point-in-time product snapshot owned by an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub product_id: ProductId,
    pub name: String,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub metal_type: Option<String>,
    pub purity: Option<String>,
    pub weight_grams: Option<f64>,
    pub price: u64,
    pub discount_price: Option<u64>,
    pub quantity: u32,
    pub line_total: u64,
}

impl OrderLineItem {
    pub fn from_input(line_no: usize, input: LineItemInput) -> Result<Self, DomainError> {
        if input.name.trim().is_empty() {
            return Err(DomainError::validation(format!("items[{line_no}].name is required")));
        }
        if input.quantity == 0 {
            return Err(DomainError::validation(format!(
                "items[{line_no}].quantity must be at least 1"
            )));
        }
        if input.price == 0 {
            return Err(DomainError::validation(format!(
                "items[{line_no}].price must be positive"
            )));
        }
        if let Some(discount) = input.discount_price {
            if discount > input.price {
                return Err(DomainError::validation(format!(
                    "items[{line_no}].discount_price cannot exceed price"
                )));
            }
        }
        if let Some(w) = input.weight_grams {
            if !w.is_finite() || w < 0.0 {
                return Err(DomainError::validation(format!(
                    "items[{line_no}].weight must be a non-negative number"
                )));
            }
        }

        let unit = input.discount_price.unwrap_or(input.price);
        let line_total = unit
            .checked_mul(u64::from(input.quantity))
            .ok_or_else(|| DomainError::validation(format!("items[{line_no}] total overflows")))?;

        Ok(Self {
            product_id: ProductId::coerce(input.product_id),
            name: input.name.trim().to_string(),
            sku: input.sku,
            category: input.category,
            image: input.image,
            metal_type: input.metal_type,
            purity: input.purity,
            weight_grams: input.weight_grams,
            price: input.price,
            discount_price: input.discount_price,
            quantity: input.quantity,
            line_total,
        })
    }

    /// Price actually charged per unit.
    pub fn effective_unit_price(&self) -> u64 {
        self.discount_price.unwrap_or(self.price)
    }
}

/// Everything needed to place an order, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    pub customer_id: UserId,
    pub channel: OrderChannel,
    pub items: Vec<LineItemInput>,
    pub shipping: ShippingAddress,
    pub shipping_cost: ShippingCharge,
    pub payment_method: PaymentMethod,
    pub initial_status: FulfillmentStatus,
    pub initial_payment_status: PaymentStatus,
    pub notes: Option<String>,
}

/// A validated order that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub order_number: OrderNumber,
    pub customer_id: UserId,
    pub channel: OrderChannel,
    pub items: Vec<OrderLineItem>,
    pub subtotal: u64,
    pub shipping_cost: u64,
    pub total: u64,
    pub status: FulfillmentStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub shipping: ShippingAddress,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Line items priced against a shipping charge.
struct Priced {
    items: Vec<OrderLineItem>,
    subtotal: u64,
    shipping_cost: u64,
    total: u64,
}

fn price(items: Vec<LineItemInput>, charge: ShippingCharge) -> Result<Priced, DomainError> {
    if items.is_empty() {
        return Err(DomainError::validation("order must contain at least one item"));
    }
    let items = items
        .into_iter()
        .enumerate()
        .map(|(i, input)| OrderLineItem::from_input(i, input))
        .collect::<Result<Vec<_>, _>>()?;

    let subtotal = items
        .iter()
        .try_fold(0u64, |acc, item| acc.checked_add(item.line_total))
        .ok_or_else(|| DomainError::validation("order subtotal overflows"))?;
    let shipping_cost = charge.resolve(subtotal);
    let total = subtotal
        .checked_add(shipping_cost)
        .ok_or_else(|| DomainError::validation("order total overflows"))?;

    Ok(Priced {
        items,
        subtotal,
        shipping_cost,
        total,
    })
}

fn check_initial_status(status: FulfillmentStatus) -> Result<(), DomainError> {
    if status == FulfillmentStatus::Cancelled {
        return Err(DomainError::validation("an order cannot be created as cancelled"));
    }
    Ok(())
}

impl NewOrder {
    /// Run every check `place` would run, without a customer attached.
    ///
    /// Callers that create records on the customer's behalf run this first
    /// so a rejected order leaves nothing behind.
    pub fn precheck(
        items: &[LineItemInput],
        shipping: &ShippingAddress,
        charge: ShippingCharge,
        initial_status: FulfillmentStatus,
    ) -> Result<(), DomainError> {
        price(items.to_vec(), charge)?;
        shipping.validate()?;
        check_initial_status(initial_status)
    }

    /// Validate a draft and compute its totals.
    pub fn place(
        draft: OrderDraft,
        order_number: OrderNumber,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let Priced {
            items,
            subtotal,
            shipping_cost,
            total,
        } = price(draft.items, draft.shipping_cost)?;
        draft.shipping.validate()?;
        check_initial_status(draft.initial_status)?;

        let notes = draft
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        Ok(Self {
            order_number,
            customer_id: draft.customer_id,
            channel: draft.channel,
            items,
            subtotal,
            shipping_cost,
            total,
            status: draft.initial_status,
            payment_method: draft.payment_method,
            payment_status: draft.initial_payment_status,
            shipping: draft.shipping,
            notes,
            created_at: now,
        })
    }

    /// Attach the storage-assigned id.
    pub fn into_order(self, id: OrderId) -> Order {
        Order {
            id,
            order_number: self.order_number,
            customer_id: self.customer_id,
            channel: self.channel,
            items: self.items,
            subtotal: self.subtotal,
            shipping_cost: self.shipping_cost,
            total: self.total,
            status: self.status,
            payment_method: self.payment_method,
            payment_status: self.payment_status,
            shipping: self.shipping,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.created_at,
            version: 1,
        }
    }
}

/// Aggregate root: Order.
///
/// # Invariants
/// - `items` is never empty.
/// - `total == subtotal + shipping_cost`, fixed at creation.
/// - `status` only moves through [`FulfillmentStatus::check_transition`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub customer_id: UserId,
    pub channel: OrderChannel,
    pub items: Vec<OrderLineItem>,
    pub subtotal: u64,
    pub shipping_cost: u64,
    pub total: u64,
    pub status: FulfillmentStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub shipping: ShippingAddress,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
}

impl Order {
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.customer_id == user
    }

    /// Genesis ledger entry, written in the same transaction as the order.
    pub fn genesis_entry(&self, actor: Option<UserId>) -> NewTrackingEntry {
        let notes = match self.channel {
            OrderChannel::Online => ORDER_PLACED_NOTE,
            OrderChannel::Offline => OFFLINE_ORDER_NOTE,
        };
        NewTrackingEntry {
            order_id: self.id,
            status: self.status,
            notes: notes.to_string(),
            actor,
            created_at: self.created_at,
        }
    }

    /// Apply a staff-driven fulfillment change. Returns the previous status.
    pub fn transition_to(
        &mut self,
        next: FulfillmentStatus,
        now: DateTime<Utc>,
    ) -> Result<FulfillmentStatus, TransitionError> {
        self.status.check_transition(next)?;
        Ok(self.set_status(next, now))
    }

    /// Cancel on behalf of the owning customer. Returns the previous status.
    ///
    /// Orders that belong to someone else read as missing.
    pub fn cancel_by_customer(
        &mut self,
        customer: UserId,
        now: DateTime<Utc>,
    ) -> Result<FulfillmentStatus, DomainError> {
        if !self.is_owned_by(customer) {
            return Err(DomainError::not_found("order"));
        }
        self.status.check_customer_cancel()?;
        Ok(self.set_status(FulfillmentStatus::Cancelled, now))
    }

    /// Record a payment status; any value may follow any other.
    pub fn record_payment(&mut self, next: PaymentStatus, now: DateTime<Utc>) -> PaymentTransition {
        let previous = self.payment_status;
        self.payment_status = next;
        self.touch(now);
        PaymentTransition::new(previous, next)
    }

    /// Email used for customer notifications, if the snapshot carries one.
    pub fn contact_email(&self) -> Option<&str> {
        self.shipping
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }

    fn set_status(&mut self, next: FulfillmentStatus, now: DateTime<Utc>) -> FulfillmentStatus {
        let previous = self.status;
        self.status = next;
        self.touch(now);
        previous
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
        self.version += 1;
    }
}

impl AggregateRoot for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}
