//! Order lifecycle domain module.
//!
//! This crate contains business rules for orders, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod number;
pub mod order;
pub mod payment;
pub mod shipping;
pub mod status;
pub mod tracking;

pub use number::{OrderChannel, OrderNumber};
pub use order::{
    LineItemInput, NewOrder, Order, OrderDraft, OrderLineItem, ShippingAddress, looks_like_email,
};
pub use payment::{PaymentMethod, PaymentStatus, PaymentTransition};
pub use shipping::{ShippingCharge, ShippingPolicy};
pub use status::{FulfillmentStatus, TransitionError};
pub use tracking::{NewTrackingEntry, TrackingEntry};
