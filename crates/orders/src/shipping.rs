//! Shipping charge rules.

use serde::{Deserialize, Serialize};

/// Store-wide shipping pricing: a flat fee, waived from a subtotal threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShippingPolicy {
    pub flat_fee: u64,
    pub free_over: Option<u64>,
}

impl ShippingPolicy {
    pub fn cost_for(&self, subtotal: u64) -> u64 {
        match self.free_over {
            Some(threshold) if subtotal >= threshold => 0,
            _ => self.flat_fee,
        }
    }
}

/// How the shipping cost of a new order is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShippingCharge {
    /// Amount set explicitly (staff override).
    Fixed(u64),
    /// Priced from the store policy against the order subtotal.
    Policy(ShippingPolicy),
}

impl ShippingCharge {
    pub fn resolve(&self, subtotal: u64) -> u64 {
        match self {
            ShippingCharge::Fixed(amount) => *amount,
            ShippingCharge::Policy(policy) => policy.cost_for(subtotal),
        }
    }
}
