//! Payment method and payment status tracking.
//!
//! Payment status is deliberately unordered: any value may follow any other, and
//! it moves independently of fulfillment (a delivered order can still be
//! refunded). The only side effect it drives is the payment confirmation,
//! which belongs to a transition *into* `paid`.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use lustre_core::DomainError;

/// How the customer intends to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Cash on delivery.
    Cod,
    Online,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cod => "cod",
            PaymentMethod::Online => "online",
        }
    }
}

impl core::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cod" | "cash_on_delivery" | "cash-on-delivery" => Ok(PaymentMethod::Cod),
            "online" => Ok(PaymentMethod::Online),
            other => Err(DomainError::validation(format!(
                "unknown payment method '{other}' (expected one of: cod, online)"
            ))),
        }
    }
}

/// Money collection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 4] = [
        PaymentStatus::Pending,
        PaymentStatus::Paid,
        PaymentStatus::Failed,
        PaymentStatus::Refunded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl core::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(DomainError::validation(format!(
                "unknown payment status '{other}' (expected one of: pending, paid, failed, refunded)"
            ))),
        }
    }
}

/// Outcome of recording a payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentTransition {
    pub previous: PaymentStatus,
    pub current: PaymentStatus,
}

impl PaymentTransition {
    pub fn new(previous: PaymentStatus, current: PaymentStatus) -> Self {
        Self { previous, current }
    }

    /// True only for a transition into `paid` from any other value.
    pub fn confirms_payment(&self) -> bool {
        self.previous != PaymentStatus::Paid && self.current == PaymentStatus::Paid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PaymentStatus::*;

    #[test]
    fn only_entering_paid_confirms() {
        assert!(PaymentTransition::new(Pending, Paid).confirms_payment());
        assert!(PaymentTransition::new(Failed, Paid).confirms_payment());
        assert!(!PaymentTransition::new(Paid, Paid).confirms_payment());
        assert!(!PaymentTransition::new(Paid, Refunded).confirms_payment());
        assert!(!PaymentTransition::new(Pending, Failed).confirms_payment());
    }

    #[test]
    fn payment_method_accepts_long_form() {
        assert_eq!("cash_on_delivery".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cod);
        assert_eq!("ONLINE".parse::<PaymentMethod>().unwrap(), PaymentMethod::Online);
        assert!("card".parse::<PaymentMethod>().is_err());
    }
}
