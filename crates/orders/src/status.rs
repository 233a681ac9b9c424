//! Fulfillment status state machine.
//!
//! Forward states carry a rank (`pending=0 … delivered=4`) and may only move to a
//! rank that is greater than or equal to the current one. `cancelled` sits outside
//! the ranking: it is reachable from every non-terminal state. `delivered` and
//! `cancelled` are absorbing.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use lustre_core::DomainError;

/// Fulfillment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FulfillmentStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl FulfillmentStatus {
    pub const ALL: [FulfillmentStatus; 6] = [
        FulfillmentStatus::Pending,
        FulfillmentStatus::Confirmed,
        FulfillmentStatus::Processing,
        FulfillmentStatus::Shipped,
        FulfillmentStatus::Delivered,
        FulfillmentStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentStatus::Pending => "pending",
            FulfillmentStatus::Confirmed => "confirmed",
            FulfillmentStatus::Processing => "processing",
            FulfillmentStatus::Shipped => "shipped",
            FulfillmentStatus::Delivered => "delivered",
            FulfillmentStatus::Cancelled => "cancelled",
        }
    }

    /// Position on the forward path; `None` for `cancelled`.
    pub fn rank(&self) -> Option<u8> {
        match self {
            FulfillmentStatus::Pending => Some(0),
            FulfillmentStatus::Confirmed => Some(1),
            FulfillmentStatus::Processing => Some(2),
            FulfillmentStatus::Shipped => Some(3),
            FulfillmentStatus::Delivered => Some(4),
            FulfillmentStatus::Cancelled => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FulfillmentStatus::Delivered | FulfillmentStatus::Cancelled)
    }

    /// Guard for a staff-initiated transition from `self` to `next`.
    pub fn check_transition(self, next: FulfillmentStatus) -> Result<(), TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError::Terminal(self));
        }

        match (self.rank(), next.rank()) {
            // Leaving the ranked path: always allowed from a non-terminal state.
            (_, None) => Ok(()),
            (Some(current), Some(target)) if target >= current => Ok(()),
            _ => Err(TransitionError::Regression {
                from: self,
                to: next,
            }),
        }
    }

    /// Guard for a customer-initiated cancellation.
    pub fn check_customer_cancel(self) -> Result<(), TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError::Terminal(self));
        }
        if self != FulfillmentStatus::Pending {
            return Err(TransitionError::CustomerCancelWindowClosed(self));
        }
        Ok(())
    }
}

impl core::fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FulfillmentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(FulfillmentStatus::Pending),
            "confirmed" => Ok(FulfillmentStatus::Confirmed),
            "processing" => Ok(FulfillmentStatus::Processing),
            "shipped" => Ok(FulfillmentStatus::Shipped),
            "delivered" => Ok(FulfillmentStatus::Delivered),
            "cancelled" => Ok(FulfillmentStatus::Cancelled),
            other => Err(DomainError::validation(format!(
                "unknown order status '{other}' (expected one of: pending, confirmed, processing, shipped, delivered, cancelled)"
            ))),
        }
    }
}

/// Why a fulfillment transition was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The order already sits in an absorbing state.
    #[error("order {0}, no further changes")]
    Terminal(FulfillmentStatus),

    /// The requested status ranks below the current one.
    #[error("order is {from}; cannot move back to {to}")]
    Regression {
        from: FulfillmentStatus,
        to: FulfillmentStatus,
    },

    /// Customers may only cancel while the order is still pending.
    #[error("order is {0}; only pending orders can be cancelled by the customer")]
    CustomerCancelWindowClosed(FulfillmentStatus),
}

impl TransitionError {
    /// The state that blocked the transition.
    pub fn blocking_status(&self) -> FulfillmentStatus {
        match self {
            TransitionError::Terminal(s) => *s,
            TransitionError::Regression { from, .. } => *from,
            TransitionError::CustomerCancelWindowClosed(s) => *s,
        }
    }
}

impl From<TransitionError> for DomainError {
    fn from(value: TransitionError) -> Self {
        DomainError::invalid_transition(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use FulfillmentStatus::*;

    #[test]
    fn forward_moves_may_skip_steps() {
        assert!(Pending.check_transition(Shipped).is_ok());
        assert!(Confirmed.check_transition(Delivered).is_ok());
        assert!(Processing.check_transition(Processing).is_ok());
    }

    #[test]
    fn regression_is_rejected_and_names_current_state() {
        let err = Shipped.check_transition(Pending).unwrap_err();
        assert_eq!(
            err,
            TransitionError::Regression {
                from: Shipped,
                to: Pending
            }
        );
        assert!(err.to_string().contains("shipped"));
        assert_eq!(err.blocking_status(), Shipped);
    }

    #[test]
    fn cancel_is_reachable_from_every_open_state() {
        for s in [Pending, Confirmed, Processing, Shipped] {
            assert!(s.check_transition(Cancelled).is_ok(), "{s} -> cancelled");
        }
    }

    #[test]
    fn terminal_states_distinguish_delivered_from_cancelled() {
        let delivered = Delivered.check_transition(Processing).unwrap_err();
        let cancelled = Cancelled.check_transition(Processing).unwrap_err();
        assert_eq!(delivered.to_string(), "order delivered, no further changes");
        assert_eq!(cancelled.to_string(), "order cancelled, no further changes");
        assert!(Cancelled.check_transition(Cancelled).is_err());
        assert!(Delivered.check_transition(Cancelled).is_err());
    }

    #[test]
    fn customer_cancel_only_from_pending() {
        assert!(Pending.check_customer_cancel().is_ok());
        assert_eq!(
            Confirmed.check_customer_cancel(),
            Err(TransitionError::CustomerCancelWindowClosed(Confirmed))
        );
        assert_eq!(
            Cancelled.check_customer_cancel(),
            Err(TransitionError::Terminal(Cancelled))
        );
    }

    #[test]
    fn parse_round_trips_display() {
        for s in FulfillmentStatus::ALL {
            assert_eq!(s.to_string().parse::<FulfillmentStatus>().unwrap(), s);
        }
        assert!(matches!(
            "lost".parse::<FulfillmentStatus>(),
            Err(DomainError::Validation(_))
        ));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn any_status() -> impl Strategy<Value = FulfillmentStatus> {
            prop::sample::select(FulfillmentStatus::ALL.to_vec())
        }

        proptest! {
            /// Property: accepted transitions never lower the rank, except into cancelled.
            #[test]
            fn accepted_sequences_are_rank_monotonic(requests in prop::collection::vec(any_status(), 0..40)) {
                let mut current = Pending;
                let mut history = vec![current];
                for next in requests {
                    if current.check_transition(next).is_ok() {
                        current = next;
                        history.push(current);
                    }
                }

                for pair in history.windows(2) {
                    let (prev, next) = (pair[0], pair[1]);
                    if next != Cancelled {
                        prop_assert!(next.rank() >= prev.rank());
                    }
                    prop_assert!(!prev.is_terminal());
                }
            }

            /// Property: nothing leaves a terminal state.
            #[test]
            fn terminal_states_absorb(next in any_status()) {
                prop_assert!(Delivered.check_transition(next).is_err());
                prop_assert!(Cancelled.check_transition(next).is_err());
            }
        }
    }
}
