//! Strongly-typed identifiers used across the domain.
//!
//! Identifiers are storage-assigned integers (`BIGSERIAL` in Postgres).

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of an order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(i64);

/// Identifier of a user account (customer, staff or admin).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

/// Identifier of a catalog product.
///
/// `0` is reserved for line items that do not reference the catalog.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(i64);

macro_rules! impl_int_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(&self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $t {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for i64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = s
                    .parse::<i64>()
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                if value <= 0 {
                    return Err(DomainError::invalid_id(format!("{}: must be positive", $name)));
                }
                Ok(Self(value))
            }
        }
    };
}

impl_int_newtype!(OrderId, "OrderId");
impl_int_newtype!(UserId, "UserId");
impl_int_newtype!(ProductId, "ProductId");

impl ProductId {
    /// Sentinel for custom / non-catalog line items.
    pub const NON_CATALOG: ProductId = ProductId(0);

    /// Largest id the catalog can hold (`INTEGER` primary key).
    pub const MAX_CATALOG: i64 = i32::MAX as i64;

    /// Coerce an externally supplied product reference into a catalog id.
    ///
    /// Missing or out-of-range references (client-synthesized ids for ad hoc
    /// items) map to [`ProductId::NON_CATALOG`] instead of failing the order.
    pub fn coerce(raw: Option<i64>) -> Self {
        match raw {
            Some(v) if (1..=Self::MAX_CATALOG).contains(&v) => Self(v),
            _ => Self::NON_CATALOG,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positive_ids() {
        let id: OrderId = "42".parse().unwrap();
        assert_eq!(id.get(), 42);
        assert!("0".parse::<OrderId>().is_err());
        assert!("abc".parse::<UserId>().is_err());
    }

    #[test]
    fn product_coercion_maps_out_of_range_to_sentinel() {
        assert_eq!(ProductId::coerce(Some(17)), ProductId::new(17));
        assert_eq!(ProductId::coerce(Some(1_717_171_717_171)), ProductId::NON_CATALOG);
        assert_eq!(ProductId::coerce(Some(-3)), ProductId::NON_CATALOG);
        assert_eq!(ProductId::coerce(None), ProductId::NON_CATALOG);
        assert_eq!(ProductId::NON_CATALOG.get(), 0);
    }
}
