//! Filtering and paging for the staff order listing.

use serde::{Deserialize, Serialize};

use lustre_orders::{FulfillmentStatus, OrderChannel, PaymentStatus};

/// Default page size for order listings.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Hard upper bound on page size.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page-number based pagination (1-based pages).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

/// Optional filters for the staff order listing. `None` means "any".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFilter {
    pub status: Option<FulfillmentStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub channel: Option<OrderChannel>,
}

impl OrderFilter {
    pub fn matches(
        &self,
        status: FulfillmentStatus,
        payment_status: PaymentStatus,
        channel: OrderChannel,
    ) -> bool {
        self.status.is_none_or(|s| s == status)
            && self.payment_status.is_none_or(|p| p == payment_status)
            && self.channel.is_none_or(|c| c == channel)
    }
}

/// One page of results plus the total number of matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.limit.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_is_clamped() {
        let p = Pagination::new(Some(0), Some(10_000));
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, MAX_PAGE_SIZE);
        assert_eq!(Pagination::new(Some(3), Some(20)).offset(), 40);
    }

    #[test]
    fn empty_filter_matches_everything() {
        let f = OrderFilter::default();
        assert!(f.matches(
            FulfillmentStatus::Pending,
            PaymentStatus::Paid,
            OrderChannel::Offline
        ));
        let f = OrderFilter {
            channel: Some(OrderChannel::Online),
            ..OrderFilter::default()
        };
        assert!(!f.matches(
            FulfillmentStatus::Pending,
            PaymentStatus::Paid,
            OrderChannel::Offline
        ));
    }
}
