use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lustre_core::{DomainError, OrderId, UserId};
use lustre_infra::store::{Account, OrderFilter, Pagination};
use lustre_infra::{ContactInfo, CustomerRef, OfflineOrderOutcome, PlaceOfflineOrder, PlaceOrder};
use lustre_orders::{
    FulfillmentStatus, LineItemInput, Order, OrderChannel, PaymentMethod, PaymentStatus,
    ShippingAddress,
};

// -------------------------
// Request DTOs
// -------------------------

/// Enum-valued fields arrive as strings so unknown values become a 400 with a
/// readable message instead of a body rejection.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<LineItemInput>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub notes: Option<String>,
}

impl CreateOrderRequest {
    pub fn into_command(self) -> Result<PlaceOrder, DomainError> {
        Ok(PlaceOrder {
            items: self.items,
            shipping: self.shipping_address,
            payment_method: self.payment_method.parse()?,
            notes: self.notes,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct OfflineOrderRequest {
    /// Existing customer; takes precedence over `customer`.
    pub customer_id: Option<i64>,
    pub customer: Option<ContactInfo>,
    pub items: Vec<LineItemInput>,
    pub shipping_address: ShippingAddress,
    pub shipping_cost: Option<u64>,
    pub payment_method: String,
    pub status: Option<String>,
    pub payment_status: Option<String>,
    pub notes: Option<String>,
}

impl OfflineOrderRequest {
    pub fn into_command(self) -> Result<PlaceOfflineOrder, DomainError> {
        let customer = match (self.customer_id, self.customer) {
            (Some(id), _) if id > 0 => CustomerRef::Existing(UserId::new(id)),
            (Some(_), _) => return Err(DomainError::invalid_id("customer_id must be positive")),
            (None, Some(contact)) => CustomerRef::Contact(contact),
            (None, None) => {
                return Err(DomainError::validation(
                    "either customer_id or customer is required",
                ));
            }
        };

        Ok(PlaceOfflineOrder {
            customer,
            items: self.items,
            shipping: self.shipping_address,
            shipping_cost: self.shipping_cost,
            payment_method: self.payment_method.parse()?,
            status: parse_opt::<FulfillmentStatus>(self.status.as_deref())?,
            payment_status: parse_opt::<PaymentStatus>(self.payment_status.as_deref())?,
            notes: self.notes,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePaymentRequest {
    pub payment_status: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelOrderRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<String>,
    pub payment_status: Option<String>,
    pub channel: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListOrdersQuery {
    pub fn into_parts(self) -> Result<(OrderFilter, Pagination), DomainError> {
        let filter = OrderFilter {
            status: parse_opt::<FulfillmentStatus>(self.status.as_deref())?,
            payment_status: parse_opt::<PaymentStatus>(self.payment_status.as_deref())?,
            channel: parse_opt::<OrderChannel>(self.channel.as_deref())?,
        };
        Ok((filter, Pagination::new(self.page, self.limit)))
    }
}

/// Blank query values count as absent.
fn parse_opt<T>(value: Option<&str>) -> Result<Option<T>, DomainError>
where
    T: core::str::FromStr<Err = DomainError>,
{
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v.parse().map(Some),
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub order_number: String,
    pub channel: OrderChannel,
    pub status: FulfillmentStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub item_count: usize,
    pub subtotal: u64,
    pub shipping_cost: u64,
    pub total: u64,
    pub created_at: DateTime<Utc>,
}

impl From<&Order> for OrderSummary {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number.as_str().to_string(),
            channel: order.channel,
            status: order.status,
            payment_status: order.payment_status,
            payment_method: order.payment_method,
            item_count: order.items.len(),
            subtotal: order.subtotal,
            shipping_cost: order.shipping_cost,
            total: order.total,
            created_at: order.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CustomerSummary {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created: bool,
}

impl CustomerSummary {
    fn new(account: &Account, created: bool) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
            phone: account.phone.clone(),
            created,
        }
    }
}

pub fn offline_outcome_to_json(outcome: &OfflineOrderOutcome) -> serde_json::Value {
    serde_json::json!({
        "order": outcome.detail.order,
        "tracking": outcome.detail.tracking,
        "customer": CustomerSummary::new(&outcome.customer, outcome.customer_created),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_json(extra: serde_json::Value) -> OfflineOrderRequest {
        let mut body = serde_json::json!({
            "items": [{ "name": "Ring", "price": 1000, "quantity": 1 }],
            "shipping_address": {
                "name": "A", "phone": "1", "address": "x", "city": "y"
            },
            "payment_method": "cod",
        });
        if let (Some(obj), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
            obj.extend(extra.clone());
        }
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn offline_request_prefers_customer_id() {
        let cmd = offline_json(serde_json::json!({
            "customer_id": 7,
            "customer": { "name": "B", "email": "b@example.com", "phone": null },
        }))
        .into_command()
        .unwrap();
        assert_eq!(cmd.customer, CustomerRef::Existing(UserId::new(7)));
    }

    #[test]
    fn offline_request_needs_a_customer() {
        let err = offline_json(serde_json::json!({})).into_command().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn unknown_enum_values_are_validation_errors() {
        let err = offline_json(serde_json::json!({ "customer_id": 1, "status": "lost" }))
            .into_command()
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn list_query_ignores_blank_filters() {
        let (filter, page) = ListOrdersQuery {
            status: Some("shipped".into()),
            payment_status: Some(" ".into()),
            channel: None,
            page: Some(0),
            limit: Some(500),
        }
        .into_parts()
        .unwrap();
        assert_eq!(filter.status, Some(FulfillmentStatus::Shipped));
        assert_eq!(filter.payment_status, None);
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 100);
    }
}
