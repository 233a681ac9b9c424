//! Shared fixtures for infra tests.

use chrono::Utc;

use lustre_core::UserId;
use lustre_orders::{
    FulfillmentStatus, LineItemInput, NewOrder, OrderChannel, OrderDraft, OrderNumber,
    PaymentMethod, PaymentStatus, ShippingAddress, ShippingCharge,
};

pub fn shipping(email: Option<&str>) -> ShippingAddress {
    ShippingAddress {
        name: "Asha Rao".to_string(),
        phone: "9800000001".to_string(),
        email: email.map(str::to_string),
        address: "12 MG Road".to_string(),
        city: "Pune".to_string(),
        state: Some("MH".to_string()),
        zip: Some("411001".to_string()),
    }
}

pub fn item(name: &str, price: u64, quantity: u32) -> LineItemInput {
    LineItemInput {
        product_id: Some(42),
        name: name.to_string(),
        sku: Some("SKU-42".to_string()),
        category: Some("necklaces".to_string()),
        image: None,
        metal_type: Some("gold".to_string()),
        purity: Some("22K".to_string()),
        weight_grams: Some(12.5),
        price,
        discount_price: None,
        quantity,
    }
}

pub fn new_order(customer: UserId, order_number: &str) -> NewOrder {
    let draft = OrderDraft {
        customer_id: customer,
        channel: OrderChannel::Online,
        items: vec![item("Pendant", 4500, 2)],
        shipping: shipping(Some("asha@example.com")),
        shipping_cost: ShippingCharge::Fixed(0),
        payment_method: PaymentMethod::Cod,
        initial_status: FulfillmentStatus::Pending,
        initial_payment_status: PaymentStatus::Pending,
        notes: None,
    };
    NewOrder::place(draft, OrderNumber::from_stored(order_number), Utc::now())
        .expect("fixture order is valid")
}
