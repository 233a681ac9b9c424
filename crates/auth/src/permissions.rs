use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. "orders.create").
/// A special wildcard permission `"*"` can be used by policy layers to indicate
/// "allow all" without hardcoding domain permissions into tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: Permission = Permission(Cow::Borrowed("*"));

    /// Place an order as the authenticated customer.
    pub const ORDERS_CREATE: Permission = Permission(Cow::Borrowed("orders.create"));
    /// Read and cancel one's own orders.
    pub const ORDERS_OWN: Permission = Permission(Cow::Borrowed("orders.own"));
    /// Read any order from the back office.
    pub const ORDERS_ADMIN_READ: Permission = Permission(Cow::Borrowed("orders.admin.read"));
    pub const ORDERS_ADMIN_STATUS: Permission = Permission(Cow::Borrowed("orders.admin.status"));
    pub const ORDERS_ADMIN_PAYMENT: Permission = Permission(Cow::Borrowed("orders.admin.payment"));
    pub const ORDERS_ADMIN_OFFLINE: Permission = Permission(Cow::Borrowed("orders.admin.offline"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
