use std::collections::HashSet;

use thiserror::Error;

use lustre_core::UserId;

use crate::{Permission, Role};

/// A fully resolved principal for authorization decisions.
///
/// Construction is decoupled from storage and transport: the API derives it from
/// verified token claims and the role policy below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
}

impl Principal {
    /// Build a principal whose permissions come from its roles.
    pub fn from_roles(user_id: UserId, roles: Vec<Role>) -> Self {
        let permissions = permissions_for_roles(&roles);
        Self {
            user_id,
            roles,
            permissions,
        }
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Authorize a principal for a single permission.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    let perms: HashSet<&str> = principal.permissions.iter().map(|p| p.as_str()).collect();

    if perms.contains("*") || perms.contains(required.as_str()) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

/// Role → permission policy.
///
/// `admin` grants everything; `staff` runs the back office and may also shop;
/// `customer` may only place and manage their own orders. Unknown roles grant
/// nothing.
pub fn role_permissions(role: &str) -> Vec<Permission> {
    match role {
        "admin" => vec![Permission::WILDCARD],
        "staff" => vec![
            Permission::ORDERS_CREATE,
            Permission::ORDERS_OWN,
            Permission::ORDERS_ADMIN_READ,
            Permission::ORDERS_ADMIN_STATUS,
            Permission::ORDERS_ADMIN_PAYMENT,
            Permission::ORDERS_ADMIN_OFFLINE,
        ],
        "customer" => vec![Permission::ORDERS_CREATE, Permission::ORDERS_OWN],
        _ => Vec::new(),
    }
}

pub fn permissions_for_roles(roles: &[Role]) -> Vec<Permission> {
    let mut out: Vec<Permission> = Vec::new();
    for role in roles {
        for perm in role_permissions(role.as_str()) {
            if !out.contains(&perm) {
                out.push(perm);
            }
        }
    }
    out
}
