//! Configuration loading and representation.
//!
//! Values come from the process environment; a `.env` file in the working
//! directory is loaded first when present.

use thiserror::Error;
use tracing::warn;

use lustre_orders::ShippingPolicy;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Fallback signing secret for local runs only.
pub const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Where orders and accounts are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    InMemory,
    Postgres { database_url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: String,
    pub jwt_secret: String,
    pub storage: StorageConfig,
    pub shipping: ShippingPolicy,
    /// Deliver notifications on background tasks instead of inline.
    pub notifications_detached: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                warn!(error = %err, "failed to load .env file");
            }
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let jwt_secret = var("JWT_SECRET").unwrap_or_else(|| {
            warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let use_persistent = parse_bool("USE_PERSISTENT_STORES", var("USE_PERSISTENT_STORES"), false)?;
        let storage = if use_persistent {
            let database_url = var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
            StorageConfig::Postgres { database_url }
        } else {
            StorageConfig::InMemory
        };

        let shipping = ShippingPolicy {
            flat_fee: parse_amount("SHIPPING_FLAT_FEE", var("SHIPPING_FLAT_FEE"))?.unwrap_or(0),
            free_over: parse_amount("FREE_SHIPPING_THRESHOLD", var("FREE_SHIPPING_THRESHOLD"))?,
        };

        let notifications_detached =
            parse_bool("NOTIFICATIONS_DETACHED", var("NOTIFICATIONS_DETACHED"), true)?;

        Ok(Self {
            bind_addr,
            jwt_secret,
            storage,
            shipping,
            notifications_detached,
        })
    }
}

fn parse_bool(name: &'static str, value: Option<String>, default: bool) -> Result<bool, ConfigError> {
    match value.as_deref().map(str::to_lowercase).as_deref() {
        None => Ok(default),
        Some("true" | "1" | "yes" | "on") => Ok(true),
        Some("false" | "0" | "no" | "off") => Ok(false),
        Some(other) => Err(ConfigError::Invalid {
            name,
            value: other.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

fn parse_amount(name: &'static str, value: Option<String>) -> Result<Option<u64>, ConfigError> {
    value
        .map(|v| {
            v.parse::<u64>().map_err(|e| ConfigError::Invalid {
                name,
                value: v.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_are_in_memory_and_free_shipping() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(cfg.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(cfg.storage, StorageConfig::InMemory);
        assert_eq!(cfg.shipping, ShippingPolicy::default());
        assert!(cfg.notifications_detached);
    }

    #[test]
    fn persistent_stores_require_database_url() {
        assert_eq!(
            config(&[("USE_PERSISTENT_STORES", "true")]),
            Err(ConfigError::Missing("DATABASE_URL"))
        );
        let cfg = config(&[
            ("USE_PERSISTENT_STORES", "true"),
            ("DATABASE_URL", "postgres://localhost/lustre"),
        ])
        .unwrap();
        assert_eq!(
            cfg.storage,
            StorageConfig::Postgres {
                database_url: "postgres://localhost/lustre".to_string()
            }
        );
    }

    #[test]
    fn shipping_policy_is_read() {
        let cfg = config(&[
            ("SHIPPING_FLAT_FEE", "500"),
            ("FREE_SHIPPING_THRESHOLD", "50000"),
        ])
        .unwrap();
        assert_eq!(cfg.shipping.flat_fee, 500);
        assert_eq!(cfg.shipping.free_over, Some(50_000));
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(matches!(
            config(&[("SHIPPING_FLAT_FEE", "five")]),
            Err(ConfigError::Invalid { name: "SHIPPING_FLAT_FEE", .. })
        ));
        assert!(matches!(
            config(&[("NOTIFICATIONS_DETACHED", "maybe")]),
            Err(ConfigError::Invalid { name: "NOTIFICATIONS_DETACHED", .. })
        ));
    }
}
