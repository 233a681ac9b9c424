//! Order channel and human-facing order numbers.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use lustre_core::DomainError;

/// Where an order was entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderChannel {
    /// Placed by an authenticated customer.
    Online,
    /// Entered by staff for a walk-in or phone customer.
    Offline,
}

impl OrderChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderChannel::Online => "online",
            OrderChannel::Offline => "offline",
        }
    }

    /// Literal prefix carried by order numbers of this channel.
    pub fn prefix(&self) -> &'static str {
        match self {
            OrderChannel::Online => "ORD",
            OrderChannel::Offline => "OFF",
        }
    }
}

impl core::fmt::Display for OrderChannel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderChannel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "online" => Ok(OrderChannel::Online),
            "offline" => Ok(OrderChannel::Offline),
            other => Err(DomainError::validation(format!(
                "unknown order channel '{other}' (expected one of: online, offline)"
            ))),
        }
    }
}

/// Display identifier of an order: `<PREFIX>-<unix millis>-<NNN>`.
///
/// Uniqueness is probabilistic; storage enforces it with a unique index and a
/// collision surfaces as a conflict.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Generate a number using the thread-local RNG.
    pub fn generate(channel: OrderChannel, now: DateTime<Utc>) -> Self {
        Self::generate_with(&mut rand::thread_rng(), channel, now)
    }

    pub fn generate_with<R: Rng + ?Sized>(
        rng: &mut R,
        channel: OrderChannel,
        now: DateTime<Utc>,
    ) -> Self {
        let disambiguator: u16 = rng.gen_range(0..1000);
        Self(format!(
            "{}-{}-{:03}",
            channel.prefix(),
            now.timestamp_millis(),
            disambiguator
        ))
    }

    /// Wrap a value loaded from storage.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
