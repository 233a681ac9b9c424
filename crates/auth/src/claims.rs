use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lustre_core::UserId;

use crate::Role;

/// JWT claims model (transport-agnostic).
///
/// Tokens are issued by the account subsystem; this is the minimal set of claims
/// the order API relies on once a token has been verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject / user identifier.
    pub sub: UserId,

    /// RBAC roles granted to the user.
    pub roles: Vec<Role>,

    /// Issued-at timestamp.
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Deterministically validate JWT claims.
///
/// Signature verification happens in [`crate::jwt`]; this checks the time window.
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims(issued: DateTime<Utc>, expires: DateTime<Utc>) -> JwtClaims {
        JwtClaims {
            sub: UserId::new(3),
            roles: vec![Role::CUSTOMER],
            issued_at: issued,
            expires_at: expires,
        }
    }

    #[test]
    fn window_is_enforced() {
        let now = Utc::now();
        assert!(validate_claims(&claims(now - Duration::minutes(1), now + Duration::minutes(5)), now).is_ok());
        assert_eq!(
            validate_claims(&claims(now - Duration::minutes(10), now - Duration::minutes(1)), now),
            Err(TokenValidationError::Expired)
        );
        assert_eq!(
            validate_claims(&claims(now + Duration::minutes(1), now + Duration::minutes(5)), now),
            Err(TokenValidationError::NotYetValid)
        );
        assert_eq!(
            validate_claims(&claims(now, now), now),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }
}
