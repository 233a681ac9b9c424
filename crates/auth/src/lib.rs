//! `lustre-auth`: authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod authorize;
pub mod claims;
pub mod credentials;
pub mod jwt;
pub mod permissions;
pub mod roles;

pub use authorize::{AuthzError, Principal, authorize};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use credentials::{CredentialError, generate_password, hash_password, verify_password};
pub use jwt::{Hs256JwtValidator, JwtValidator, TokenError};
pub use permissions::Permission;
pub use roles::Role;
