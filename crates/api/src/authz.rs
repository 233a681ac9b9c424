//! API-side authorization guard.
//!
//! Every handler checks its permission here before calling into the
//! lifecycle engine, so the engine itself stays auth-agnostic.

use axum::http::StatusCode;
use axum::response::Response;

use lustre_auth::{Permission, authorize};

use crate::app::errors;
use crate::context::PrincipalContext;

/// Require `permission` for the current principal, or produce a 403 response.
pub fn require(principal: &PrincipalContext, permission: &Permission) -> Result<(), Response> {
    authorize(&principal.principal(), permission)
        .map_err(|e| errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string()))
}
