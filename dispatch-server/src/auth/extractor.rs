//! Bearer token extractor
//!
//! Handlers that take a [`CurrentUser`] argument are authenticated; the
//! token is validated once per request and cached in the extensions.

use axum::{extract::FromRequestParts, http::request::Parts};
use shared::error::AppError;
use shared::order::ActorRole;

use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;

impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let token = match auth_header {
            Some(header) => JwtService::extract_from_header(header)
                .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
            None => {
                tracing::warn!(uri = %parts.uri, "Request without credentials");
                return Err(AppError::not_authenticated());
            }
        };

        match state.jwt_service().validate_token(token) {
            Ok(claims) => {
                let user = CurrentUser::try_from(claims)
                    .map_err(|e| AppError::invalid_token(format!("Malformed claims: {}", e)))?;
                parts.extensions.insert(user.clone());
                Ok(user)
            }
            Err(e) => {
                tracing::warn!(error = %e, uri = %parts.uri, "Token rejected");
                match e {
                    JwtError::ExpiredToken => Err(AppError::token_expired()),
                    _ => Err(AppError::invalid_token("Invalid token")),
                }
            }
        }
    }
}

/// Reject callers whose role is not in `roles`
pub fn require_role(user: &CurrentUser, roles: &[ActorRole]) -> Result<(), AppError> {
    if roles.contains(&user.role) {
        Ok(())
    } else {
        Err(AppError::permission_denied(format!(
            "role {} may not perform this action",
            user.role
        )))
    }
}

/// Partners may only act as themselves
pub fn require_self_or_admin(user: &CurrentUser, subject_id: &str) -> Result<(), AppError> {
    if user.is_admin() || user.id == subject_id {
        Ok(())
    } else {
        Err(AppError::permission_denied(format!(
            "{} may not act for {}",
            user.id, subject_id
        )))
    }
}
