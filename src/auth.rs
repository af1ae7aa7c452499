//! Token-to-user binding. Intentionally weak authentication: a bearer token
//! is bound to the first user id it is presented with and keeps that identity
//! for the process lifetime. Bindings are never invalidated or expired.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::api::routes::ApiState;
use crate::error::{AppError, Result};

pub struct TokenBinder {
    /// token → user_id, first write wins
    bindings: DashMap<String, String>,
}

impl TokenBinder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            bindings: DashMap::new(),
        })
    }

    /// Resolve a token to its user id, binding it on first use.
    ///
    /// The entry API holds the shard lock across the check-then-insert, so
    /// two concurrent first contacts with the same token cannot both bind.
    pub fn resolve(&self, token: &str, hint: Option<&str>) -> Result<String> {
        match self.bindings.entry(token.to_string()) {
            Entry::Occupied(bound) => match hint {
                Some(h) if h != bound.get() => Err(AppError::Forbidden(
                    "Token already bound to a different user".to_string(),
                )),
                _ => Ok(bound.get().clone()),
            },
            Entry::Vacant(slot) => match hint {
                Some(h) => {
                    slot.insert(h.to_string());
                    Ok(h.to_string())
                }
                None => Err(AppError::Unauthenticated(
                    "Unknown token. Include X-User-Id to bind.".to_string(),
                )),
            },
        }
    }
}

/// Resolved caller identity, extracted from the `Authorization: Bearer`
/// header plus the optional `X-User-Id` binding hint.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

#[async_trait]
impl FromRequestParts<ApiState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Unauthenticated("Missing Authorization header".to_string())
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Unauthenticated(
                "Invalid Authorization format. Expected: Bearer <token>".to_string(),
            )
        })?;

        let hint = parts.headers.get("x-user-id").and_then(|v| v.to_str().ok());
        let user_id = state.binder.resolve(token, hint)?;

        Ok(AuthUser { user_id })
    }
}
