// ABOUTME: Authentication context for API requests
// ABOUTME: Resolves the bearer token into a principal; bad or missing credentials mean anonymous

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use std::convert::Infallible;
use tracing::warn;

use keel_security::{verify_token_hash, Principal};

use crate::AppState;

/// Principal id given to holders of the admin token
pub const ADMIN_PRINCIPAL_ID: &str = "admin";

/// Caller of the current request
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Principal);

/// Extract the token from `Authorization: Bearer <token>`
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

pub fn resolve_principal(headers: &HeaderMap, admin_token_hash: Option<&str>) -> Principal {
    let Some(token) = bearer_token(headers) else {
        return Principal::anonymous();
    };

    match admin_token_hash {
        Some(hash) if verify_token_hash(token, hash) => Principal::administrator(ADMIN_PRINCIPAL_ID),
        Some(_) => {
            warn!(audit = true, "Bearer token did not match the admin credential");
            Principal::anonymous()
        }
        None => {
            warn!(audit = true, "Bearer token sent but no admin credential is configured");
            Principal::anonymous()
        }
    }
}

impl FromRequestParts<AppState> for CurrentPrincipal {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(resolve_principal(
            &parts.headers,
            state.admin_token_hash.as_deref(),
        )))
    }
}
