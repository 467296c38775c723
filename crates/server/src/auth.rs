use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::{header, request::Parts, StatusCode},
    Json,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::{domain::OwnerId, error::ApiError};

use crate::app_state::AppState;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub ttl_seconds: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    owner_id: i64,
    iat: i64,
    exp: i64,
}

pub fn mint_token(
    cfg: &AuthConfig,
    owner_id: OwnerId,
    username: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let exp = now + Duration::seconds(cfg.ttl_seconds);
    let claims = Claims {
        sub: username.to_string(),
        owner_id: owner_id.0,
        iat: now.timestamp(),
        exp: exp.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(cfg.secret.as_bytes()),
    )
}

pub fn verify_token(cfg: &AuthConfig, token: &str) -> Result<OwnerId, ApiError> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(cfg.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::unauthorized("invalid or expired token"))?;
    Ok(OwnerId(decoded.claims.owner_id))
}

fn unauthorized(message: &str) -> (StatusCode, Json<ApiError>) {
    (StatusCode::UNAUTHORIZED, Json(ApiError::unauthorized(message)))
}

/// Owner resolved from an `Authorization: Bearer` header.
pub struct AuthOwner(pub OwnerId);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthOwner {
    type Rejection = (StatusCode, Json<ApiError>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| unauthorized("missing bearer token"))?;
        let owner_id =
            verify_token(&state.auth, token).map_err(|e| (StatusCode::UNAUTHORIZED, Json(e)))?;
        Ok(Self(owner_id))
    }
}

#[derive(Debug, Deserialize)]
struct WsQuery {
    token: Option<String>,
}

/// Owner resolved from the `?token=` query of a websocket upgrade.
pub struct WsOwner(pub OwnerId);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for WsOwner {
    type Rejection = (StatusCode, Json<ApiError>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Query(q) = Query::<WsQuery>::from_request_parts(parts, state)
            .await
            .map_err(|_| unauthorized("missing token"))?;
        let token = q.token.ok_or_else(|| unauthorized("missing token"))?;
        let owner_id =
            verify_token(&state.auth, &token).map_err(|e| (StatusCode::UNAUTHORIZED, Json(e)))?;
        Ok(Self(owner_id))
    }
}

#[cfg(test)]
#[path = "tests/auth_tests.rs"]
mod tests;
