//! Authentication middleware
//!
//! Bearer-token validation plus store-access scoping. The caller's store
//! access list rides in the token claims and is threaded through handlers as
//! an explicit context value; the store being queried is always a request
//! parameter checked against that list, never ambient state.

use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::error::{AppError, ErrorResponse};

/// Authenticated caller information extracted from the bearer token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    /// Stores this caller may query or mutate
    pub store_access: Vec<Uuid>,
}

impl AuthUser {
    /// Check that the caller may act on `store_id`.
    pub fn check_store_access(&self, store_id: Uuid) -> Result<(), AppError> {
        if self.store_access.contains(&store_id) {
            Ok(())
        } else {
            tracing::warn!(user_id = %self.user_id, store_id = %store_id, "store access denied");
            Err(AppError::StoreAccessDenied)
        }
    }
}

/// Authentication middleware that validates bearer tokens.
/// Token validation is done inline to avoid state dependency issues.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) if header.starts_with("Bearer ") => &header[7..],
        _ => {
            return unauthorized_response("Missing or invalid Authorization header");
        }
    };

    let jwt_secret = std::env::var("STOCKCOUNT__JWT__SECRET")
        .or_else(|_| std::env::var("STOCKCOUNT_JWT_SECRET"))
        .unwrap_or_else(|_| "development-secret-key".to_string());

    let claims = match decode_jwt(token, &jwt_secret) {
        Ok(claims) => claims,
        Err(msg) => {
            return unauthorized_response(&msg);
        }
    };

    let user_id = match Uuid::parse_str(&claims.sub) {
        Ok(id) => id,
        Err(_) => return unauthorized_response("Invalid user ID in token"),
    };

    let mut store_access = Vec::with_capacity(claims.stores.len());
    for store in &claims.stores {
        match Uuid::parse_str(store) {
            Ok(id) => store_access.push(id),
            Err(_) => return unauthorized_response("Invalid store ID in token"),
        }
    }

    request
        .extensions_mut()
        .insert(AuthUser { user_id, store_access });

    next.run(request).await
}

/// Bearer token claims structure
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct Claims {
    sub: String,
    stores: Vec<String>,
    exp: i64,
    iat: i64,
}

/// Decode and validate a bearer token
fn decode_jwt(token: &str, secret: &str) -> Result<Claims, String> {
    use jsonwebtoken::{decode, DecodingKey, Validation};

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| format!("Invalid token: {}", e))
}

/// Create unauthorized response
fn unauthorized_response(message: &str) -> Response {
    let error = ErrorResponse {
        error: crate::error::ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            field: None,
        },
    };

    (StatusCode::UNAUTHORIZED, Json(error)).into_response()
}

/// Extractor for the authenticated caller.
/// Use this in handlers to get the current user and their store access list.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| {
                let error = ErrorResponse {
                    error: crate::error::ErrorDetail {
                        code: "UNAUTHORIZED".to_string(),
                        message: "Authentication required".to_string(),
                        field: None,
                    },
                };
                (StatusCode::UNAUTHORIZED, Json(error))
            })
    }
}
