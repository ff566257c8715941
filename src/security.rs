//! User token checks for session endpoints.
//!
//! The page hands its token to the stream and form endpoints either as a
//! `?token=` query parameter (SSE cannot set headers) or as a bearer header.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::Error;

/// Claims carried by a user token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub exp: usize,
}

/// Caller identity, inserted into request extensions for every request that
/// passes the middleware. `user_id` is `None` for anonymous callers.
#[derive(Debug, Clone, Default)]
pub struct UserContext {
    pub user_id: Option<String>,
}

/// Pull a token from the `Authorization` header or the `token` query parameter.
pub fn extract_token(request: &Request) -> Option<String> {
    let from_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    from_header.or_else(|| {
        request.uri().query().and_then(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .find(|(k, _)| k == "token")
                .map(|(_, v)| v.into_owned())
        })
    })
}

/// Verify an HS256 token against `secret`.
pub fn verify(token: &str, secret: &str) -> Result<UserClaims, Error> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    decode::<UserClaims>(token, &key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| Error::Unauthorized(e.to_string()))
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Error> {
    let Some(token) = extract_token(&request) else {
        if state.config.security.token_required {
            return Err(Error::Unauthorized("missing token".to_string()));
        }
        request.extensions_mut().insert(UserContext::default());
        return Ok(next.run(request).await);
    };

    match verify(&token, &state.config.security.jwt_secret) {
        Ok(claims) => {
            request
                .extensions_mut()
                .insert(UserContext {
                    user_id: Some(claims.sub),
                });
            Ok(next.run(request).await)
        }
        Err(e) if state.config.security.token_required => {
            tracing::warn!(name: "auth.rejected", error = %e, "Token rejected");
            Err(e)
        }
        // Optional mode: a stale token is not fatal.
        Err(_) => {
            request.extensions_mut().insert(UserContext::default());
            Ok(next.run(request).await)
        }
    }
}
