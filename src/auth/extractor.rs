use crate::auth::verify_token;
use crate::config::Config;
use crate::error::ApiError;
use actix_web::{web, Error, FromRequest, HttpRequest};
use std::future::{ready, Ready};

/// Caller identity taken from a `Bearer` JWT. Use `Option<AuthenticatedUser>`
/// for endpoints that also serve anonymous visitors.
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub email: String,
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        ready(authenticate(req).map_err(Error::from))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, ApiError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| {
            ApiError::Unauthorized("Authentication credentials were not provided".to_string())
        })?;

    let config = req
        .app_data::<web::Data<Config>>()
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("Config is not registered")))?;

    let claims = verify_token(token, &config.jwt.secret).map_err(|e| {
        log::debug!("Rejected token: {:?}", e);
        ApiError::Unauthorized("Invalid token".to_string())
    })?;

    let user_id = claims
        .user_id()
        .ok_or_else(|| ApiError::Unauthorized("Invalid token".to_string()))?;

    Ok(AuthenticatedUser {
        user_id,
        email: claims.email,
    })
}
