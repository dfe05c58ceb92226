use crate::auth::issue_token;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::models::{AuthResponse, LoginRequest, UserResponse};
use crate::services::users as accounts;
use actix_web::{web, HttpResponse, Result as ActixResult};

#[utoipa::path(
    post,
    path = "/api/auth/token/login/",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 404, description = "User not found")
    ),
    tag = "auth"
)]
pub async fn login(
    req: web::Json<LoginRequest>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> ActixResult<HttpResponse> {
    let user = accounts::authenticate(pool.get_ref(), &req.email, &req.password).await?;

    let token = issue_token(user.id, &user.email, &config.jwt)
        .map_err(ApiError::Internal)?;

    log::info!("User {} logged in", user.id);
    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        user: UserResponse::new(user, false),
    }))
}
