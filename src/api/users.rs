use crate::auth::AuthenticatedUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::models::{
    AvatarRequest, AvatarResponse, Page, PageQuery, Paginated, PaginatedSubscriptions,
    PaginatedUsers, SetPasswordRequest, SignupRequest, SubscriptionResponse, UserCreatedResponse,
    UserResponse,
};
use crate::services::{follows, users as accounts};
use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SubscriptionQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Maximum number of recipes shown per author; non-numeric means no cap
    pub recipes_limit: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecipesLimitQuery {
    /// Maximum number of recipes shown for the author; non-numeric means no cap
    pub recipes_limit: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/users/",
    params(PageQuery),
    responses(
        (status = 200, description = "Paginated users", body = PaginatedUsers)
    ),
    tag = "users"
)]
pub async fn list_users(
    req: HttpRequest,
    user: Option<AuthenticatedUser>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    query: web::Query<PageQuery>,
) -> ActixResult<HttpResponse> {
    let viewer = user.map(|u| u.user_id);
    let page = Page::resolve(query.page, query.limit, &config.pagination);

    let (users, count) = accounts::list_users(pool.get_ref(), page).await?;
    let mut results = Vec::with_capacity(users.len());
    for user in users {
        results.push(accounts::user_view(pool.get_ref(), user, viewer).await?);
    }

    Ok(HttpResponse::Ok().json(Paginated::new(
        results,
        count,
        page,
        req.path(),
        req.query_string(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/users/",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created", body = UserCreatedResponse),
        (status = 400, description = "Invalid data or user already exists")
    ),
    tag = "users"
)]
pub async fn register(
    req: web::Json<SignupRequest>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> ActixResult<HttpResponse> {
    let user = accounts::register(pool.get_ref(), req.into_inner(), config.jwt.bcrypt_cost).await?;
    Ok(HttpResponse::Created().json(UserCreatedResponse::from(user)))
}

#[utoipa::path(
    get,
    path = "/api/users/me/",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "users"
)]
pub async fn me(user: AuthenticatedUser, pool: web::Data<DbPool>) -> ActixResult<HttpResponse> {
    let current = accounts::get_user(pool.get_ref(), user.user_id).await?;
    Ok(HttpResponse::Ok().json(UserResponse::new(current, false)))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/",
    params(("user_id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 404, description = "User not found")
    ),
    tag = "users"
)]
pub async fn get_user(
    path: web::Path<i64>,
    user: Option<AuthenticatedUser>,
    pool: web::Data<DbPool>,
) -> ActixResult<HttpResponse> {
    let profile = accounts::get_user(pool.get_ref(), path.into_inner()).await?;
    let view = accounts::user_view(pool.get_ref(), profile, user.map(|u| u.user_id)).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[utoipa::path(
    put,
    path = "/api/users/me/avatar/",
    request_body = AvatarRequest,
    responses(
        (status = 200, description = "Avatar stored", body = AvatarResponse),
        (status = 400, description = "Avatar missing"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "users"
)]
pub async fn set_avatar(
    req: web::Json<AvatarRequest>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> ActixResult<HttpResponse> {
    let updated = accounts::set_avatar(pool.get_ref(), user.user_id, req.avatar.as_deref()).await?;
    Ok(HttpResponse::Ok().json(AvatarResponse {
        avatar: updated.avatar,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/users/me/avatar/",
    responses(
        (status = 204, description = "Avatar removed"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "users"
)]
pub async fn delete_avatar(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> ActixResult<HttpResponse> {
    accounts::clear_avatar(pool.get_ref(), user.user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    post,
    path = "/api/users/set_password/",
    request_body = SetPasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Wrong current password or weak new password"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "users"
)]
pub async fn set_password(
    req: web::Json<SetPasswordRequest>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> ActixResult<HttpResponse> {
    accounts::set_password(
        pool.get_ref(),
        user.user_id,
        &req.current_password,
        &req.new_password,
        config.jwt.bcrypt_cost,
    )
    .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/users/subscriptions/",
    params(SubscriptionQuery),
    responses(
        (status = 200, description = "Followed authors with recipe previews", body = PaginatedSubscriptions),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "users"
)]
pub async fn subscriptions(
    req: HttpRequest,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    query: web::Query<SubscriptionQuery>,
) -> ActixResult<HttpResponse> {
    let page = Page::resolve(query.page, query.limit, &config.pagination);
    let recipes_limit = follows::parse_recipes_limit(query.recipes_limit.as_deref());

    let (results, count) =
        follows::list_following(pool.get_ref(), user.user_id, page, recipes_limit).await?;

    Ok(HttpResponse::Ok().json(Paginated::new(
        results,
        count,
        page,
        req.path(),
        req.query_string(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/users/{user_id}/subscribe/",
    params(
        ("user_id" = i64, Path, description = "Author ID"),
        RecipesLimitQuery
    ),
    responses(
        (status = 201, description = "Subscribed", body = SubscriptionResponse),
        (status = 400, description = "Already subscribed or self-subscription"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Author not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "users"
)]
pub async fn subscribe(
    path: web::Path<i64>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    query: web::Query<RecipesLimitQuery>,
) -> ActixResult<HttpResponse> {
    let recipes_limit = follows::parse_recipes_limit(query.recipes_limit.as_deref());
    let subscription =
        follows::follow(pool.get_ref(), user.user_id, path.into_inner(), recipes_limit).await?;
    Ok(HttpResponse::Created().json(subscription))
}

#[utoipa::path(
    delete,
    path = "/api/users/{user_id}/subscribe/",
    params(("user_id" = i64, Path, description = "Author ID")),
    responses(
        (status = 204, description = "Unsubscribed"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Author not found or not subscribed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "users"
)]
pub async fn unsubscribe(
    path: web::Path<i64>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> ActixResult<HttpResponse> {
    follows::unfollow(pool.get_ref(), user.user_id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
