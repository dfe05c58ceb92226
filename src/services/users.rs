use crate::auth::{hash_password, verify_password};
use crate::db::DbPool;
use crate::entities::user;
use crate::error::{duplicate_as, ApiError, ApiResult};
use crate::models::{Page, SignupRequest, UserResponse};
use crate::services::recipes::is_following;
use chrono::Utc;
use log::{info, warn};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

const MAX_EMAIL_LENGTH: usize = 254;
const MAX_NAME_LENGTH: usize = 150;
const MIN_PASSWORD_LENGTH: usize = 8;

pub async fn register(db: &DbPool, req: SignupRequest, bcrypt_cost: u32) -> ApiResult<user::Model> {
    let email = validate_email(&req.email)?;
    let username = validate_username(&req.username)?;
    let first_name = validate_person_name(&req.first_name, "First name")?;
    let last_name = validate_person_name(&req.last_name, "Last name")?;
    validate_password(&req.password)?;

    let existing = user::Entity::find()
        .filter(
            Condition::any()
                .add(user::Column::Email.eq(email.as_str()))
                .add(user::Column::Username.eq(username.as_str())),
        )
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::AlreadyExists(
            "User with this email or username already exists".to_string(),
        ));
    }

    let password_hash = hash_password(&req.password, bcrypt_cost)?;
    let now = Utc::now();
    let user = user::ActiveModel {
        email: Set(email),
        username: Set(username),
        first_name: Set(first_name),
        last_name: Set(last_name),
        password_hash: Set(password_hash),
        avatar: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| duplicate_as(e, "User with this email or username already exists"))?;

    info!("Registered user {} ({})", user.id, user.username);
    Ok(user)
}

/// Resolves login credentials to an account.
pub async fn authenticate(db: &DbPool, email: &str, password: &str) -> ApiResult<user::Model> {
    let user = user::Entity::find()
        .filter(user::Column::Email.eq(email.trim()))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if !verify_password(password, &user.password_hash) {
        warn!("Failed login attempt for user {}", user.id);
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }
    Ok(user)
}

pub async fn get_user(db: &DbPool, user_id: i64) -> ApiResult<user::Model> {
    user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

pub async fn list_users(db: &DbPool, page: Page) -> ApiResult<(Vec<user::Model>, u64)> {
    let count = user::Entity::find().count(db).await?;
    let users = user::Entity::find()
        .order_by_asc(user::Column::Id)
        .limit(page.size)
        .offset(page.offset())
        .all(db)
        .await?;
    Ok((users, count))
}

pub async fn user_view(
    db: &DbPool,
    user: user::Model,
    viewer: Option<i64>,
) -> ApiResult<UserResponse> {
    let is_subscribed = match viewer {
        Some(viewer_id) if viewer_id != user.id => is_following(db, viewer_id, user.id).await?,
        _ => false,
    };
    Ok(UserResponse::new(user, is_subscribed))
}

pub async fn set_avatar(db: &DbPool, user_id: i64, avatar: Option<&str>) -> ApiResult<user::Model> {
    let avatar = match avatar.map(str::trim) {
        Some(avatar) if !avatar.is_empty() => avatar.to_string(),
        _ => return Err(ApiError::validation("Avatar is required")),
    };

    let mut active: user::ActiveModel = get_user(db, user_id).await?.into();
    active.avatar = Set(Some(avatar));
    active.updated_at = Set(Utc::now());
    Ok(active.update(db).await?)
}

pub async fn clear_avatar(db: &DbPool, user_id: i64) -> ApiResult<()> {
    let mut active: user::ActiveModel = get_user(db, user_id).await?.into();
    active.avatar = Set(None);
    active.updated_at = Set(Utc::now());
    active.update(db).await?;
    Ok(())
}

pub async fn set_password(
    db: &DbPool,
    user_id: i64,
    current_password: &str,
    new_password: &str,
    bcrypt_cost: u32,
) -> ApiResult<()> {
    let user = get_user(db, user_id).await?;
    if !verify_password(current_password, &user.password_hash) {
        return Err(ApiError::validation("Current password is incorrect"));
    }
    validate_password(new_password)?;

    let mut active: user::ActiveModel = user.into();
    active.password_hash = Set(hash_password(new_password, bcrypt_cost)?);
    active.updated_at = Set(Utc::now());
    active.update(db).await?;

    info!("User {} changed password", user_id);
    Ok(())
}

fn validate_email(email: &str) -> ApiResult<String> {
    let email = email.trim();
    let well_formed = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if !well_formed || email.len() > MAX_EMAIL_LENGTH {
        return Err(ApiError::validation("Enter a valid email address"));
    }
    Ok(email.to_string())
}

fn validate_username(username: &str) -> ApiResult<String> {
    if username.is_empty() || username.chars().count() > MAX_NAME_LENGTH {
        return Err(ApiError::validation(format!(
            "Username must be 1 to {} characters long",
            MAX_NAME_LENGTH
        )));
    }
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-');
    if !username.chars().all(allowed) {
        return Err(ApiError::validation(
            "Username may contain only letters, digits and @ . + - _",
        ));
    }
    Ok(username.to_string())
}

fn validate_person_name(name: &str, field: &str) -> ApiResult<String> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
        return Err(ApiError::validation(format!(
            "{} must be 1 to {} characters long",
            field, MAX_NAME_LENGTH
        )));
    }
    Ok(name.to_string())
}

fn validate_password(password: &str) -> ApiResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::validation(format!(
            "Password must contain at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(ApiError::validation("Password cannot be entirely numeric"));
    }
    Ok(())
}
