use crate::db::DbPool;
use crate::entities::{follow, recipe, user};
use crate::error::{duplicate_as, ApiError, ApiResult};
use crate::models::{Page, RecipeShortResponse, SubscriptionResponse};
use chrono::Utc;
use log::info;
use sea_orm::sea_query::Query;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

/// Parses the `recipes_limit` query value. Missing, negative or non-numeric
/// values mean "no cap".
pub fn parse_recipes_limit(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
}

pub async fn follow(
    db: &DbPool,
    user_id: i64,
    author_id: i64,
    recipes_limit: Option<u64>,
) -> ApiResult<SubscriptionResponse> {
    if user_id == author_id {
        return Err(ApiError::InvalidOperation(
            "You cannot subscribe to yourself".to_string(),
        ));
    }

    let txn = db.begin().await?;
    let author = find_user(&txn, author_id).await?;

    let exists = follow::Entity::find_by_id((user_id, author_id))
        .one(&txn)
        .await?
        .is_some();
    if exists {
        return Err(ApiError::AlreadyExists(
            "You are already subscribed to this author".to_string(),
        ));
    }

    follow::Entity::insert(follow::ActiveModel {
        user_id: Set(user_id),
        author_id: Set(author_id),
        created_at: Set(Utc::now()),
    })
    .exec_without_returning(&txn)
    .await
    .map_err(|e| duplicate_as(e, "You are already subscribed to this author"))?;

    let subscription = subscription_view(&txn, author, recipes_limit).await?;
    txn.commit().await?;

    info!("User {} subscribed to author {}", user_id, author_id);
    Ok(subscription)
}

pub async fn unfollow(db: &DbPool, user_id: i64, author_id: i64) -> ApiResult<()> {
    find_user(db, author_id).await?;

    let deleted = follow::Entity::delete_many()
        .filter(follow::Column::UserId.eq(user_id))
        .filter(follow::Column::AuthorId.eq(author_id))
        .exec(db)
        .await?;
    if deleted.rows_affected == 0 {
        return Err(ApiError::not_found("You are not subscribed to this author"));
    }

    info!("User {} unsubscribed from author {}", user_id, author_id);
    Ok(())
}

/// Authors followed by `user_id`, one page at a time, each with a recipe
/// preview capped at `recipes_limit`.
pub async fn list_following(
    db: &DbPool,
    user_id: i64,
    page: Page,
    recipes_limit: Option<u64>,
) -> ApiResult<(Vec<SubscriptionResponse>, u64)> {
    let query = user::Entity::find().filter(
        user::Column::Id.in_subquery(
            Query::select()
                .column(follow::Column::AuthorId)
                .from(follow::Entity)
                .and_where(follow::Column::UserId.eq(user_id))
                .to_owned(),
        ),
    );

    let count = query.clone().count(db).await?;
    let authors = query
        .order_by_asc(user::Column::Username)
        .limit(page.size)
        .offset(page.offset())
        .all(db)
        .await?;

    let mut subscriptions = Vec::with_capacity(authors.len());
    for author in authors {
        subscriptions.push(subscription_view(db, author, recipes_limit).await?);
    }
    Ok((subscriptions, count))
}

async fn subscription_view<C: ConnectionTrait>(
    conn: &C,
    author: user::Model,
    recipes_limit: Option<u64>,
) -> ApiResult<SubscriptionResponse> {
    let recipes_query = recipe::Entity::find().filter(recipe::Column::AuthorId.eq(author.id));
    let recipes_count = recipes_query.clone().count(conn).await?;

    let mut preview = recipes_query
        .order_by_desc(recipe::Column::CreatedAt)
        .order_by_desc(recipe::Column::Id);
    if let Some(limit) = recipes_limit {
        preview = preview.limit(limit);
    }
    let recipes = preview
        .all(conn)
        .await?
        .into_iter()
        .map(RecipeShortResponse::from)
        .collect();

    Ok(SubscriptionResponse::new(author, recipes, recipes_count))
}

async fn find_user<C: ConnectionTrait>(conn: &C, user_id: i64) -> ApiResult<user::Model> {
    user::Entity::find_by_id(user_id)
        .one(conn)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}
