//! Per-user recipe sets: favorites and the shopping cart. Both are plain
//! (user, recipe) pairs whose composite primary key rejects duplicates.

use crate::db::DbPool;
use crate::entities::{favorite, shopping_cart};
use crate::error::{duplicate_as, ApiError, ApiResult};
use crate::models::RecipeShortResponse;
use crate::services::recipes::find_recipe;
use chrono::Utc;
use log::info;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Favorite,
    ShoppingCart,
}

impl Membership {
    fn already_present(&self) -> &'static str {
        match self {
            Membership::Favorite => "Recipe is already in favorites",
            Membership::ShoppingCart => "Recipe is already in the shopping cart",
        }
    }

    fn absent(&self) -> &'static str {
        match self {
            Membership::Favorite => "Recipe is not in favorites",
            Membership::ShoppingCart => "Recipe is not in the shopping cart",
        }
    }
}

pub async fn add_favorite(db: &DbPool, user_id: i64, recipe_id: i64) -> ApiResult<RecipeShortResponse> {
    add(db, Membership::Favorite, user_id, recipe_id).await
}

pub async fn remove_favorite(db: &DbPool, user_id: i64, recipe_id: i64) -> ApiResult<()> {
    remove(db, Membership::Favorite, user_id, recipe_id).await
}

pub async fn add_to_cart(db: &DbPool, user_id: i64, recipe_id: i64) -> ApiResult<RecipeShortResponse> {
    add(db, Membership::ShoppingCart, user_id, recipe_id).await
}

pub async fn remove_from_cart(db: &DbPool, user_id: i64, recipe_id: i64) -> ApiResult<()> {
    remove(db, Membership::ShoppingCart, user_id, recipe_id).await
}

/// Check and insert share one transaction; a concurrent duplicate that slips
/// past the check is still reported as `AlreadyExists` by the key constraint.
pub async fn add(
    db: &DbPool,
    kind: Membership,
    user_id: i64,
    recipe_id: i64,
) -> ApiResult<RecipeShortResponse> {
    let txn = db.begin().await?;
    let recipe = find_recipe(&txn, recipe_id).await?;

    let exists = match kind {
        Membership::Favorite => favorite::Entity::find_by_id((user_id, recipe_id))
            .one(&txn)
            .await?
            .is_some(),
        Membership::ShoppingCart => shopping_cart::Entity::find_by_id((user_id, recipe_id))
            .one(&txn)
            .await?
            .is_some(),
    };
    if exists {
        return Err(ApiError::AlreadyExists(kind.already_present().to_string()));
    }

    let now = Utc::now();
    let inserted = match kind {
        Membership::Favorite => {
            favorite::Entity::insert(favorite::ActiveModel {
                user_id: Set(user_id),
                recipe_id: Set(recipe_id),
                created_at: Set(now),
            })
            .exec_without_returning(&txn)
            .await
        }
        Membership::ShoppingCart => {
            shopping_cart::Entity::insert(shopping_cart::ActiveModel {
                user_id: Set(user_id),
                recipe_id: Set(recipe_id),
                created_at: Set(now),
            })
            .exec_without_returning(&txn)
            .await
        }
    };
    inserted.map_err(|e| duplicate_as(e, kind.already_present()))?;
    txn.commit().await?;

    info!("User {} added recipe {} to {:?}", user_id, recipe_id, kind);
    Ok(RecipeShortResponse::from(recipe))
}

pub async fn remove(db: &DbPool, kind: Membership, user_id: i64, recipe_id: i64) -> ApiResult<()> {
    find_recipe(db, recipe_id).await?;

    let deleted = match kind {
        Membership::Favorite => {
            favorite::Entity::delete_many()
                .filter(favorite::Column::UserId.eq(user_id))
                .filter(favorite::Column::RecipeId.eq(recipe_id))
                .exec(db)
                .await?
        }
        Membership::ShoppingCart => {
            shopping_cart::Entity::delete_many()
                .filter(shopping_cart::Column::UserId.eq(user_id))
                .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
                .exec(db)
                .await?
        }
    };

    if deleted.rows_affected == 0 {
        return Err(ApiError::NotFound(kind.absent().to_string()));
    }
    info!("User {} removed recipe {} from {:?}", user_id, recipe_id, kind);
    Ok(())
}
