//! Recipe composition: a recipe and its ingredient list are always written
//! together inside one transaction, so readers never observe a recipe with a
//! partial ingredient set.

use crate::config::RecipeLimits;
use crate::db::DbPool;
use crate::entities::{favorite, follow, ingredient, recipe, recipe_ingredient, shopping_cart, user};
use crate::error::{ApiError, ApiResult};
use crate::models::{
    CreateRecipeRequest, IngredientAmount, Page, RecipeIngredientResponse, RecipeResponse,
    UpdateRecipeRequest, UserResponse,
};
use chrono::Utc;
use log::{debug, info};
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::HashSet;

const MAX_NAME_LENGTH: usize = 255;

pub async fn create_recipe(
    db: &DbPool,
    author_id: i64,
    req: CreateRecipeRequest,
    limits: &RecipeLimits,
) -> ApiResult<recipe::Model> {
    let name = validate_name(&req.name)?;
    let text = validate_text(&req.text)?;
    let image = validate_image(req.image.as_deref())?;
    validate_cooking_time(req.cooking_time, limits)?;

    let txn = db.begin().await?;
    validate_ingredients(&txn, &req.ingredients, limits).await?;

    let now = Utc::now();
    let recipe = recipe::ActiveModel {
        author_id: Set(author_id),
        name: Set(name),
        image: Set(image),
        text: Set(text),
        cooking_time: Set(req.cooking_time),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    insert_ingredient_links(&txn, recipe.id, &req.ingredients).await?;
    txn.commit().await?;

    info!(
        "Recipe {} created by user {} with {} ingredients",
        recipe.id,
        author_id,
        req.ingredients.len()
    );
    Ok(recipe)
}

/// Applies a partial update. A supplied ingredient list replaces the stored
/// one wholesale; an absent list leaves the links untouched.
pub async fn update_recipe(
    db: &DbPool,
    recipe_id: i64,
    editor_id: i64,
    patch: UpdateRecipeRequest,
    limits: &RecipeLimits,
) -> ApiResult<recipe::Model> {
    let txn = db.begin().await?;

    let existing = find_recipe(&txn, recipe_id).await?;
    ensure_author(&existing, editor_id)?;

    let mut active: recipe::ActiveModel = existing.into();
    if let Some(name) = patch.name.as_deref() {
        active.name = Set(validate_name(name)?);
    }
    if let Some(text) = patch.text.as_deref() {
        active.text = Set(validate_text(text)?);
    }
    if patch.image.is_some() {
        active.image = Set(validate_image(patch.image.as_deref())?);
    }
    if let Some(cooking_time) = patch.cooking_time {
        validate_cooking_time(cooking_time, limits)?;
        active.cooking_time = Set(cooking_time);
    }

    if let Some(ingredients) = patch.ingredients.as_ref() {
        validate_ingredients(&txn, ingredients, limits).await?;
        recipe_ingredient::Entity::delete_many()
            .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
            .exec(&txn)
            .await?;
        insert_ingredient_links(&txn, recipe_id, ingredients).await?;
    }

    active.updated_at = Set(Utc::now());
    let updated = active.update(&txn).await?;
    txn.commit().await?;

    info!("Recipe {} updated by user {}", recipe_id, editor_id);
    Ok(updated)
}

pub async fn delete_recipe(db: &DbPool, recipe_id: i64, user_id: i64) -> ApiResult<()> {
    let txn = db.begin().await?;

    let existing = find_recipe(&txn, recipe_id).await?;
    ensure_author(&existing, user_id)?;

    recipe_ingredient::Entity::delete_many()
        .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
        .exec(&txn)
        .await?;
    favorite::Entity::delete_many()
        .filter(favorite::Column::RecipeId.eq(recipe_id))
        .exec(&txn)
        .await?;
    shopping_cart::Entity::delete_many()
        .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
        .exec(&txn)
        .await?;
    recipe::Entity::delete_by_id(recipe_id).exec(&txn).await?;

    txn.commit().await?;
    info!("Recipe {} deleted by user {}", recipe_id, user_id);
    Ok(())
}

pub async fn find_recipe<C: ConnectionTrait>(conn: &C, recipe_id: i64) -> ApiResult<recipe::Model> {
    recipe::Entity::find_by_id(recipe_id)
        .one(conn)
        .await?
        .ok_or_else(|| ApiError::not_found("Recipe not found"))
}

fn ensure_author(recipe: &recipe::Model, user_id: i64) -> ApiResult<()> {
    if recipe.author_id != user_id {
        return Err(ApiError::Forbidden(
            "Only the author can modify this recipe".to_string(),
        ));
    }
    Ok(())
}

async fn insert_ingredient_links<C: ConnectionTrait>(
    conn: &C,
    recipe_id: i64,
    ingredients: &[IngredientAmount],
) -> ApiResult<()> {
    let links = ingredients
        .iter()
        .map(|item| recipe_ingredient::ActiveModel {
            recipe_id: Set(recipe_id),
            ingredient_id: Set(item.id),
            amount: Set(item.amount),
        });
    recipe_ingredient::Entity::insert_many(links)
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

fn validate_name(name: &str) -> ApiResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("Recipe name must not be empty"));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ApiError::validation(format!(
            "Recipe name must be at most {} characters",
            MAX_NAME_LENGTH
        )));
    }
    Ok(name.to_string())
}

fn validate_text(text: &str) -> ApiResult<String> {
    if text.trim().is_empty() {
        return Err(ApiError::validation("Recipe description must not be empty"));
    }
    Ok(text.to_string())
}

fn validate_image(image: Option<&str>) -> ApiResult<String> {
    match image.map(str::trim) {
        Some(image) if !image.is_empty() => Ok(image.to_string()),
        _ => Err(ApiError::validation("Recipe image is required")),
    }
}

fn validate_cooking_time(cooking_time: i32, limits: &RecipeLimits) -> ApiResult<()> {
    if cooking_time < limits.min_cooking_time || cooking_time > limits.max_cooking_time {
        return Err(ApiError::validation(format!(
            "Cooking time must be between {} and {} minutes",
            limits.min_cooking_time, limits.max_cooking_time
        )));
    }
    Ok(())
}

/// Checks the list shape and bounds, then that every id exists in the catalog.
async fn validate_ingredients<C: ConnectionTrait>(
    conn: &C,
    ingredients: &[IngredientAmount],
    limits: &RecipeLimits,
) -> ApiResult<()> {
    if ingredients.is_empty() {
        return Err(ApiError::validation("At least one ingredient is required"));
    }

    let mut seen = HashSet::with_capacity(ingredients.len());
    for item in ingredients {
        if !seen.insert(item.id) {
            return Err(ApiError::validation(format!(
                "Ingredient {} is listed more than once",
                item.id
            )));
        }
        if item.amount < limits.min_amount || item.amount > limits.max_amount {
            return Err(ApiError::validation(format!(
                "Ingredient amount must be between {} and {}",
                limits.min_amount, limits.max_amount
            )));
        }
    }

    let ids: Vec<i64> = seen.into_iter().collect();
    let known = ingredient::Entity::find()
        .filter(ingredient::Column::Id.is_in(ids.clone()))
        .count(conn)
        .await?;
    if known != ids.len() as u64 {
        debug!("Recipe references unknown ingredients among {:?}", ids);
        return Err(ApiError::validation("Unknown ingredient referenced"));
    }
    Ok(())
}

/// Recipe listing filters. The membership filters hold the viewer's id and
/// are only set for authenticated viewers.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecipeFilter {
    pub author_id: Option<i64>,
    pub favorited_by: Option<i64>,
    pub in_cart_of: Option<i64>,
}

/// Newest recipes first, with the total count of matches for pagination.
pub async fn list_recipes(
    db: &DbPool,
    filter: RecipeFilter,
    page: Page,
) -> ApiResult<(Vec<recipe::Model>, u64)> {
    let mut query = recipe::Entity::find();

    if let Some(author_id) = filter.author_id {
        query = query.filter(recipe::Column::AuthorId.eq(author_id));
    }
    if let Some(user_id) = filter.favorited_by {
        query = query.filter(
            recipe::Column::Id.in_subquery(
                Query::select()
                    .column(favorite::Column::RecipeId)
                    .from(favorite::Entity)
                    .and_where(favorite::Column::UserId.eq(user_id))
                    .to_owned(),
            ),
        );
    }
    if let Some(user_id) = filter.in_cart_of {
        query = query.filter(
            recipe::Column::Id.in_subquery(
                Query::select()
                    .column(shopping_cart::Column::RecipeId)
                    .from(shopping_cart::Entity)
                    .and_where(shopping_cart::Column::UserId.eq(user_id))
                    .to_owned(),
            ),
        );
    }

    let count = query.clone().count(db).await?;
    let recipes = query
        .order_by_desc(recipe::Column::CreatedAt)
        .order_by_desc(recipe::Column::Id)
        .limit(page.size)
        .offset(page.offset())
        .all(db)
        .await?;

    Ok((recipes, count))
}

/// Full read model of a recipe as seen by `viewer` (`None` for anonymous).
pub async fn recipe_view(
    db: &DbPool,
    recipe: recipe::Model,
    viewer: Option<i64>,
) -> ApiResult<RecipeResponse> {
    let author = user::Entity::find_by_id(recipe.author_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Recipe author not found"))?;

    let ingredients = recipe_ingredient::Entity::find()
        .filter(recipe_ingredient::Column::RecipeId.eq(recipe.id))
        .find_also_related(ingredient::Entity)
        .order_by_asc(ingredient::Column::Name)
        .all(db)
        .await?
        .into_iter()
        .filter_map(|(link, ingredient)| {
            ingredient.map(|ingredient| RecipeIngredientResponse {
                id: ingredient.id,
                name: ingredient.name,
                measurement_unit: ingredient.measurement_unit,
                amount: link.amount,
            })
        })
        .collect();

    let (is_subscribed, is_favorited, is_in_shopping_cart) = match viewer {
        Some(viewer_id) => (
            is_following(db, viewer_id, author.id).await?,
            favorite::Entity::find_by_id((viewer_id, recipe.id))
                .one(db)
                .await?
                .is_some(),
            shopping_cart::Entity::find_by_id((viewer_id, recipe.id))
                .one(db)
                .await?
                .is_some(),
        ),
        None => (false, false, false),
    };

    Ok(RecipeResponse {
        id: recipe.id,
        author: UserResponse::new(author, is_subscribed),
        ingredients,
        is_favorited,
        is_in_shopping_cart,
        name: recipe.name,
        image: recipe.image,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
    })
}

pub async fn recipe_views(
    db: &DbPool,
    recipes: Vec<recipe::Model>,
    viewer: Option<i64>,
) -> ApiResult<Vec<RecipeResponse>> {
    let mut views = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        views.push(recipe_view(db, recipe, viewer).await?);
    }
    Ok(views)
}

pub async fn is_following<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
    author_id: i64,
) -> ApiResult<bool> {
    Ok(follow::Entity::find_by_id((user_id, author_id))
        .one(conn)
        .await?
        .is_some())
}
