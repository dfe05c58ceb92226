use crate::db::DbPool;
use crate::models::IngredientResponse;
use crate::services::ingredients as catalog;
use actix_web::{web, HttpResponse, Result as ActixResult};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IngredientQuery {
    /// Case-insensitive name prefix
    #[param(example = "mil")]
    pub name: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/ingredients/",
    params(IngredientQuery),
    responses(
        (status = 200, description = "Matching ingredients, unpaginated", body = Vec<IngredientResponse>)
    ),
    tag = "ingredients"
)]
pub async fn list_ingredients(
    pool: web::Data<DbPool>,
    query: web::Query<IngredientQuery>,
) -> ActixResult<HttpResponse> {
    let ingredients = catalog::search_ingredients(pool.get_ref(), query.name.as_deref()).await?;

    let body: Vec<IngredientResponse> = ingredients.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    get,
    path = "/api/ingredients/{ingredient_id}/",
    params(("ingredient_id" = i64, Path, description = "Ingredient ID")),
    responses(
        (status = 200, description = "Ingredient", body = IngredientResponse),
        (status = 404, description = "Ingredient not found")
    ),
    tag = "ingredients"
)]
pub async fn get_ingredient(
    path: web::Path<i64>,
    pool: web::Data<DbPool>,
) -> ActixResult<HttpResponse> {
    let ingredient = catalog::get_ingredient(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(IngredientResponse::from(ingredient)))
}
