use crate::api::is_truthy;
use crate::auth::AuthenticatedUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::models::{
    CreateRecipeRequest, Page, Paginated, PaginatedRecipes, RecipeResponse, RecipeShortResponse,
    ShortLinkResponse, UpdateRecipeRequest,
};
use crate::services::recipes::{self as cookbook, RecipeFilter};
use crate::services::{memberships, shopping_list, short_link};
use actix_web::http::header::{self, ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecipeQuery {
    /// Page number, starting at 1
    pub page: Option<u64>,
    /// Items per page
    pub limit: Option<u64>,
    /// Only recipes by this author
    pub author: Option<i64>,
    /// `1` restricts to the caller's favorites; ignored for anonymous callers
    pub is_favorited: Option<String>,
    /// `1` restricts to the caller's shopping cart; ignored for anonymous callers
    pub is_in_shopping_cart: Option<String>,
}

impl RecipeQuery {
    fn filter(&self, viewer: Option<i64>) -> RecipeFilter {
        let viewer_if = |flag: &Option<String>| viewer.filter(|_| is_truthy(flag.as_deref()));
        RecipeFilter {
            author_id: self.author,
            favorited_by: viewer_if(&self.is_favorited),
            in_cart_of: viewer_if(&self.is_in_shopping_cart),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/recipes/",
    params(RecipeQuery),
    responses(
        (status = 200, description = "Paginated recipes, newest first", body = PaginatedRecipes)
    ),
    tag = "recipes"
)]
pub async fn list_recipes(
    req: HttpRequest,
    user: Option<AuthenticatedUser>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    query: web::Query<RecipeQuery>,
) -> ActixResult<HttpResponse> {
    let viewer = user.map(|u| u.user_id);
    let page = Page::resolve(query.page, query.limit, &config.pagination);

    let (recipes, count) = cookbook::list_recipes(pool.get_ref(), query.filter(viewer), page).await?;
    let results = cookbook::recipe_views(pool.get_ref(), recipes, viewer).await?;

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
    path = "/api/recipes/",
    request_body = CreateRecipeRequest,
    responses(
        (status = 201, description = "Recipe created", body = RecipeResponse),
        (status = 400, description = "Invalid recipe"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn create_recipe(
    req: web::Json<CreateRecipeRequest>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> ActixResult<HttpResponse> {
    let recipe =
        cookbook::create_recipe(pool.get_ref(), user.user_id, req.into_inner(), &config.recipes)
            .await?;
    let view = cookbook::recipe_view(pool.get_ref(), recipe, Some(user.user_id)).await?;
    Ok(HttpResponse::Created().json(view))
}

#[utoipa::path(
    get,
    path = "/api/recipes/{recipe_id}/",
    params(("recipe_id" = i64, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Recipe", body = RecipeResponse),
        (status = 404, description = "Recipe not found")
    ),
    tag = "recipes"
)]
pub async fn get_recipe(
    path: web::Path<i64>,
    user: Option<AuthenticatedUser>,
    pool: web::Data<DbPool>,
) -> ActixResult<HttpResponse> {
    let recipe = cookbook::find_recipe(pool.get_ref(), path.into_inner()).await?;
    let view = cookbook::recipe_view(pool.get_ref(), recipe, user.map(|u| u.user_id)).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[utoipa::path(
    patch,
    path = "/api/recipes/{recipe_id}/",
    params(("recipe_id" = i64, Path, description = "Recipe ID")),
    request_body = UpdateRecipeRequest,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 400, description = "Invalid recipe"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Recipe not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn update_recipe(
    path: web::Path<i64>,
    req: web::Json<UpdateRecipeRequest>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> ActixResult<HttpResponse> {
    let recipe = cookbook::update_recipe(
        pool.get_ref(),
        path.into_inner(),
        user.user_id,
        req.into_inner(),
        &config.recipes,
    )
    .await?;
    let view = cookbook::recipe_view(pool.get_ref(), recipe, Some(user.user_id)).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{recipe_id}/",
    params(("recipe_id" = i64, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Recipe not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn delete_recipe(
    path: web::Path<i64>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> ActixResult<HttpResponse> {
    cookbook::delete_recipe(pool.get_ref(), path.into_inner(), user.user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    post,
    path = "/api/recipes/{recipe_id}/favorite/",
    params(("recipe_id" = i64, Path, description = "Recipe ID")),
    responses(
        (status = 201, description = "Added to favorites", body = RecipeShortResponse),
        (status = 400, description = "Already in favorites"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Recipe not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn add_favorite(
    path: web::Path<i64>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> ActixResult<HttpResponse> {
    let recipe = memberships::add_favorite(pool.get_ref(), user.user_id, path.into_inner()).await?;
    Ok(HttpResponse::Created().json(recipe))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{recipe_id}/favorite/",
    params(("recipe_id" = i64, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Removed from favorites"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Recipe not found or not in favorites")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn remove_favorite(
    path: web::Path<i64>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> ActixResult<HttpResponse> {
    memberships::remove_favorite(pool.get_ref(), user.user_id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    post,
    path = "/api/recipes/{recipe_id}/shopping_cart/",
    params(("recipe_id" = i64, Path, description = "Recipe ID")),
    responses(
        (status = 201, description = "Added to shopping cart", body = RecipeShortResponse),
        (status = 400, description = "Already in shopping cart"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Recipe not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn add_to_shopping_cart(
    path: web::Path<i64>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> ActixResult<HttpResponse> {
    let recipe = memberships::add_to_cart(pool.get_ref(), user.user_id, path.into_inner()).await?;
    Ok(HttpResponse::Created().json(recipe))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{recipe_id}/shopping_cart/",
    params(("recipe_id" = i64, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Removed from shopping cart"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Recipe not found or not in shopping cart")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn remove_from_shopping_cart(
    path: web::Path<i64>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> ActixResult<HttpResponse> {
    memberships::remove_from_cart(pool.get_ref(), user.user_id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Sums ingredient amounts over every recipe in the caller's cart and
/// returns them as a plain-text attachment.
#[utoipa::path(
    get,
    path = "/api/recipes/download_shopping_cart/",
    responses(
        (status = 200, description = "Shopping list", body = String, content_type = "text/plain"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn download_shopping_cart(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> ActixResult<HttpResponse> {
    let body = shopping_list::build_shopping_list(pool.get_ref(), user.user_id).await?;

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(
                shopping_list::SHOPPING_LIST_FILENAME.to_string(),
            )],
        })
        .body(body))
}

#[utoipa::path(
    get,
    path = "/api/recipes/{recipe_id}/get-link/",
    params(("recipe_id" = i64, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Short link", body = ShortLinkResponse),
        (status = 404, description = "Recipe not found")
    ),
    tag = "recipes"
)]
pub async fn get_short_link(
    req: HttpRequest,
    path: web::Path<i64>,
    pool: web::Data<DbPool>,
) -> ActixResult<HttpResponse> {
    let recipe = cookbook::find_recipe(pool.get_ref(), path.into_inner()).await?;

    let conn = req.connection_info();
    let link = short_link::short_url(conn.scheme(), conn.host(), recipe.id);
    Ok(HttpResponse::Ok().json(ShortLinkResponse { short_link: link }))
}

#[utoipa::path(
    get,
    path = "/s/{code}/",
    params(("code" = String, Path, description = "Short link code")),
    responses(
        (status = 302, description = "Redirect to the recipe page"),
        (status = 404, description = "Unknown code")
    ),
    tag = "recipes"
)]
pub async fn follow_short_link(
    path: web::Path<String>,
    pool: web::Data<DbPool>,
) -> ActixResult<HttpResponse> {
    let recipe_id =
        short_link::decode(&path).ok_or_else(|| ApiError::not_found("Short link not found"))?;
    let recipe = cookbook::find_recipe(pool.get_ref(), recipe_id).await?;

    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, format!("/recipes/{}", recipe.id)))
        .finish())
}
