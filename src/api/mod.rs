pub mod auth;
pub mod ingredients;
pub mod recipes;
pub mod users;

use crate::error::ApiError;
use crate::models::{
    AuthResponse, AvatarRequest, AvatarResponse, CreateRecipeRequest, IngredientAmount,
    IngredientResponse, LoginRequest, PaginatedRecipes, PaginatedSubscriptions, PaginatedUsers,
    RecipeIngredientResponse, RecipeResponse, RecipeShortResponse, SetPasswordRequest,
    ShortLinkResponse, SignupRequest, SubscriptionResponse, UpdateRecipeRequest,
    UserCreatedResponse, UserResponse,
};
use actix_web::web;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth endpoints
        auth::login,
        // User endpoints
        users::list_users,
        users::register,
        users::me,
        users::get_user,
        users::set_avatar,
        users::delete_avatar,
        users::set_password,
        users::subscriptions,
        users::subscribe,
        users::unsubscribe,
        // Ingredient endpoints
        ingredients::list_ingredients,
        ingredients::get_ingredient,
        // Recipe endpoints
        recipes::list_recipes,
        recipes::create_recipe,
        recipes::get_recipe,
        recipes::update_recipe,
        recipes::delete_recipe,
        recipes::add_favorite,
        recipes::remove_favorite,
        recipes::add_to_shopping_cart,
        recipes::remove_from_shopping_cart,
        recipes::download_shopping_cart,
        recipes::get_short_link,
        recipes::follow_short_link,
    ),
    components(schemas(
        // Auth schemas
        LoginRequest,
        AuthResponse,
        // User schemas
        SignupRequest,
        UserCreatedResponse,
        UserResponse,
        SubscriptionResponse,
        AvatarRequest,
        AvatarResponse,
        SetPasswordRequest,
        PaginatedUsers,
        PaginatedSubscriptions,
        // Ingredient schemas
        IngredientResponse,
        // Recipe schemas
        IngredientAmount,
        CreateRecipeRequest,
        UpdateRecipeRequest,
        RecipeIngredientResponse,
        RecipeResponse,
        RecipeShortResponse,
        ShortLinkResponse,
        PaginatedRecipes,
    )),
    tags(
        (name = "auth", description = "Token endpoints"),
        (name = "users", description = "Accounts and subscriptions"),
        (name = "ingredients", description = "Ingredient catalog"),
        (name = "recipes", description = "Recipes, favorites and shopping cart"),
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

use utoipa::Modify;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

/// Registers every API route plus the extractor error handlers.
/// Shared by the server binary and the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        ApiError::Validation(format!("Malformed request body: {}", err)).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        ApiError::Validation(format!("Malformed query string: {}", err)).into()
    }))
    .app_data(
        web::PathConfig::default()
            .error_handler(|_err, _req| ApiError::not_found("Not found").into()),
    )
    .route("/s/{code}/", web::get().to(recipes::follow_short_link))
    .service(
        web::scope("/api")
            .service(
                web::scope("/auth").route("/token/login/", web::post().to(auth::login)),
            )
            .service(
                web::scope("/users")
                    .route("/", web::get().to(users::list_users))
                    .route("/", web::post().to(users::register))
                    .route("/me/", web::get().to(users::me))
                    .route("/me/avatar/", web::put().to(users::set_avatar))
                    .route("/me/avatar/", web::delete().to(users::delete_avatar))
                    .route("/set_password/", web::post().to(users::set_password))
                    .route("/subscriptions/", web::get().to(users::subscriptions))
                    .route("/{user_id}/", web::get().to(users::get_user))
                    .route("/{user_id}/subscribe/", web::post().to(users::subscribe))
                    .route("/{user_id}/subscribe/", web::delete().to(users::unsubscribe)),
            )
            .service(
                web::scope("/ingredients")
                    .route("/", web::get().to(ingredients::list_ingredients))
                    .route("/{ingredient_id}/", web::get().to(ingredients::get_ingredient)),
            )
            .service(
                web::scope("/recipes")
                    .route("/", web::get().to(recipes::list_recipes))
                    .route("/", web::post().to(recipes::create_recipe))
                    .route(
                        "/download_shopping_cart/",
                        web::get().to(recipes::download_shopping_cart),
                    )
                    .route("/{recipe_id}/", web::get().to(recipes::get_recipe))
                    .route("/{recipe_id}/", web::patch().to(recipes::update_recipe))
                    .route("/{recipe_id}/", web::delete().to(recipes::delete_recipe))
                    .route("/{recipe_id}/favorite/", web::post().to(recipes::add_favorite))
                    .route(
                        "/{recipe_id}/favorite/",
                        web::delete().to(recipes::remove_favorite),
                    )
                    .route(
                        "/{recipe_id}/shopping_cart/",
                        web::post().to(recipes::add_to_shopping_cart),
                    )
                    .route(
                        "/{recipe_id}/shopping_cart/",
                        web::delete().to(recipes::remove_from_shopping_cart),
                    )
                    .route("/{recipe_id}/get-link/", web::get().to(recipes::get_short_link)),
            ),
    );
}

/// `1`, `true` and `True` switch a boolean query filter on.
pub(crate) fn is_truthy(value: Option<&str>) -> bool {
    matches!(value, Some("1" | "true" | "True"))
}
