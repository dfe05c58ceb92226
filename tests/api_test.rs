// Integration tests for API endpoints
// Every test runs against its own in-memory SQLite database.
// Run with: cargo test --test api_test

use actix_web::{http::header, http::StatusCode, test, web, App};
use recipe_share_service::{
    api,
    auth::issue_token,
    config::Config,
    db::{self, DbPool},
    models::{
        AuthResponse, IngredientRecord, IngredientResponse, Paginated, RecipeResponse,
        RecipeShortResponse, ShortLinkResponse, SignupRequest, SubscriptionResponse,
        UserCreatedResponse, UserResponse,
    },
    services::{
        ingredients::{import_ingredients, search_ingredients},
        users::register,
    },
};
use serde_json::{json, Value};

fn test_config() -> Config {
    Config::with_database_url("sqlite::memory:")
}

async fn create_test_pool() -> DbPool {
    db::setup_test_db()
        .await
        .expect("Failed to create test database")
}

/// Helper function to create a test app
fn create_test_app(
    pool: DbPool,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(test_config()))
        .app_data(web::Data::new(pool))
        .configure(api::configure)
}

/// Registers a user directly and returns its id plus a bearer token.
async fn create_account(pool: &DbPool, username: &str) -> (i64, String) {
    let config = test_config();
    let user = register(
        pool,
        SignupRequest {
            email: format!("{}@example.com", username),
            username: username.to_string(),
            first_name: "Test".to_string(),
            last_name: "Cook".to_string(),
            password: "password123".to_string(),
        },
        config.jwt.bcrypt_cost,
    )
    .await
    .expect("Failed to register user");
    let token = issue_token(user.id, &user.email, &config.jwt).expect("Failed to issue token");
    (user.id, format!("Bearer {}", token))
}

/// Seeds the catalog and returns ingredient ids in the given order.
async fn seed_catalog(pool: &DbPool, items: &[(&str, &str)]) -> Vec<i64> {
    let records: Vec<IngredientRecord> = items
        .iter()
        .map(|(name, unit)| IngredientRecord {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
        })
        .collect();
    import_ingredients(pool, &records)
        .await
        .expect("Failed to seed ingredients");

    let mut ids = Vec::new();
    for (name, unit) in items {
        let found = search_ingredients(pool, Some(name))
            .await
            .expect("Failed to look up ingredient");
        let id = found
            .iter()
            .find(|i| i.name == *name && i.measurement_unit == *unit)
            .map(|i| i.id)
            .expect("Seeded ingredient missing");
        ids.push(id);
    }
    ids
}

fn recipe_body(name: &str, ingredients: &[(i64, i32)]) -> Value {
    json!({
        "ingredients": ingredients
            .iter()
            .map(|(id, amount)| json!({ "id": id, "amount": amount }))
            .collect::<Vec<_>>(),
        "image": "data:image/png;base64,iVBORw0KGgo=",
        "name": name,
        "text": "Mix everything and cook",
        "cooking_time": 15
    })
}

#[actix_web::test]
async fn test_signup_and_login() {
    let pool = create_test_pool().await;
    let app = test::init_service(create_test_app(pool)).await;

    let signup_req = json!({
        "email": "anna@example.com",
        "username": "anna",
        "first_name": "Anna",
        "last_name": "Cook",
        "password": "password123"
    });

    let req = test::TestRequest::post()
        .uri("/api/users/")
        .set_json(&signup_req)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(
        resp.status(),
        StatusCode::CREATED,
        "Signup should return 201 CREATED"
    );
    let created: UserCreatedResponse = test::read_body_json(resp).await;
    assert_eq!(created.username, "anna", "Username should match");

    // Same email again
    let req = test::TestRequest::post()
        .uri("/api/users/")
        .set_json(&signup_req)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(
        resp.status(),
        StatusCode::BAD_REQUEST,
        "Duplicate signup should return 400 BAD REQUEST"
    );

    let req = test::TestRequest::post()
        .uri("/api/auth/token/login/")
        .set_json(&json!({ "email": "anna@example.com", "password": "password123" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK, "Login should return 200 OK");
    let body: AuthResponse = test::read_body_json(resp).await;
    assert!(!body.token.is_empty(), "Token should not be empty");
    assert_eq!(body.user.id, created.id);

    let req = test::TestRequest::get()
        .uri("/api/users/me/")
        .insert_header(("Authorization", format!("Bearer {}", body.token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let me: UserResponse = test::read_body_json(resp).await;
    assert_eq!(me.email, "anna@example.com");
    assert!(!me.is_subscribed);
}

#[actix_web::test]
async fn test_login_with_wrong_password() {
    let pool = create_test_pool().await;
    create_account(&pool, "anna").await;
    let app = test::init_service(create_test_app(pool)).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/token/login/")
        .set_json(&json!({ "email": "anna@example.com", "password": "not-the-password" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(
        resp.status(),
        StatusCode::UNAUTHORIZED,
        "Wrong password should return 401 UNAUTHORIZED"
    );

    let req = test::TestRequest::post()
        .uri("/api/auth/token/login/")
        .set_json(&json!({ "email": "nobody@example.com", "password": "password123" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_protected_endpoints_require_token() {
    let pool = create_test_pool().await;
    let app = test::init_service(create_test_app(pool)).await;

    let req = test::TestRequest::get().uri("/api/users/me/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/recipes/")
        .set_json(&recipe_body("Soup", &[(1, 1)]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/recipes/download_shopping_cart/")
        .insert_header(("Authorization", "Bearer garbage"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_recipe_lifecycle() {
    let pool = create_test_pool().await;
    let (author_id, author_token) = create_account(&pool, "chef").await;
    let (_, guest_token) = create_account(&pool, "guest").await;
    let ids = seed_catalog(&pool, &[("Egg", "pcs"), ("Milk", "ml")]).await;
    let app = test::init_service(create_test_app(pool)).await;

    let req = test::TestRequest::post()
        .uri("/api/recipes/")
        .insert_header(("Authorization", author_token.clone()))
        .set_json(&recipe_body("Omelette", &[(ids[1], 100), (ids[0], 2)]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(
        resp.status(),
        StatusCode::CREATED,
        "Create recipe should return 201 CREATED"
    );
    let recipe: RecipeResponse = test::read_body_json(resp).await;
    assert_eq!(recipe.author.id, author_id);
    assert_eq!(recipe.ingredients.len(), 2);
    assert_eq!(recipe.ingredients[0].name, "Egg", "Ingredients ordered by name");

    // Anonymous read
    let req = test::TestRequest::get()
        .uri(&format!("/api/recipes/{}/", recipe.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: RecipeResponse = test::read_body_json(resp).await;
    assert!(!fetched.is_favorited);
    assert!(!fetched.is_in_shopping_cart);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/recipes/{}/", recipe.id))
        .insert_header(("Authorization", guest_token.clone()))
        .set_json(&json!({ "name": "Stolen" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(
        resp.status(),
        StatusCode::FORBIDDEN,
        "Non-author edit should return 403 FORBIDDEN"
    );

    let req = test::TestRequest::patch()
        .uri(&format!("/api/recipes/{}/", recipe.id))
        .insert_header(("Authorization", author_token.clone()))
        .set_json(&json!({
            "name": "Plain omelette",
            "ingredients": [{ "id": ids[0], "amount": 3 }]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: RecipeResponse = test::read_body_json(resp).await;
    assert_eq!(updated.name, "Plain omelette");
    assert_eq!(updated.ingredients.len(), 1);
    assert_eq!(updated.ingredients[0].amount, 3);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/recipes/{}/", recipe.id))
        .insert_header(("Authorization", guest_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/recipes/{}/", recipe.id))
        .insert_header(("Authorization", author_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/recipes/{}/", recipe.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_create_recipe_validation() {
    let pool = create_test_pool().await;
    let (_, token) = create_account(&pool, "chef").await;
    let ids = seed_catalog(&pool, &[("Egg", "pcs")]).await;
    let app = test::init_service(create_test_app(pool)).await;

    let invalid = vec![
        recipe_body("No ingredients", &[]),
        recipe_body("Twice", &[(ids[0], 1), (ids[0], 2)]),
        recipe_body("Unknown", &[(ids[0], 1), (ids[0] + 100, 1)]),
        recipe_body("Zero", &[(ids[0], 0)]),
    ];
    for body in invalid {
        let req = test::TestRequest::post()
            .uri("/api/recipes/")
            .insert_header(("Authorization", token.clone()))
            .set_json(&body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body: {}", body);
        let err: Value = test::read_body_json(resp).await;
        assert!(err["detail"].is_string(), "Error should carry a detail");
    }

    let req = test::TestRequest::get().uri("/api/recipes/").to_request();
    let resp = test::call_service(&app, req).await;
    let page: Paginated<RecipeResponse> = test::read_body_json(resp).await;
    assert_eq!(page.count, 0, "Rejected recipes must not be stored");
}

#[actix_web::test]
async fn test_favorite_twice() {
    let pool = create_test_pool().await;
    let (_, token) = create_account(&pool, "chef").await;
    let ids = seed_catalog(&pool, &[("Egg", "pcs")]).await;
    let app = test::init_service(create_test_app(pool)).await;

    let req = test::TestRequest::post()
        .uri("/api/recipes/")
        .insert_header(("Authorization", token.clone()))
        .set_json(&recipe_body("Boiled egg", &[(ids[0], 1)]))
        .to_request();
    let recipe: RecipeResponse = test::call_and_read_body_json(&app, req).await;
    let uri = format!("/api/recipes/{}/favorite/", recipe.id);

    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(("Authorization", token.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let short: RecipeShortResponse = test::read_body_json(resp).await;
    assert_eq!(short.id, recipe.id);

    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(("Authorization", token.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(
        resp.status(),
        StatusCode::BAD_REQUEST,
        "Second favorite should return 400 BAD REQUEST"
    );

    let req = test::TestRequest::get()
        .uri("/api/recipes/?is_favorited=1")
        .insert_header(("Authorization", token.clone()))
        .to_request();
    let page: Paginated<RecipeResponse> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page.count, 1);
    assert!(page.results[0].is_favorited);

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(("Authorization", token.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(("Authorization", token.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri("/api/recipes/9999/favorite/")
        .insert_header(("Authorization", token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(
        resp.status(),
        StatusCode::NOT_FOUND,
        "Favoriting a missing recipe should return 404 NOT FOUND"
    );
}

#[actix_web::test]
async fn test_download_shopping_cart() {
    let pool = create_test_pool().await;
    let (_, token) = create_account(&pool, "chef").await;
    let ids = seed_catalog(&pool, &[("Egg", "pcs"), ("Milk", "ml")]).await;
    let app = test::init_service(create_test_app(pool)).await;

    let mut recipe_ids = Vec::new();
    for body in [
        recipe_body("Omelette", &[(ids[0], 2), (ids[1], 100)]),
        recipe_body("Fried eggs", &[(ids[0], 3)]),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/recipes/")
            .insert_header(("Authorization", token.clone()))
            .set_json(&body)
            .to_request();
        let recipe: RecipeResponse = test::call_and_read_body_json(&app, req).await;
        recipe_ids.push(recipe.id);
    }

    for id in &recipe_ids {
        let req = test::TestRequest::post()
            .uri(&format!("/api/recipes/{}/shopping_cart/", id))
            .insert_header(("Authorization", token.clone()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::get()
        .uri("/api/recipes/download_shopping_cart/")
        .insert_header(("Authorization", token.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let disposition = resp
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains("shopping_list.txt"));
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/plain"));

    let body = test::read_body(resp).await;
    assert_eq!(
        std::str::from_utf8(&body).unwrap(),
        "Список покупок:\nEgg (pcs) — 5\nMilk (ml) — 100\n"
    );

    // Removing from the cart shrinks the list
    let req = test::TestRequest::delete()
        .uri(&format!("/api/recipes/{}/shopping_cart/", recipe_ids[0]))
        .insert_header(("Authorization", token.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri("/api/recipes/download_shopping_cart/")
        .insert_header(("Authorization", token))
        .to_request();
    let body = test::call_and_read_body(&app, req).await;
    assert_eq!(
        std::str::from_utf8(&body).unwrap(),
        "Список покупок:\nEgg (pcs) — 3\n"
    );
}

#[actix_web::test]
async fn test_subscriptions() {
    let pool = create_test_pool().await;
    let (reader_id, reader_token) = create_account(&pool, "reader").await;
    let (author_id, author_token) = create_account(&pool, "author").await;
    let ids = seed_catalog(&pool, &[("Egg", "pcs")]).await;
    let app = test::init_service(create_test_app(pool)).await;

    for name in ["First", "Second"] {
        let req = test::TestRequest::post()
            .uri("/api/recipes/")
            .insert_header(("Authorization", author_token.clone()))
            .set_json(&recipe_body(name, &[(ids[0], 1)]))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::post()
        .uri(&format!("/api/users/{}/subscribe/", reader_id))
        .insert_header(("Authorization", reader_token.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(
        resp.status(),
        StatusCode::BAD_REQUEST,
        "Self-subscription should return 400 BAD REQUEST"
    );

    let req = test::TestRequest::post()
        .uri(&format!("/api/users/{}/subscribe/?recipes_limit=1", author_id))
        .insert_header(("Authorization", reader_token.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let subscription: SubscriptionResponse = test::read_body_json(resp).await;
    assert_eq!(subscription.id, author_id);
    assert!(subscription.is_subscribed);
    assert_eq!(subscription.recipes.len(), 1);
    assert_eq!(subscription.recipes_count, 2);

    let req = test::TestRequest::post()
        .uri(&format!("/api/users/{}/subscribe/", author_id))
        .insert_header(("Authorization", reader_token.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri(&format!("/api/users/{}/", author_id))
        .insert_header(("Authorization", reader_token.clone()))
        .to_request();
    let profile: UserResponse = test::call_and_read_body_json(&app, req).await;
    assert!(profile.is_subscribed);

    let req = test::TestRequest::get()
        .uri("/api/users/subscriptions/?recipes_limit=abc")
        .insert_header(("Authorization", reader_token.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let page: Paginated<SubscriptionResponse> = test::read_body_json(resp).await;
    assert_eq!(page.count, 1);
    assert_eq!(page.results[0].recipes.len(), 2, "Non-numeric limit means no cap");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/users/{}/subscribe/", author_id))
        .insert_header(("Authorization", reader_token.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/users/{}/subscribe/", author_id))
        .insert_header(("Authorization", reader_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_users_pagination() {
    let pool = create_test_pool().await;
    for i in 0..3 {
        create_account(&pool, &format!("cook{}", i)).await;
    }
    let app = test::init_service(create_test_app(pool)).await;

    let req = test::TestRequest::get()
        .uri("/api/users/?page=1&limit=2")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let page: Paginated<UserResponse> = test::read_body_json(resp).await;
    assert_eq!(page.count, 3);
    assert_eq!(page.results.len(), 2);
    assert_eq!(page.next.as_deref(), Some("/api/users/?page=2&limit=2"));
    assert!(page.previous.is_none());
}

#[actix_web::test]
async fn test_ingredient_search() {
    let pool = create_test_pool().await;
    seed_catalog(&pool, &[("Milk", "ml"), ("Millet", "g"), ("Egg", "pcs")]).await;
    let app = test::init_service(create_test_app(pool)).await;

    let req = test::TestRequest::get()
        .uri("/api/ingredients/?name=mil")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let found: Vec<IngredientResponse> = test::read_body_json(resp).await;
    let names: Vec<&str> = found.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Milk", "Millet"]);

    let req = test::TestRequest::get().uri("/api/ingredients/").to_request();
    let all: Vec<IngredientResponse> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(all.len(), 3);

    let req = test::TestRequest::get()
        .uri("/api/ingredients/9999/")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_short_link() {
    let pool = create_test_pool().await;
    let (_, token) = create_account(&pool, "chef").await;
    let ids = seed_catalog(&pool, &[("Egg", "pcs")]).await;
    let app = test::init_service(create_test_app(pool)).await;

    let req = test::TestRequest::post()
        .uri("/api/recipes/")
        .insert_header(("Authorization", token))
        .set_json(&recipe_body("Boiled egg", &[(ids[0], 1)]))
        .to_request();
    let recipe: RecipeResponse = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/recipes/{}/get-link/", recipe.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let link: ShortLinkResponse = test::read_body_json(resp).await;

    let path_start = link
        .short_link
        .find("/s/")
        .expect("Short link should point at /s/");
    let req = test::TestRequest::get()
        .uri(&link.short_link[path_start..])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers().get(header::LOCATION).unwrap(),
        &format!("/recipes/{}", recipe.id)
    );

    let req = test::TestRequest::get().uri("/s/!!/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_recipes_page_past_the_end() {
    let pool = create_test_pool().await;
    let (_, token) = create_account(&pool, "chef").await;
    let ids = seed_catalog(&pool, &[("Egg", "pcs")]).await;
    let app = test::init_service(create_test_app(pool)).await;

    let req = test::TestRequest::post()
        .uri("/api/recipes/")
        .insert_header(("Authorization", token))
        .set_json(&recipe_body("Boiled egg", &[(ids[0], 1)]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    for uri in [
        "/api/recipes/?page=18446744073709551615",
        "/api/users/?page=18446744073709551615&limit=100",
    ] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "uri: {}", uri);
        let page: Value = test::read_body_json(resp).await;
        assert_eq!(page["results"], json!([]), "uri: {}", uri);
        assert!(page["next"].is_null(), "uri: {}", uri);
    }
}
