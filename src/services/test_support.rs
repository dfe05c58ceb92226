use crate::db::DbPool;
use crate::entities::user;
use crate::models::IngredientRecord;
use crate::services::ingredients::{import_ingredients, search_ingredients};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};

pub(crate) async fn create_user(db: &DbPool, username: &str) -> user::Model {
    let now = Utc::now();
    user::ActiveModel {
        email: Set(format!("{}@example.com", username)),
        username: Set(username.to_string()),
        first_name: Set(username.to_string()),
        last_name: Set("Tester".to_string()),
        password_hash: Set("not-a-real-hash".to_string()),
        avatar: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

/// Imports the given (name, unit) pairs and returns their ids in input order.
pub(crate) async fn seed_ingredients(db: &DbPool, items: &[(&str, &str)]) -> Vec<i64> {
    let records: Vec<IngredientRecord> = items
        .iter()
        .map(|(name, unit)| IngredientRecord {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
        })
        .collect();
    import_ingredients(db, &records).await.unwrap();

    let catalog = search_ingredients(db, None).await.unwrap();
    items
        .iter()
        .map(|(name, unit)| {
            catalog
                .iter()
                .find(|i| i.name == *name && i.measurement_unit == *unit)
                .map(|i| i.id)
                .unwrap()
        })
        .collect()
}
