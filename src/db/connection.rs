use crate::config::Config;
use crate::entities::{favorite, follow, ingredient, recipe, recipe_ingredient, shopping_cart, user};
use sea_orm::sea_query::{Index, TableCreateStatement};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::time::Duration;

pub type DbPool = DatabaseConnection;

pub async fn create_pool(config: &Config) -> Result<DbPool, anyhow::Error> {
    let db = connect(&config.database.url, config.database.max_connections).await?;
    init_schema(&db).await?;
    Ok(db)
}

pub async fn connect(url: &str, max_connections: u32) -> Result<DbPool, anyhow::Error> {
    let mut options = ConnectOptions::new(url.to_string());
    options
        .max_connections(max_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    log::info!("Connected to {:?} database", db.get_database_backend());
    Ok(db)
}

/// Creates every table (parents first). Safe to run against an already
/// initialised database.
pub async fn init_schema(db: &DbPool) -> Result<(), anyhow::Error> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let ingredients = table(&schema, ingredient::Entity)
        .index(
            Index::create()
                .name("uq_ingredients_name_unit")
                .col(ingredient::Column::Name)
                .col(ingredient::Column::MeasurementUnit)
                .unique(),
        )
        .to_owned();

    let tables = [
        table(&schema, user::Entity),
        ingredients,
        table(&schema, recipe::Entity),
        table(&schema, recipe_ingredient::Entity),
        table(&schema, favorite::Entity),
        table(&schema, shopping_cart::Entity),
        table(&schema, follow::Entity),
    ];
    for stmt in tables.iter() {
        db.execute(backend.build(stmt)).await?;
    }

    Ok(())
}

fn table<E: EntityTrait>(schema: &Schema, entity: E) -> TableCreateStatement {
    schema.create_table_from_entity(entity).if_not_exists().to_owned()
}

/// In-memory SQLite database with the full schema, used by the test suites.
pub async fn setup_test_db() -> Result<DbPool, anyhow::Error> {
    let db = connect("sqlite::memory:", 1).await?;
    init_schema(&db).await?;
    Ok(db)
}
