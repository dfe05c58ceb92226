use crate::db::DbPool;
use crate::entities::ingredient;
use crate::error::{ApiError, ApiResult};
use crate::models::IngredientRecord;
use log::info;
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

/// Catalog entries whose name starts with `prefix`, ignoring case, ordered by name.
/// A missing or blank prefix returns the whole catalog.
///
/// SQLite's `LOWER` folds ASCII only, so on that backend the prefix is
/// matched here with full Unicode case folding instead of in SQL.
pub async fn search_ingredients(
    db: &DbPool,
    prefix: Option<&str>,
) -> ApiResult<Vec<ingredient::Model>> {
    let prefix = prefix
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_lowercase);
    let fold_in_sql = db.get_database_backend() != DbBackend::Sqlite;

    let mut query = ingredient::Entity::find();
    if let Some(prefix) = prefix.as_deref().filter(|_| fold_in_sql) {
        let pattern = format!("{}%", escape_like(prefix));
        query = query.filter(
            Expr::expr(Func::lower(Expr::col(ingredient::Column::Name)))
                .like(LikeExpr::new(pattern).escape('\\')),
        );
    }

    let mut ingredients = query
        .order_by_asc(ingredient::Column::Name)
        .order_by_asc(ingredient::Column::MeasurementUnit)
        .all(db)
        .await?;

    if let Some(prefix) = prefix.as_deref().filter(|_| !fold_in_sql) {
        ingredients.retain(|i| i.name.to_lowercase().starts_with(prefix));
    }
    Ok(ingredients)
}

pub async fn get_ingredient(db: &DbPool, id: i64) -> ApiResult<ingredient::Model> {
    ingredient::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Ingredient not found"))
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub created: usize,
    pub skipped: usize,
}

/// Loads catalog records, skipping every (name, unit) pair already present.
/// Runs as one transaction, so a failed import leaves the catalog untouched.
pub async fn import_ingredients(
    db: &DbPool,
    records: &[IngredientRecord],
) -> ApiResult<ImportSummary> {
    let txn = db.begin().await?;
    let mut summary = ImportSummary::default();

    for record in records {
        if insert_if_absent(&txn, record).await? {
            summary.created += 1;
        } else {
            summary.skipped += 1;
        }
    }

    txn.commit().await?;
    info!(
        "Ingredient import finished: created={}, skipped={}",
        summary.created, summary.skipped
    );
    Ok(summary)
}

async fn insert_if_absent<C: ConnectionTrait>(conn: &C, record: &IngredientRecord) -> ApiResult<bool> {
    let existing = ingredient::Entity::find()
        .filter(ingredient::Column::Name.eq(record.name.as_str()))
        .filter(ingredient::Column::MeasurementUnit.eq(record.measurement_unit.as_str()))
        .one(conn)
        .await?;
    if existing.is_some() {
        return Ok(false);
    }

    ingredient::ActiveModel {
        name: Set(record.name.clone()),
        measurement_unit: Set(record.measurement_unit.clone()),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(true)
}
