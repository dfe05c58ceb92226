use crate::db::DbPool;
use crate::entities::{ingredient, recipe_ingredient, shopping_cart};
use crate::error::ApiResult;
use log::debug;
use sea_orm::sea_query::Query;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use std::collections::BTreeMap;

pub const SHOPPING_LIST_HEADER: &str = "Список покупок:\n";
pub const SHOPPING_LIST_FILENAME: &str = "shopping_list.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub total: i64,
}

/// Sums amounts per (name, unit), ordered by name then unit.
pub fn aggregate<I>(rows: I) -> Vec<ShoppingListItem>
where
    I: IntoIterator<Item = (String, String, i64)>,
{
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();
    for (name, unit, amount) in rows {
        *totals.entry((name, unit)).or_insert(0) += amount;
    }

    totals
        .into_iter()
        .map(|((name, measurement_unit), total)| ShoppingListItem {
            name,
            measurement_unit,
            total,
        })
        .collect()
}

pub fn render(items: &[ShoppingListItem]) -> String {
    let mut out = String::from(SHOPPING_LIST_HEADER);
    for item in items {
        out.push_str(&format!(
            "{} ({}) — {}\n",
            item.name, item.measurement_unit, item.total
        ));
    }
    out
}

/// Every ingredient of every recipe in the user's cart, merged and summed.
pub async fn collect_items(db: &DbPool, user_id: i64) -> ApiResult<Vec<ShoppingListItem>> {
    let rows = recipe_ingredient::Entity::find()
        .filter(
            recipe_ingredient::Column::RecipeId.in_subquery(
                Query::select()
                    .column(shopping_cart::Column::RecipeId)
                    .from(shopping_cart::Entity)
                    .and_where(shopping_cart::Column::UserId.eq(user_id))
                    .to_owned(),
            ),
        )
        .find_also_related(ingredient::Entity)
        .all(db)
        .await?;

    debug!("User {} cart holds {} ingredient rows", user_id, rows.len());

    Ok(aggregate(rows.into_iter().filter_map(|(link, ingredient)| {
        ingredient.map(|i| (i.name, i.measurement_unit, i64::from(link.amount)))
    })))
}

pub async fn build_shopping_list(db: &DbPool, user_id: i64) -> ApiResult<String> {
    let items = collect_items(db, user_id).await?;
    Ok(render(&items))
}
