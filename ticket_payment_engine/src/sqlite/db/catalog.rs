use std::str::FromStr;

use log::trace;
use rust_decimal::Decimal;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{CatalogItem, ConversionError},
    traits::PaymentGatewayError,
};

#[derive(Debug, Clone, FromRow)]
struct CatalogItemRow {
    id: i64,
    event_id: i64,
    name: String,
    price: String,
}

impl TryFrom<CatalogItemRow> for CatalogItem {
    type Error = ConversionError;

    fn try_from(row: CatalogItemRow) -> Result<Self, Self::Error> {
        let price = Decimal::from_str(&row.price)
            .map_err(|e| ConversionError::new(format!("catalog item {} has an invalid price: {e}", row.id)))?;
        Ok(CatalogItem { id: row.id, event_id: row.event_id, name: row.name, price })
    }
}

/// Items whose event is active and whose price is positive. The price filter runs after decoding, since prices are
/// stored as decimal text.
pub async fn fetch_purchasable_items(
    item_ids: &[i64],
    conn: &mut SqliteConnection,
) -> Result<Vec<CatalogItem>, PaymentGatewayError> {
    if item_ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::<Sqlite>::new(
        r#"
    SELECT catalog_items.id, catalog_items.event_id, catalog_items.name, catalog_items.price
    FROM catalog_items JOIN events ON events.id = catalog_items.event_id
    WHERE events.is_active = 1 AND catalog_items.id IN (
    "#,
    );
    let mut ids = builder.separated(", ");
    for id in item_ids {
        ids.push_bind(*id);
    }
    builder.push(") ORDER BY catalog_items.id ASC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let rows: Vec<CatalogItemRow> = builder.build_query_as().fetch_all(conn).await?;
    let items = rows
        .into_iter()
        .map(CatalogItem::try_from)
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .filter(|item| item.price > Decimal::ZERO)
        .collect();
    Ok(items)
}

pub async fn insert_event(name: &str, is_active: bool, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("INSERT INTO events (name, is_active) VALUES ($1, $2) RETURNING id")
        .bind(name)
        .bind(is_active)
        .fetch_one(conn)
        .await
}

pub async fn insert_item(
    event_id: i64,
    name: &str,
    price: Decimal,
    conn: &mut SqliteConnection,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("INSERT INTO catalog_items (event_id, name, price) VALUES ($1, $2, $3) RETURNING id")
        .bind(event_id)
        .bind(name)
        .bind(price.to_string())
        .fetch_one(conn)
        .await
}
