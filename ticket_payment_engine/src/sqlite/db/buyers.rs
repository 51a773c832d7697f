use chrono::{DateTime, Utc};
use log::debug;
use sqlx::{FromRow, SqliteConnection};

use crate::db_types::{Buyer, BuyerId};

#[derive(Debug, Clone, FromRow)]
struct BuyerRow {
    id: i64,
    name: String,
    is_paid: bool,
    paid_at: Option<DateTime<Utc>>,
}

impl From<BuyerRow> for Buyer {
    fn from(row: BuyerRow) -> Self {
        Buyer { id: BuyerId(row.id), name: row.name, is_paid: row.is_paid, paid_at: row.paid_at }
    }
}

pub async fn fetch_buyer(buyer_id: BuyerId, conn: &mut SqliteConnection) -> Result<Option<Buyer>, sqlx::Error> {
    let row: Option<BuyerRow> = sqlx::query_as("SELECT id, name, is_paid, paid_at FROM buyers WHERE id = $1")
        .bind(buyer_id)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(Buyer::from))
}

/// Sets the buyer's payment flag. `paid_at` is cleared along with the flag.
pub async fn set_payment_status(
    buyer_id: BuyerId,
    paid_at: Option<DateTime<Utc>>,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE buyers SET is_paid = $1, paid_at = $2 WHERE id = $3")
        .bind(paid_at.is_some())
        .bind(paid_at)
        .bind(buyer_id)
        .execute(conn)
        .await?;
    debug!("🗃️ Payment flag for {buyer_id} set to {}", paid_at.is_some());
    Ok(())
}

/// Inserts a buyer record. The payment core never registers buyers itself; this exists for seeding and tests.
pub async fn insert_buyer(name: &str, conn: &mut SqliteConnection) -> Result<BuyerId, sqlx::Error> {
    let id: i64 =
        sqlx::query_scalar("INSERT INTO buyers (name) VALUES ($1) RETURNING id").bind(name).fetch_one(conn).await?;
    Ok(BuyerId(id))
}
