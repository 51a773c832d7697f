use sqlx::SqliteConnection;

use crate::db_types::BuyerId;

pub async fn buyer_for_session(token: &str, conn: &mut SqliteConnection) -> Result<Option<BuyerId>, sqlx::Error> {
    let id: Option<i64> = sqlx::query_scalar("SELECT buyer_id FROM buyer_sessions WHERE token = $1")
        .bind(token)
        .fetch_optional(conn)
        .await?;
    Ok(id.map(BuyerId))
}

pub async fn insert_session(token: &str, buyer_id: BuyerId, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO buyer_sessions (token, buyer_id) VALUES ($1, $2)")
        .bind(token)
        .bind(buyer_id)
        .execute(conn)
        .await?;
    Ok(())
}
