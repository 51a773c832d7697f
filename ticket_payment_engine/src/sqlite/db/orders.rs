use std::str::FromStr;

use chrono::{DateTime, Utc};
use log::{debug, trace};
use rust_decimal::Decimal;
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db_types::{
        BuyerId,
        ClickDetails,
        ConversionError,
        NewOrder,
        Order,
        OrderId,
        OrderStatusType,
        PaymeDetails,
        PaymeState,
        PaymentProvider,
    },
    traits::PaymentGatewayError,
};

/// The raw shape of a row in the `orders` table. Amounts are stored as decimal text.
#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
    id: i64,
    buyer_id: i64,
    item_id: Option<i64>,
    event_id: Option<i64>,
    total_amount: String,
    status: String,
    payment_method: String,
    payme_transaction_id: Option<String>,
    payme_state: Option<i32>,
    payme_create_time: Option<i64>,
    payme_perform_time: Option<i64>,
    payme_cancel_time: Option<i64>,
    payme_cancel_reason: Option<i32>,
    click_trans_id: Option<i64>,
    click_prepare_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = ConversionError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let total_amount = Decimal::from_str(&row.total_amount)
            .map_err(|e| ConversionError::new(format!("order {} has an invalid amount: {e}", row.id)))?;
        let status = OrderStatusType::from_str(&row.status)?;
        let payment_method = PaymentProvider::from_str(&row.payment_method)?;
        let state = row.payme_state.map(PaymeState::try_from).transpose()?;
        Ok(Order {
            id: OrderId(row.id),
            buyer_id: BuyerId(row.buyer_id),
            item_id: row.item_id,
            event_id: row.event_id,
            total_amount,
            status,
            payment_method,
            payme: PaymeDetails {
                transaction_id: row.payme_transaction_id,
                state,
                create_time: row.payme_create_time,
                perform_time: row.payme_perform_time,
                cancel_time: row.payme_cancel_time,
                cancel_reason: row.payme_cancel_reason,
            },
            click: ClickDetails { trans_id: row.click_trans_id, prepare_id: row.click_prepare_id },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_orders(rows: Vec<OrderRow>) -> Result<Vec<Order>, PaymentGatewayError> {
    rows.into_iter().map(|r| Order::try_from(r).map_err(PaymentGatewayError::from)).collect()
}

/// Inserts a new order into the database using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
pub async fn insert_order(
    order: NewOrder,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Order, PaymentGatewayError> {
    let row: OrderRow = sqlx::query_as(
        r#"
            INSERT INTO orders (
                buyer_id,
                item_id,
                event_id,
                total_amount,
                status,
                payment_method,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING *;
        "#,
    )
    .bind(order.buyer_id)
    .bind(order.item_id)
    .bind(order.event_id)
    .bind(order.total_amount.to_string())
    .bind(OrderStatusType::Pending.to_string())
    .bind(order.payment_method.to_string())
    .bind(now)
    .fetch_one(conn)
    .await?;
    let order = Order::try_from(row)?;
    debug!("🗃️ Order {} inserted for {}", order.id, order.buyer_id);
    Ok(order)
}

pub async fn fetch_order(order_id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, PaymentGatewayError> {
    let row: Option<OrderRow> =
        sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(row.map(Order::try_from).transpose()?)
}

pub async fn fetch_order_by_payme_id(
    transaction_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, PaymentGatewayError> {
    let row: Option<OrderRow> = sqlx::query_as("SELECT * FROM orders WHERE payme_transaction_id = $1")
        .bind(transaction_id)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(Order::try_from).transpose()?)
}

/// The same no-op write as [`touch_order`], keyed on the Payme transaction id. Returns the id of the bound order.
pub async fn touch_order_by_payme_id(
    transaction_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderId>, sqlx::Error> {
    let id: Option<i64> =
        sqlx::query_scalar("UPDATE orders SET updated_at = updated_at WHERE payme_transaction_id = $1 RETURNING id")
            .bind(transaction_id)
            .fetch_optional(conn)
            .await?;
    Ok(id.map(OrderId))
}

pub async fn fetch_payme_transactions(
    from: i64,
    to: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, PaymentGatewayError> {
    let rows: Vec<OrderRow> = sqlx::query_as(
        r#"
            SELECT * FROM orders
            WHERE payme_transaction_id IS NOT NULL
              AND payme_create_time IS NOT NULL
              AND payme_create_time >= $1
              AND payme_create_time <= $2
            ORDER BY payme_create_time ASC, id ASC
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(conn)
    .await?;
    trace!("🗃️ {} Payme transactions found between {from} and {to}", rows.len());
    into_orders(rows)
}

pub async fn fetch_orders_for_buyer(
    buyer_id: BuyerId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, PaymentGatewayError> {
    let rows: Vec<OrderRow> = sqlx::query_as("SELECT * FROM orders WHERE buyer_id = $1 ORDER BY created_at ASC, id ASC")
        .bind(buyer_id)
        .fetch_all(conn)
        .await?;
    into_orders(rows)
}

/// Marks every pending order of the buyer as cancelled. Returns the number of orders that were superseded.
pub async fn cancel_pending_orders(
    buyer_id: BuyerId,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE orders SET status = $1, updated_at = $2 WHERE buyer_id = $3 AND status = $4")
        .bind(OrderStatusType::Cancelled.to_string())
        .bind(now)
        .bind(buyer_id)
        .bind(OrderStatusType::Pending.to_string())
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

/// Performs a no-op write on the order row. Inside a transaction, this takes SQLite's write lock before anything
/// about the order has been read. Returns `false` if the order does not exist.
pub async fn touch_order(order_id: OrderId, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("UPDATE orders SET updated_at = updated_at WHERE id = $1").bind(order_id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

/// Writes every mutable field of the order back to the database. `updated_at` is set to `now`.
pub async fn update_order(
    order: &Order,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Order, PaymentGatewayError> {
    let row: OrderRow = sqlx::query_as(
        r#"
            UPDATE orders SET
                status = $1,
                payment_method = $2,
                payme_transaction_id = $3,
                payme_state = $4,
                payme_create_time = $5,
                payme_perform_time = $6,
                payme_cancel_time = $7,
                payme_cancel_reason = $8,
                click_trans_id = $9,
                click_prepare_id = $10,
                updated_at = $11
            WHERE id = $12
            RETURNING *;
        "#,
    )
    .bind(order.status.to_string())
    .bind(order.payment_method.to_string())
    .bind(order.payme.transaction_id.as_deref())
    .bind(order.payme.state.map(|s| s.code()))
    .bind(order.payme.create_time)
    .bind(order.payme.perform_time)
    .bind(order.payme.cancel_time)
    .bind(order.payme.cancel_reason)
    .bind(order.click.trans_id)
    .bind(order.click.prepare_id)
    .bind(now)
    .bind(order.id)
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Order {} updated. Status: {}", order.id, order.status);
    Ok(Order::try_from(row)?)
}

/// Counts the buyer's paid orders, leaving out `except`.
pub async fn count_other_paid_orders(
    buyer_id: BuyerId,
    except: OrderId,
    conn: &mut SqliteConnection,
) -> Result<i64, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE buyer_id = $1 AND status = $2 AND id != $3")
        .bind(buyer_id)
        .bind(OrderStatusType::Paid.to_string())
        .bind(except)
        .fetch_one(conn)
        .await?;
    Ok(count)
}
