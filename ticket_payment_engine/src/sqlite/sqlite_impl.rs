//! `SqliteDatabase` is a concrete implementation of a ticket payment engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::{migrate, Sqlite, SqlitePool, Transaction};

use super::db::{buyers, catalog, new_pool, orders, sessions};
use crate::{
    db_types::{Buyer, BuyerId, CatalogItem, NewOrder, Order, OrderId},
    traits::{
        BuyerManagement,
        CatalogManagement,
        OrderLock,
        OrderManagement,
        PaymentGatewayDatabase,
        PaymentGatewayError,
        SessionApiError,
        SessionManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

/// The order lock for SQLite. The lock *is* the database transaction: the order row was written to when the lock was
/// taken, so SQLite holds its write lock until the transaction commits or is rolled back on drop.
pub struct SqliteOrderLock {
    tx: Transaction<'static, Sqlite>,
    order: Order,
}

impl SqliteOrderLock {
    async fn acquire(
        mut tx: Transaction<'static, Sqlite>,
        order_id: OrderId,
    ) -> Result<Option<Self>, PaymentGatewayError> {
        let order = orders::fetch_order(order_id, &mut tx).await?;
        Ok(order.map(|order| Self { tx, order }))
    }
}

impl OrderLock for SqliteOrderLock {
    fn order(&self) -> &Order {
        &self.order
    }

    fn order_mut(&mut self) -> &mut Order {
        &mut self.order
    }

    async fn mark_buyer_paid(&mut self, paid_at: DateTime<Utc>) -> Result<(), PaymentGatewayError> {
        buyers::set_payment_status(self.order.buyer_id, Some(paid_at), &mut self.tx).await?;
        Ok(())
    }

    async fn reverse_buyer_payment(&mut self) -> Result<bool, PaymentGatewayError> {
        let others = orders::count_other_paid_orders(self.order.buyer_id, self.order.id, &mut self.tx).await?;
        if others > 0 {
            debug!("🗃️ {} still has {others} paid order(s). Payment flag is kept.", self.order.buyer_id);
            return Ok(false);
        }
        buyers::set_payment_status(self.order.buyer_id, None, &mut self.tx).await?;
        Ok(true)
    }

    async fn commit(mut self) -> Result<Order, PaymentGatewayError> {
        let order = orders::update_order(&self.order, Utc::now(), &mut self.tx).await?;
        self.tx.commit().await?;
        trace!("🗃️ Lock on order {} released", order.id);
        Ok(order)
    }
}

impl PaymentGatewayDatabase for SqliteDatabase {
    type Lock = SqliteOrderLock;

    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn lock_order(&self, order_id: OrderId) -> Result<Option<Self::Lock>, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        if !orders::touch_order(order_id, &mut tx).await? {
            trace!("🗃️ Cannot lock order {order_id}. It does not exist.");
            return Ok(None);
        }
        trace!("🗃️ Lock acquired on order {order_id}");
        SqliteOrderLock::acquire(tx, order_id).await
    }

    async fn lock_order_by_payme_id(&self, transaction_id: &str) -> Result<Option<Self::Lock>, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        match orders::touch_order_by_payme_id(transaction_id, &mut tx).await? {
            Some(order_id) => {
                trace!("🗃️ Lock acquired on order {order_id} (Payme transaction {transaction_id})");
                SqliteOrderLock::acquire(tx, order_id).await
            },
            None => Ok(None),
        }
    }

    async fn replace_pending_orders(
        &self,
        buyer_id: BuyerId,
        new_orders: Vec<NewOrder>,
    ) -> Result<Vec<Order>, PaymentGatewayError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let superseded = orders::cancel_pending_orders(buyer_id, now, &mut tx).await?;
        if superseded > 0 {
            debug!("🗃️ {superseded} pending order(s) for {buyer_id} have been superseded");
        }
        let mut result = Vec::with_capacity(new_orders.len());
        for order in new_orders {
            result.push(orders::insert_order(order, now, &mut tx).await?);
        }
        tx.commit().await?;
        Ok(result)
    }

    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(order_id, &mut conn).await
    }

    async fn fetch_order_by_payme_id(&self, transaction_id: &str) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_payme_id(transaction_id, &mut conn).await
    }

    async fn fetch_payme_transactions(&self, from: i64, to: i64) -> Result<Vec<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_payme_transactions(from, to, &mut conn).await
    }

    async fn fetch_orders_for_buyer(&self, buyer_id: BuyerId) -> Result<Vec<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_orders_for_buyer(buyer_id, &mut conn).await
    }
}

impl BuyerManagement for SqliteDatabase {
    async fn fetch_buyer(&self, buyer_id: BuyerId) -> Result<Option<Buyer>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(buyers::fetch_buyer(buyer_id, &mut conn).await?)
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn fetch_purchasable_items(&self, item_ids: &[i64]) -> Result<Vec<CatalogItem>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        catalog::fetch_purchasable_items(item_ids, &mut conn).await
    }
}

impl SessionManagement for SqliteDatabase {
    async fn fetch_buyer_id_for_session(&self, token: &str) -> Result<Option<BuyerId>, SessionApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(sessions::buyer_for_session(token, &mut conn).await?)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date using the migrations embedded in this crate.
    pub async fn migrate(&self) -> Result<(), PaymentGatewayError> {
        migrate!("./src/sqlite/migrations")
            .run(&self.pool)
            .await
            .map_err(|e| PaymentGatewayError::DatabaseError(format!("Migration failed: {e}")))?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    //------------------------------------  Seeding  ------------------------------------------------------------
    // Buyers, events, items and sessions belong to other parts of the site. These helpers exist so that a fresh
    // database can be populated for local runs and tests.

    pub async fn insert_buyer(&self, name: &str) -> Result<BuyerId, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(buyers::insert_buyer(name, &mut conn).await?)
    }

    pub async fn insert_event(&self, name: &str, is_active: bool) -> Result<i64, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::insert_event(name, is_active, &mut conn).await?)
    }

    pub async fn insert_item(
        &self,
        event_id: i64,
        name: &str,
        price: rust_decimal::Decimal,
    ) -> Result<i64, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::insert_item(event_id, name, price, &mut conn).await?)
    }

    pub async fn insert_session(&self, token: &str, buyer_id: BuyerId) -> Result<(), PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(sessions::insert_session(token, buyer_id, &mut conn).await?)
    }
}
