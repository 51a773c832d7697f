use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{BuyerId, ConversionError, NewOrder, Order, OrderId},
    traits::{BuyerManagement, CatalogManagement, OrderManagement},
};

/// This trait defines the highest level of behaviour for backends supporting the ticket payment engine.
///
/// This behaviour includes:
/// * Acquiring exclusive locks on single orders, so that provider callbacks can be applied atomically.
/// * Replacing a buyer's pending orders with a fresh set during checkout.
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayDatabase: Clone + OrderManagement + BuyerManagement + CatalogManagement {
    type Lock: OrderLock;

    /// The URL of the database
    fn url(&self) -> &str;

    /// Acquires the exclusive lock for the order with the given id. The lock is taken *before* the order is read, so
    /// the order held by the guard is always the latest committed version.
    ///
    /// Returns `None` if the order does not exist.
    async fn lock_order(&self, order_id: OrderId) -> Result<Option<Self::Lock>, PaymentGatewayError>;

    /// Acquires the exclusive lock for the order bound to the given Payme transaction id.
    ///
    /// Returns `None` if no order has been bound to this transaction.
    async fn lock_order_by_payme_id(&self, transaction_id: &str) -> Result<Option<Self::Lock>, PaymentGatewayError>;

    /// In a single atomic transaction,
    /// * marks every pending order of the buyer as cancelled, and
    /// * inserts the new orders, in the order given.
    ///
    /// The newly created orders are returned in insertion order.
    async fn replace_pending_orders(
        &self,
        buyer_id: BuyerId,
        orders: Vec<NewOrder>,
    ) -> Result<Vec<Order>, PaymentGatewayError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        Ok(())
    }
}

/// An exclusive guard over a single order.
///
/// Changes to the order are made through [`OrderLock::order_mut`]. Changes to the owning buyer's payment flag are
/// staged with [`OrderLock::mark_buyer_paid`] and [`OrderLock::reverse_buyer_payment`]. Nothing is visible to other
/// callers until [`OrderLock::commit`] succeeds. Dropping the guard aborts.
#[allow(async_fn_in_trait)]
pub trait OrderLock {
    /// The order, as it was when the lock was acquired, plus any changes made through `order_mut`.
    fn order(&self) -> &Order;

    fn order_mut(&mut self) -> &mut Order;

    /// Marks the order's buyer as paid at the given time.
    async fn mark_buyer_paid(&mut self, paid_at: DateTime<Utc>) -> Result<(), PaymentGatewayError>;

    /// Clears the buyer's paid flag, unless another of the buyer's orders is still paid when the lock is committed.
    ///
    /// Returns `true` if no other paid order was found at the time of the call.
    async fn reverse_buyer_payment(&mut self) -> Result<bool, PaymentGatewayError>;

    /// Writes the order (and any staged buyer change) and releases the lock. `updated_at` is refreshed.
    async fn commit(self) -> Result<Order, PaymentGatewayError>;
}

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("The requested {0} does not exist")]
    BuyerNotFound(BuyerId),
    #[error("The Payme transaction {0} is already bound to another order")]
    TransactionAlreadyBound(String),
    #[error("A stored record could not be read. {0}")]
    InvalidRecord(String),
}

impl From<sqlx::Error> for PaymentGatewayError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                PaymentGatewayError::TransactionAlreadyBound(db.message().to_string())
            },
            e => PaymentGatewayError::DatabaseError(e.to_string()),
        }
    }
}

impl From<ConversionError> for PaymentGatewayError {
    fn from(e: ConversionError) -> Self {
        PaymentGatewayError::InvalidRecord(e.to_string())
    }
}
