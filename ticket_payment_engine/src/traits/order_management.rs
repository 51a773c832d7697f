use crate::{
    db_types::{BuyerId, Order, OrderId},
    traits::PaymentGatewayError,
};

/// The `OrderManagement` trait defines the behaviour for querying information about orders in the database backend.
///
/// None of these methods take the order lock. They return the latest committed state.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, PaymentGatewayError>;

    async fn fetch_order_by_payme_id(&self, transaction_id: &str) -> Result<Option<Order>, PaymentGatewayError>;

    /// Fetches every order with a bound Payme transaction whose `create_time` lies in `[from, to]` (inclusive),
    /// ordered by `create_time`.
    async fn fetch_payme_transactions(&self, from: i64, to: i64) -> Result<Vec<Order>, PaymentGatewayError>;

    /// All orders for the buyer, oldest first.
    async fn fetch_orders_for_buyer(&self, buyer_id: BuyerId) -> Result<Vec<Order>, PaymentGatewayError>;
}
