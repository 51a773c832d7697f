use crate::{
    db_types::{Buyer, BuyerId},
    traits::PaymentGatewayError,
};

/// Read access to the buyer records owned by the registration collaborator.
///
/// The payment flag on a buyer is only ever written through an [`crate::traits::OrderLock`].
#[allow(async_fn_in_trait)]
pub trait BuyerManagement {
    async fn fetch_buyer(&self, buyer_id: BuyerId) -> Result<Option<Buyer>, PaymentGatewayError>;
}
