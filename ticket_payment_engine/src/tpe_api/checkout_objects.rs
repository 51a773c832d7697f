use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db_types::{OrderId, PaymentProvider};

/// The outcome of a successful checkout: the order that the provider will be told about, the aggregate amount (in
/// sum) and the link that the buyer must be redirected to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutResult {
    pub order_id: OrderId,
    pub amount: Decimal,
    pub pay_url: String,
    pub provider: PaymentProvider,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatus {
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
}
