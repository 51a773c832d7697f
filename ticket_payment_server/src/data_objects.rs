use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use ticket_payment_engine::checkout_objects::{CheckoutResult, PaymentStatus};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitiatePaymentRequest {
    #[serde(default, alias = "subject_ids")]
    pub item_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiatePaymentResponse {
    pub success: bool,
    pub order_id: i64,
    /// In sum
    pub amount: f64,
    pub pay_url: String,
}

impl From<CheckoutResult> for InitiatePaymentResponse {
    fn from(result: CheckoutResult) -> Self {
        Self {
            success: true,
            order_id: result.order_id.value(),
            amount: result.amount.to_f64().unwrap_or_default(),
            pay_url: result.pay_url,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentStatusResponse {
    pub success: bool,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
}

impl From<PaymentStatus> for PaymentStatusResponse {
    fn from(status: PaymentStatus) -> Self {
        Self { success: true, is_paid: status.is_paid, paid_at: status.paid_at }
    }
}
