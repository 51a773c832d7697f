use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

impl ConversionError {
    pub fn new<S: Into<String>>(msg: S) -> Self {
        Self(msg.into())
    }
}

//--------------------------------------        OrderId        ---------------------------------------------------------
/// The numeric order id. Both providers reference orders by this value (`account.order_id` for Payme,
/// `merchant_trans_id` for Click), so it must stay stable for the lifetime of the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub i64);

impl FromStr for OrderId {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self).map_err(|e| ConversionError(format!("Invalid order id '{s}': {e}")))
    }
}

impl From<i64> for OrderId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

//--------------------------------------        BuyerId        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct BuyerId(pub i64);

impl From<i64> for BuyerId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for BuyerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "buyer #{}", self.0)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// The order has been created and is waiting for a provider to confirm payment.
    Pending,
    /// A provider has performed (Payme) or completed (Click) the payment.
    Paid,
    /// The order was superseded, cancelled by the provider, or refunded after payment.
    Cancelled,
    /// The provider reported a failure for this order.
    Failed,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "pending"),
            OrderStatusType::Paid => write!(f, "paid"),
            OrderStatusType::Cancelled => write!(f, "cancelled"),
            OrderStatusType::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "cancelled" => Ok(Self::Cancelled),
            "failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to pending");
            OrderStatusType::Pending
        })
    }
}

//--------------------------------------   PaymentProvider     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    Payme,
    Click,
}

impl Display for PaymentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentProvider::Payme => write!(f, "payme"),
            PaymentProvider::Click => write!(f, "click"),
        }
    }
}

impl FromStr for PaymentProvider {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "payme" => Ok(Self::Payme),
            "click" => Ok(Self::Click),
            s => Err(ConversionError(format!("Invalid payment provider: {s}"))),
        }
    }
}

//--------------------------------------      PaymeState       ---------------------------------------------------------
/// The Payme transaction state, as defined by the Payme Merchant API.
///
/// ```text
///   (unbound) --Create--> Created --Perform--> Performed
///   (unbound | Created) --Cancel--> CancelledBeforePerform
///   Performed --Cancel--> CancelledAfterPerform
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymeState {
    Created,
    Performed,
    CancelledBeforePerform,
    CancelledAfterPerform,
}

impl PaymeState {
    /// The integer code that Payme uses on the wire.
    pub fn code(&self) -> i32 {
        match self {
            PaymeState::Created => 1,
            PaymeState::Performed => 2,
            PaymeState::CancelledBeforePerform => -1,
            PaymeState::CancelledAfterPerform => -2,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PaymeState::CancelledBeforePerform | PaymeState::CancelledAfterPerform)
    }

    /// The state a cancellation lands in, depending on whether the transaction had been performed.
    pub fn cancelled(was_performed: bool) -> Self {
        if was_performed {
            PaymeState::CancelledAfterPerform
        } else {
            PaymeState::CancelledBeforePerform
        }
    }
}

impl TryFrom<i32> for PaymeState {
    type Error = ConversionError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PaymeState::Created),
            2 => Ok(PaymeState::Performed),
            -1 => Ok(PaymeState::CancelledBeforePerform),
            -2 => Ok(PaymeState::CancelledAfterPerform),
            v => Err(ConversionError(format!("Invalid Payme state: {v}"))),
        }
    }
}

impl Display for PaymeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

//--------------------------------------     PaymeDetails      ---------------------------------------------------------
/// Payme-specific sub-state of an order. All times are epoch milliseconds, as Payme reports them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymeDetails {
    pub transaction_id: Option<String>,
    pub state: Option<PaymeState>,
    pub create_time: Option<i64>,
    pub perform_time: Option<i64>,
    pub cancel_time: Option<i64>,
    pub cancel_reason: Option<i32>,
}

impl PaymeDetails {
    /// The current state. A bound transaction without a recorded state is treated as freshly created.
    pub fn current_state(&self) -> PaymeState {
        self.state.unwrap_or(PaymeState::Created)
    }

    pub fn perform_time_or_zero(&self) -> i64 {
        self.perform_time.unwrap_or(0)
    }

    pub fn cancel_time_or_zero(&self) -> i64 {
        self.cancel_time.unwrap_or(0)
    }
}

//--------------------------------------     ClickDetails      ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClickDetails {
    pub trans_id: Option<i64>,
    pub prepare_id: Option<i64>,
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: OrderId,
    pub buyer_id: BuyerId,
    pub item_id: Option<i64>,
    pub event_id: Option<i64>,
    /// The order value in sum (the major unit). Never stored in tiyin.
    pub total_amount: Decimal,
    pub status: OrderStatusType,
    pub payment_method: PaymentProvider,
    pub payme: PaymeDetails,
    pub click: ClickDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_paid(&self) -> bool {
        self.status == OrderStatusType::Paid
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == OrderStatusType::Cancelled
    }
}

//--------------------------------------       NewOrder        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub buyer_id: BuyerId,
    pub item_id: Option<i64>,
    pub event_id: Option<i64>,
    pub total_amount: Decimal,
    pub payment_method: PaymentProvider,
}

impl NewOrder {
    pub fn new(buyer_id: BuyerId, total_amount: Decimal, payment_method: PaymentProvider) -> Self {
        Self { buyer_id, item_id: None, event_id: None, total_amount, payment_method }
    }

    pub fn for_item(mut self, item: &CatalogItem) -> Self {
        self.item_id = Some(item.id);
        self.event_id = Some(item.event_id);
        self
    }
}

//--------------------------------------         Buyer         ---------------------------------------------------------
/// The buyer as seen by the payment core. Registration and login live elsewhere; only `is_paid` and `paid_at` are
/// written here, and only inside the commit of the order write that caused the change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buyer {
    pub id: BuyerId,
    pub name: String,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
}

//--------------------------------------      CatalogItem      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    /// Ticket price in sum.
    pub price: Decimal,
}

//--------------------------------------         Event         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub is_active: bool,
}
