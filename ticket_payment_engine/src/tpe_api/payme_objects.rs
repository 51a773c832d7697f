//! Result objects for the Payme Merchant API. Field names match the JSON that Payme expects inside `result`.
use serde::{Deserialize, Serialize};

use crate::db_types::OrderId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckPerformResult {
    pub allow: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTransactionResult {
    pub create_time: i64,
    pub transaction: String,
    pub state: i32,
}

/// PerformTransaction answers with the perform time, unless the transaction had already been cancelled, in which case
/// the stored cancellation is reported instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PerformTransactionResult {
    Performed { perform_time: i64, transaction: String, state: i32 },
    Cancelled { cancel_time: i64, transaction: String, state: i32 },
}

impl PerformTransactionResult {
    pub fn state(&self) -> i32 {
        match self {
            PerformTransactionResult::Performed { state, .. } | PerformTransactionResult::Cancelled { state, .. } => {
                *state
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelTransactionResult {
    pub cancel_time: i64,
    pub transaction: String,
    pub state: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckTransactionResult {
    pub create_time: i64,
    pub perform_time: i64,
    pub cancel_time: i64,
    pub transaction: String,
    pub state: i32,
    /// Only present for cancelled transactions. Serialized as `null` otherwise.
    pub reason: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementAccount {
    pub order_id: OrderId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementEntry {
    pub id: String,
    pub time: i64,
    /// In tiyin
    pub amount: i64,
    pub account: StatementAccount,
    pub create_time: i64,
    pub perform_time: i64,
    pub cancel_time: i64,
    pub transaction: String,
    pub state: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementResult {
    pub transactions: Vec<StatementEntry>,
}
