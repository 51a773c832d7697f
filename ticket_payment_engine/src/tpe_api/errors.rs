use serde::Serialize;
use thiserror::Error;

use crate::{
    db_types::BuyerId,
    helpers::PayLinkError,
    traits::{PaymentGatewayError, SessionApiError},
};

//--------------------------------------      PaymeError       ---------------------------------------------------------
/// A Payme Merchant API fault. Every variant maps to one of the documented numeric codes, and carries the name of the
/// offending field in [`PaymeError::data`] where Payme expects one.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PaymeError {
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("Insufficient privilege")]
    InsufficientPrivilege,
    #[error("Invalid JSON-RPC object")]
    InvalidRequest,
    #[error("Method not found: {0}")]
    MethodNotFound(String),
    #[error("Invalid params: {0}")]
    InvalidParams(&'static str),
    #[error("Invalid amount")]
    InvalidAmount,
    #[error("Order not found")]
    OrderNotFound,
    #[error("Order is blocked")]
    OrderBlocked,
    #[error("Order is busy with another transaction")]
    OrderBusy,
    #[error("Order already paid")]
    AlreadyPaid,
    #[error("Cannot perform operation")]
    CannotPerform,
    #[error("Transaction not found")]
    TransactionNotFound,
}

/// The localized message block that accompanies every Payme error.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LocalizedMessage {
    pub ru: &'static str,
    pub uz: &'static str,
    pub en: &'static str,
}

impl PaymeError {
    pub fn code(&self) -> i32 {
        match self {
            PaymeError::Internal(_) => -32400,
            PaymeError::InsufficientPrivilege => -32504,
            PaymeError::InvalidRequest => -32600,
            PaymeError::MethodNotFound(_) => -32601,
            PaymeError::InvalidParams(_) => -32602,
            PaymeError::InvalidAmount => -31001,
            PaymeError::OrderNotFound | PaymeError::OrderBlocked | PaymeError::OrderBusy => -31050,
            PaymeError::AlreadyPaid => -31051,
            PaymeError::CannotPerform => -31008,
            PaymeError::TransactionNotFound => -31003,
        }
    }

    pub fn data(&self) -> Option<&str> {
        match self {
            PaymeError::InvalidParams(field) => Some(*field),
            PaymeError::InvalidAmount => Some("amount"),
            PaymeError::OrderNotFound | PaymeError::OrderBlocked | PaymeError::OrderBusy | PaymeError::AlreadyPaid => {
                Some("order_id")
            },
            PaymeError::TransactionNotFound | PaymeError::CannotPerform => Some("id"),
            PaymeError::MethodNotFound(method) => Some(method.as_str()),
            _ => None,
        }
    }

    pub fn message(&self) -> LocalizedMessage {
        let (ru, uz, en) = match self {
            PaymeError::Internal(_) => ("Внутренняя ошибка сервера", "Serverning ichki xatosi", "Internal server error"),
            PaymeError::InsufficientPrivilege => (
                "Недостаточно привилегий для выполнения метода",
                "Metodni bajarish uchun huquqlar yetarli emas",
                "Insufficient privilege to perform this method",
            ),
            PaymeError::InvalidRequest => {
                ("Неверный JSON-RPC объект", "JSON-RPC obyekti noto'g'ri", "Invalid JSON-RPC object")
            },
            PaymeError::MethodNotFound(_) => ("Метод не найден", "Metod topilmadi", "Method not found"),
            PaymeError::InvalidParams(_) => ("Неверные параметры", "Parametrlar noto'g'ri", "Invalid params"),
            PaymeError::InvalidAmount => ("Неверная сумма", "Noto'g'ri summa", "Invalid amount"),
            PaymeError::OrderNotFound => ("Заказ не найден", "Buyurtma topilmadi", "Order not found"),
            PaymeError::OrderBlocked => ("Заказ заблокирован", "Buyurtma bloklangan", "Order is blocked"),
            PaymeError::OrderBusy => (
                "Заказ ожидает оплаты по другой транзакции",
                "Buyurtma boshqa tranzaksiya bo'yicha to'lovni kutmoqda",
                "Order is busy with another transaction",
            ),
            PaymeError::AlreadyPaid => ("Заказ уже оплачен", "Buyurtma allaqachon to'langan", "Order already paid"),
            PaymeError::CannotPerform => {
                ("Невозможно выполнить операцию", "Operatsiyani bajarib bo'lmaydi", "Unable to perform operation")
            },
            PaymeError::TransactionNotFound => ("Транзакция не найдена", "Tranzaksiya topilmadi", "Transaction not found"),
        };
        LocalizedMessage { ru, uz, en }
    }
}

impl From<PaymentGatewayError> for PaymeError {
    fn from(e: PaymentGatewayError) -> Self {
        match e {
            PaymentGatewayError::TransactionAlreadyBound(_) => PaymeError::CannotPerform,
            e => PaymeError::Internal(e.to_string()),
        }
    }
}

//--------------------------------------    ClickErrorCode     ---------------------------------------------------------
/// The Click SHOP API result codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickErrorCode {
    Success,
    SignCheckFailed,
    InvalidAmount,
    ActionNotFound,
    AlreadyPaid,
    OrderNotFound,
    TransactionNotFound,
    UpdateFailed,
    BadRequest,
    TransactionCancelled,
}

impl ClickErrorCode {
    pub fn code(&self) -> i32 {
        match self {
            ClickErrorCode::Success => 0,
            ClickErrorCode::SignCheckFailed => -1,
            ClickErrorCode::InvalidAmount => -2,
            ClickErrorCode::ActionNotFound => -3,
            ClickErrorCode::AlreadyPaid => -4,
            ClickErrorCode::OrderNotFound => -5,
            ClickErrorCode::TransactionNotFound => -6,
            ClickErrorCode::UpdateFailed => -7,
            ClickErrorCode::BadRequest => -8,
            ClickErrorCode::TransactionCancelled => -9,
        }
    }
}

//--------------------------------------      ClickError       ---------------------------------------------------------
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClickError {
    #[error("Invalid signature")]
    SignCheckFailed,
    #[error("Invalid amount")]
    InvalidAmount,
    #[error("Unknown action")]
    ActionNotFound,
    #[error("Already paid")]
    AlreadyPaid,
    #[error("Order not found")]
    OrderNotFound,
    #[error("Prepare ID mismatch")]
    TransactionNotFound,
    #[error("Update failed")]
    UpdateFailed(String),
    #[error("Invalid request: {0}")]
    BadRequest(&'static str),
    #[error("Cancelled")]
    Cancelled,
}

impl ClickError {
    pub fn code(&self) -> ClickErrorCode {
        match self {
            ClickError::SignCheckFailed => ClickErrorCode::SignCheckFailed,
            ClickError::InvalidAmount => ClickErrorCode::InvalidAmount,
            ClickError::ActionNotFound => ClickErrorCode::ActionNotFound,
            ClickError::AlreadyPaid => ClickErrorCode::AlreadyPaid,
            ClickError::OrderNotFound => ClickErrorCode::OrderNotFound,
            ClickError::TransactionNotFound => ClickErrorCode::TransactionNotFound,
            ClickError::UpdateFailed(_) => ClickErrorCode::UpdateFailed,
            ClickError::BadRequest(_) => ClickErrorCode::BadRequest,
            ClickError::Cancelled => ClickErrorCode::TransactionCancelled,
        }
    }

    /// The `error_note` sent back to Click. Database details are never included.
    pub fn note(&self) -> String {
        match self {
            ClickError::UpdateFailed(_) => "Update failed".to_string(),
            e => e.to_string(),
        }
    }
}

impl From<PaymentGatewayError> for ClickError {
    fn from(e: PaymentGatewayError) -> Self {
        ClickError::UpdateFailed(e.to_string())
    }
}

//--------------------------------------     CheckoutError     ---------------------------------------------------------
#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("{0} does not exist")]
    BuyerNotFound(BuyerId),
    #[error("{0} has already paid")]
    AlreadyPaid(BuyerId),
    #[error("No items were selected")]
    EmptySelection,
    #[error("None of the selected items can be bought")]
    NoMatchingItems,
    #[error("{0}")]
    PayLink(#[from] PayLinkError),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<PaymentGatewayError> for CheckoutError {
    fn from(e: PaymentGatewayError) -> Self {
        CheckoutError::DatabaseError(e.to_string())
    }
}

//--------------------------------------     SessionError      ---------------------------------------------------------
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("No session token was provided")]
    MissingToken,
    #[error("The session is unknown or has expired")]
    UnknownSession,
    #[error("{0}")]
    Backend(#[from] SessionApiError),
}
