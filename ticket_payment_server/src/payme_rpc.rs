//! # Payme JSON-RPC envelope
//!
//! Payme calls a single endpoint with a JSON-RPC style body, `{"id": .., "method": .., "params": {..}}`, and
//! authenticates with `Authorization: Basic base64("Paycom:{merchant_key}")`.
//!
//! Requests are handled in this order:
//! 1. The body must be a non-empty JSON object, or the answer is `-32600` with a `null` id.
//! 2. The credentials must match the configured merchant key (`-32504`). An unset key rejects everything.
//! 3. The method must be known (`-32601`).
//! 4. The parameters for that method are extracted (`-32602`, naming the offending field) before any state is read.
//!
//! Every answer is HTTP 200 with `{"jsonrpc": "2.0", "id": .., "result": ..}` or
//! `{"jsonrpc": "2.0", "id": .., "error": {"code": .., "message": {"ru", "uz", "en"}, "data": ..}}`.
use std::str::FromStr;

use actix_web::{http::header, HttpRequest};
use log::*;
use serde::Serialize;
use serde_json::{Map, Value};
use ticket_payment_engine::{db_types::OrderId, traits::PaymentGatewayDatabase, LocalizedMessage, PaymeApi, PaymeError};
use tpg_common::{Secret, Tiyin};

pub const PAYME_LOGIN: &str = "Paycom";

//--------------------------------------   PaymeCredentials    ---------------------------------------------------------
#[derive(Debug, Clone, Default)]
pub struct PaymeCredentials {
    key: Secret<String>,
}

impl PaymeCredentials {
    pub fn new(key: Secret<String>) -> Self {
        Self { key }
    }

    pub fn is_configured(&self) -> bool {
        !self.key.is_empty()
    }

    /// Checks the value of an `Authorization` header against the merchant key.
    pub fn authorize(&self, authorization: Option<&str>) -> bool {
        if !self.is_configured() {
            return false;
        }
        let encoded = match authorization.and_then(|h| h.trim().strip_prefix("Basic ")) {
            Some(encoded) => encoded.trim(),
            None => return false,
        };
        let decoded = match base64::decode(encoded).ok().and_then(|b| String::from_utf8(b).ok()) {
            Some(decoded) => decoded,
            None => return false,
        };
        match decoded.split_once(':') {
            Some((login, password)) => login == PAYME_LOGIN && password == self.key.reveal().trim(),
            None => false,
        }
    }
}

//--------------------------------------      PaymeMethod      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymeMethod {
    CheckPerformTransaction,
    CreateTransaction,
    PerformTransaction,
    CancelTransaction,
    CheckTransaction,
    GetStatement,
    ChangePassword,
}

impl FromStr for PaymeMethod {
    type Err = PaymeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CheckPerformTransaction" => Ok(Self::CheckPerformTransaction),
            "CreateTransaction" => Ok(Self::CreateTransaction),
            "PerformTransaction" => Ok(Self::PerformTransaction),
            "CancelTransaction" => Ok(Self::CancelTransaction),
            "CheckTransaction" => Ok(Self::CheckTransaction),
            "GetStatement" => Ok(Self::GetStatement),
            "ChangePassword" => Ok(Self::ChangePassword),
            s => Err(PaymeError::MethodNotFound(s.to_string())),
        }
    }
}

//--------------------------------------      RpcResponse      ---------------------------------------------------------
#[derive(Debug, Clone, Serialize)]
pub struct RpcError {
    pub code: i32,
    pub message: LocalizedMessage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl From<&PaymeError> for RpcError {
    fn from(e: &PaymeError) -> Self {
        Self { code: e.code(), message: e.message(), data: e.data().map(String::from) }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self { jsonrpc: "2.0", id, result: Some(result), error: None }
    }

    pub fn failure(id: Value, error: &PaymeError) -> Self {
        Self { jsonrpc: "2.0", id, result: None, error: Some(error.into()) }
    }
}

//--------------------------------------       Handling        ---------------------------------------------------------

/// Runs a raw Payme request through the envelope checks and the state machine. Never fails: every fault is carried in
/// the returned envelope.
pub async fn handle_rpc<B>(
    req: &HttpRequest,
    body: &[u8],
    api: &PaymeApi<B>,
    credentials: &PaymeCredentials,
) -> RpcResponse
where
    B: PaymentGatewayDatabase,
{
    let envelope = match parse_envelope(body) {
        Ok(envelope) => envelope,
        Err(e) => {
            debug!("💳️ Payme sent a request that is not a JSON-RPC object");
            return RpcResponse::failure(Value::Null, &e);
        },
    };
    let id = envelope.get("id").cloned().unwrap_or(Value::Null);
    let authorization = req.headers().get(header::AUTHORIZATION).and_then(|v| v.to_str().ok());
    if !credentials.authorize(authorization) {
        if credentials.is_configured() {
            warn!("💳️ Payme request {id} carried invalid credentials");
        } else {
            error!("💳️ Payme request {id} rejected because the merchant key is not configured");
        }
        return RpcResponse::failure(id, &PaymeError::InsufficientPrivilege);
    }
    let method = envelope.get("method").and_then(Value::as_str).unwrap_or_default();
    let empty = Value::Object(Map::new());
    let params = envelope.get("params").filter(|p| p.is_object()).unwrap_or(&empty);
    match dispatch(api, method, params).await {
        Ok(result) => RpcResponse::success(id, result),
        Err(e) => {
            match &e {
                PaymeError::Internal(detail) => error!("💳️ Payme {method} request {id} failed. {detail}"),
                e => debug!("💳️ Payme {method} request {id} rejected with {}: {e}", e.code()),
            }
            RpcResponse::failure(id, &e)
        },
    }
}

fn parse_envelope(body: &[u8]) -> Result<Map<String, Value>, PaymeError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) if !map.is_empty() => Ok(map),
        _ => Err(PaymeError::InvalidRequest),
    }
}

/// Extracts the parameters for `method` and calls the matching operation.
pub async fn dispatch<B>(api: &PaymeApi<B>, method: &str, params: &Value) -> Result<Value, PaymeError>
where B: PaymentGatewayDatabase {
    let method = PaymeMethod::from_str(method)?;
    trace!("💳️ Dispatching {method:?}");
    match method {
        PaymeMethod::CheckPerformTransaction => {
            let (order_id, amount) = (order_id(params)?, amount(params)?);
            to_json(api.check_perform_transaction(order_id, amount).await?)
        },
        PaymeMethod::CreateTransaction => {
            let (order_id, amount, transaction_id) = (order_id(params)?, amount(params)?, transaction_id(params)?);
            let time = optional_integer(params, "time");
            to_json(api.create_transaction(order_id, amount, &transaction_id, time).await?)
        },
        PaymeMethod::PerformTransaction => to_json(api.perform_transaction(&transaction_id(params)?).await?),
        PaymeMethod::CancelTransaction => {
            let transaction_id = transaction_id(params)?;
            let reason = reason(params)?;
            to_json(api.cancel_transaction(&transaction_id, reason).await?)
        },
        PaymeMethod::CheckTransaction => to_json(api.check_transaction(&transaction_id(params)?).await?),
        PaymeMethod::GetStatement => {
            let from = optional_integer(params, "from").ok_or(PaymeError::InvalidParams("from/to"))?;
            let to = optional_integer(params, "to").ok_or(PaymeError::InvalidParams("from/to"))?;
            to_json(api.get_statement(from, to).await?)
        },
        PaymeMethod::ChangePassword => {
            api.change_password().await?;
            Ok(Value::Null)
        },
    }
}

fn to_json<T: Serialize>(result: T) -> Result<Value, PaymeError> {
    serde_json::to_value(result).map_err(|e| PaymeError::Internal(format!("Could not serialize result. {e}")))
}

/// Payme sends integers, but numeric strings and integral floats are tolerated.
fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64().filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn optional_integer(params: &Value, field: &str) -> Option<i64> {
    params.get(field).and_then(integer)
}

fn order_id(params: &Value) -> Result<OrderId, PaymeError> {
    params
        .get("account")
        .and_then(|account| account.get("order_id"))
        .and_then(integer)
        .map(OrderId)
        .ok_or(PaymeError::InvalidParams("order_id"))
}

fn amount(params: &Value) -> Result<Tiyin, PaymeError> {
    optional_integer(params, "amount").map(Tiyin::from).ok_or(PaymeError::InvalidParams("amount"))
}

/// An absent or null `reason` means the default reason applies. Anything else must fit an `i32`.
fn reason(params: &Value) -> Result<Option<i32>, PaymeError> {
    match params.get("reason") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => integer(value)
            .and_then(|r| i32::try_from(r).ok())
            .map(Some)
            .ok_or(PaymeError::InvalidParams("reason")),
    }
}

fn transaction_id(params: &Value) -> Result<String, PaymeError> {
    params
        .get("id")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .ok_or(PaymeError::InvalidParams("id"))
}
