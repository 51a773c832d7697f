//! # Click Prepare/Complete state machine
//!
//! Click pays in two phases. *Prepare* (action 0) asks whether the order can be paid and binds Click's transaction id
//! to it. *Complete* (action 1) reports the outcome of the payment, echoing the prepare id that we handed out.
//!
//! Every callback is checked in the same order: signature, order id, order lookup (under the order lock), amount, and
//! finally the phase itself. A failed check answers with the matching Click error code and writes nothing.
use std::{fmt::Debug, str::FromStr};

use chrono::Utc;
use log::*;
use rust_decimal::Decimal;
use tpg_common::Secret;

use crate::{
    db_types::{OrderId, OrderStatusType, PaymentProvider},
    tpe_api::{
        click_objects::{ClickAction, ClickRequest, ClickResponse},
        errors::ClickError,
    },
    traits::{OrderLock, PaymentGatewayDatabase},
};

/// Amounts reported by Click may differ from the order total by at most this much (in sum).
pub const AMOUNT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// The shared secret that Click signs callbacks with.
#[derive(Debug, Clone, Default)]
pub struct ClickCredentials {
    pub service_id: String,
    pub secret_key: Secret<String>,
}

impl ClickCredentials {
    pub fn new<S: Into<String>>(service_id: S, secret_key: Secret<String>) -> Self {
        Self { service_id: service_id.into(), secret_key }
    }
}

pub struct ClickApi<B> {
    db: B,
    credentials: ClickCredentials,
}

impl<B> Debug for ClickApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ClickApi (service {})", self.credentials.service_id)
    }
}

impl<B> ClickApi<B> {
    pub fn new(db: B, credentials: ClickCredentials) -> Self {
        Self { db, credentials }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> ClickApi<B>
where B: PaymentGatewayDatabase
{
    /// Handles a single Prepare or Complete callback. The answer is always a well-formed Click response; faults are
    /// carried in its `error` field.
    pub async fn handle_callback(&self, request: ClickRequest) -> ClickResponse {
        let click_trans_id = match request.click_trans_id() {
            Ok(id) => id,
            Err(e) => {
                warn!("🖱️ Click callback without a usable click_trans_id: '{}'", request.click_trans_id);
                return ClickResponse::failure(&request, 0, 0, &e);
            },
        };
        if self.credentials.secret_key.is_empty() {
            error!("🖱️ The Click secret key is not configured. Every callback is rejected.");
            return ClickResponse::failure(&request, click_trans_id, 0, &ClickError::SignCheckFailed);
        }
        if !request.signature_is_valid(self.credentials.secret_key.reveal()) {
            warn!("🖱️ Invalid signature on Click transaction {click_trans_id}");
            return ClickResponse::failure(&request, click_trans_id, 0, &ClickError::SignCheckFailed);
        }
        let result = match ClickAction::parse(&request.action) {
            Some(ClickAction::Complete) => self.complete(&request, click_trans_id).await,
            _ => self.prepare(&request, click_trans_id).await,
        };
        match result {
            Ok(response) => response,
            Err((prepare_id, e)) => {
                match &e {
                    ClickError::UpdateFailed(detail) => {
                        error!("🖱️ Click transaction {click_trans_id} could not be saved. {detail}")
                    },
                    e => debug!("🖱️ Click transaction {click_trans_id} rejected: {e}"),
                }
                ClickResponse::failure(&request, click_trans_id, prepare_id, &e)
            },
        }
    }

    /// Locks the order and checks the amount. Returns the lock, ready for the phase-specific logic.
    async fn lock_and_validate(&self, request: &ClickRequest) -> Result<B::Lock, ClickError> {
        let order_id = OrderId::from_str(&request.merchant_trans_id).map_err(|_| ClickError::OrderNotFound)?;
        let lock = self.db.lock_order(order_id).await?.ok_or(ClickError::OrderNotFound)?;
        let amount = Decimal::from_str(request.amount.trim()).map_err(|_| ClickError::InvalidAmount)?;
        let expected = lock.order().total_amount;
        if (expected - amount).abs() > AMOUNT_TOLERANCE {
            debug!("🖱️ Order {order_id} expects {expected}, but Click reported {amount}");
            return Err(ClickError::InvalidAmount);
        }
        Ok(lock)
    }

    async fn prepare(&self, request: &ClickRequest, click_trans_id: i64) -> Result<ClickResponse, (i64, ClickError)> {
        // Unknown actions are only reported once the order and amount have been validated.
        let mut lock = self.lock_and_validate(request).await.map_err(|e| (0, e))?;
        let order_id = lock.order().id;
        if ClickAction::parse(&request.action).is_none() {
            return Err((0, ClickError::ActionNotFound));
        }
        let order = lock.order();
        if order.is_paid() {
            return Err((order_id.value(), ClickError::AlreadyPaid));
        }
        if order.is_cancelled() {
            return Err((order_id.value(), ClickError::Cancelled));
        }
        if let Some(previous) = order.click.trans_id.filter(|id| *id != click_trans_id) {
            info!("🖱️ Order {order_id} was prepared for Click transaction {previous}. Rebinding to {click_trans_id}.");
        }
        let prepare_id = order_id.value();
        let order = lock.order_mut();
        order.click.trans_id = Some(click_trans_id);
        order.click.prepare_id = Some(prepare_id);
        order.payment_method = PaymentProvider::Click;
        lock.commit().await.map_err(|e| (prepare_id, ClickError::from(e)))?;
        info!("🖱️ Order {order_id} prepared for Click transaction {click_trans_id}");
        Ok(ClickResponse::success(request, click_trans_id, prepare_id))
    }

    async fn complete(&self, request: &ClickRequest, click_trans_id: i64) -> Result<ClickResponse, (i64, ClickError)> {
        let mut lock = self.lock_and_validate(request).await.map_err(|e| (0, e))?;
        let order_id = lock.order().id;
        let echoed = request.merchant_prepare_id().map_err(|e| (0, e))?;
        let echoed_id = echoed.unwrap_or(0);
        let provider_error = request.provider_error().map_err(|e| (echoed_id, e))?;

        if provider_error < 0 {
            info!("🖱️ Click reported error {provider_error} for order {order_id}: {}", request.error_note);
            if !lock.order().is_paid() && !lock.order().is_cancelled() {
                lock.order_mut().status = OrderStatusType::Cancelled;
                lock.commit().await.map_err(|e| (echoed_id, ClickError::from(e)))?;
            }
            return Err((echoed_id, ClickError::Cancelled));
        }
        let order = lock.order();
        if order.is_paid() {
            return Err((echoed_id, ClickError::AlreadyPaid));
        }
        if order.is_cancelled() {
            return Err((echoed_id, ClickError::Cancelled));
        }
        if order.click.prepare_id.is_none() || order.click.prepare_id != echoed {
            debug!("🖱️ Order {order_id} has prepare id {:?}, but Click echoed {echoed:?}", order.click.prepare_id);
            return Err((echoed_id, ClickError::TransactionNotFound));
        }
        let now = Utc::now();
        lock.order_mut().status = OrderStatusType::Paid;
        lock.mark_buyer_paid(now).await.map_err(|e| (echoed_id, ClickError::from(e)))?;
        lock.commit().await.map_err(|e| (echoed_id, ClickError::from(e)))?;
        info!("🖱️ Click transaction {click_trans_id} complete. Order {order_id} is paid.");
        Ok(ClickResponse::success(request, click_trans_id, echoed_id).with_confirm_id(echoed_id))
    }
}
