//! # Payme transaction state machine
//!
//! `PaymeApi` implements the six methods of the Payme Merchant API against any [`PaymentGatewayDatabase`] backend.
//!
//! Every mutating method (Create, Perform and Cancel) runs under the exclusive order lock, so that duplicated and
//! concurrent callbacks for the same order are serialized. Replays of a completed transition return the stored values
//! of the original response and write nothing.
//!
//! The read-only methods (CheckPerform, Check and GetStatement) read the latest committed state without locking.
use std::fmt::Debug;

use chrono::Utc;
use log::*;
use tpg_common::{sum_to_tiyin, Tiyin};

use crate::{
    db_types::{Order, OrderId, OrderStatusType, PaymeState, PaymentProvider},
    helpers::now_millis,
    tpe_api::{
        errors::PaymeError,
        payme_objects::{
            CancelTransactionResult,
            CheckPerformResult,
            CheckTransactionResult,
            CreateTransactionResult,
            PerformTransactionResult,
            StatementAccount,
            StatementEntry,
            StatementResult,
        },
    },
    traits::{OrderLock, PaymentGatewayDatabase},
};

/// Cancel reason recorded when Payme omits one and the transaction was never performed.
pub const DEFAULT_REASON_BEFORE_PERFORM: i32 = 3;
/// Cancel reason recorded when Payme omits one and the payment is being refunded.
pub const DEFAULT_REASON_AFTER_PERFORM: i32 = 5;

pub struct PaymeApi<B> {
    db: B,
}

impl<B> Debug for PaymeApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymeApi")
    }
}

impl<B> PaymeApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

fn expected_tiyin(order: &Order) -> Result<Tiyin, PaymeError> {
    sum_to_tiyin(order.total_amount).map_err(|e| {
        error!("💳️ Order {} has an amount that cannot be expressed in tiyin. {e}", order.id);
        PaymeError::Internal(e.to_string())
    })
}

/// The validation shared by CheckPerformTransaction and CreateTransaction.
fn check_amount(order: &Order, amount: Tiyin) -> Result<(), PaymeError> {
    let expected = expected_tiyin(order)?;
    if amount != expected {
        debug!("💳️ Order {} expects {} tiyin, but {} was offered", order.id, expected.value(), amount.value());
        return Err(PaymeError::InvalidAmount);
    }
    Ok(())
}

fn check_payable(order: &Order) -> Result<(), PaymeError> {
    if order.is_paid() {
        return Err(PaymeError::AlreadyPaid);
    }
    if order.is_cancelled() {
        return Err(PaymeError::OrderBlocked);
    }
    Ok(())
}

fn millis(t: chrono::DateTime<Utc>) -> i64 {
    t.timestamp_millis()
}

impl<B> PaymeApi<B>
where B: PaymentGatewayDatabase
{
    /// Asks whether a payment of `amount` for the order would be accepted. Nothing is written.
    pub async fn check_perform_transaction(
        &self,
        order_id: OrderId,
        amount: Tiyin,
    ) -> Result<CheckPerformResult, PaymeError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(PaymeError::OrderNotFound)?;
        check_payable(&order)?;
        check_amount(&order, amount)?;
        trace!("💳️ Order {order_id} can be paid with {amount}");
        Ok(CheckPerformResult { allow: true })
    }

    /// Binds a Payme transaction to the order.
    ///
    /// A repeated call with the same transaction id returns the stored `create_time` and state. A call with a
    /// different transaction id while one is already bound is rejected, and the existing binding is kept.
    pub async fn create_transaction(
        &self,
        order_id: OrderId,
        amount: Tiyin,
        transaction_id: &str,
        time: Option<i64>,
    ) -> Result<CreateTransactionResult, PaymeError> {
        let mut lock = self.db.lock_order(order_id).await?.ok_or(PaymeError::OrderNotFound)?;
        let order = lock.order();
        check_amount(order, amount)?;
        check_payable(order)?;
        if let Some(bound) = order.payme.transaction_id.as_deref() {
            if bound == transaction_id {
                let create_time = order.payme.create_time.or(time).unwrap_or_else(now_millis);
                let state = order.payme.current_state().code();
                debug!("💳️ CreateTransaction replay for {transaction_id} on order {order_id}");
                return Ok(CreateTransactionResult { create_time, transaction: bound.to_string(), state });
            }
            info!("💳️ Order {order_id} is already bound to {bound}. Rejecting transaction {transaction_id}.");
            return Err(PaymeError::OrderBusy);
        }
        let create_time = time.unwrap_or_else(now_millis);
        let order = lock.order_mut();
        order.payme.transaction_id = Some(transaction_id.to_string());
        order.payme.create_time = Some(create_time);
        order.payme.state = Some(PaymeState::Created);
        order.payment_method = PaymentProvider::Payme;
        // A transaction id that is already bound to another order is rejected by the store on commit.
        lock.commit().await.map_err(|e| {
            warn!("💳️ Transaction {transaction_id} could not be bound to order {order_id}. {e}");
            PaymeError::from(e)
        })?;
        info!("💳️ Transaction {transaction_id} created for order {order_id}");
        Ok(CreateTransactionResult {
            create_time,
            transaction: transaction_id.to_string(),
            state: PaymeState::Created.code(),
        })
    }

    /// Completes the payment. The order is marked paid and the buyer's payment flag is set in the same atomic unit.
    pub async fn perform_transaction(&self, transaction_id: &str) -> Result<PerformTransactionResult, PaymeError> {
        let mut lock =
            self.db.lock_order_by_payme_id(transaction_id).await?.ok_or(PaymeError::TransactionNotFound)?;
        let order = lock.order();
        let state = order.payme.current_state();
        if state.is_cancelled() {
            debug!("💳️ PerformTransaction on cancelled transaction {transaction_id}");
            return Ok(PerformTransactionResult::Cancelled {
                cancel_time: order.payme.cancel_time_or_zero(),
                transaction: transaction_id.to_string(),
                state: state.code(),
            });
        }
        if state == PaymeState::Performed {
            debug!("💳️ PerformTransaction replay for {transaction_id}");
            return Ok(PerformTransactionResult::Performed {
                perform_time: order.payme.perform_time_or_zero(),
                transaction: transaction_id.to_string(),
                state: state.code(),
            });
        }
        if order.is_cancelled() {
            info!("💳️ Order {} was superseded before transaction {transaction_id} could be performed", order.id);
            return Err(PaymeError::CannotPerform);
        }
        if order.is_paid() {
            info!("💳️ Order {} was paid through another channel. Cannot perform {transaction_id}.", order.id);
            return Err(PaymeError::CannotPerform);
        }
        let now = Utc::now();
        let perform_time = millis(now);
        let order = lock.order_mut();
        order.status = OrderStatusType::Paid;
        order.payme.state = Some(PaymeState::Performed);
        order.payme.perform_time = Some(perform_time);
        lock.mark_buyer_paid(now).await?;
        let order = lock.commit().await?;
        info!("💳️ Transaction {transaction_id} performed. Order {} is paid.", order.id);
        Ok(PerformTransactionResult::Performed {
            perform_time,
            transaction: transaction_id.to_string(),
            state: PaymeState::Performed.code(),
        })
    }

    /// Cancels the transaction. If the payment had been performed, this is a refund and the buyer's payment flag is
    /// reversed in the same atomic unit.
    pub async fn cancel_transaction(
        &self,
        transaction_id: &str,
        reason: Option<i32>,
    ) -> Result<CancelTransactionResult, PaymeError> {
        let mut lock =
            self.db.lock_order_by_payme_id(transaction_id).await?.ok_or(PaymeError::TransactionNotFound)?;
        let order = lock.order();
        let was_performed =
            order.payme.perform_time_or_zero() > 0 || order.payme.state == Some(PaymeState::Performed) || order.is_paid();
        let target = PaymeState::cancelled(was_performed);
        let default_reason = if was_performed { DEFAULT_REASON_AFTER_PERFORM } else { DEFAULT_REASON_BEFORE_PERFORM };

        let already_cancelled = order.is_cancelled() || order.payme.current_state().is_cancelled();
        if already_cancelled {
            if order.payme.state == Some(target) {
                debug!("💳️ CancelTransaction replay for {transaction_id}");
                return Ok(CancelTransactionResult {
                    cancel_time: order.payme.cancel_time_or_zero(),
                    transaction: transaction_id.to_string(),
                    state: target.code(),
                });
            }
            let order = lock.order_mut();
            info!("💳️ Normalizing state of cancelled transaction {transaction_id} to {target}");
            order.payme.state = Some(target);
            if order.payme.cancel_time_or_zero() <= 0 {
                order.payme.cancel_time = Some(now_millis());
            }
            if order.payme.cancel_reason.is_none() {
                order.payme.cancel_reason = Some(reason.unwrap_or(default_reason));
            }
            let order = lock.commit().await?;
            return Ok(CancelTransactionResult {
                cancel_time: order.payme.cancel_time_or_zero(),
                transaction: transaction_id.to_string(),
                state: target.code(),
            });
        }

        let cancel_time = now_millis();
        let order = lock.order_mut();
        order.status = OrderStatusType::Cancelled;
        order.payme.state = Some(target);
        order.payme.cancel_time = Some(cancel_time);
        order.payme.cancel_reason = Some(reason.unwrap_or(default_reason));
        if !was_performed {
            order.payme.perform_time = None;
        }
        if was_performed {
            let reversed = lock.reverse_buyer_payment().await?;
            debug!("💳️ Refund of {transaction_id}. Buyer payment flag cleared: {reversed}");
        }
        let order = lock.commit().await?;
        info!("💳️ Transaction {transaction_id} cancelled (state {target}). Order {} is cancelled.", order.id);
        Ok(CancelTransactionResult { cancel_time, transaction: transaction_id.to_string(), state: target.code() })
    }

    /// Reports the current state of the transaction. Missing timestamps are backfilled from the order record.
    pub async fn check_transaction(&self, transaction_id: &str) -> Result<CheckTransactionResult, PaymeError> {
        let order =
            self.db.fetch_order_by_payme_id(transaction_id).await?.ok_or(PaymeError::TransactionNotFound)?;
        let payme = &order.payme;
        let state = payme.current_state();
        let create_time = payme.create_time.filter(|t| *t > 0).unwrap_or_else(|| millis(order.created_at));
        let cancel_time = if state.is_cancelled() {
            payme.cancel_time.filter(|t| *t > 0).unwrap_or_else(|| millis(order.updated_at))
        } else {
            0
        };
        let perform_time = match state {
            PaymeState::Performed | PaymeState::CancelledAfterPerform => {
                payme.perform_time.filter(|t| *t > 0).unwrap_or(create_time)
            },
            PaymeState::Created | PaymeState::CancelledBeforePerform => 0,
        };
        let reason = if state.is_cancelled() { payme.cancel_reason } else { None };
        Ok(CheckTransactionResult {
            create_time,
            perform_time,
            cancel_time,
            transaction: transaction_id.to_string(),
            state: state.code(),
            reason,
        })
    }

    /// Lists every transaction created in `[from, to]`, ordered by creation time.
    pub async fn get_statement(&self, from: i64, to: i64) -> Result<StatementResult, PaymeError> {
        if from > to {
            return Err(PaymeError::InvalidParams("from/to"));
        }
        let orders = self.db.fetch_payme_transactions(from, to).await?;
        let transactions = orders
            .into_iter()
            .filter_map(|order| {
                let transaction = order.payme.transaction_id.clone()?;
                let state = order.payme.current_state();
                let create_time = order.payme.create_time.unwrap_or(0);
                let amount = match expected_tiyin(&order) {
                    Ok(t) => t.value(),
                    Err(_) => return None,
                };
                Some(StatementEntry {
                    id: transaction.clone(),
                    time: create_time,
                    amount,
                    account: StatementAccount { order_id: order.id },
                    create_time,
                    perform_time: order.payme.perform_time.filter(|t| *t > 0).unwrap_or(0),
                    cancel_time: if state.is_cancelled() { order.payme.cancel_time_or_zero() } else { 0 },
                    transaction,
                    state: state.code(),
                    reason: if state.is_cancelled() { order.payme.cancel_reason } else { None },
                })
            })
            .collect::<Vec<_>>();
        trace!("💳️ Statement for [{from}, {to}] has {} transactions", transactions.len());
        Ok(StatementResult { transactions })
    }

    /// Credentials are managed outside this service, so password changes are always refused.
    pub async fn change_password(&self) -> Result<(), PaymeError> {
        warn!("💳️ Payme asked to change the merchant password. This is not supported here.");
        Err(PaymeError::InsufficientPrivilege)
    }
}
