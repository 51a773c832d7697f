//! # Order initiation
//!
//! `CheckoutApi` turns a buyer's selection of catalog items into pending orders and a provider checkout link.
//!
//! One order is created per selected item. The **first** order carries the aggregate total of the whole selection and
//! is the one that the checkout link refers to, so it is the order that provider callbacks will validate against. The
//! remaining orders carry their own item price and exist for bookkeeping. Any pending orders that the buyer already
//! had are superseded in the same atomic unit.
use std::fmt::Debug;

use log::*;
use rust_decimal::Decimal;

use crate::{
    db_types::{BuyerId, NewOrder, PaymentProvider},
    helpers::PayLinkConfig,
    tpe_api::{
        checkout_objects::{CheckoutResult, PaymentStatus},
        errors::CheckoutError,
    },
    traits::PaymentGatewayDatabase,
};

pub struct CheckoutApi<B> {
    db: B,
    links: PayLinkConfig,
}

impl<B> Debug for CheckoutApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi")
    }
}

impl<B> CheckoutApi<B> {
    pub fn new(db: B, links: PayLinkConfig) -> Self {
        Self { db, links }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> CheckoutApi<B>
where B: PaymentGatewayDatabase
{
    /// Creates the orders for the buyer's selection and returns the checkout link for `provider`.
    ///
    /// The merchant configuration for `provider` is checked before anything is written, so a misconfigured server
    /// never leaves orders behind that cannot be paid.
    pub async fn initiate_checkout(
        &self,
        buyer_id: BuyerId,
        item_ids: &[i64],
        provider: PaymentProvider,
        return_url: Option<&str>,
    ) -> Result<CheckoutResult, CheckoutError> {
        self.links.ensure_configured(provider)?;
        let buyer = self.db.fetch_buyer(buyer_id).await?.ok_or(CheckoutError::BuyerNotFound(buyer_id))?;
        if buyer.is_paid {
            return Err(CheckoutError::AlreadyPaid(buyer_id));
        }
        if item_ids.is_empty() {
            return Err(CheckoutError::EmptySelection);
        }
        let mut ids = item_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        let items = self.db.fetch_purchasable_items(&ids).await?;
        if items.is_empty() {
            debug!("🛒️ None of the items {ids:?} selected by {buyer_id} can be bought");
            return Err(CheckoutError::NoMatchingItems);
        }
        let total = items.iter().map(|item| item.price).sum::<Decimal>();
        let new_orders = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let amount = if i == 0 { total } else { item.price };
                NewOrder::new(buyer_id, amount, provider).for_item(item)
            })
            .collect::<Vec<_>>();
        let orders = self.db.replace_pending_orders(buyer_id, new_orders).await?;
        let first = orders.first().ok_or(CheckoutError::NoMatchingItems)?;
        let pay_url = self.links.pay_link(provider, first.id, total, return_url)?;
        info!("🛒️ {buyer_id} checked out {} item(s) via {provider}. Order {} for {total}.", orders.len(), first.id);
        Ok(CheckoutResult { order_id: first.id, amount: total, pay_url, provider })
    }

    pub async fn payment_status(&self, buyer_id: BuyerId) -> Result<PaymentStatus, CheckoutError> {
        let buyer = self.db.fetch_buyer(buyer_id).await?.ok_or(CheckoutError::BuyerNotFound(buyer_id))?;
        Ok(PaymentStatus { is_paid: buyer.is_paid, paid_at: buyer.paid_at })
    }
}
