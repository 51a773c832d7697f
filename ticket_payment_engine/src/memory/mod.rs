//! An in-memory backend for the ticket payment engine.
//!
//! All state lives behind a single `Arc<RwLock<..>>`, and every order additionally has its own mutex that plays the
//! role of the row lock in the SQLite backend. The same protocol logic therefore runs unchanged against both stores.
//! Nothing is persisted. This backend is used for tests and local experiments.
use std::{
    collections::{BTreeMap, HashMap},
    fmt::Debug,
    sync::Arc,
};

use chrono::{DateTime, Utc};
use log::*;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::{
    db_types::{Buyer, BuyerId, CatalogItem, Event, NewOrder, Order, OrderId, OrderStatusType},
    traits::{
        BuyerManagement,
        CatalogManagement,
        OrderLock,
        OrderManagement,
        PaymentGatewayDatabase,
        PaymentGatewayError,
        SessionApiError,
        SessionManagement,
    },
};

#[derive(Default)]
struct MemoryState {
    orders: BTreeMap<OrderId, Order>,
    buyers: HashMap<BuyerId, Buyer>,
    events: HashMap<i64, Event>,
    items: BTreeMap<i64, CatalogItem>,
    sessions: HashMap<String, BuyerId>,
    last_order_id: i64,
    last_buyer_id: i64,
    last_event_id: i64,
    last_item_id: i64,
}

impl MemoryState {
    fn other_paid_orders(&self, buyer_id: BuyerId, except: OrderId) -> usize {
        self.orders.values().filter(|o| o.buyer_id == buyer_id && o.id != except && o.is_paid()).count()
    }

    fn payme_id_taken_by_other(&self, order: &Order) -> bool {
        match &order.payme.transaction_id {
            Some(txid) => self
                .orders
                .values()
                .any(|o| o.id != order.id && o.payme.transaction_id.as_deref() == Some(txid.as_str())),
            None => false,
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<RwLock<MemoryState>>,
    locks: Arc<Mutex<HashMap<OrderId, Arc<Mutex<()>>>>>,
}

impl Debug for MemoryDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MemoryDatabase")
    }
}

/// A buyer payment change waiting for the lock to be committed.
#[derive(Debug, Clone, Copy)]
enum StagedBuyerChange {
    MarkPaid(DateTime<Utc>),
    /// Decided at commit time, against the buyer's other orders as they are then.
    ClearUnlessOtherPaid,
}

pub struct MemoryOrderLock {
    _guard: OwnedMutexGuard<()>,
    state: Arc<RwLock<MemoryState>>,
    order: Order,
    buyer_change: Option<StagedBuyerChange>,
}

impl OrderLock for MemoryOrderLock {
    fn order(&self) -> &Order {
        &self.order
    }

    fn order_mut(&mut self) -> &mut Order {
        &mut self.order
    }

    async fn mark_buyer_paid(&mut self, paid_at: DateTime<Utc>) -> Result<(), PaymentGatewayError> {
        self.buyer_change = Some(StagedBuyerChange::MarkPaid(paid_at));
        Ok(())
    }

    async fn reverse_buyer_payment(&mut self) -> Result<bool, PaymentGatewayError> {
        let others = self.state.read().await.other_paid_orders(self.order.buyer_id, self.order.id);
        if others > 0 {
            debug!("🗃️ {} still has {others} paid order(s). Payment flag is kept.", self.order.buyer_id);
        }
        self.buyer_change = Some(StagedBuyerChange::ClearUnlessOtherPaid);
        Ok(others == 0)
    }

    async fn commit(self) -> Result<Order, PaymentGatewayError> {
        let mut state = self.state.write().await;
        if state.payme_id_taken_by_other(&self.order) {
            let txid = self.order.payme.transaction_id.clone().unwrap_or_default();
            return Err(PaymentGatewayError::TransactionAlreadyBound(txid));
        }
        let mut order = self.order;
        order.updated_at = Utc::now();
        state.orders.insert(order.id, order.clone());
        let paid_at = match self.buyer_change {
            None => None,
            Some(StagedBuyerChange::MarkPaid(t)) => Some(Some(t)),
            Some(StagedBuyerChange::ClearUnlessOtherPaid) => {
                match state.other_paid_orders(order.buyer_id, order.id) {
                    0 => Some(None),
                    n => {
                        debug!("🗃️ {} has {n} paid order(s) at commit. Payment flag is kept.", order.buyer_id);
                        None
                    },
                }
            },
        };
        if let Some(paid_at) = paid_at {
            match state.buyers.get_mut(&order.buyer_id) {
                Some(buyer) => {
                    buyer.is_paid = paid_at.is_some();
                    buyer.paid_at = paid_at;
                },
                None => warn!("🗃️ Order {} belongs to {}, which does not exist", order.id, order.buyer_id),
            }
        }
        trace!("🗃️ Lock on order {} released", order.id);
        Ok(order)
    }
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    async fn order_mutex(&self, order_id: OrderId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(order_id).or_default().clone()
    }

    pub async fn insert_buyer(&self, name: &str) -> BuyerId {
        let mut state = self.state.write().await;
        state.last_buyer_id += 1;
        let id = BuyerId(state.last_buyer_id);
        state.buyers.insert(id, Buyer { id, name: name.to_string(), is_paid: false, paid_at: None });
        id
    }

    pub async fn insert_event(&self, name: &str, is_active: bool) -> i64 {
        let mut state = self.state.write().await;
        state.last_event_id += 1;
        let id = state.last_event_id;
        state.events.insert(id, Event { id, name: name.to_string(), is_active });
        id
    }

    pub async fn insert_item(&self, event_id: i64, name: &str, price: Decimal) -> i64 {
        let mut state = self.state.write().await;
        state.last_item_id += 1;
        let id = state.last_item_id;
        state.items.insert(id, CatalogItem { id, event_id, name: name.to_string(), price });
        id
    }

    pub async fn insert_session(&self, token: &str, buyer_id: BuyerId) {
        self.state.write().await.sessions.insert(token.to_string(), buyer_id);
    }
}

impl PaymentGatewayDatabase for MemoryDatabase {
    type Lock = MemoryOrderLock;

    fn url(&self) -> &str {
        "memory://"
    }

    async fn lock_order(&self, order_id: OrderId) -> Result<Option<Self::Lock>, PaymentGatewayError> {
        let guard = self.order_mutex(order_id).await.lock_owned().await;
        let order = self.state.read().await.orders.get(&order_id).cloned();
        Ok(order.map(|order| MemoryOrderLock { _guard: guard, state: self.state.clone(), order, buyer_change: None }))
    }

    async fn lock_order_by_payme_id(&self, transaction_id: &str) -> Result<Option<Self::Lock>, PaymentGatewayError> {
        let order_id = self.fetch_order_by_payme_id(transaction_id).await?.map(|o| o.id);
        match order_id {
            Some(id) => self.lock_order(id).await,
            None => Ok(None),
        }
    }

    async fn replace_pending_orders(
        &self,
        buyer_id: BuyerId,
        new_orders: Vec<NewOrder>,
    ) -> Result<Vec<Order>, PaymentGatewayError> {
        let pending = {
            let state = self.state.read().await;
            state
                .orders
                .values()
                .filter(|o| o.buyer_id == buyer_id && o.status == OrderStatusType::Pending)
                .map(|o| o.id)
                .collect::<Vec<_>>()
        };
        // Ids come out of a BTreeMap, so locks are always taken in ascending order.
        let mut guards = Vec::with_capacity(pending.len());
        for id in &pending {
            guards.push(self.order_mutex(*id).await.lock_owned().await);
        }
        let now = Utc::now();
        let mut state = self.state.write().await;
        let mut superseded = 0;
        for id in &pending {
            if let Some(order) = state.orders.get_mut(id) {
                if order.status == OrderStatusType::Pending {
                    order.status = OrderStatusType::Cancelled;
                    order.updated_at = now;
                    superseded += 1;
                }
            }
        }
        if superseded > 0 {
            debug!("🗃️ {superseded} pending order(s) for {buyer_id} have been superseded");
        }
        let mut result = Vec::with_capacity(new_orders.len());
        for new_order in new_orders {
            state.last_order_id += 1;
            let order = Order {
                id: OrderId(state.last_order_id),
                buyer_id: new_order.buyer_id,
                item_id: new_order.item_id,
                event_id: new_order.event_id,
                total_amount: new_order.total_amount,
                status: OrderStatusType::Pending,
                payment_method: new_order.payment_method,
                payme: Default::default(),
                click: Default::default(),
                created_at: now,
                updated_at: now,
            };
            debug!("🗃️ Order {} inserted for {}", order.id, order.buyer_id);
            state.orders.insert(order.id, order.clone());
            result.push(order);
        }
        drop(guards);
        Ok(result)
    }
}

impl OrderManagement for MemoryDatabase {
    async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, PaymentGatewayError> {
        Ok(self.state.read().await.orders.get(&order_id).cloned())
    }

    async fn fetch_order_by_payme_id(&self, transaction_id: &str) -> Result<Option<Order>, PaymentGatewayError> {
        let state = self.state.read().await;
        let order = state.orders.values().find(|o| o.payme.transaction_id.as_deref() == Some(transaction_id));
        Ok(order.cloned())
    }

    async fn fetch_payme_transactions(&self, from: i64, to: i64) -> Result<Vec<Order>, PaymentGatewayError> {
        let state = self.state.read().await;
        let mut orders = state
            .orders
            .values()
            .filter(|o| o.payme.transaction_id.is_some())
            .filter(|o| o.payme.create_time.map(|t| t >= from && t <= to).unwrap_or(false))
            .cloned()
            .collect::<Vec<_>>();
        orders.sort_by_key(|o| (o.payme.create_time, o.id));
        Ok(orders)
    }

    async fn fetch_orders_for_buyer(&self, buyer_id: BuyerId) -> Result<Vec<Order>, PaymentGatewayError> {
        let state = self.state.read().await;
        Ok(state.orders.values().filter(|o| o.buyer_id == buyer_id).cloned().collect())
    }
}

impl BuyerManagement for MemoryDatabase {
    async fn fetch_buyer(&self, buyer_id: BuyerId) -> Result<Option<Buyer>, PaymentGatewayError> {
        Ok(self.state.read().await.buyers.get(&buyer_id).cloned())
    }
}

impl CatalogManagement for MemoryDatabase {
    async fn fetch_purchasable_items(&self, item_ids: &[i64]) -> Result<Vec<CatalogItem>, PaymentGatewayError> {
        let state = self.state.read().await;
        let items = state
            .items
            .values()
            .filter(|item| item_ids.contains(&item.id))
            .filter(|item| item.price > Decimal::ZERO)
            .filter(|item| state.events.get(&item.event_id).map(|e| e.is_active).unwrap_or(false))
            .cloned()
            .collect();
        Ok(items)
    }
}

impl SessionManagement for MemoryDatabase {
    async fn fetch_buyer_id_for_session(&self, token: &str) -> Result<Option<BuyerId>, SessionApiError> {
        Ok(self.state.read().await.sessions.get(token).copied())
    }
}
