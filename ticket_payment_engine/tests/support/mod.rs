#![allow(dead_code)]
use log::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use ticket_payment_engine::{
    db_types::{BuyerId, NewOrder, Order, PaymentProvider},
    helpers::{ClickCheckoutConfig, PayLinkConfig, PaymeCheckoutConfig},
    traits::PaymentGatewayDatabase,
    MemoryDatabase,
    SqliteDatabase,
};

pub const CLICK_SECRET: &str = "click-secret-key";
pub const CLICK_SERVICE_ID: &str = "4321";

pub fn init_logging() {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
}

pub fn random_db_path() -> String {
    let dir = std::env::temp_dir();
    format!("sqlite://{}/tpg_test_{}.db", dir.display(), rand::random::<u64>())
}

/// Creates a fresh SQLite database with the schema applied.
pub async fn prepare_test_env() -> SqliteDatabase {
    init_logging();
    let url = random_db_path();
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    db.migrate().await.expect("Error running migrations");
    debug!("🚀️ Test database ready at {url}");
    db
}

pub fn pay_links() -> PayLinkConfig {
    PayLinkConfig::default()
        .with_payme(PaymeCheckoutConfig::new("payme-merchant"))
        .with_click(ClickCheckoutConfig::new(CLICK_SERVICE_ID, "click-merchant"))
}

/// A buyer with an active event that sells two tickets, priced 100 000 and 50 000 sum.
pub struct Seeded {
    pub buyer: BuyerId,
    pub items: Vec<i64>,
    pub inactive_item: i64,
}

pub async fn seed_memory(db: &MemoryDatabase) -> Seeded {
    let buyer = db.insert_buyer("Alice").await;
    let event = db.insert_event("Spring Gala", true).await;
    let closed = db.insert_event("Last Year", false).await;
    let vip = db.insert_item(event, "VIP", dec!(100000)).await;
    let standard = db.insert_item(event, "Standard", dec!(50000)).await;
    let inactive_item = db.insert_item(closed, "Old ticket", dec!(10000)).await;
    db.insert_session("alice-session", buyer).await;
    Seeded { buyer, items: vec![vip, standard], inactive_item }
}

pub async fn seed_sqlite(db: &SqliteDatabase) -> Seeded {
    let buyer = db.insert_buyer("Alice").await.unwrap();
    let event = db.insert_event("Spring Gala", true).await.unwrap();
    let closed = db.insert_event("Last Year", false).await.unwrap();
    let vip = db.insert_item(event, "VIP", dec!(100000)).await.unwrap();
    let standard = db.insert_item(event, "Standard", dec!(50000)).await.unwrap();
    let inactive_item = db.insert_item(closed, "Old ticket", dec!(10000)).await.unwrap();
    db.insert_session("alice-session", buyer).await.unwrap();
    Seeded { buyer, items: vec![vip, standard], inactive_item }
}

/// Inserts a single pending order for the buyer, superseding any others.
pub async fn pending_order<B: PaymentGatewayDatabase>(
    db: &B,
    buyer: BuyerId,
    amount: Decimal,
    provider: PaymentProvider,
) -> Order {
    let orders = db.replace_pending_orders(buyer, vec![NewOrder::new(buyer, amount, provider)]).await.unwrap();
    orders.into_iter().next().unwrap()
}
