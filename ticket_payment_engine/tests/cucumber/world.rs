use std::collections::HashMap;

use cucumber::World;
use log::*;
use ticket_payment_engine::{
    click_objects::ClickResponse,
    db_types::{BuyerId, OrderId},
    helpers::{ClickCheckoutConfig, PayLinkConfig, PaymeCheckoutConfig},
    CheckoutApi,
    ClickApi,
    ClickCredentials,
    PaymeApi,
    PaymeError,
    SqliteDatabase,
};
use tpg_common::Secret;

pub const CLICK_SECRET: &str = "cucumber-click-secret";
pub const CLICK_SERVICE_ID: &str = "1001";

#[derive(Default, Debug, World)]
pub struct TicketWorld {
    pub system: Option<PaymentSystem>,
}

#[derive(Debug)]
pub struct PaymentSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub payme: PaymeApi<SqliteDatabase>,
    pub click: ClickApi<SqliteDatabase>,
    pub checkout: CheckoutApi<SqliteDatabase>,
    pub buyers: HashMap<String, BuyerId>,
    pub items: HashMap<String, i64>,
    pub current_order: Option<OrderId>,
    pub last_payme_error: Option<PaymeError>,
    pub last_click: Option<ClickResponse>,
}

impl TicketWorld {
    pub async fn system(&mut self) -> &mut PaymentSystem {
        if self.system.is_none() {
            self.system = Some(PaymentSystem::new().await);
        }
        self.system.as_mut().expect("Payment system not initialised")
    }
}

impl PaymentSystem {
    pub async fn new() -> Self {
        let dir = std::env::temp_dir();
        let db_path = format!("sqlite://{}/tpg_cucumber_{}.db", dir.display(), rand::random::<u64>());
        let db = SqliteDatabase::new_with_url(&db_path, 5).await.expect("Error creating connection to database");
        db.migrate().await.expect("Error running migrations");
        debug!("Created database: {db_path}");
        let links = PayLinkConfig::default()
            .with_payme(PaymeCheckoutConfig::new("cucumber-merchant"))
            .with_click(ClickCheckoutConfig::new(CLICK_SERVICE_ID, "cucumber-merchant"));
        let credentials = ClickCredentials::new(CLICK_SERVICE_ID, Secret::new(CLICK_SECRET.to_string()));
        Self {
            db_path,
            payme: PaymeApi::new(db.clone()),
            click: ClickApi::new(db.clone(), credentials),
            checkout: CheckoutApi::new(db.clone(), links),
            db,
            buyers: HashMap::new(),
            items: HashMap::new(),
            current_order: None,
            last_payme_error: None,
            last_click: None,
        }
    }

    pub fn buyer(&self, name: &str) -> BuyerId {
        *self.buyers.get(name).unwrap_or_else(|| panic!("Unknown buyer '{name}'"))
    }

    pub fn item(&self, name: &str) -> i64 {
        *self.items.get(name).unwrap_or_else(|| panic!("Unknown item '{name}'"))
    }

    pub fn order(&self) -> OrderId {
        self.current_order.expect("No order has been checked out yet")
    }
}
