use actix_web::{http::StatusCode, test, test::TestRequest, web, App};
use log::debug;
use rust_decimal_macros::dec;
use ticket_payment_engine::{
    db_types::BuyerId,
    helpers::{ClickCheckoutConfig, PayLinkConfig, PaymeCheckoutConfig},
    traits::SessionManagement,
    CheckoutApi,
    ClickApi,
    ClickCredentials,
    MemoryDatabase,
    PaymeApi,
    SessionApi,
};
use tpg_common::Secret;

use crate::{
    config::ServerOptions,
    payme_rpc::PaymeCredentials,
    routes::{
        checkout_json_config,
        click_form_config,
        ClickCallbackRoute,
        InitiateClickRoute,
        InitiatePaymeRoute,
        PaymeCallbackRoute,
        PaymentStatusRoute,
    },
};

// Test credentials. DO NOT re-use these anywhere.
pub const PAYME_KEY: &str = "endpoint-test-key";
pub const CLICK_SECRET: &str = "endpoint-test-secret";
pub const CLICK_SERVICE_ID: &str = "77";
pub const SESSION: &str = "buyer-session";

pub struct Seeded {
    pub db: MemoryDatabase,
    pub buyer: BuyerId,
    /// VIP (100000) and Standard (50000)
    pub items: Vec<i64>,
}

pub async fn seeded_db() -> Seeded {
    let db = MemoryDatabase::new();
    let buyer = db.insert_buyer("Alice").await;
    let event = db.insert_event("Spring Gala", true).await;
    let vip = db.insert_item(event, "VIP", dec!(100000)).await;
    let standard = db.insert_item(event, "Standard", dec!(50000)).await;
    db.insert_session(SESSION, buyer).await;
    Seeded { db, buyer, items: vec![vip, standard] }
}

pub fn pay_links() -> PayLinkConfig {
    PayLinkConfig::default()
        .with_payme(PaymeCheckoutConfig::new("payme-merchant"))
        .with_click(ClickCheckoutConfig::new(CLICK_SERVICE_ID, "click-merchant"))
}

pub fn payme_basic_auth(key: &str) -> String {
    format!("Basic {}", base64::encode(format!("Paycom:{key}")))
}

/// Sends `req` to an app carrying every API route, backed by `db` and the given session store.
pub async fn send_request<S>(
    db: &MemoryDatabase,
    sessions: S,
    links: PayLinkConfig,
    req: TestRequest,
) -> (StatusCode, String)
where
    S: SessionManagement + 'static,
{
    let click_credentials = ClickCredentials::new(CLICK_SERVICE_ID, Secret::new(CLICK_SECRET.to_string()));
    let options = ServerOptions { return_url: Some("https://tickets.example/done".to_string()), ..Default::default() };
    let app = App::new()
        .app_data(web::Data::new(PaymeApi::new(db.clone())))
        .app_data(web::Data::new(ClickApi::new(db.clone(), click_credentials)))
        .app_data(web::Data::new(CheckoutApi::new(db.clone(), links)))
        .app_data(web::Data::new(SessionApi::new(sessions)))
        .app_data(web::Data::new(PaymeCredentials::new(Secret::new(PAYME_KEY.to_string()))))
        .app_data(web::Data::new(options))
        .service(
            web::scope("/api")
                .service(web::scope("/payme").service(PaymeCallbackRoute::<MemoryDatabase>::new()))
                .service(
                    web::scope("/click")
                        .app_data(click_form_config())
                        .service(ClickCallbackRoute::<MemoryDatabase>::new()),
                )
                .service(
                    web::scope("/payment")
                        .app_data(checkout_json_config())
                        .service(InitiatePaymeRoute::<MemoryDatabase, S>::new())
                        .service(InitiateClickRoute::<MemoryDatabase, S>::new())
                        .service(PaymentStatusRoute::<MemoryDatabase, S>::new()),
                ),
        );
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    (status, String::from_utf8_lossy(&body).into_owned())
}

/// Sends `req` using the memory database as the session store.
pub async fn send(db: &MemoryDatabase, req: TestRequest) -> (StatusCode, String) {
    send_request(db, db.clone(), pay_links(), req).await
}

pub fn json(body: &str) -> serde_json::Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Response is not JSON: {e}. Body: {body}"))
}
