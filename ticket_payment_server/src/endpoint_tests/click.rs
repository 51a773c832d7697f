use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::Value;
use ticket_payment_engine::{
    click_objects::ClickRequest,
    db_types::{OrderId, OrderStatusType, PaymentProvider},
    traits::{BuyerManagement, OrderManagement},
    CheckoutApi,
    MemoryDatabase,
};

use super::helpers::{json, pay_links, seeded_db, send, Seeded, CLICK_SECRET, CLICK_SERVICE_ID};

fn callback(order_id: OrderId, action: &str, prepare_id: &str, amount: &str) -> ClickRequest {
    ClickRequest {
        click_trans_id: "880001".into(),
        service_id: CLICK_SERVICE_ID.into(),
        click_paydoc_id: "55001".into(),
        merchant_trans_id: order_id.value().to_string(),
        merchant_prepare_id: prepare_id.into(),
        amount: amount.into(),
        action: action.into(),
        sign_time: "2024-05-01 10:00:00".into(),
        ..Default::default()
    }
}

async fn post(db: &MemoryDatabase, request: &ClickRequest) -> Value {
    let req = TestRequest::post().uri("/api/click/callback").set_form(request);
    let (status, body) = send(db, req).await;
    assert_eq!(status, StatusCode::OK);
    json(&body)
}

async fn standard_order(seeded: &Seeded) -> OrderId {
    let checkout = CheckoutApi::new(seeded.db.clone(), pay_links());
    let standard = [seeded.items[1]];
    checkout.initiate_checkout(seeded.buyer, &standard, PaymentProvider::Click, None).await.unwrap().order_id
}

#[actix_web::test]
async fn prepare_and_complete_over_http() {
    let _ = env_logger::try_init().ok();
    let seeded = seeded_db().await;
    let order_id = standard_order(&seeded).await;

    let prepare = callback(order_id, "0", "", "50000.00").sign(CLICK_SECRET);
    let response = post(&seeded.db, &prepare).await;
    assert_eq!(response["error"], 0);
    assert_eq!(response["click_trans_id"], 880001);
    assert_eq!(response["merchant_trans_id"], order_id.value().to_string());
    let prepare_id = response["merchant_prepare_id"].as_i64().unwrap();

    let complete = callback(order_id, "1", &prepare_id.to_string(), "50000.00").sign(CLICK_SECRET);
    let response = post(&seeded.db, &complete).await;
    assert_eq!(response["error"], 0);
    assert_eq!(response["merchant_confirm_id"], prepare_id);

    let order = seeded.db.fetch_order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Paid);
    assert!(seeded.db.fetch_buyer(seeded.buyer).await.unwrap().unwrap().is_paid);

    // A second Complete reports the order as paid and changes nothing
    let response = post(&seeded.db, &complete).await;
    assert_eq!(response["error"], -4);
}

#[actix_web::test]
async fn forged_signature_leaves_order_untouched() {
    let _ = env_logger::try_init().ok();
    let seeded = seeded_db().await;
    let order_id = standard_order(&seeded).await;
    let prepare = callback(order_id, "0", "", "50000.00").sign("a-guess");
    let response = post(&seeded.db, &prepare).await;
    assert_eq!(response["error"], -1);
    let order = seeded.db.fetch_order(order_id).await.unwrap().unwrap();
    assert_eq!(order.click.trans_id, None);
    assert_eq!(order.status, OrderStatusType::Pending);
}

#[actix_web::test]
async fn wrong_amount() {
    let _ = env_logger::try_init().ok();
    let seeded = seeded_db().await;
    let order_id = standard_order(&seeded).await;
    let prepare = callback(order_id, "0", "", "49000").sign(CLICK_SECRET);
    let response = post(&seeded.db, &prepare).await;
    assert_eq!(response["error"], -2);
}

#[actix_web::test]
async fn body_that_is_not_a_form() {
    let _ = env_logger::try_init().ok();
    let seeded = seeded_db().await;
    let req = TestRequest::post().uri("/api/click/callback").set_json(serde_json::json!({"click_trans_id": 1}));
    let (status, body) = send(&seeded.db, req).await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["error"], -8);
    assert_eq!(body["click_trans_id"], 0);
}
