use actix_web::{cookie::Cookie, http::StatusCode, test::TestRequest};
use serde_json::json;
use ticket_payment_engine::{
    db_types::{BuyerId, OrderStatusType},
    helpers::PayLinkConfig,
    traits::{OrderManagement, SessionApiError},
};

use super::{
    helpers::{json, pay_links, seeded_db, send, send_request, SESSION},
    mocks::MockSessionManager,
};

fn initiate(path: &str, body: serde_json::Value) -> TestRequest {
    TestRequest::post().uri(path).insert_header(("Authorization", format!("Bearer {SESSION}"))).set_json(body)
}

#[actix_web::test]
async fn initiate_payme_checkout() {
    let _ = env_logger::try_init().ok();
    let seeded = seeded_db().await;
    let req = initiate("/api/payment/initiate", json!({"item_ids": seeded.items}));
    let (status, body) = send(&seeded.db, req).await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["success"], true);
    assert_eq!(body["amount"], 150000.0);
    let order_id = body["order_id"].as_i64().unwrap();
    let pay_url = body["pay_url"].as_str().unwrap();
    assert!(pay_url.starts_with("https://checkout.paycom.uz/"));

    let orders = seeded.db.fetch_orders_for_buyer(seeded.buyer).await.unwrap();
    assert_eq!(orders.len(), 2);
    assert!(orders.iter().any(|o| o.id.value() == order_id));
    assert!(orders.iter().all(|o| o.status == OrderStatusType::Pending));
}

#[actix_web::test]
async fn initiate_click_checkout_with_legacy_field_name() {
    let _ = env_logger::try_init().ok();
    let seeded = seeded_db().await;
    let req = initiate("/api/payment/initiate-click", json!({"subject_ids": [seeded.items[1]]}));
    let (status, body) = send(&seeded.db, req).await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    let order_id = body["order_id"].as_i64().unwrap();
    assert_eq!(
        body["pay_url"],
        format!(
            "https://my.click.uz/services/pay?service_id=77&merchant_id=click-merchant&amount=50000&transaction_param=\
             {order_id}&return_url=https%3A%2F%2Ftickets.example%2Fdone"
        )
    );
}

#[actix_web::test]
async fn session_cookie_is_accepted() {
    let _ = env_logger::try_init().ok();
    let seeded = seeded_db().await;
    let req = TestRequest::get().uri("/api/payment/status").cookie(Cookie::new("session_id", SESSION));
    let (status, body) = send(&seeded.db, req).await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["success"], true);
    assert_eq!(body["is_paid"], false);
    assert_eq!(body["paid_at"], serde_json::Value::Null);
}

#[actix_web::test]
async fn missing_session() {
    let _ = env_logger::try_init().ok();
    let seeded = seeded_db().await;
    let req = TestRequest::post().uri("/api/payment/initiate").set_json(json!({"item_ids": seeded.items}));
    let (status, body) = send(&seeded.db, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json(&body)["success"], false);
    assert!(seeded.db.fetch_orders_for_buyer(seeded.buyer).await.unwrap().is_empty());
}

#[actix_web::test]
async fn unknown_session_from_session_store() {
    let _ = env_logger::try_init().ok();
    let seeded = seeded_db().await;
    let mut sessions = MockSessionManager::new();
    sessions.expect_fetch_buyer_id_for_session().times(1).returning(|_| Ok(None));
    let req = TestRequest::get().uri("/api/payment/status").insert_header(("Authorization", "Bearer expired"));
    let (status, _) = send_request(&seeded.db, sessions, pay_links(), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn session_store_failure() {
    let _ = env_logger::try_init().ok();
    let seeded = seeded_db().await;
    let mut sessions = MockSessionManager::new();
    sessions
        .expect_fetch_buyer_id_for_session()
        .returning(|_| Err(SessionApiError::DatabaseError("connection reset".into())));
    let req = initiate("/api/payment/initiate", json!({"item_ids": seeded.items}));
    let (status, body) = send_request(&seeded.db, sessions, pay_links(), req).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = json(&body);
    assert_eq!(body["success"], false);
    assert!(!body["error"].as_str().unwrap().contains("connection reset"));
}

#[actix_web::test]
async fn buyer_from_session_store_must_exist() {
    let _ = env_logger::try_init().ok();
    let seeded = seeded_db().await;
    let mut sessions = MockSessionManager::new();
    sessions.expect_fetch_buyer_id_for_session().withf(|token| token == "other").returning(|_| Ok(Some(BuyerId(999))));
    let req = TestRequest::post()
        .uri("/api/payment/initiate")
        .insert_header(("Authorization", "Bearer other"))
        .set_json(json!({"item_ids": seeded.items}));
    let (status, _) = send_request(&seeded.db, sessions, pay_links(), req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn bad_selections() {
    let _ = env_logger::try_init().ok();
    let seeded = seeded_db().await;
    let (status, _) = send(&seeded.db, initiate("/api/payment/initiate", json!({"item_ids": []}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&seeded.db, initiate("/api/payment/initiate", json!({"item_ids": [404, 405]}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = send(&seeded.db, initiate("/api/payment/initiate", json!({"item_ids": "all"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["success"], false);
}

#[actix_web::test]
async fn unconfigured_provider() {
    let _ = env_logger::try_init().ok();
    let seeded = seeded_db().await;
    let req = initiate("/api/payment/initiate-click", json!({"item_ids": seeded.items}));
    let (status, body) = send_request(&seeded.db, seeded.db.clone(), PayLinkConfig::default(), req).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json(&body)["success"], false);
    assert!(seeded.db.fetch_orders_for_buyer(seeded.buyer).await.unwrap().is_empty());
}
