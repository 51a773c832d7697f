use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::{json, Value};
use ticket_payment_engine::{
    db_types::{BuyerId, OrderId, PaymentProvider},
    traits::{BuyerManagement, OrderManagement},
    CheckoutApi,
    MemoryDatabase,
};

use super::helpers::{json, pay_links, payme_basic_auth, seeded_db, send, PAYME_KEY};

const VIP_TIYIN: i64 = 10_000_000;

fn rpc(body: Value) -> TestRequest {
    TestRequest::post()
        .uri("/api/payme/callback")
        .insert_header(("Authorization", payme_basic_auth(PAYME_KEY)))
        .set_json(body)
}

async fn call(db: &MemoryDatabase, body: Value) -> Value {
    let (status, body) = send(db, rpc(body)).await;
    assert_eq!(status, StatusCode::OK);
    json(&body)
}

async fn vip_order(db: &MemoryDatabase, buyer: BuyerId, vip: i64) -> OrderId {
    let checkout = CheckoutApi::new(db.clone(), pay_links());
    checkout.initiate_checkout(buyer, &[vip], PaymentProvider::Payme, None).await.unwrap().order_id
}

#[actix_web::test]
async fn malformed_json_is_an_invalid_request() {
    let _ = env_logger::try_init().ok();
    let seeded = seeded_db().await;
    let req = TestRequest::post()
        .uri("/api/payme/callback")
        .insert_header(("Authorization", payme_basic_auth(PAYME_KEY)))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{\"id\": 3, \"method\": ");
    let (status, body) = send(&seeded.db, req).await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["jsonrpc"], "2.0");
    assert_eq!(body["id"], Value::Null);
    assert_eq!(body["error"]["code"], -32600);
}

#[actix_web::test]
async fn bad_credentials_are_rejected_before_anything_else() {
    let _ = env_logger::try_init().ok();
    let seeded = seeded_db().await;
    let order_id = vip_order(&seeded.db, seeded.buyer, seeded.items[0]).await;
    let body = json!({
        "id": 41,
        "method": "CreateTransaction",
        "params": {"id": "tx-1", "time": 1_700_000_000_000i64, "amount": VIP_TIYIN, "account": {"order_id": order_id}}
    });
    let req = TestRequest::post()
        .uri("/api/payme/callback")
        .insert_header(("Authorization", payme_basic_auth("not-the-key")))
        .set_json(body.clone());
    let (status, response) = send(&seeded.db, req).await;
    assert_eq!(status, StatusCode::OK);
    let response = json(&response);
    assert_eq!(response["id"], 41);
    assert_eq!(response["error"]["code"], -32504);
    assert_eq!(response["error"]["message"]["en"], "Insufficient privilege to perform this method");

    let req = TestRequest::post().uri("/api/payme/callback").set_json(body);
    let (_, response) = send(&seeded.db, req).await;
    assert_eq!(json(&response)["error"]["code"], -32504);

    let order = seeded.db.fetch_order(order_id).await.unwrap().unwrap();
    assert!(order.payme.transaction_id.is_none());
}

#[actix_web::test]
async fn unknown_methods() {
    let _ = env_logger::try_init().ok();
    let seeded = seeded_db().await;
    let response = call(&seeded.db, json!({"id": 1, "method": "RefundEverything", "params": {}})).await;
    assert_eq!(response["error"]["code"], -32601);
    assert_eq!(response["error"]["data"], "RefundEverything");
}

#[actix_web::test]
async fn invalid_params_name_the_field() {
    let _ = env_logger::try_init().ok();
    let seeded = seeded_db().await;
    let response = call(
        &seeded.db,
        json!({"id": 2, "method": "CheckPerformTransaction", "params": {"amount": "lots", "account": {"order_id": 1}}}),
    )
    .await;
    assert_eq!(response["error"]["code"], -32602);
    assert_eq!(response["error"]["data"], "amount");

    let response = call(&seeded.db, json!({"id": 3, "method": "GetStatement", "params": {"from": 10}})).await;
    assert_eq!(response["error"]["code"], -32602);
    assert_eq!(response["error"]["data"], "from/to");
}

#[actix_web::test]
async fn change_password_is_refused() {
    let _ = env_logger::try_init().ok();
    let seeded = seeded_db().await;
    let response =
        call(&seeded.db, json!({"id": 9, "method": "ChangePassword", "params": {"password": "hunter2"}})).await;
    assert_eq!(response["error"]["code"], -32504);
}

#[actix_web::test]
async fn pay_an_order_over_http() {
    let _ = env_logger::try_init().ok();
    let seeded = seeded_db().await;
    let order_id = vip_order(&seeded.db, seeded.buyer, seeded.items[0]).await;
    let account = json!({"order_id": order_id.value().to_string()});

    let response = call(
        &seeded.db,
        json!({"id": 1, "method": "CheckPerformTransaction", "params": {"amount": VIP_TIYIN, "account": account}}),
    )
    .await;
    assert_eq!(response["result"]["allow"], true);

    let response = call(
        &seeded.db,
        json!({"id": 2, "method": "CheckPerformTransaction", "params": {"amount": VIP_TIYIN + 1, "account": account}}),
    )
    .await;
    assert_eq!(response["error"]["code"], -31001);
    assert_eq!(response["error"]["data"], "amount");

    let create = json!({
        "id": 3,
        "method": "CreateTransaction",
        "params": {"id": "payme-tx-1", "time": 1_700_000_000_000i64, "amount": VIP_TIYIN, "account": account}
    });
    let response = call(&seeded.db, create.clone()).await;
    assert_eq!(response["result"]["create_time"], 1_700_000_000_000i64);
    assert_eq!(response["result"]["transaction"], "payme-tx-1");
    assert_eq!(response["result"]["state"], 1);
    // Replays answer identically
    let replay = call(&seeded.db, create).await;
    assert_eq!(replay["result"], response["result"]);

    let response =
        call(&seeded.db, json!({"id": 4, "method": "PerformTransaction", "params": {"id": "payme-tx-1"}})).await;
    assert_eq!(response["result"]["state"], 2);
    let perform_time = response["result"]["perform_time"].as_i64().unwrap();
    assert!(perform_time > 0);

    let response =
        call(&seeded.db, json!({"id": 5, "method": "CheckTransaction", "params": {"id": "payme-tx-1"}})).await;
    assert_eq!(response["result"]["state"], 2);
    assert_eq!(response["result"]["perform_time"], perform_time);
    assert_eq!(response["result"]["cancel_time"], 0);
    assert_eq!(response["result"]["reason"], Value::Null);

    let buyer = seeded.db.fetch_buyer(seeded.buyer).await.unwrap().unwrap();
    assert!(buyer.is_paid);

    let response = call(
        &seeded.db,
        json!({"id": 6, "method": "GetStatement", "params": {"from": 1_700_000_000_000i64, "to": 1_700_000_000_000i64}}),
    )
    .await;
    let transactions = response["result"]["transactions"].as_array().unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0]["amount"], VIP_TIYIN);
    assert_eq!(transactions[0]["account"]["order_id"], order_id.value());
}

#[actix_web::test]
async fn unknown_transactions() {
    let _ = env_logger::try_init().ok();
    let seeded = seeded_db().await;
    let response =
        call(&seeded.db, json!({"id": "abc", "method": "CancelTransaction", "params": {"id": "nope", "reason": 1}}))
            .await;
    assert_eq!(response["id"], "abc");
    assert_eq!(response["error"]["code"], -31003);
    assert_eq!(response["error"]["data"], "id");
}

#[actix_web::test]
async fn cancel_reason_must_fit() {
    let _ = env_logger::try_init().ok();
    let seeded = seeded_db().await;
    let params = json!({"id": "nope", "reason": 4_294_967_296_i64});
    let response = call(&seeded.db, json!({"id": 9, "method": "CancelTransaction", "params": params})).await;
    assert_eq!(response["error"]["code"], -32602);
    assert_eq!(response["error"]["data"], "reason");
}
