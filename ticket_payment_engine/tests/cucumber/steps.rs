use std::str::FromStr;

use cucumber::{given, then, when};
use rust_decimal::Decimal;
use ticket_payment_engine::{
    click_objects::ClickRequest,
    db_types::{OrderStatusType, PaymentProvider},
    traits::{BuyerManagement, OrderManagement},
};
use tpg_common::Tiyin;

use crate::cucumber::{
    world::{CLICK_SECRET, CLICK_SERVICE_ID},
    TicketWorld,
};

#[given(expr = "a buyer named '{word}'")]
async fn buyer_named(world: &mut TicketWorld, name: String) {
    let sys = world.system().await;
    let id = sys.db.insert_buyer(&name).await.expect("Error inserting buyer");
    sys.buyers.insert(name, id);
}

#[given(expr = "an active event '{word}' selling '{word}' for {int} sum")]
async fn event_with_item(world: &mut TicketWorld, event: String, item: String, price: i64) {
    let sys = world.system().await;
    let event_id = sys.db.insert_event(&event, true).await.expect("Error inserting event");
    let item_id = sys.db.insert_item(event_id, &item, Decimal::from(price)).await.expect("Error inserting item");
    sys.items.insert(item, item_id);
}

#[when(expr = "'{word}' checks out '{word}' via {word}")]
async fn checkout_one(world: &mut TicketWorld, buyer: String, item: String, provider: String) {
    checkout(world, buyer, vec![item], provider).await;
}

#[when(expr = "'{word}' checks out '{word}' and '{word}' via {word}")]
async fn checkout_two(world: &mut TicketWorld, buyer: String, first: String, second: String, provider: String) {
    checkout(world, buyer, vec![first, second], provider).await;
}

async fn checkout(world: &mut TicketWorld, buyer: String, items: Vec<String>, provider: String) {
    let sys = world.system().await;
    let buyer = sys.buyer(&buyer);
    let ids = items.iter().map(|name| sys.item(name)).collect::<Vec<_>>();
    let provider = PaymentProvider::from_str(&provider).expect("Unknown provider");
    let result = sys.checkout.initiate_checkout(buyer, &ids, provider, None).await.expect("Checkout failed");
    sys.current_order = Some(result.order_id);
}

#[then(expr = "the order total is {int} sum")]
async fn order_total(world: &mut TicketWorld, total: i64) {
    let sys = world.system().await;
    let order = sys.db.fetch_order(sys.order()).await.unwrap().expect("Order does not exist");
    assert_eq!(order.total_amount, Decimal::from(total));
}

#[then(expr = "the order is {word}")]
async fn order_status(world: &mut TicketWorld, status: String) {
    let sys = world.system().await;
    let expected = OrderStatusType::from_str(&status).expect("Unknown order status");
    let order = sys.db.fetch_order(sys.order()).await.unwrap().expect("Order does not exist");
    assert_eq!(order.status, expected);
}

#[then(expr = "buyer '{word}' has paid")]
async fn buyer_paid(world: &mut TicketWorld, name: String) {
    let sys = world.system().await;
    let buyer = sys.db.fetch_buyer(sys.buyer(&name)).await.unwrap().expect("Buyer does not exist");
    assert!(buyer.is_paid, "{name} has not paid");
    assert!(buyer.paid_at.is_some());
}

#[then(expr = "buyer '{word}' has not paid")]
async fn buyer_not_paid(world: &mut TicketWorld, name: String) {
    let sys = world.system().await;
    let buyer = sys.db.fetch_buyer(sys.buyer(&name)).await.unwrap().expect("Buyer does not exist");
    assert!(!buyer.is_paid, "{name} has paid");
}

//------------------------------------------  Payme  -------------------------------------------------------------

#[when(expr = "Payme creates transaction [{word}] for {int} tiyin")]
async fn payme_create(world: &mut TicketWorld, txid: String, amount: i64) {
    let sys = world.system().await;
    let result = sys.payme.create_transaction(sys.order(), Tiyin::from(amount), &txid, None).await;
    sys.last_payme_error = result.err();
}

#[when(expr = "Payme performs transaction [{word}]")]
async fn payme_perform(world: &mut TicketWorld, txid: String) {
    let sys = world.system().await;
    sys.last_payme_error = sys.payme.perform_transaction(&txid).await.err();
}

#[when(expr = "Payme cancels transaction [{word}] with reason {int}")]
async fn payme_cancel(world: &mut TicketWorld, txid: String, reason: i32) {
    let sys = world.system().await;
    sys.last_payme_error = sys.payme.cancel_transaction(&txid, Some(reason)).await.err();
}

#[then(expr = "the last Payme call succeeded")]
async fn payme_succeeded(world: &mut TicketWorld) {
    let sys = world.system().await;
    assert!(sys.last_payme_error.is_none(), "Payme call failed: {:?}", sys.last_payme_error);
}

#[then(expr = "the last Payme call failed with code {int}")]
async fn payme_failed(world: &mut TicketWorld, code: i32) {
    let sys = world.system().await;
    let err = sys.last_payme_error.as_ref().expect("The last Payme call succeeded");
    assert_eq!(err.code(), code);
}

#[then(expr = "Payme transaction [{word}] has state {int}")]
async fn payme_state(world: &mut TicketWorld, txid: String, state: i32) {
    let sys = world.system().await;
    let result = sys.payme.check_transaction(&txid).await.expect("CheckTransaction failed");
    assert_eq!(result.state, state);
}

//------------------------------------------  Click  -------------------------------------------------------------

fn click_request(order_id: i64, action: &str, amount: &str, prepare_id: &str, error: &str) -> ClickRequest {
    let mut request = ClickRequest {
        click_trans_id: "700001".into(),
        service_id: CLICK_SERVICE_ID.into(),
        click_paydoc_id: "800001".into(),
        merchant_trans_id: order_id.to_string(),
        merchant_prepare_id: prepare_id.into(),
        amount: amount.into(),
        action: action.into(),
        sign_time: "2024-06-01 10:00:00".into(),
        ..Default::default()
    };
    request.error = error.into();
    request.sign(CLICK_SECRET)
}

#[when(expr = "Click prepares the order for {word} sum")]
async fn click_prepare(world: &mut TicketWorld, amount: String) {
    let sys = world.system().await;
    let request = click_request(sys.order().value(), "0", &amount, "", "0");
    sys.last_click = Some(sys.click.handle_callback(request).await);
}

#[when(expr = "Click completes the order for {word} sum")]
async fn click_complete(world: &mut TicketWorld, amount: String) {
    send_complete(world, &amount, "0").await;
}

#[when(expr = "Click completes the order for {word} sum with error {word}")]
async fn click_complete_with_error(world: &mut TicketWorld, amount: String, error: String) {
    send_complete(world, &amount, &error).await;
}

async fn send_complete(world: &mut TicketWorld, amount: &str, error: &str) {
    let sys = world.system().await;
    let prepare_id = sys.last_click.as_ref().map(|r| r.merchant_prepare_id.to_string()).unwrap_or_default();
    let request = click_request(sys.order().value(), "1", amount, &prepare_id, error);
    sys.last_click = Some(sys.click.handle_callback(request).await);
}

#[then(expr = "the last Click response has error {int}")]
async fn click_error(world: &mut TicketWorld, error: i32) {
    let sys = world.system().await;
    let response = sys.last_click.as_ref().expect("No Click callback has been sent");
    assert_eq!(response.error, error, "{response:?}");
}
