use std::net::IpAddr;

use actix_web::{http::StatusCode, test, test::TestRequest, web, App, HttpResponse};

use crate::middleware::PeerWhitelistFactory;

async fn status_for(whitelist: Option<Vec<&str>>, req: TestRequest) -> StatusCode {
    let whitelist: Option<Vec<IpAddr>> = whitelist.map(|w| w.into_iter().map(|s| s.parse().unwrap()).collect());
    let app = App::new().service(
        web::scope("/api/payme")
            .wrap(PeerWhitelistFactory::new(whitelist, true, false))
            .route("/callback", web::post().to(|| async { HttpResponse::Ok().finish() })),
    );
    let service = test::init_service(app).await;
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => res.status(),
        Err(e) => e.as_response_error().status_code(),
    }
}

fn callback_from(peer: &str) -> TestRequest {
    TestRequest::post().uri("/api/payme/callback").peer_addr(format!("{peer}:443").parse().unwrap())
}

#[actix_web::test]
async fn whitelisted_peers_pass() {
    let _ = env_logger::try_init().ok();
    let status = status_for(Some(vec!["185.234.113.1"]), callback_from("185.234.113.1")).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn other_peers_are_forbidden() {
    let _ = env_logger::try_init().ok();
    let status = status_for(Some(vec!["185.234.113.1"]), callback_from("10.1.1.1")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let status = status_for(Some(vec![]), callback_from("185.234.113.1")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn forwarded_address_is_used_when_enabled() {
    let _ = env_logger::try_init().ok();
    let req = callback_from("10.0.0.1").insert_header(("X-Forwarded-For", "185.234.113.1, 10.0.0.1"));
    let status = status_for(Some(vec!["185.234.113.1"]), req).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn no_whitelist_lets_everyone_through() {
    let _ = env_logger::try_init().ok();
    let status = status_for(None, callback_from("10.1.1.1")).await;
    assert_eq!(status, StatusCode::OK);
}
