use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use ticket_payment_engine::{CheckoutApi, ClickApi, PaymeApi, SessionApi, SqliteDatabase};

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    middleware::PeerWhitelistFactory,
    routes::{
        checkout_json_config,
        click_form_config,
        health,
        ClickCallbackRoute,
        InitiateClickRoute,
        InitiatePaymeRoute,
        PaymeCallbackRoute,
        PaymentStatusRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("🗃️ Database is ready at {}", config.database_url);
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let payme_api = PaymeApi::new(db.clone());
        let click_api = ClickApi::new(db.clone(), config.click_credentials());
        let checkout_api = CheckoutApi::new(db.clone(), config.pay_link_config());
        let session_api = SessionApi::new(db.clone());
        let whitelist = || {
            PeerWhitelistFactory::new(
                config.callback_whitelist.clone(),
                config.use_x_forwarded_for,
                config.use_forwarded,
            )
        };
        let payme_scope = web::scope("/payme").wrap(whitelist()).service(PaymeCallbackRoute::<SqliteDatabase>::new());
        let click_scope = web::scope("/click")
            .wrap(whitelist())
            .app_data(click_form_config())
            .service(ClickCallbackRoute::<SqliteDatabase>::new());
        let payment_scope = web::scope("/payment")
            .app_data(checkout_json_config())
            .service(InitiatePaymeRoute::<SqliteDatabase, SqliteDatabase>::new())
            .service(InitiateClickRoute::<SqliteDatabase, SqliteDatabase>::new())
            .service(PaymentStatusRoute::<SqliteDatabase, SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("tpg::access_log"))
            .app_data(web::Data::new(payme_api))
            .app_data(web::Data::new(click_api))
            .app_data(web::Data::new(checkout_api))
            .app_data(web::Data::new(session_api))
            .app_data(web::Data::new(config.payme_credentials()))
            .app_data(web::Data::new(ServerOptions::from_config(&config)))
            .service(health)
            .service(web::scope("/api").service(payme_scope).service(click_scope).service(payment_scope))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
