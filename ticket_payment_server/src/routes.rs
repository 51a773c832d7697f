//! Request handler definitions
//!
//! Define each route and its handler here. Protocol logic lives in the engine and in [`crate::payme_rpc`]; handlers
//! only extract, delegate and serialize.
//!
//! The provider callbacks never produce HTTP errors. Payme and Click expect HTTP 200 with their own error envelopes,
//! and treat anything else as a transport failure that they will retry.
use actix_web::{error::InternalError, get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use ticket_payment_engine::{
    click_objects::{ClickRequest, ClickResponse},
    db_types::PaymentProvider,
    traits::{PaymentGatewayDatabase, SessionManagement},
    CheckoutApi,
    ClickApi,
    ClickError,
    PaymeApi,
    SessionApi,
};

use crate::{
    config::ServerOptions,
    data_objects::{InitiatePaymentRequest, InitiatePaymentResponse, PaymentStatusResponse},
    errors::ServerError,
    helpers::session_token,
    payme_rpc::{handle_rpc, PaymeCredentials},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Payme  ----------------------------------------------------
route!(payme_callback => Post "/callback" impl PaymentGatewayDatabase);
/// The Payme Merchant API endpoint. The body is read raw so that malformed JSON can still be answered with a JSON-RPC
/// error envelope.
pub async fn payme_callback<B: PaymentGatewayDatabase>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<PaymeApi<B>>,
    credentials: web::Data<PaymeCredentials>,
) -> HttpResponse {
    let response = handle_rpc(&req, &body, api.as_ref(), credentials.as_ref()).await;
    HttpResponse::Ok().json(response)
}

//----------------------------------------------   Click  ----------------------------------------------------
route!(click_callback => Post "/callback" impl PaymentGatewayDatabase);
pub async fn click_callback<B: PaymentGatewayDatabase>(
    body: web::Form<ClickRequest>,
    api: web::Data<ClickApi<B>>,
) -> HttpResponse {
    let request = body.into_inner();
    trace!("💻️ Click callback for order '{}', action '{}'", request.merchant_trans_id, request.action);
    let response = api.handle_callback(request).await;
    HttpResponse::Ok().json(response)
}

/// A Click body that cannot be decoded as a form is answered with a bad-request (-8) response, not an HTTP error.
pub fn click_form_config() -> web::FormConfig {
    web::FormConfig::default().error_handler(|err, _req| {
        warn!("💻️ Could not decode Click callback body. {err}");
        let response =
            ClickResponse::failure(&ClickRequest::default(), 0, 0, &ClickError::BadRequest("request body"));
        InternalError::from_response(err, HttpResponse::Ok().json(response)).into()
    })
}

//----------------------------------------------  Checkout  ----------------------------------------------------
route!(initiate_payme => Post "/initiate" impl PaymentGatewayDatabase, SessionManagement);
pub async fn initiate_payme<B, S>(
    req: HttpRequest,
    body: web::Json<InitiatePaymentRequest>,
    checkout: web::Data<CheckoutApi<B>>,
    sessions: web::Data<SessionApi<S>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentGatewayDatabase,
    S: SessionManagement,
{
    initiate(&req, body.into_inner(), PaymentProvider::Payme, &checkout, &sessions, &options).await
}

route!(initiate_click => Post "/initiate-click" impl PaymentGatewayDatabase, SessionManagement);
pub async fn initiate_click<B, S>(
    req: HttpRequest,
    body: web::Json<InitiatePaymentRequest>,
    checkout: web::Data<CheckoutApi<B>>,
    sessions: web::Data<SessionApi<S>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentGatewayDatabase,
    S: SessionManagement,
{
    initiate(&req, body.into_inner(), PaymentProvider::Click, &checkout, &sessions, &options).await
}

async fn initiate<B, S>(
    req: &HttpRequest,
    body: InitiatePaymentRequest,
    provider: PaymentProvider,
    checkout: &CheckoutApi<B>,
    sessions: &SessionApi<S>,
    options: &ServerOptions,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentGatewayDatabase,
    S: SessionManagement,
{
    let token = session_token(req);
    let buyer_id = sessions.authenticate(token.as_deref()).await?;
    debug!("💻️ {buyer_id} is checking out {:?} via {provider}", body.item_ids);
    let result =
        checkout.initiate_checkout(buyer_id, &body.item_ids, provider, options.return_url.as_deref()).await?;
    Ok(HttpResponse::Ok().json(InitiatePaymentResponse::from(result)))
}

route!(payment_status => Get "/status" impl PaymentGatewayDatabase, SessionManagement);
pub async fn payment_status<B, S>(
    req: HttpRequest,
    checkout: web::Data<CheckoutApi<B>>,
    sessions: web::Data<SessionApi<S>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentGatewayDatabase,
    S: SessionManagement,
{
    let token = session_token(&req);
    let buyer_id = sessions.authenticate(token.as_deref()).await?;
    let status = checkout.payment_status(buyer_id).await?;
    Ok(HttpResponse::Ok().json(PaymentStatusResponse::from(status)))
}

/// Malformed initiation bodies get the same `{success: false}` shape as every other checkout failure.
pub fn checkout_json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| ServerError::InvalidRequest(err.to_string()).into())
}
