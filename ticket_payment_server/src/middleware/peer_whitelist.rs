//! Peer whitelist middleware for the provider callback scopes.
//!
//! Payme and Click publish the addresses they call merchants from. When a whitelist is configured, requests from any
//! other address are refused with 403 Forbidden before they reach the handler. Without a whitelist, every request is
//! passed through and only the provider credentials are checked.
//!
//! The remote address is resolved with [`get_remote_ip`], so it honours the `X-Forwarded-For` and `Forwarded` settings.
use std::{net::IpAddr, pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorForbidden,
    Error,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use log::*;

use crate::helpers::get_remote_ip;

#[derive(Clone, Debug, Default)]
pub struct PeerWhitelistFactory {
    whitelist: Option<Rc<Vec<IpAddr>>>,
    use_x_forwarded_for: bool,
    use_forwarded: bool,
}

impl PeerWhitelistFactory {
    pub fn new(whitelist: Option<Vec<IpAddr>>, use_x_forwarded_for: bool, use_forwarded: bool) -> Self {
        Self { whitelist: whitelist.map(Rc::new), use_x_forwarded_for, use_forwarded }
    }
}

impl<S, B> Transform<S, ServiceRequest> for PeerWhitelistFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = PeerWhitelistService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(PeerWhitelistService {
            whitelist: self.whitelist.clone(),
            use_x_forwarded_for: self.use_x_forwarded_for,
            use_forwarded: self.use_forwarded,
            service: Rc::new(service),
        })
    }
}

pub struct PeerWhitelistService<S> {
    whitelist: Option<Rc<Vec<IpAddr>>>,
    use_x_forwarded_for: bool,
    use_forwarded: bool,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for PeerWhitelistService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let whitelist = self.whitelist.clone();
        let peer_ip = get_remote_ip(req.request(), self.use_x_forwarded_for, self.use_forwarded);
        Box::pin(async move {
            let allowed = match (peer_ip, whitelist) {
                (_, None) => true,
                (Some(ip), Some(whitelist)) => {
                    let allowed = whitelist.contains(&ip);
                    if !allowed {
                        warn!("💻️ Callback to {} from {ip}, which is not whitelisted", req.path());
                    }
                    allowed
                },
                (None, Some(_)) => {
                    warn!("💻️ No remote address found for callback to {}. Denying access.", req.path());
                    false
                },
            };
            if allowed {
                service.call(req).await
            } else {
                Err(ErrorForbidden("Forbidden peer"))
            }
        })
    }
}
