//! # Provider checkout links
//!
//! After checkout, the buyer is redirected to the provider's hosted payment page. The link carries the order id and
//! amount so that the provider can call us back about the right order.
//!
//! ## Payme
//!
//! ```text
//!    {checkout_url}/{base64("m={merchant_id};ac.order_id={order_id};a={amount_in_tiyin}[;c={return_url}]")}
//! ```
//!
//! ## Click
//!
//! ```text
//!    {checkout_url}?service_id={service_id}&merchant_id={merchant_id}&amount={amount_in_sum}&transaction_param={order_id}[&return_url={url_encoded}]
//! ```
use log::*;
use rust_decimal::Decimal;
use thiserror::Error;
use tpg_common::{sum_to_tiyin, TiyinConversionError};

use crate::db_types::{OrderId, PaymentProvider};

pub const DEFAULT_PAYME_CHECKOUT_URL: &str = "https://checkout.paycom.uz";
pub const DEFAULT_CLICK_CHECKOUT_URL: &str = "https://my.click.uz/services/pay";

#[derive(Debug, Clone, Error)]
pub enum PayLinkError {
    #[error("The merchant configuration for {0} is missing. Cannot generate a checkout link.")]
    MissingMerchantConfig(PaymentProvider),
    #[error("Cannot express the order amount in tiyin. {0}")]
    InvalidAmount(#[from] TiyinConversionError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymeCheckoutConfig {
    pub merchant_id: String,
    pub checkout_url: String,
}

impl PaymeCheckoutConfig {
    pub fn new<S: Into<String>>(merchant_id: S) -> Self {
        Self { merchant_id: merchant_id.into(), checkout_url: DEFAULT_PAYME_CHECKOUT_URL.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickCheckoutConfig {
    pub service_id: String,
    pub merchant_id: String,
    pub checkout_url: String,
}

impl ClickCheckoutConfig {
    pub fn new<S: Into<String>>(service_id: S, merchant_id: S) -> Self {
        Self {
            service_id: service_id.into(),
            merchant_id: merchant_id.into(),
            checkout_url: DEFAULT_CLICK_CHECKOUT_URL.to_string(),
        }
    }
}

/// Builds provider checkout links. A provider without configuration cannot produce links at all; callers check
/// [`PayLinkConfig::ensure_configured`] before writing anything.
#[derive(Debug, Clone, Default)]
pub struct PayLinkConfig {
    pub payme: Option<PaymeCheckoutConfig>,
    pub click: Option<ClickCheckoutConfig>,
}

impl PayLinkConfig {
    pub fn with_payme(mut self, config: PaymeCheckoutConfig) -> Self {
        self.payme = Some(config);
        self
    }

    pub fn with_click(mut self, config: ClickCheckoutConfig) -> Self {
        self.click = Some(config);
        self
    }

    pub fn ensure_configured(&self, provider: PaymentProvider) -> Result<(), PayLinkError> {
        let configured = match provider {
            PaymentProvider::Payme => self.payme.as_ref().map(|c| !c.merchant_id.is_empty()),
            PaymentProvider::Click => self.click.as_ref().map(|c| !c.service_id.is_empty()),
        };
        match configured {
            Some(true) => Ok(()),
            _ => {
                error!("🛒️ No merchant configuration for {provider}. Checkout links cannot be created.");
                Err(PayLinkError::MissingMerchantConfig(provider))
            },
        }
    }

    /// Generates the checkout link for the given provider. `amount` is always in sum.
    pub fn pay_link(
        &self,
        provider: PaymentProvider,
        order_id: OrderId,
        amount: Decimal,
        return_url: Option<&str>,
    ) -> Result<String, PayLinkError> {
        self.ensure_configured(provider)?;
        match (provider, &self.payme, &self.click) {
            (PaymentProvider::Payme, Some(payme), _) => payme_link(payme, order_id, amount, return_url),
            (PaymentProvider::Click, _, Some(click)) => Ok(click_link(click, order_id, amount, return_url)),
            _ => Err(PayLinkError::MissingMerchantConfig(provider)),
        }
    }
}

fn payme_link(
    config: &PaymeCheckoutConfig,
    order_id: OrderId,
    amount: Decimal,
    return_url: Option<&str>,
) -> Result<String, PayLinkError> {
    let tiyin = sum_to_tiyin(amount)?;
    let mut params = format!("m={};ac.order_id={};a={}", config.merchant_id, order_id.value(), tiyin.value());
    if let Some(url) = return_url.filter(|u| !u.is_empty()) {
        params.push_str(&format!(";c={url}"));
    }
    let link = format!("{}/{}", config.checkout_url.trim_end_matches('/'), base64::encode(params));
    debug!("🛒️ Payme checkout link for order {order_id}: {link}");
    Ok(link)
}

fn click_link(config: &ClickCheckoutConfig, order_id: OrderId, amount: Decimal, return_url: Option<&str>) -> String {
    let mut link = format!(
        "{}?service_id={}&merchant_id={}&amount={}&transaction_param={}",
        config.checkout_url,
        config.service_id,
        config.merchant_id,
        amount.normalize(),
        order_id.value()
    );
    if let Some(url) = return_url.filter(|u| !u.is_empty()) {
        link.push_str("&return_url=");
        link.push_str(&urlencoding::encode(url));
    }
    debug!("🛒️ Click checkout link for order {order_id}: {link}");
    link
}
