use std::{env, net::IpAddr};

use log::*;
use ticket_payment_engine::{
    helpers::{
        ClickCheckoutConfig,
        PayLinkConfig,
        PaymeCheckoutConfig,
        DEFAULT_CLICK_CHECKOUT_URL,
        DEFAULT_PAYME_CHECKOUT_URL,
    },
    ClickCredentials,
};
use tpg_common::{
    helpers::{non_empty, parse_boolean_flag},
    Secret,
};

use crate::payme_rpc::PaymeCredentials;

const DEFAULT_TPG_HOST: &str = "127.0.0.1";
const DEFAULT_TPG_PORT: u16 = 8360;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address.
    pub use_forwarded: bool,
    /// If supplied, provider callbacks are only accepted from these addresses.
    pub callback_whitelist: Option<Vec<IpAddr>>,
    /// Where the provider sends the buyer once the payment is done.
    pub return_url: Option<String>,
    pub payme: PaymeConfig,
    pub click: ClickConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_TPG_HOST.to_string(),
            port: DEFAULT_TPG_PORT,
            database_url: String::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            callback_whitelist: None,
            return_url: None,
            payme: PaymeConfig::default(),
            click: ClickConfig::default(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PaymeConfig {
    pub merchant_id: String,
    /// The merchant key. Payme sends it as the password of the `Paycom` Basic credentials.
    pub key: Secret<String>,
    pub checkout_url: String,
}

impl Default for PaymeConfig {
    fn default() -> Self {
        Self {
            merchant_id: String::default(),
            key: Secret::default(),
            checkout_url: DEFAULT_PAYME_CHECKOUT_URL.to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ClickConfig {
    pub service_id: String,
    pub merchant_id: String,
    pub secret_key: Secret<String>,
    pub checkout_url: String,
}

impl Default for ClickConfig {
    fn default() -> Self {
        Self {
            service_id: String::default(),
            merchant_id: String::default(),
            secret_key: Secret::default(),
            checkout_url: DEFAULT_CLICK_CHECKOUT_URL.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("TPG_HOST").ok().unwrap_or_else(|| DEFAULT_TPG_HOST.into());
        let port = env::var("TPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for TPG_PORT. {e} Using the default, {DEFAULT_TPG_PORT}, instead."
                    );
                    DEFAULT_TPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_TPG_PORT);
        let database_url = env::var("TPG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ TPG_DATABASE_URL is not set. Please set it to the URL for the TPG database.");
            String::default()
        });
        let use_x_forwarded_for = parse_boolean_flag(env::var("TPG_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("TPG_USE_FORWARDED").ok(), false);
        let callback_whitelist = env::var("TPG_CALLBACK_IP_WHITELIST").ok().and_then(|s| parse_ip_whitelist(&s));
        log_whitelist(&callback_whitelist);
        let return_url = non_empty(env::var("TPG_RETURN_URL").ok());
        Self {
            host,
            port,
            database_url,
            use_x_forwarded_for,
            use_forwarded,
            callback_whitelist,
            return_url,
            payme: PaymeConfig::from_env_or_defaults(),
            click: ClickConfig::from_env_or_defaults(),
        }
    }

    pub fn pay_link_config(&self) -> PayLinkConfig {
        let mut links = PayLinkConfig::default();
        if !self.payme.merchant_id.is_empty() {
            let mut payme = PaymeCheckoutConfig::new(self.payme.merchant_id.as_str());
            payme.checkout_url = self.payme.checkout_url.clone();
            links = links.with_payme(payme);
        }
        if !self.click.service_id.is_empty() {
            let mut click = ClickCheckoutConfig::new(self.click.service_id.as_str(), self.click.merchant_id.as_str());
            click.checkout_url = self.click.checkout_url.clone();
            links = links.with_click(click);
        }
        links
    }

    pub fn payme_credentials(&self) -> PaymeCredentials {
        PaymeCredentials::new(self.payme.key.clone())
    }

    pub fn click_credentials(&self) -> ClickCredentials {
        ClickCredentials::new(self.click.service_id.as_str(), self.click.secret_key.clone())
    }
}

impl PaymeConfig {
    pub fn from_env_or_defaults() -> Self {
        let merchant_id = non_empty(env::var("TPG_PAYME_MERCHANT_ID").ok()).unwrap_or_else(|| {
            warn!("🪛️ TPG_PAYME_MERCHANT_ID is not set. Payme checkouts are disabled.");
            String::default()
        });
        let key = non_empty(env::var("TPG_PAYME_KEY").ok()).unwrap_or_else(|| {
            error!("🪛️ TPG_PAYME_KEY is not set. Every Payme callback will be rejected.");
            String::default()
        });
        let checkout_url =
            non_empty(env::var("TPG_PAYME_CHECKOUT_URL").ok()).unwrap_or_else(|| DEFAULT_PAYME_CHECKOUT_URL.into());
        Self { merchant_id, key: Secret::new(key), checkout_url }
    }
}

impl ClickConfig {
    pub fn from_env_or_defaults() -> Self {
        let service_id = non_empty(env::var("TPG_CLICK_SERVICE_ID").ok()).unwrap_or_else(|| {
            warn!("🪛️ TPG_CLICK_SERVICE_ID is not set. Click checkouts are disabled.");
            String::default()
        });
        let merchant_id = non_empty(env::var("TPG_CLICK_MERCHANT_ID").ok()).unwrap_or_default();
        let secret_key = non_empty(env::var("TPG_CLICK_SECRET_KEY").ok()).unwrap_or_else(|| {
            error!("🪛️ TPG_CLICK_SECRET_KEY is not set. Every Click callback will be rejected.");
            String::default()
        });
        let checkout_url =
            non_empty(env::var("TPG_CLICK_CHECKOUT_URL").ok()).unwrap_or_else(|| DEFAULT_CLICK_CHECKOUT_URL.into());
        Self { service_id, merchant_id, secret_key: Secret::new(secret_key), checkout_url }
    }
}

/// Parses a comma-separated list of IP addresses. "none", "false" and "0" explicitly disable the whitelist. Invalid
/// entries are skipped.
pub fn parse_ip_whitelist(value: &str) -> Option<Vec<IpAddr>> {
    if value.trim().is_empty() || ["none", "false", "0"].contains(&value.trim().to_lowercase().as_str()) {
        return None;
    }
    let ip_addrs = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| {
            s.parse::<IpAddr>()
                .map_err(|e| warn!("🪛️ Ignoring invalid IP address ({s}) in TPG_CALLBACK_IP_WHITELIST: {e}"))
                .ok()
        })
        .collect::<Vec<IpAddr>>();
    Some(ip_addrs)
}

fn log_whitelist(whitelist: &Option<Vec<IpAddr>>) {
    match whitelist {
        Some(whitelist) if whitelist.is_empty() => {
            warn!(
                "🚨️ The callback IP whitelist was configured, but is empty. The server will run, but won't accept any \
                 provider callbacks."
            );
        },
        None => info!("🪛️ No callback IP whitelist is set. Only provider credentials will be checked."),
        Some(v) => {
            let addrs = v.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ");
            info!("🪛️ Callback IP whitelist: {addrs}");
        },
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// The subset of the configuration that request handlers need. Secrets are excluded.
#[derive(Clone, Debug, Default)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
    pub return_url: Option<String>,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            use_x_forwarded_for: config.use_x_forwarded_for,
            use_forwarded: config.use_forwarded,
            return_url: config.return_url.clone(),
        }
    }
}
