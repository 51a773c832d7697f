mod click_signature;
mod pay_links;

pub use click_signature::{md5_signature, signature_matches};
pub use pay_links::{
    ClickCheckoutConfig,
    PayLinkConfig,
    PayLinkError,
    PaymeCheckoutConfig,
    DEFAULT_CLICK_CHECKOUT_URL,
    DEFAULT_PAYME_CHECKOUT_URL,
};

use chrono::Utc;

/// The current time as epoch milliseconds, which is how Payme expresses every timestamp.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
