//! Types shared between the ticket payment engine and the server.
//!
//! * [`Tiyin`] is the minor currency unit (1 sum = 100 tiyin). The Payme protocol speaks tiyin, while orders are
//!   priced in sum, so every conversion between the two goes through here.
//! * [`Secret`] wraps credentials so that they never end up in log output.
mod money;

pub mod helpers;
pub mod op;
mod secret;

pub use money::{sum_to_tiyin, Tiyin, TiyinConversionError, CURRENCY_CODE, TIYIN_PER_SUM};
pub use secret::Secret;
