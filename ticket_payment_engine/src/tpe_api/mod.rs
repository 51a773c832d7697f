//! # Ticket payment engine public API
//!
//! The `tpe_api` module exposes the programmatic API of the payment engine. Each API wraps a database backend and is
//! independent of the others, so a server can mount only the parts it needs.
//!
//! * [`payme_api`] implements the Payme Merchant API transaction state machine.
//! * [`click_api`] implements the Click Prepare/Complete callback protocol.
//! * [`checkout_api`] creates orders from a buyer's selection and builds the provider checkout link.
//! * [`session_api`] resolves buyer session tokens.
//!
//! # API usage
//!
//! ```rust,ignore
//! use ticket_payment_engine::{PaymeApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/tickets.db", 5).await?;
//! let api = PaymeApi::new(db);
//! let result = api.check_transaction("5305e3bab097f420a62ced0b").await?;
//! ```
pub mod checkout_api;
pub mod checkout_objects;
pub mod click_api;
pub mod click_objects;
pub mod errors;
pub mod payme_api;
pub mod payme_objects;
pub mod session_api;
