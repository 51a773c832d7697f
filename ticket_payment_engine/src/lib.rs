//! Ticket Payment Engine
//!
//! The ticket payment engine reconciles ticket purchases with two Uzbek payment providers, Payme and Click. Buyers pick
//! catalog items, the engine creates their orders and hands back a provider checkout link, and the providers then call
//! back to report the progress of the payment. This library contains the core logic for all of that. It is
//! transport-agnostic: the HTTP surface lives in the server crate.
//!
//! The library is divided into the following sections:
//! 1. Storage contracts ([`mod@traits`]) and the backends that implement them. [`SqliteDatabase`] is the production
//!    backend; [`MemoryDatabase`] keeps everything in memory and is used for tests. The data types that cross the
//!    storage boundary are defined in [`mod@db_types`] and are public.
//! 2. The payment engine public API ([`mod@tpe_api`]). Each provider protocol is a separate API object that is generic
//!    over its storage backend.
//! 3. Stateless helpers ([`mod@helpers`]) for checkout links and Click signatures.
pub mod db_types;
pub mod helpers;
pub mod memory;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

mod tpe_api;

pub use memory::{MemoryDatabase, MemoryOrderLock};
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteDatabase, SqliteOrderLock};
pub use tpe_api::{
    checkout_api::CheckoutApi,
    checkout_objects,
    click_api::{ClickApi, ClickCredentials, AMOUNT_TOLERANCE},
    click_objects,
    errors::{CheckoutError, ClickError, ClickErrorCode, LocalizedMessage, PaymeError, SessionError},
    payme_api::{PaymeApi, DEFAULT_REASON_AFTER_PERFORM, DEFAULT_REASON_BEFORE_PERFORM},
    payme_objects,
    session_api::SessionApi,
};
