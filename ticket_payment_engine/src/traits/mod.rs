//! #  Database management and control.
//!
//! This module provides the interfaces that define the interface contracts of the payment engine database *backends*.
//!
//! ## Orders and locks
//! Every order moves through its lifecycle in response to provider callbacks. Mutations always happen through an
//! [`OrderLock`], which is an exclusive, scoped guard over a single order. The guard is obtained from
//! [`PaymentGatewayDatabase::lock_order`] (or [`PaymentGatewayDatabase::lock_order_by_payme_id`]), changed in place,
//! and then either committed or dropped. Dropping the guard without committing discards every staged change.
//!
//! ## Traits
//! * [`PaymentGatewayDatabase`] defines the highest level of behavior for backends supporting the payment engine.
//! * [`OrderManagement`] provides read-only queries over orders and their Payme transactions.
//! * [`BuyerManagement`] and [`CatalogManagement`] give read access to the collaborator's buyers, events and items.
//! * [`SessionManagement`] resolves session tokens into buyer ids. It is kept separate so that the server can be run
//!   against any session store.
mod buyer_management;
mod catalog_management;
mod order_management;
mod payment_gateway_database;
mod session_management;

pub use buyer_management::BuyerManagement;
pub use catalog_management::CatalogManagement;
pub use order_management::OrderManagement;
pub use payment_gateway_database::{OrderLock, PaymentGatewayDatabase, PaymentGatewayError};
pub use session_management::{SessionApiError, SessionManagement};
