//! # Ticket payment gateway server
//! This crate hosts the HTTP surface of the ticket payment gateway. It is responsible for:
//! * Answering the Payme Merchant API (JSON-RPC) callbacks.
//! * Answering the Click Prepare/Complete callbacks.
//! * Letting signed-in buyers start a checkout, and reporting whether they have paid.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/payme/callback`: The Payme JSON-RPC endpoint.
//! * `/api/click/callback`: The Click Prepare/Complete endpoint.
//! * `/api/payment/initiate` and `/api/payment/initiate-click`: Create orders for the buyer's selection and return a
//!   checkout link for Payme or Click respectively.
//! * `/api/payment/status`: Whether the signed-in buyer has paid.
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod middleware;
pub mod payme_rpc;
pub mod routes;
pub mod server;
