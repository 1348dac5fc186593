//! # Payment reconciliation server
//!
//! This crate hosts the HTTP front end for the reconciliation engine. It is responsible for:
//! * Listening for incoming webhook deliveries from the payment processor.
//! * Verifying each delivery's HMAC signature before any parsing happens.
//! * Handing authenticated deliveries to the reconciliation engine, bounded by a processing deadline.
//! * Acknowledging every authenticated delivery with a 200 response so the processor never retries forever.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/webhook/event`: The webhook route for receiving entity lifecycle events from the payment processor.

pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod middleware;
pub mod routes;
pub mod secret;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
