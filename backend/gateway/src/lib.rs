//! CodeDoc HTTP gateway.
//!
//! Axum routes for SQL queries, streamed chat, documentation generation and
//! static client hosting, plus the client side of the chat relay.

pub mod client;
pub mod documents;
pub mod error;
pub mod health_api;
pub mod query;
pub mod relay;
pub mod server;

pub use client::{RelayClient, RelayOutcome, Utf8Decoder};
pub use error::ApiError;
pub use server::{build_router, start_server, GatewayState};

#[cfg(test)]
pub(crate) mod test_support;
