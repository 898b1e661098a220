//! HTTP API gateway for GraphMind.
//!
//! Exposes the query and ingestion workflows plus task tracking over a
//! small REST surface, with CORS open for browser frontends.

pub mod routes;
pub mod server;
pub mod state;

pub use server::GatewayServer;
pub use state::AppState;
