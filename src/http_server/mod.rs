//! # HTTP Server Module
//!
//! JSON front end for the topic registry.
//!
//! # Endpoints
//!
//! - `POST /produce/:topic` - Enqueue `{"message": "..."}`
//! - `GET /consume/:topic` - Dequeue the next message
//! - `POST /ack/:topic/:id` - Acknowledge a delivered message
//! - `GET /topics` - Registered topic names
//! - `/health` - Health check
//! - `/observability/*` - Per-topic metrics

pub mod config;
pub mod observability_routes;
pub mod queue_routes;
pub mod server;

pub use config::HttpServerConfig;
pub use server::{build_router, HttpServer};
