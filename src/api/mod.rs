//! API Module
//!
//! HTTP handlers and routing for the key-value REST API.
//!
//! # Endpoints
//! - `PUT /kv/*key` - Store a value
//! - `POST /kv` - Store a key-value pair
//! - `GET /kv/*key` - Retrieve a value by key
//! - `DELETE /kv/*key` - Delete a key
//! - `GET /stats` - Cache and pool statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
