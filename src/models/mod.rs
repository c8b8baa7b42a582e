//! Request and Response models for the key-value API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{
    validate_key, validate_value, CreateRequest, PutBody, PutQuery, MAX_KEY_LENGTH,
    MAX_VALUE_SIZE,
};
pub use responses::{GetResponse, HealthResponse, PoolStats, StatsResponse, WriteResponse};
