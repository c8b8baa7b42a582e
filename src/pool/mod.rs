//! Worker Pool Module
//!
//! Fixed-size pool of OS threads that executes request tasks.
//!
//! # Behavior
//! - FIFO queue shared by all workers, unbounded
//! - Shutdown drains every queued task before workers exit
//! - A panicking task is contained; its worker keeps serving

mod worker_pool;

pub use worker_pool::{Task, WorkerPool};
