//! Retry engine tests.
//!
//! Test organization:
//! - behavior.rs: attempt bounds, retryable classifications, exhaustion reporting
//! - blocking.rs: the thread-blocking variant
//! - layer.rs: the tower adapter

mod layer;
