//! Testing utilities for the service facade
//!
//! Test doubles for the handler seam and a factory for broker-shaped
//! messages, so dispatch semantics are testable without a live broker.
//! Only compiled when running tests.

#![cfg(test)]

pub mod mocks;

pub use mocks::{owned_message, CountingHandler, RecordingHandler};
