//! Test utilities for unit and HTTP-level tests.
//!
//! This module provides:
//! - Test data factories for creating valid test fixtures
//! - An in-memory persistence layer implementing every repository trait
//! - In-memory email and rate-limit ports
//! - A builder for a complete `AppState` wired to the in-memory pieces

mod app_state_builder;
mod factories;
mod mocks;
mod persistence_mocks;

pub use app_state_builder::*;
pub use factories::*;
pub use mocks::*;
pub use persistence_mocks::*;
