//! SuiteDeck server library.
//!
//! Projects, test suites and test runs persisted over a remote table store
//! with a local fallback, a simulated run lifecycle, a change notification
//! bus and dashboard aggregations.

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;
