//! Integration tests for Link-Cadence
//!
//! Persistence tests run against real files in temporary directories, and the
//! visit tests use wiremock to stand up mock HTTP targets.

mod persistence_tests;
mod visit_tests;
