//! Shared test utilities for shopfloor integration tests.
//!
//! - `TestHarness` opens a file-backed database in a temp directory
//! - `ErpFixture` seeds the ERP tables the queries read

pub mod fixtures;
pub mod harness;

pub use fixtures::ErpFixture;
pub use harness::TestHarness;
