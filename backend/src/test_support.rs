//! Test utilities shared by unit tests in `src/`.
//!
//! Only compiled when running tests.

pub mod retry_runtime;
