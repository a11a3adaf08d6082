//! Outbound adapters implementing domain ports.
//!
//! - **memory**: an in-process document store holding User and Problem
//!   records, with revision-checked two-record commits.
//!
//! Adapters are thin translators between the ports and their storage. They
//! contain no reaction rules.

pub mod memory;

pub use memory::InMemoryReactionStore;
