//! Consistency engine for problem reactions.
//!
//! Likes, dislikes and stars on coding problems are kept consistent between
//! each user's membership sets and each problem's aggregate counters. The
//! crate is laid out as a hexagon: [`domain`] holds the rules and ports,
//! [`inbound`] the UI-facing session and [`outbound`] the store adapter.

pub mod domain;
pub mod inbound;
pub mod outbound;
pub mod settings;

#[cfg(test)]
mod test_support;

pub use settings::ReactionSettings;
