//! Inbound adapters that translate caller intent into domain service calls.
//!
//! The only driving adapter is the UI-facing [`session::ReactionSession`],
//! which owns the optimistic view cache for one viewer.

pub mod session;

pub use session::ReactionSession;
