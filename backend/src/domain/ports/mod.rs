//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports ([`ReactionStore`], [`IdentityProvider`]) are implemented by
//! outbound adapters. Driving ports ([`ReactionCommand`],
//! [`ProfileReactionsQuery`]) are implemented by domain services and called by
//! inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod identity_provider;
mod profile_reactions_query;
mod reaction_command;
mod reaction_store;

#[cfg(test)]
pub use identity_provider::MockIdentityProvider;
pub use identity_provider::{IdentityProvider, StaticIdentityProvider};
#[cfg(test)]
pub use profile_reactions_query::MockProfileReactionsQuery;
pub use profile_reactions_query::ProfileReactionsQuery;
#[cfg(test)]
pub use reaction_command::MockReactionCommand;
pub use reaction_command::ReactionCommand;
#[cfg(test)]
pub use reaction_store::MockReactionStore;
pub use reaction_store::{ReactionCommit, ReactionStore, ReactionStoreError};
