//! Port supplying the signed-in user.
//!
//! The reaction engine only reads the current identity; session management
//! lives behind this port.

use crate::domain::Identity;

/// Source of the caller's identity.
#[cfg_attr(test, mockall::automock)]
pub trait IdentityProvider: Send + Sync {
    /// The identity to act as right now.
    fn current(&self) -> Identity;
}

/// Identity provider that always returns the same identity.
///
/// # Examples
/// ```
/// use reactions::domain::{Identity, UserId};
/// use reactions::domain::ports::{IdentityProvider, StaticIdentityProvider};
///
/// let provider = StaticIdentityProvider::new(Identity::authenticated(UserId::random()));
/// assert!(provider.current().user_id().is_some());
/// assert_eq!(StaticIdentityProvider::anonymous().current(), Identity::Anonymous);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    identity: Identity,
}

impl StaticIdentityProvider {
    /// Provider for a fixed identity.
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }

    /// Provider for a signed-out viewer.
    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn current(&self) -> Identity {
        self.identity.clone()
    }
}
