//! Caller identity passed explicitly into reaction services.
//!
//! Services never look up a session on their own. Whatever drives them
//! resolves the identity first (see the `IdentityProvider` port) and hands it
//! in with every call.

use super::{Error, UserId};

/// Who is performing an action.
///
/// # Examples
/// ```
/// use reactions::domain::{ErrorCode, Identity, UserId};
///
/// let user = UserId::new("uid-7").expect("valid id");
/// assert_eq!(Identity::authenticated(user.clone()).require_user().ok(), Some(&user));
///
/// let err = Identity::Anonymous.require_user().unwrap_err();
/// assert_eq!(err.code(), ErrorCode::Unauthenticated);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Identity {
    /// No signed-in user.
    #[default]
    Anonymous,
    /// A signed-in user.
    Authenticated(UserId),
}

impl Identity {
    /// Shorthand for [`Identity::Authenticated`].
    pub fn authenticated(user_id: UserId) -> Self {
        Self::Authenticated(user_id)
    }

    /// The signed-in user, if any.
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(user_id) => Some(user_id),
        }
    }

    /// The signed-in user, or an `Unauthenticated` error.
    pub fn require_user(&self) -> Result<&UserId, Error> {
        self.user_id()
            .ok_or_else(|| Error::unauthenticated("sign in to react to problems"))
    }
}
