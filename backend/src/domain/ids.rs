//! Opaque identifiers for users and problems.
//!
//! Both identifiers are issued outside the reaction engine (account creation,
//! problem authoring), so the only guarantees enforced here are the ones the
//! store relies on: non-empty and free of surrounding whitespace.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors returned when constructing identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdValidationError {
    EmptyUserId,
    PaddedUserId,
    EmptyProblemId,
    PaddedProblemId,
}

impl fmt::Display for IdValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyUserId => write!(f, "user id must not be empty"),
            Self::PaddedUserId => write!(f, "user id must not contain surrounding whitespace"),
            Self::EmptyProblemId => write!(f, "problem id must not be empty"),
            Self::PaddedProblemId => {
                write!(f, "problem id must not contain surrounding whitespace")
            }
        }
    }
}

impl std::error::Error for IdValidationError {}

/// Stable account identifier.
///
/// # Examples
/// ```
/// use reactions::domain::UserId;
///
/// let id = UserId::new("uid-42").expect("valid id");
/// assert_eq!(id.as_ref(), "uid-42");
/// assert!(UserId::new(" uid-42").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, IdValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    fn from_owned(id: String) -> Result<Self, IdValidationError> {
        if id.trim().is_empty() {
            return Err(IdValidationError::EmptyUserId);
        }
        if id.trim() != id {
            return Err(IdValidationError::PaddedUserId);
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl TryFrom<String> for UserId {
    type Error = IdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Stable problem identifier, typically a slug such as `two-sum`.
///
/// # Examples
/// ```
/// use reactions::domain::ProblemId;
///
/// let id = ProblemId::new("two-sum").expect("valid id");
/// assert_eq!(id.to_string(), "two-sum");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProblemId(String);

impl ProblemId {
    /// Validate and construct a [`ProblemId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, IdValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    fn from_owned(id: String) -> Result<Self, IdValidationError> {
        if id.trim().is_empty() {
            return Err(IdValidationError::EmptyProblemId);
        }
        if id.trim() != id {
            return Err(IdValidationError::PaddedProblemId);
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for ProblemId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ProblemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<ProblemId> for String {
    fn from(value: ProblemId) -> Self {
        value.0
    }
}

impl TryFrom<String> for ProblemId {
    type Error = IdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}
