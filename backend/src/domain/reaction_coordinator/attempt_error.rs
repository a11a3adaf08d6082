//! Attempt-local outcomes for one read-modify-commit pass.
//!
//! Only write conflicts are retried. Everything else has already been mapped
//! to a domain [`Error`] and ends the call.

use crate::domain::Error;
use crate::domain::ports::ReactionStoreError;

pub(super) enum AttemptError {
    Conflict(ReactionStoreError),
    Fatal(Error),
}

impl From<Error> for AttemptError {
    fn from(value: Error) -> Self {
        Self::Fatal(value)
    }
}
