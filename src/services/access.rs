//! Ownership gate
//!
//! Detail, update and delete paths on owned entities all pass through
//! [`authorize`]. A missing entity, a foreign one and an anonymous caller are
//! reported as the same [`ServiceError::NotFound`].

use crate::models::{Comment, Identity, Note, User};
use crate::services::error::ServiceError;
use std::fmt::Display;

/// An entity with a single author
pub trait Owned {
    fn author_id(&self) -> i64;
}

impl Owned for Comment {
    fn author_id(&self) -> i64 {
        self.author_id
    }
}

impl Owned for Note {
    fn author_id(&self) -> i64 {
        self.author_id
    }
}

/// Release a looked-up entity to `identity` only if it exists and they wrote it.
///
/// `kind` and `key` only feed the log line.
pub fn authorize<T: Owned>(
    found: Option<T>,
    identity: &Identity,
    kind: &str,
    key: impl Display,
) -> Result<T, ServiceError> {
    match found {
        Some(entity) if identity.owns(entity.author_id()) => {
            tracing::debug!(kind, %key, user_id = ?identity.user_id(), "access granted");
            Ok(entity)
        }
        Some(_) => {
            tracing::warn!(kind, %key, user_id = ?identity.user_id(), "access denied to foreign entity");
            Err(ServiceError::NotFound)
        }
        None => {
            tracing::debug!(kind, %key, "entity not found");
            Err(ServiceError::NotFound)
        }
    }
}

/// The authenticated caller, or `Unauthenticated` for anonymous ones
pub fn require_user(identity: &Identity) -> Result<&User, ServiceError> {
    identity.user().ok_or(ServiceError::Unauthenticated)
}
