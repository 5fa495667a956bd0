//! Error types for the Pulsar3D scene index
//!
//! This module defines the error types used throughout the index,
//! covering object registration, bounds validation, and build parameters.

use std::fmt;

use crate::octree::ObjectId;

/// Result type for Pulsar3D scene index operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pulsar3D scene index errors
///
/// No variant is fatal to the index as a whole: a bad single object is
/// isolated and the rest of the scene remains queryable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Insert of an object id that is already registered (caller bug,
    /// reported instead of silently overwriting the existing bounds)
    DuplicateId(ObjectId),

    /// Remove or update of an object id that is not registered
    /// (tolerated as a no-op; async unregister races are expected)
    NotFound(ObjectId),

    /// Object bounds containing NaN or infinite components; the object
    /// is excluded from the tree rather than corrupting sibling boxes
    DegenerateBounds(ObjectId),

    /// Rejected build parameters (non-positive minimum node size, etc.)
    InvalidParameters(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DuplicateId(id) => write!(f, "Duplicate object id: {}", id),
            Error::NotFound(id) => write!(f, "Object id not found: {}", id),
            Error::DegenerateBounds(id) => write!(f, "Degenerate bounds for object id: {}", id),
            Error::InvalidParameters(msg) => write!(f, "Invalid build parameters: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
