//! Error types
//!
//! Two tiers. [`HostFault`] is what the realm's raw operations report; the
//! kernel absorbs every one of them. [`EngineError`] is what the public API
//! returns, and only for misuse at the `fuse`/`configure` boundary.

use thiserror::Error;

use crate::realm::{ObjectId, PropertyKey, TypeId};

/// Failure of a raw realm operation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HostFault {
    /// Object was revoked
    #[error("Object {0} has been revoked")]
    RevokedObject(ObjectId),

    /// Type node was revoked
    #[error("Type {0} has been revoked")]
    RevokedType(TypeId),

    /// Object does not exist
    #[error("Unknown object: {0}")]
    UnknownObject(ObjectId),

    /// Type node does not exist
    #[error("Unknown type: {0}")]
    UnknownType(TypeId),

    /// No host class is registered for the tag
    #[error("Unknown host tag: {0}")]
    UnknownTag(String),

    /// A host class is already registered for the tag
    #[error("Duplicate host tag: {0}")]
    DuplicateTag(String),

    /// Object was not created from a host tag
    #[error("Object {0} has no host tag")]
    NoHostTag(ObjectId),

    /// Object does not accept new properties or pointer changes
    #[error("Object {0} is not extensible")]
    NotExtensible(ObjectId),

    /// Existing property cannot be redefined
    #[error("Property '{key}' is not configurable")]
    NonConfigurable {
        /// Offending key
        key: PropertyKey,
    },

    /// Host class refuses to be spliced under a bridge
    #[error("Type {0} is sealed against splicing")]
    SealedType(TypeId),

    /// Requested hierarchy shape is not allowed
    #[error("Invalid type hierarchy: {0}")]
    InvalidHierarchy(String),

    /// Host code raised an exception
    #[error("Uncaught exception: {0}")]
    Thrown(String),
}

/// Raw realm operation result
pub type HostResult<T> = Result<T, HostFault>;

/// Misuse of the engine API
#[derive(Debug, Error)]
pub enum EngineError {
    /// Policy text is not one of `flexible`, `strict`, `strictest`
    #[error("Invalid strictness policy: '{0}'")]
    InvalidPolicy(String),

    /// Type id does not name a type node
    #[error("Unknown type: {0}")]
    UnknownType(TypeId),

    /// Type id names a node that is not a user class
    #[error("Type {0} is not a user type")]
    NotUserType(TypeId),

    /// The (instance, user type) pair cannot be fused
    #[error("Malformed type pair: {0}")]
    MalformedPair(String),

    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Engine API result
pub type EngineResult<T> = Result<T, EngineError>;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// TOML text could not be parsed into a configuration
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A per-type entry names no user class
    #[error("Unknown type name in configuration: '{0}'")]
    UnknownTypeName(String),

    /// A per-type entry names more than one user class
    #[error("Ambiguous type name in configuration: '{name}' matches {count} user types")]
    AmbiguousTypeName {
        /// Name as written
        name: String,
        /// Number of matching user types
        count: usize,
    },

    /// Hierarchy depth bound outside the accepted range
    #[error("Invalid max_depth {0}: expected 1..={max}", max = crate::config::MAX_DEPTH_LIMIT)]
    InvalidDepth(usize),
}
