//! Chimera Identity-Fusion Engine
//!
//! Makes a single host-created instance a member of two independent type
//! hierarchies at once: a user-authored class hierarchy and the host's own
//! object hierarchy, which the engine neither controls nor mutates.
//!
//! - **Realm**: the host object world: type nodes, instances, property
//!   descriptors and a tamperable intrinsics table (`realm` module)
//! - **Kernel**: infallible reflection over pre-captured primitives
//!   (`kernel` module)
//! - **Fusion**: one bridge type per (user type, host type) pair and
//!   hierarchy pointer redirection (`fusion` module)
//! - **Merge**: policy-driven, two-pass descriptor merge onto the fused
//!   instance (`merge` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use chimera_engine::{ClassDef, Engine, HostClassDef, HostTag, Realm};
//!
//! let mut realm = Realm::new();
//! let boxed = realm.register_host_class(HostClassDef::new("box", "Box"))?;
//! let widget = realm.define_class(ClassDef::new("Widget").value("label", "w"))?;
//!
//! let engine = Engine::capture(&realm);
//! let instance = realm.create_instance(&HostTag::new("box"))?;
//! let composite = engine.fuse(&mut realm, instance, widget)?;
//!
//! assert!(engine.is_instance_of(&realm, instance, widget));
//! assert!(engine.is_instance_of(&realm, instance, boxed));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// ============================================================================
// Core Modules
// ============================================================================

/// Host realm: type nodes, objects, properties and intrinsics
pub mod realm;

/// Hardened reflection kernel
pub mod kernel;

/// Identity fusion and the bridge cache
pub mod fusion;

/// Descriptor merge
pub mod merge;

// ============================================================================
// Ambient Modules
// ============================================================================

/// Engine configuration
pub mod config;

/// Recovered-failure diagnostics
pub mod diagnostics;

/// Engine facade
pub mod engine;

/// Error types
pub mod error;

/// Strictness policies
pub mod policy;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{EngineConfig, FusionConfig};
pub use diagnostics::{Diagnostic, DiagnosticCode, DiagnosticLog};
pub use engine::{CompositeInstance, Engine};
pub use error::{ConfigError, EngineError, EngineResult, HostFault, HostResult};
pub use fusion::{FusionStats, Identity};
pub use kernel::Kernel;
pub use merge::{MergeReport, ReservedKeys};
pub use policy::{PolicyStore, StrictnessPolicy};
pub use realm::{
    ClassDef, Function, HostClassDef, HostTag, Intrinsics, ObjectId, PropertyDescriptor,
    PropertyKey, Realm, Target, TypeId, Value,
};
