//! Strictness policies
//!
//! The policy decides how the descriptor merge resolves conflicts between
//! hierarchy levels. It can be set globally and overridden per user type:
//!
//! ```toml
//! [fusion]
//! policy = "strict"
//!
//! [fusion.types]
//! "Widget" = "strictest"
//! ```
//!
//! A fusion of `T` uses `T`'s own override, else the override of the
//! nearest ancestor of `T` that has one, else the global policy.

use std::fmt;
use std::str::FromStr;

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::error::EngineError;
use crate::realm::TypeId;

/// Conflict resolution mode of the descriptor merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum StrictnessPolicy {
    /// The most-derived definition always wins verbatim
    Flexible,
    /// Overrides are merged; locked and read-only attributes propagate
    #[default]
    Strict,
    /// Like `Strict`, but locked definitions cannot be overridden at all
    Strictest,
}

impl StrictnessPolicy {
    /// All policies, least to most strict
    pub const ALL: [Self; 3] = [Self::Flexible, Self::Strict, Self::Strictest];

    /// Lower-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flexible => "flexible",
            Self::Strict => "strict",
            Self::Strictest => "strictest",
        }
    }
}

impl fmt::Display for StrictnessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrictnessPolicy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flexible" => Ok(Self::Flexible),
            "strict" => Ok(Self::Strict),
            "strictest" => Ok(Self::Strictest),
            _ => Err(EngineError::InvalidPolicy(s.to_string())),
        }
    }
}

impl TryFrom<String> for StrictnessPolicy {
    type Error = EngineError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Global policy plus per-type overrides
#[derive(Debug, Clone, Default)]
pub struct PolicyStore {
    global: StrictnessPolicy,
    per_type: FxHashMap<TypeId, StrictnessPolicy>,
}

impl PolicyStore {
    /// Create a store with the default global policy and no overrides
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Global =====

    /// Set the global policy
    pub fn set_global(&mut self, policy: StrictnessPolicy) {
        self.global = policy;
    }

    /// Global policy
    pub fn global(&self) -> StrictnessPolicy {
        self.global
    }

    // ===== Per type =====

    /// Override the policy for one user type
    pub fn set_type(&mut self, ty: TypeId, policy: StrictnessPolicy) {
        self.per_type.insert(ty, policy);
    }

    /// Override for one user type (not resolved)
    pub fn get_type(&self, ty: TypeId) -> Option<StrictnessPolicy> {
        self.per_type.get(&ty).copied()
    }

    /// Remove the override for one user type
    pub fn clear_type(&mut self, ty: TypeId) {
        self.per_type.remove(&ty);
    }

    /// Check if any per-type override is configured
    pub fn has_overrides(&self) -> bool {
        !self.per_type.is_empty()
    }

    // ===== Resolution =====

    /// Policy for a type, given its ancestor chain (the type first)
    pub fn resolve(&self, chain: &[TypeId]) -> StrictnessPolicy {
        chain
            .iter()
            .find_map(|ty| self.get_type(*ty))
            .unwrap_or(self.global)
    }
}
