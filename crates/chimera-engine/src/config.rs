//! Engine configuration
//!
//! Loaded from TOML text:
//!
//! ```toml
//! [fusion]
//! policy = "strict"          # global strictness policy
//! max_depth = 64             # hierarchy walk bound
//! reserved_keys = ["_internal"]
//!
//! [fusion.types]
//! "Widget" = "strictest"     # per user type, by class name
//! ```
//!
//! Per-type entries name user classes; they are resolved to type ids
//! against a realm when the configuration is applied.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::policy::StrictnessPolicy;
use crate::realm::{Realm, TypeId, TypeKind, DEFAULT_MAX_DEPTH};

/// Largest accepted hierarchy walk bound
pub const MAX_DEPTH_LIMIT: usize = 4096;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Fusion settings
    #[serde(default)]
    pub fusion: FusionConfig,
}

/// `[fusion]` section
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FusionConfig {
    /// Global strictness policy
    #[serde(default)]
    pub policy: StrictnessPolicy,

    /// Hierarchy walk bound
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Extra keys never merged onto instances
    #[serde(default)]
    pub reserved_keys: Vec<String>,

    /// Per user type policies, keyed by class name
    #[serde(default)]
    pub types: BTreeMap<String, StrictnessPolicy>,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            policy: StrictnessPolicy::default(),
            max_depth: default_max_depth(),
            reserved_keys: Vec::new(),
            types: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        let depth = self.fusion.max_depth;
        if depth == 0 || depth > MAX_DEPTH_LIMIT {
            return Err(ConfigError::InvalidDepth(depth));
        }
        Ok(())
    }
}

impl FusionConfig {
    /// Resolve per-type entries to user type ids.
    ///
    /// Each name must match exactly one user class in the realm.
    pub fn resolve_types(&self, realm: &Realm) -> Result<Vec<(TypeId, StrictnessPolicy)>, ConfigError> {
        self.types
            .iter()
            .map(|(name, policy)| {
                let matches: Vec<TypeId> = realm
                    .find_types_by_name(name)
                    .into_iter()
                    .filter(|ty| {
                        realm
                            .type_node(*ty)
                            .is_some_and(|node| node.kind == TypeKind::User)
                    })
                    .collect();
                match matches.as_slice() {
                    [ty] => Ok((*ty, *policy)),
                    [] => Err(ConfigError::UnknownTypeName(name.clone())),
                    _ => Err(ConfigError::AmbiguousTypeName {
                        name: name.clone(),
                        count: matches.len(),
                    }),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realm::ClassDef;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config.fusion.policy, StrictnessPolicy::Strict);
        assert_eq!(config.fusion.max_depth, DEFAULT_MAX_DEPTH);
        assert!(config.fusion.types.is_empty());
    }

    #[test]
    fn test_full_section() {
        let config = EngineConfig::from_toml_str(
            r#"
            [fusion]
            policy = "Flexible"
            max_depth = 16
            reserved_keys = ["_internal", "$$typeof"]

            [fusion.types]
            "Widget" = "strictest"
            "#,
        )
        .unwrap();

        assert_eq!(config.fusion.policy, StrictnessPolicy::Flexible);
        assert_eq!(config.fusion.max_depth, 16);
        assert_eq!(config.fusion.reserved_keys, vec!["_internal", "$$typeof"]);
        assert_eq!(config.fusion.types["Widget"], StrictnessPolicy::Strictest);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            EngineConfig::from_toml_str("[fusion]\npolicy = \"loose\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("[fusion]\nmax_depth = 0"),
            Err(ConfigError::InvalidDepth(0))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("[fusion]\nunknown = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_resolve_types_by_name() {
        let mut realm = Realm::new();
        let widget = realm.define_class(ClassDef::new("Widget")).unwrap();
        realm.define_class(ClassDef::new("Twin")).unwrap();
        realm.define_class(ClassDef::new("Twin")).unwrap();

        let mut fusion = FusionConfig::default();
        fusion.types.insert("Widget".into(), StrictnessPolicy::Strictest);
        assert_eq!(
            fusion.resolve_types(&realm).unwrap(),
            vec![(widget, StrictnessPolicy::Strictest)]
        );

        fusion.types.insert("Twin".into(), StrictnessPolicy::Flexible);
        assert!(matches!(
            fusion.resolve_types(&realm),
            Err(ConfigError::AmbiguousTypeName { count: 2, .. })
        ));

        fusion.types.clear();
        fusion.types.insert("Missing".into(), StrictnessPolicy::Flexible);
        assert!(matches!(
            fusion.resolve_types(&realm),
            Err(ConfigError::UnknownTypeName(_))
        ));
    }
}
