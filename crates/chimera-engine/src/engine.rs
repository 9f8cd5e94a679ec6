//! Engine facade
//!
//! Ties the kernel, identity fusion, descriptor merge and policy store
//! together behind the two operations collaborators use: [`Engine::fuse`]
//! and [`Engine::configure`].

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::diagnostics::DiagnosticLog;
use crate::error::EngineResult;
use crate::fusion::{BridgeKey, FusionStats, Identity, IdentityFusion};
use crate::kernel::Kernel;
use crate::merge::{DescriptorMerge, MergeReport, ReservedKeys};
use crate::policy::{PolicyStore, StrictnessPolicy};
use crate::realm::{ObjectId, Realm, TypeId};

/// A host instance that now also belongs to a user hierarchy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeInstance {
    /// The instance (its identity never changes)
    pub instance: ObjectId,
    /// User type fused in
    pub user: TypeId,
    /// Host type the instance was created with
    pub host: TypeId,
    /// Bridge the instance points at
    pub bridge: Option<TypeId>,
    /// How completely the fusion took
    pub identity: Identity,
    /// Policy the merge ran under
    pub policy: StrictnessPolicy,
    /// What the merge did
    pub merge: MergeReport,
}

/// Identity-fusion engine
#[derive(Debug)]
pub struct Engine {
    kernel: Kernel,
    fusion: IdentityFusion,
    merge: DescriptorMerge,
    policies: RwLock<PolicyStore>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Engine over the realm's genuine operations, with default settings
    pub fn new() -> Self {
        Self::with_kernel(Kernel::new(Arc::new(DiagnosticLog::new())), ReservedKeys::new())
    }

    /// Engine over a snapshot of the realm's current intrinsics
    pub fn capture(realm: &Realm) -> Self {
        Self::with_kernel(
            Kernel::capture(realm, Arc::new(DiagnosticLog::new())),
            ReservedKeys::new(),
        )
    }

    /// Engine over an explicit kernel
    pub fn with_kernel(kernel: Kernel, reserved: ReservedKeys) -> Self {
        Self {
            fusion: IdentityFusion::new(kernel.clone()),
            merge: DescriptorMerge::new(kernel.clone(), reserved),
            kernel,
            policies: RwLock::new(PolicyStore::new()),
        }
    }

    /// Engine configured from `config`, capturing the realm's intrinsics.
    /// Per-type policy names are resolved against `realm`.
    pub fn from_config(realm: &Realm, config: &EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let fusion = &config.fusion;
        let kernel = Kernel::capture(realm, Arc::new(DiagnosticLog::new()))
            .with_max_depth(fusion.max_depth);
        let engine = Self::with_kernel(kernel, ReservedKeys::with_extra(fusion.reserved_keys.iter().cloned()));

        let overrides = fusion.resolve_types(realm)?;
        {
            let mut policies = engine.policies.write();
            policies.set_global(fusion.policy);
            for (ty, policy) in overrides {
                policies.set_type(ty, policy);
            }
        }
        Ok(engine)
    }

    /// [`Engine::from_config`] from TOML text
    pub fn from_toml_str(realm: &Realm, content: &str) -> EngineResult<Self> {
        let config = EngineConfig::from_toml_str(content)?;
        Self::from_config(realm, &config)
    }

    // ===== Fusion =====

    /// Fuse `instance` into the hierarchy of user type `user`, then merge
    /// the hierarchy's members onto it.
    ///
    /// Errors only when the pair is unusable: `user` is not a user class or
    /// the instance's host type cannot be determined. Everything the host
    /// refuses along the way degrades the result instead.
    pub fn fuse(&self, realm: &mut Realm, instance: ObjectId, user: TypeId) -> EngineResult<CompositeInstance> {
        let fused = self.fusion.fuse(realm, instance, user)?;
        let policy = self.policy_for(realm, user);
        let merge = self.merge.run(realm, instance, user, policy);

        if fused.identity != Identity::Full || !merge.is_complete() {
            warn!(
                instance = %instance,
                user = %user,
                identity = ?fused.identity,
                failed = merge.failed.len(),
                "fusion degraded"
            );
        } else {
            debug!(instance = %instance, user = %user, host = %fused.host, policy = %policy, "instance fused");
        }

        Ok(CompositeInstance {
            instance,
            user,
            host: fused.host,
            bridge: fused.bridge,
            identity: fused.identity,
            policy,
            merge,
        })
    }

    // ===== Policy =====

    /// Set the strictness policy globally (`ty = None`) or for one user type
    pub fn configure(&self, realm: &Realm, policy: StrictnessPolicy, ty: Option<TypeId>) -> EngineResult<()> {
        let mut policies = self.policies.write();
        match ty {
            None => policies.set_global(policy),
            Some(ty) => {
                self.fusion.check_user_type(realm, ty)?;
                policies.set_type(ty, policy);
            }
        }
        Ok(())
    }

    /// [`Engine::configure`] with the policy given by name
    pub fn configure_str(&self, realm: &Realm, policy: &str, ty: Option<TypeId>) -> EngineResult<()> {
        let policy: StrictnessPolicy = policy.parse()?;
        self.configure(realm, policy, ty)
    }

    /// Policy a fusion of `user` would merge under
    pub fn policy_for(&self, realm: &Realm, user: TypeId) -> StrictnessPolicy {
        let chain = self.kernel.user_levels(realm, user);
        self.policies.read().resolve(&chain)
    }

    /// Global policy
    pub fn global_policy(&self) -> StrictnessPolicy {
        self.policies.read().global()
    }

    // ===== Introspection =====

    /// Structural membership of an instance in a type
    pub fn is_instance_of(&self, realm: &Realm, instance: ObjectId, ty: TypeId) -> bool {
        self.kernel.instance_of(realm, instance, ty)
    }

    /// Ancestor chain of an instance's current hierarchy pointer
    pub fn ancestry(&self, realm: &Realm, instance: ObjectId) -> Vec<TypeId> {
        self.kernel.instance_chain(realm, instance)
    }

    /// Cached bridge of a pair, if one was derived
    pub fn bridge_for(&self, user: TypeId, host: TypeId) -> Option<TypeId> {
        self.fusion
            .cache()
            .get(BridgeKey::new(user, host))
            .map(|entry| entry.bridge)
    }

    /// Fusion counters
    pub fn stats(&self) -> FusionStats {
        self.fusion.stats()
    }

    /// Log of every recovered failure
    pub fn diagnostics(&self) -> &Arc<DiagnosticLog> {
        self.kernel.log()
    }

    /// Reflection kernel
    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }
}
