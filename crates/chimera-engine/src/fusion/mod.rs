//! Identity Fusion
//!
//! Makes one host instance a member of a user hierarchy without touching
//! either hierarchy. For each (user type `T`, host type `H`) pair a single
//! bridge type is derived:
//!
//! ```text
//! bridge ─► T ─► … ─► J ─┐        J: last user node before the root
//!                        └─► H ─► … ─► Object
//! ```
//!
//! The instance's hierarchy pointer is then redirected to the bridge, so
//! structural membership checks succeed for `T`, its ancestors, the bridge,
//! `H` and every ancestor of `H`.
//!
//! Fusion degrades instead of failing. A host type that refuses to be
//! spliced yields an unspliced bridge ([`Identity::Partial`]); an instance
//! that refuses redirection keeps its pointer ([`Identity::Unchanged`]).

mod cache;

pub use cache::{BridgeCache, BridgeEntry, BridgeKey};

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::diagnostics::DiagnosticCode;
use crate::error::{EngineError, EngineResult};
use crate::kernel::Kernel;
use crate::realm::{
    ObjectId, PropertyDescriptor, PropertyKey, Realm, Splice, Target, TypeId, TypeOrigin, Value,
};

/// How completely an instance took on the fused identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Identity {
    /// Member of both hierarchies
    Full,
    /// Member of the user hierarchy only; the host refused the splice
    Partial,
    /// Hierarchy pointer could not be redirected
    Unchanged,
}

impl Identity {
    /// Check if the instance is a member of both hierarchies
    pub fn is_full(&self) -> bool {
        *self == Self::Full
    }
}

/// Outcome of fusing one instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FusedIdentity {
    /// Fused instance
    pub instance: ObjectId,
    /// User type fused in
    pub user: TypeId,
    /// Host type the instance was created with
    pub host: TypeId,
    /// Bridge the instance now points at; `None` if none could be derived
    pub bridge: Option<TypeId>,
    /// How completely the fusion took
    pub identity: Identity,
}

/// Fusion counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FusionStats {
    /// Bridges derived so far
    pub bridges_created: u64,
    /// Fusions performed
    pub fusions: u64,
    /// Fusions that ended [`Identity::Partial`]
    pub partial_fusions: u64,
    /// Fusions that ended [`Identity::Unchanged`]
    pub unchanged_fusions: u64,
}

/// Identity fusion over a shared bridge cache
#[derive(Debug)]
pub struct IdentityFusion {
    kernel: Kernel,
    cache: BridgeCache,
    fusions: AtomicU64,
    partial: AtomicU64,
    unchanged: AtomicU64,
}

impl IdentityFusion {
    /// Create a fusion engine reflecting through `kernel`
    pub fn new(kernel: Kernel) -> Self {
        Self {
            kernel,
            cache: BridgeCache::new(),
            fusions: AtomicU64::new(0),
            partial: AtomicU64::new(0),
            unchanged: AtomicU64::new(0),
        }
    }

    /// Bridge cache
    pub fn cache(&self) -> &BridgeCache {
        &self.cache
    }

    /// Check that `ty` names a live user class
    pub fn check_user_type(&self, realm: &Realm, ty: TypeId) -> EngineResult<()> {
        match self.kernel.origin_of(realm, ty) {
            Some(TypeOrigin::User) => Ok(()),
            Some(_) => Err(EngineError::NotUserType(ty)),
            None => Err(EngineError::UnknownType(ty)),
        }
    }

    /// Host type an instance was created with.
    ///
    /// The recorded native origin wins; otherwise the current hierarchy
    /// pointer is used (a host class directly, or the host of a spliced
    /// bridge).
    pub fn resolve_host(&self, realm: &Realm, instance: ObjectId) -> EngineResult<TypeId> {
        if let Some(host) = self.recorded_origin(realm, instance) {
            return Ok(host);
        }

        let Some(proto) = self.kernel.parent_of(realm, instance) else {
            return Err(EngineError::MalformedPair(format!(
                "hierarchy pointer of {instance} cannot be read"
            )));
        };
        let Some(link) = self.kernel.type_link(realm, proto) else {
            return Err(EngineError::MalformedPair(format!(
                "hierarchy of {instance} is unreadable at {proto}"
            )));
        };
        match (link.origin, link.splice) {
            (TypeOrigin::Host, _) => Ok(proto),
            (TypeOrigin::Bridge, Some(splice)) => Ok(splice.host),
            _ => Err(EngineError::MalformedPair(format!(
                "{instance} is not an instance of a host type"
            ))),
        }
    }

    fn recorded_origin(&self, realm: &Realm, instance: ObjectId) -> Option<TypeId> {
        let slot = self.kernel.own_property(
            realm,
            Target::Object(instance),
            &PropertyKey::native_origin(),
        )?;
        let host = slot.value()?.as_type()?;
        (self.kernel.origin_of(realm, host) == Some(TypeOrigin::Host)).then_some(host)
    }

    /// Bridge for a pair, derived on first request
    pub fn bridge(&self, realm: &mut Realm, user: TypeId, host: TypeId) -> Option<BridgeEntry> {
        let key = BridgeKey::new(user, host);
        let (entry, created) = self
            .cache
            .get_or_create(key, || self.derive_bridge(realm, user, host))?;
        if created {
            debug!(user = %user, host = %host, bridge = %entry.bridge, spliced = entry.spliced, "bridge created");
        }
        Some(entry)
    }

    fn derive_bridge(&self, realm: &mut Realm, user: TypeId, host: TypeId) -> Option<BridgeEntry> {
        let junction = self.kernel.user_levels(realm, user).last().copied()?;
        let splice = Splice { junction, host };

        if let Some(bridge) = self.kernel.derive_bridge(realm, user, Some(splice)) {
            return Some(BridgeEntry {
                bridge,
                spliced: true,
            });
        }

        self.kernel.report(
            DiagnosticCode::SpliceRefused,
            format!("host {host} refused splicing under {user}, bridging the user hierarchy only"),
        );
        let bridge = self.kernel.derive_bridge(realm, user, None)?;
        Some(BridgeEntry {
            bridge,
            spliced: false,
        })
    }

    /// Fuse `instance` into the user hierarchy of `user`
    pub fn fuse(&self, realm: &mut Realm, instance: ObjectId, user: TypeId) -> EngineResult<FusedIdentity> {
        self.check_user_type(realm, user)?;
        let host = self.resolve_host(realm, instance)?;
        self.fusions.fetch_add(1, Ordering::Relaxed);

        let Some(entry) = self.bridge(realm, user, host) else {
            self.kernel.report(
                DiagnosticCode::RedirectRefused,
                format!("no bridge could be derived for ({user}, {host}), {instance} left unchanged"),
            );
            self.unchanged.fetch_add(1, Ordering::Relaxed);
            return Ok(FusedIdentity {
                instance,
                user,
                host,
                bridge: None,
                identity: Identity::Unchanged,
            });
        };

        self.record_origin(realm, instance, host);

        let identity = if !self.kernel.set_parent(realm, instance, entry.bridge) {
            self.kernel.report(
                DiagnosticCode::RedirectRefused,
                format!("{instance} refused redirection to {}", entry.bridge),
            );
            self.unchanged.fetch_add(1, Ordering::Relaxed);
            Identity::Unchanged
        } else if entry.spliced {
            Identity::Full
        } else {
            self.partial.fetch_add(1, Ordering::Relaxed);
            Identity::Partial
        };

        Ok(FusedIdentity {
            instance,
            user,
            host,
            bridge: Some(entry.bridge),
            identity,
        })
    }

    fn record_origin(&self, realm: &mut Realm, instance: ObjectId, host: TypeId) {
        if self.recorded_origin(realm, instance) == Some(host) {
            return;
        }
        let slot = PropertyDescriptor::data(Value::Type(host)).hidden();
        if !self
            .kernel
            .define_property(realm, instance, PropertyKey::native_origin(), slot)
        {
            self.kernel.report(
                DiagnosticCode::OriginNotRecorded,
                format!("native origin {host} not recorded on {instance}"),
            );
        }
    }

    /// Snapshot of the fusion counters
    pub fn stats(&self) -> FusionStats {
        FusionStats {
            bridges_created: self.cache.created_count(),
            fusions: self.fusions.load(Ordering::Relaxed),
            partial_fusions: self.partial.load(Ordering::Relaxed),
            unchanged_fusions: self.unchanged.load(Ordering::Relaxed),
        }
    }
}
