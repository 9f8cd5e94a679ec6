//! Hardened Reflection Kernel
//!
//! Infallible wrappers around the realm's foundational operations. The
//! kernel copies its primitive table exactly once, at construction, and
//! never consults the realm's live intrinsics again, so tampering that
//! happens afterwards cannot reach it.
//!
//! Every primitive returns a documented safe default instead of failing:
//!
//! | Primitive               | On fault or panic     |
//! |-------------------------|-----------------------|
//! | `parent_of`             | `None`                |
//! | `type_link`             | `None`                |
//! | `own_keys`              | empty list            |
//! | `own_property`          | `None`                |
//! | `define_property`       | `false`               |
//! | `get` / `call`          | `Value::Undefined`    |
//! | `set`                   | `false`               |
//! | `tag_of`                | `None`                |
//! | `create_disposable`     | `None`                |
//! | `dispose`               | `false`               |
//! | `derive_bridge`         | `None`                |
//!
//! Each absorbed failure is reported to the kernel's [`DiagnosticLog`].
//! Callers never wrap kernel calls in further error handling.

mod hierarchy;
mod probe;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::diagnostics::{DiagnosticCode, DiagnosticLog};
use crate::error::HostResult;
use crate::realm::{
    Function, HostTag, Intrinsics, ObjectId, PropertyDescriptor, PropertyKey, Realm, Splice,
    Target, TypeId, TypeLink, Value, DEFAULT_MAX_DEPTH,
};

/// Infallible reflection over a possibly hostile realm
#[derive(Debug, Clone)]
pub struct Kernel {
    primitives: Intrinsics,
    log: Arc<DiagnosticLog>,
    max_depth: usize,
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new(Arc::new(DiagnosticLog::new()))
    }
}

impl Kernel {
    /// Kernel over the realm's genuine operations
    pub fn new(log: Arc<DiagnosticLog>) -> Self {
        Self::with_primitives(Intrinsics::genuine(), log)
    }

    /// Kernel over a snapshot of the realm's current intrinsics table
    pub fn capture(realm: &Realm, log: Arc<DiagnosticLog>) -> Self {
        Self::with_primitives(*realm.intrinsics(), log)
    }

    /// Kernel over an explicit primitive table
    pub fn with_primitives(primitives: Intrinsics, log: Arc<DiagnosticLog>) -> Self {
        Self {
            primitives,
            log,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Set the hierarchy walk bound (at least 1)
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Hierarchy walk bound
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Diagnostic log this kernel reports to
    pub fn log(&self) -> &Arc<DiagnosticLog> {
        &self.log
    }

    /// Report a diagnostic
    pub fn report(&self, code: DiagnosticCode, message: impl Into<String>) {
        self.log.emit(code, message);
    }

    /// Run a raw operation, absorbing faults and panics
    fn guard<T>(&self, op: &str, default: T, f: impl FnOnce() -> HostResult<T>) -> T {
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(Ok(value)) => value,
            Ok(Err(fault)) => {
                self.report(DiagnosticCode::PrimitiveFault, format!("{op}: {fault}"));
                default
            }
            Err(payload) => {
                self.report(
                    DiagnosticCode::PrimitivePanic,
                    format!("{op} panicked: {}", panic_message(payload.as_ref())),
                );
                default
            }
        }
    }

    // ===== Hierarchy pointers =====

    /// Read an object's hierarchy pointer
    pub fn parent_of(&self, realm: &Realm, obj: ObjectId) -> Option<TypeId> {
        let p = self.primitives;
        self.guard("get_prototype_of", None, || (p.get_prototype_of)(realm, obj))
    }

    /// Redirect an object's hierarchy pointer
    pub fn set_parent(&self, realm: &mut Realm, obj: ObjectId, proto: TypeId) -> bool {
        let p = self.primitives;
        self.guard("set_prototype_of", false, || {
            (p.set_prototype_of)(realm, obj, proto).map(|()| true)
        })
    }

    /// Read a type node's link
    pub fn type_link(&self, realm: &Realm, ty: TypeId) -> Option<TypeLink> {
        let p = self.primitives;
        self.guard("type_link", None, || (p.type_link)(realm, ty).map(Some))
    }

    // ===== Properties =====

    /// Enumerate own string and symbol keys
    pub fn own_keys(&self, realm: &Realm, target: Target) -> Vec<PropertyKey> {
        let p = self.primitives;
        self.guard("own_keys", Vec::new(), || (p.own_keys)(realm, target))
    }

    /// Read an own property descriptor
    pub fn own_property(
        &self,
        realm: &Realm,
        target: Target,
        key: &PropertyKey,
    ) -> Option<PropertyDescriptor> {
        let p = self.primitives;
        self.guard("get_own_property", None, || {
            (p.get_own_property)(realm, target, key)
        })
    }

    /// Define an own property; `false` if the realm refused
    pub fn define_property(
        &self,
        realm: &mut Realm,
        obj: ObjectId,
        key: PropertyKey,
        descriptor: PropertyDescriptor,
    ) -> bool {
        let p = self.primitives;
        self.guard("define_own_property", false, || {
            (p.define_own_property)(realm, obj, key, descriptor).map(|()| true)
        })
    }

    /// Ordinary property read
    pub fn get(&self, realm: &mut Realm, obj: ObjectId, key: &PropertyKey) -> Value {
        let p = self.primitives;
        self.guard("get", Value::Undefined, || (p.get)(realm, obj, key))
    }

    /// Ordinary property write
    pub fn set(&self, realm: &mut Realm, obj: ObjectId, key: PropertyKey, value: Value) -> bool {
        let p = self.primitives;
        self.guard("set", false, || (p.set)(realm, obj, key, value))
    }

    // ===== Functions =====

    /// Fix a function's receiver
    pub fn bind(&self, function: &Function, this: Value) -> Function {
        function.bind(this)
    }

    /// Call a function
    pub fn call(&self, realm: &mut Realm, function: &Function, this: &Value, args: &[Value]) -> Value {
        let p = self.primitives;
        self.guard("call", Value::Undefined, || (p.call)(realm, function, this, args))
    }

    // ===== Instances =====

    /// Read an object's host tag
    pub fn tag_of(&self, realm: &Realm, obj: ObjectId) -> Option<HostTag> {
        let p = self.primitives;
        self.guard("tag_of", None, || (p.tag_of)(realm, obj).map(Some))
    }

    /// Create a throwaway instance of a host tag
    pub fn create_disposable(&self, realm: &mut Realm, tag: &HostTag) -> Option<ObjectId> {
        let p = self.primitives;
        self.guard("create_instance", None, || {
            (p.create_instance)(realm, tag).map(Some)
        })
    }

    /// Discard an object
    pub fn dispose(&self, realm: &mut Realm, obj: ObjectId) -> bool {
        let p = self.primitives;
        self.guard("dispose", false, || (p.dispose)(realm, obj).map(|()| true))
    }

    /// Derive a bridge node from a user type
    pub fn derive_bridge(
        &self,
        realm: &mut Realm,
        base: TypeId,
        splice: Option<Splice>,
    ) -> Option<TypeId> {
        let p = self.primitives;
        self.guard("derive_bridge", None, || {
            (p.derive_bridge)(realm, base, splice).map(Some)
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HostFault;
    use crate::realm::HostClassDef;

    fn realm_with_box() -> (Realm, ObjectId) {
        let mut realm = Realm::new();
        realm
            .register_host_class(HostClassDef::new("box", "Box").instance_value("volume", 10))
            .unwrap();
        let obj = realm.create_instance(&HostTag::new("box")).unwrap();
        (realm, obj)
    }

    #[test]
    fn test_genuine_primitives_pass_through() {
        let (mut realm, obj) = realm_with_box();
        let kernel = Kernel::default();

        assert_eq!(kernel.parent_of(&realm, obj), realm.host_class("box"));
        assert_eq!(kernel.own_keys(&realm, Target::Object(obj)), vec![PropertyKey::from("volume")]);
        assert_eq!(kernel.get(&mut realm, obj, &"volume".into()), Value::from(10));
        assert!(kernel.define_property(&mut realm, obj, "x".into(), PropertyDescriptor::data(1)));
        assert!(kernel.log().is_empty());
    }

    #[test]
    fn test_fault_returns_default_and_reports() {
        let (mut realm, obj) = realm_with_box();
        let kernel = Kernel::default();
        realm.revoke(obj).unwrap();

        assert_eq!(kernel.parent_of(&realm, obj), None);
        assert!(kernel.own_keys(&realm, Target::Object(obj)).is_empty());
        assert!(!kernel.define_property(&mut realm, obj, "x".into(), PropertyDescriptor::data(1)));
        assert_eq!(kernel.log().count(DiagnosticCode::PrimitiveFault), 3);
    }

    #[test]
    fn test_panic_returns_default_and_reports() {
        let (realm, obj) = realm_with_box();
        let primitives = Intrinsics {
            own_keys: |_, _| panic!("tampered own_keys"),
            ..Intrinsics::genuine()
        };
        let kernel = Kernel::with_primitives(primitives, Arc::new(DiagnosticLog::new()));

        assert!(kernel.own_keys(&realm, Target::Object(obj)).is_empty());
        let entries = kernel.log().snapshot();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].code, DiagnosticCode::PrimitivePanic);
        assert!(entries[0].message.contains("tampered own_keys"));
    }

    #[test]
    fn test_capture_ignores_later_tampering() {
        let (mut realm, obj) = realm_with_box();
        let kernel = Kernel::capture(&realm, Arc::new(DiagnosticLog::new()));
        realm.intrinsics_mut().get_prototype_of = |_, _| Err(HostFault::Thrown("tampered".into()));

        assert_eq!(kernel.parent_of(&realm, obj), realm.host_class("box"));
        let late = Kernel::capture(&realm, Arc::new(DiagnosticLog::new()));
        assert_eq!(late.parent_of(&realm, obj), None);
        assert!(late.log().contains(DiagnosticCode::PrimitiveFault));
    }

    #[test]
    fn test_throwing_getter_reads_undefined() {
        let (mut realm, obj) = realm_with_box();
        let kernel = Kernel::default();
        let getter = Function::new("boom", |_, _, _| Err(HostFault::Thrown("boom".into())));
        realm
            .define_own_property(obj, "boom".into(), PropertyDescriptor::accessor(Some(getter), None))
            .unwrap();

        assert!(kernel.get(&mut realm, obj, &"boom".into()).is_undefined());
        assert!(kernel.log().contains(DiagnosticCode::PrimitiveFault));
    }

    #[test]
    fn test_call_respects_binding() {
        let (mut realm, obj) = realm_with_box();
        let kernel = Kernel::default();
        let f = Function::new("self", |_, this, _| Ok(this.clone()));
        let bound = kernel.bind(&f, Value::Object(obj));
        assert_eq!(kernel.call(&mut realm, &bound, &Value::Null, &[]), Value::Object(obj));
        assert_eq!(kernel.call(&mut realm, &f, &Value::Null, &[]), Value::Null);
    }

    #[test]
    fn test_max_depth_floor() {
        let kernel = Kernel::default().with_max_depth(0);
        assert_eq!(kernel.max_depth(), 1);
    }
}
