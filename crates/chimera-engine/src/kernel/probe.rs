//! Host-ownership probe

use super::Kernel;
use crate::diagnostics::DiagnosticCode;
use crate::realm::{ObjectId, PropertyKey, Realm, Target, TypeOrigin};

impl Kernel {
    /// Check whether `key` is native to the instance's host tag.
    ///
    /// A throwaway instance of the same tag is created and inspected: the
    /// key counts as native if the fresh instance owns it, or if any host
    /// class on its chain declares it. The throwaway is disposed before
    /// returning. When no probe can be made (no tag, creation refused) the
    /// key is reported as not native.
    pub fn is_host_own_property(&self, realm: &mut Realm, obj: ObjectId, key: &PropertyKey) -> bool {
        let Some(tag) = self.tag_of(realm, obj) else {
            self.report(
                DiagnosticCode::ProbeFailed,
                format!("cannot probe '{key}' on {obj}: no host tag"),
            );
            return false;
        };
        let Some(probe) = self.create_disposable(realm, &tag) else {
            self.report(
                DiagnosticCode::ProbeFailed,
                format!("cannot probe '{key}' on {obj}: '{tag}' refused a reference instance"),
            );
            return false;
        };

        let native = self.probe_declares(realm, probe, key);
        self.dispose(realm, probe);
        native
    }

    fn probe_declares(&self, realm: &Realm, probe: ObjectId, key: &PropertyKey) -> bool {
        if self.own_property(realm, Target::Object(probe), key).is_some() {
            return true;
        }
        self.instance_chain(realm, probe)
            .into_iter()
            .filter(|&ty| self.origin_of(realm, ty) == Some(TypeOrigin::Host))
            .any(|ty| self.own_property(realm, Target::Type(ty), key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::diagnostics::DiagnosticLog;
    use crate::realm::{HostClassDef, HostTag, Intrinsics, TypeId, Value};

    fn realm() -> (Realm, ObjectId) {
        let mut realm = Realm::new();
        let element = realm
            .register_host_class(
                HostClassDef::abstract_class("Element").method("click", |_, _, _| Ok(Value::Null)),
            )
            .unwrap();
        realm
            .register_host_class(
                HostClassDef::new("box", "Box")
                    .extends(element)
                    .instance_value("volume", 10),
            )
            .unwrap();
        let obj = realm.create_instance(&HostTag::new("box")).unwrap();
        (realm, obj)
    }

    #[test]
    fn test_native_keys_are_detected() {
        let (mut realm, obj) = realm();
        let kernel = Kernel::default();
        let objects = realm.object_count();

        assert!(kernel.is_host_own_property(&mut realm, obj, &"volume".into()));
        assert!(kernel.is_host_own_property(&mut realm, obj, &"click".into()));
        assert!(!kernel.is_host_own_property(&mut realm, obj, &"label".into()));
        // Reference instances are disposed
        assert_eq!(realm.object_count(), objects);
    }

    #[test]
    fn test_instance_additions_are_not_native() {
        let (mut realm, obj) = realm();
        let kernel = Kernel::default();
        realm.set(obj, "label".into(), Value::from("x")).unwrap();
        assert!(!kernel.is_host_own_property(&mut realm, obj, &"label".into()));
    }

    #[test]
    fn test_untagged_object_probe_fails_softly() {
        let (mut realm, _) = realm();
        let plain = realm.create_object(TypeId(0)).unwrap();
        let kernel = Kernel::default();

        assert!(!kernel.is_host_own_property(&mut realm, plain, &"volume".into()));
        assert!(kernel.log().contains(DiagnosticCode::ProbeFailed));
    }

    #[test]
    fn test_refused_reference_instance() {
        let (mut realm, obj) = realm();
        let primitives = Intrinsics {
            create_instance: |_, tag| panic!("no instances of {tag}"),
            ..Intrinsics::genuine()
        };
        let kernel = Kernel::with_primitives(primitives, Arc::new(DiagnosticLog::new()));

        assert!(!kernel.is_host_own_property(&mut realm, obj, &"volume".into()));
        assert!(kernel.log().contains(DiagnosticCode::PrimitivePanic));
        assert!(kernel.log().contains(DiagnosticCode::ProbeFailed));
    }
}
