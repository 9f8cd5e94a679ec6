//! Integration tests for identity fusion
//!
//! Membership in both hierarchies, bridge reuse, degraded fusions and
//! immutability of the fused hierarchies.

mod common;

use chimera_engine::{
    ClassDef, DiagnosticCode, Engine, EngineError, Identity, PropertyKey, Target, TypeId, Value,
};
use common::HostWorld;

fn user_chain(world: &mut HostWorld) -> (TypeId, TypeId, TypeId) {
    let a = world.realm.define_class(ClassDef::new("A")).unwrap();
    let b = world.realm.define_class(ClassDef::new("B").extends(a)).unwrap();
    let c = world.realm.define_class(ClassDef::new("C").extends(b)).unwrap();
    (a, b, c)
}

// ============================================================================
// Membership
// ============================================================================

mod membership {
    use super::*;

    #[test]
    fn test_fused_instance_belongs_to_both_hierarchies() {
        let mut world = HostWorld::new();
        let (a, b, c) = user_chain(&mut world);
        let engine = Engine::capture(&world.realm);
        let obj = world.new_box();

        let composite = engine.fuse(&mut world.realm, obj, c).unwrap();
        assert_eq!(composite.identity, Identity::Full);
        assert_eq!(composite.instance, obj);

        let bridge = composite.bridge.unwrap();
        let root = world.realm.object_root();
        for ty in [bridge, c, b, a, world.boxed, world.element, world.node, root] {
            assert!(engine.is_instance_of(&world.realm, obj, ty), "missing {ty}");
        }
        assert!(!engine.is_instance_of(&world.realm, obj, world.panel));
        assert_eq!(
            engine.ancestry(&world.realm, obj),
            vec![bridge, c, b, a, world.boxed, world.element, world.node, root]
        );
    }

    #[test]
    fn test_unfused_objects_are_not_host_members() {
        let mut world = HostWorld::new();
        let (a, _, _) = user_chain(&mut world);
        let engine = Engine::capture(&world.realm);

        let plain = world.realm.create_object(a).unwrap();
        assert!(engine.is_instance_of(&world.realm, plain, a));
        assert!(!engine.is_instance_of(&world.realm, plain, world.boxed));

        let other = world.new_box();
        assert!(!engine.is_instance_of(&world.realm, other, a));
    }

    #[test]
    fn test_host_natives_still_work_after_fusion() {
        let mut world = HostWorld::new();
        let (a, _, _) = user_chain(&mut world);
        let engine = Engine::capture(&world.realm);
        let obj = world.new_box();
        engine.fuse(&mut world.realm, obj, a).unwrap();

        assert_eq!(common::read(&mut world.realm, obj, "volume"), Value::from(10));
        let click = common::read(&mut world.realm, obj, "click");
        let click = click.as_function().unwrap().clone();
        assert_eq!(
            click.call(&mut world.realm, &Value::Object(obj), &[]).unwrap(),
            Value::from("clicked")
        );
    }
}

// ============================================================================
// Bridge cache
// ============================================================================

mod bridge_cache {
    use super::*;

    #[test]
    fn test_one_bridge_per_pair() {
        let mut world = HostWorld::new();
        let (_, _, c) = user_chain(&mut world);
        let engine = Engine::capture(&world.realm);

        let bridges: Vec<_> = (0..5)
            .map(|_| {
                let obj = world.new_box();
                engine.fuse(&mut world.realm, obj, c).unwrap().bridge
            })
            .collect();

        assert!(bridges.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(engine.stats().bridges_created, 1);
        assert_eq!(engine.stats().fusions, 5);
        assert_eq!(engine.bridge_for(c, world.boxed), bridges[0]);
    }

    #[test]
    fn test_distinct_hosts_get_distinct_bridges() {
        let mut world = HostWorld::new();
        let (a, _, _) = user_chain(&mut world);
        let engine = Engine::capture(&world.realm);
        let boxed = world.new_box();
        let panel = world.new_panel();

        let x = engine.fuse(&mut world.realm, boxed, a).unwrap();
        let y = engine.fuse(&mut world.realm, panel, a).unwrap();

        assert_ne!(x.bridge, y.bridge);
        assert_eq!(engine.stats().bridges_created, 2);
        assert!(engine.is_instance_of(&world.realm, panel, world.panel));
        assert!(!engine.is_instance_of(&world.realm, panel, world.boxed));
    }

    #[test]
    fn test_distinct_user_types_get_distinct_bridges() {
        let mut world = HostWorld::new();
        let (a, b, _) = user_chain(&mut world);
        let engine = Engine::capture(&world.realm);
        let first = world.new_box();
        let second = world.new_box();

        let x = engine.fuse(&mut world.realm, first, a).unwrap();
        let y = engine.fuse(&mut world.realm, second, b).unwrap();
        assert_ne!(x.bridge, y.bridge);
        assert!(!engine.is_instance_of(&world.realm, first, b));
    }

    #[test]
    fn test_caches_are_scoped_to_engine() {
        let mut world = HostWorld::new();
        let (a, _, _) = user_chain(&mut world);
        let first = Engine::capture(&world.realm);
        let second = Engine::capture(&world.realm);
        let x = world.new_box();
        let y = world.new_box();

        let bx = first.fuse(&mut world.realm, x, a).unwrap().bridge;
        let by = second.fuse(&mut world.realm, y, a).unwrap().bridge;
        assert_ne!(bx, by);
        assert_eq!(second.bridge_for(a, world.boxed), by);
    }
}

// ============================================================================
// Re-fusion
// ============================================================================

mod refusion {
    use super::*;

    #[test]
    fn test_refusion_uses_recorded_native_origin() {
        let mut world = HostWorld::new();
        let (a, b, c) = user_chain(&mut world);
        let engine = Engine::capture(&world.realm);
        let obj = world.new_box();

        engine.fuse(&mut world.realm, obj, a).unwrap();
        let origin = world
            .realm
            .get_own_property(Target::Object(obj), &PropertyKey::native_origin())
            .unwrap()
            .unwrap();
        assert_eq!(origin.value(), Some(&Value::Type(world.boxed)));
        assert!(!origin.is_enumerable());

        let composite = engine.fuse(&mut world.realm, obj, c).unwrap();
        assert_eq!(composite.host, world.boxed);
        assert_eq!(composite.identity, Identity::Full);
        for ty in [c, b, a, world.boxed] {
            assert!(engine.is_instance_of(&world.realm, obj, ty));
        }
    }
}

// ============================================================================
// Degraded fusions
// ============================================================================

mod degraded {
    use super::*;

    #[test]
    fn test_sealed_host_gives_partial_identity() {
        let mut world = HostWorld::new();
        let (a, b, _) = user_chain(&mut world);
        world.realm.seal_type(world.boxed).unwrap();
        let engine = Engine::capture(&world.realm);
        let obj = world.new_box();

        let composite = engine.fuse(&mut world.realm, obj, b).unwrap();
        assert_eq!(composite.identity, Identity::Partial);
        assert!(engine.is_instance_of(&world.realm, obj, b));
        assert!(engine.is_instance_of(&world.realm, obj, a));
        assert!(!engine.is_instance_of(&world.realm, obj, world.boxed));
        assert!(engine.diagnostics().contains(DiagnosticCode::SpliceRefused));
        assert_eq!(engine.stats().partial_fusions, 1);

        // The partial bridge is cached like any other
        let again = world.new_box();
        engine.fuse(&mut world.realm, again, b).unwrap();
        assert_eq!(engine.stats().bridges_created, 1);
    }

    #[test]
    fn test_non_extensible_instance_keeps_its_pointer() {
        let mut world = HostWorld::new();
        let (a, _, _) = user_chain(&mut world);
        let engine = Engine::capture(&world.realm);
        let obj = world.new_box();
        world.realm.prevent_extensions(obj).unwrap();

        let composite = engine.fuse(&mut world.realm, obj, a).unwrap();
        assert_eq!(composite.identity, Identity::Unchanged);
        assert_eq!(world.realm.get_prototype_of(obj).unwrap(), Some(world.boxed));
        assert!(engine.diagnostics().contains(DiagnosticCode::RedirectRefused));
        assert!(engine.diagnostics().contains(DiagnosticCode::OriginNotRecorded));
        assert_eq!(engine.stats().unchanged_fusions, 1);
    }

    #[test]
    fn test_revoked_instance_is_a_malformed_pair() {
        let mut world = HostWorld::new();
        let (a, _, _) = user_chain(&mut world);
        let engine = Engine::capture(&world.realm);
        let obj = world.new_box();
        world.realm.revoke(obj).unwrap();

        assert!(matches!(
            engine.fuse(&mut world.realm, obj, a),
            Err(EngineError::MalformedPair(_))
        ));
    }

    #[test]
    fn test_bad_type_arguments() {
        let mut world = HostWorld::new();
        let (a, _, _) = user_chain(&mut world);
        let engine = Engine::capture(&world.realm);
        let obj = world.new_box();
        let plain = world.realm.create_object(a).unwrap();

        assert!(matches!(
            engine.fuse(&mut world.realm, obj, world.boxed),
            Err(EngineError::NotUserType(_))
        ));
        assert!(matches!(
            engine.fuse(&mut world.realm, obj, TypeId(10_000)),
            Err(EngineError::UnknownType(_))
        ));
        assert!(matches!(
            engine.fuse(&mut world.realm, plain, a),
            Err(EngineError::MalformedPair(_))
        ));
        assert_eq!(engine.stats().fusions, 0);
    }
}

// ============================================================================
// Hierarchy immutability
// ============================================================================

mod immutability {
    use super::*;

    #[test]
    fn test_fusion_never_mutates_existing_type_nodes() {
        let mut world = HostWorld::new();
        let (a, b, c) = user_chain(&mut world);
        let watched = [a, b, c, world.node, world.element, world.boxed, world.panel];
        let before: Vec<_> = watched
            .iter()
            .map(|ty| {
                let node = world.realm.type_node(*ty).unwrap();
                (node.parent, node.members.clone(), node.kind.clone())
            })
            .collect();

        let engine = Engine::capture(&world.realm);
        let boxed = world.new_box();
        let panel = world.new_panel();
        engine.fuse(&mut world.realm, boxed, c).unwrap();
        engine.fuse(&mut world.realm, panel, b).unwrap();

        let after: Vec<_> = watched
            .iter()
            .map(|ty| {
                let node = world.realm.type_node(*ty).unwrap();
                (node.parent, node.members.clone(), node.kind.clone())
            })
            .collect();
        assert_eq!(before, after);

        // Plain user instances are unaffected by the splice
        let plain = world.realm.create_object(c).unwrap();
        assert!(!engine.is_instance_of(&world.realm, plain, world.boxed));
    }
}
