//! Shared fixtures for integration tests
//!
//! Host hierarchy: `Object ◄─ Node ◄─ Element ◄─ Box ("box")`, plus
//! `Element ◄─ Panel ("panel")`. Every `box` instance owns `volume = 10`;
//! `Element` declares `click`.

#![allow(dead_code)]

use std::sync::Once;

use chimera_engine::{
    HostClassDef, HostFault, HostTag, ObjectId, Realm, TypeId, Value,
};

static TRACING: Once = Once::new();

/// Route engine logs to the test harness output (`RUST_LOG=debug`)
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub struct HostWorld {
    pub realm: Realm,
    pub node: TypeId,
    pub element: TypeId,
    pub boxed: TypeId,
    pub panel: TypeId,
}

impl HostWorld {
    pub fn new() -> Self {
        init_tracing();
        let mut realm = Realm::new();
        let node = realm
            .register_host_class(HostClassDef::abstract_class("Node"))
            .unwrap();
        let element = realm
            .register_host_class(
                HostClassDef::abstract_class("Element")
                    .extends(node)
                    .method("click", |_, _, _| Ok(Value::from("clicked"))),
            )
            .unwrap();
        let boxed = realm
            .register_host_class(
                HostClassDef::new("box", "Box")
                    .extends(element)
                    .instance_value("volume", 10),
            )
            .unwrap();
        let panel = realm
            .register_host_class(HostClassDef::new("panel", "Panel").extends(element))
            .unwrap();
        Self {
            realm,
            node,
            element,
            boxed,
            panel,
        }
    }

    pub fn new_box(&mut self) -> ObjectId {
        self.realm.create_instance(&HostTag::new("box")).unwrap()
    }

    pub fn new_panel(&mut self) -> ObjectId {
        self.realm.create_instance(&HostTag::new("panel")).unwrap()
    }
}

/// Read a data or accessor property through the realm's ordinary `get`
pub fn read(realm: &mut Realm, obj: ObjectId, key: &str) -> Value {
    realm.get(obj, &key.into()).unwrap()
}

/// Host function returning a fixed value
pub fn constant(name: &str, value: &'static str) -> chimera_engine::Function {
    chimera_engine::Function::new(name, move |_, _, _| Ok(Value::from(value)))
}

/// Host function that always raises
pub fn thrower(name: &str) -> chimera_engine::Function {
    let message = format!("{name} threw");
    chimera_engine::Function::new(name, move |_, _, _| Err(HostFault::Thrown(message.clone())))
}
