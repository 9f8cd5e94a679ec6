//! Class definitions
//!
//! Builders for the two kinds of hierarchy a realm holds: user classes
//! authored by the embedding application, and host classes registered by
//! the host at integration time.
//!
//! ```rust,ignore
//! let base = realm.define_class(ClassDef::new("Base").value("x", 1))?;
//! let leaf = realm.define_class(
//!     ClassDef::new("Leaf")
//!         .extends(base)
//!         .method("greet", |_, _, _| Ok(Value::from("hi"))),
//! )?;
//! ```

use super::property::{PropertyDescriptor, PropertyKey, PropertyMap};
use super::value::{Function, Value};
use super::{HostTag, Realm, TypeId};
use crate::error::HostResult;

/// Definition of a class (user or host prototype side)
#[derive(Debug, Clone)]
pub struct ClassDef {
    /// Class name (display only, never used as identity)
    pub name: String,
    /// Parent class, if any
    pub parent: Option<TypeId>,
    /// Own members declared by this class
    pub members: PropertyMap,
}

impl ClassDef {
    /// Create a new class definition with no parent and no members
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            members: PropertyMap::default(),
        }
    }

    /// Set the parent class
    pub fn extends(mut self, parent: TypeId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Add a member with an explicit descriptor
    pub fn member(mut self, key: impl Into<PropertyKey>, descriptor: PropertyDescriptor) -> Self {
        self.members.insert(key.into(), descriptor);
        self
    }

    /// Add a plain data member
    pub fn value(self, key: impl Into<PropertyKey>, value: impl Into<Value>) -> Self {
        self.member(key, PropertyDescriptor::data(value))
    }

    /// Add a method
    pub fn method<F>(self, name: &str, body: F) -> Self
    where
        F: Fn(&mut Realm, &Value, &[Value]) -> HostResult<Value> + Send + Sync + 'static,
    {
        self.member(name, PropertyDescriptor::method(Function::new(name, body)))
    }

    /// Add an accessor member
    pub fn accessor(self, name: &str, get: Option<Function>, set: Option<Function>) -> Self {
        self.member(name, PropertyDescriptor::accessor(get, set))
    }
}

/// Definition of a host class
#[derive(Debug, Clone)]
pub struct HostClassDef {
    /// Tag instances are created with; abstract classes have none
    pub tag: Option<HostTag>,
    /// Prototype side of the class
    pub class: ClassDef,
    /// Own properties every fresh instance of the tag receives
    pub instance_template: PropertyMap,
}

impl HostClassDef {
    /// Create an instantiable host class for `tag`
    pub fn new(tag: &str, name: &str) -> Self {
        Self {
            tag: Some(HostTag::new(tag)),
            class: ClassDef::new(name),
            instance_template: PropertyMap::default(),
        }
    }

    /// Create a host class that cannot be instantiated directly
    pub fn abstract_class(name: &str) -> Self {
        Self {
            tag: None,
            class: ClassDef::new(name),
            instance_template: PropertyMap::default(),
        }
    }

    /// Set the parent host class
    pub fn extends(mut self, parent: TypeId) -> Self {
        self.class.parent = Some(parent);
        self
    }

    /// Add a prototype member
    pub fn member(mut self, key: impl Into<PropertyKey>, descriptor: PropertyDescriptor) -> Self {
        self.class.members.insert(key.into(), descriptor);
        self
    }

    /// Add a prototype method
    pub fn method<F>(mut self, name: &str, body: F) -> Self
    where
        F: Fn(&mut Realm, &Value, &[Value]) -> HostResult<Value> + Send + Sync + 'static,
    {
        self.class = self.class.method(name, body);
        self
    }

    /// Add an own property every instance starts with
    pub fn instance_member(
        mut self,
        key: impl Into<PropertyKey>,
        descriptor: PropertyDescriptor,
    ) -> Self {
        self.instance_template.insert(key.into(), descriptor);
        self
    }

    /// Add a plain data property every instance starts with
    pub fn instance_value(self, key: impl Into<PropertyKey>, value: impl Into<Value>) -> Self {
        self.instance_member(key, PropertyDescriptor::data(value))
    }
}
