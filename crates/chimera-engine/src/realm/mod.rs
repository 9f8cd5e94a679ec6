//! Host realm
//!
//! The object world the engine is embedded into. A realm owns:
//! - **type nodes**: the universal object root, host classes, user classes
//!   and bridge types, all addressed by [`TypeId`]
//! - **objects**: instances addressed by [`ObjectId`], each with a
//!   hierarchy pointer, own properties and extensibility state
//! - **intrinsics**: the tamperable table of foundational operations
//!
//! Every raw operation here is fallible and reports a [`HostFault`]. The
//! realm also models a hostile host: objects and type nodes can be revoked,
//! objects frozen, host parent links rewired, and intrinsics replaced.
//!
//! Type nodes are immutable once created, with one exception: the host may
//! rewire the parent link of its own classes ([`Realm::set_host_parent`]).

mod class;
mod intrinsics;
mod property;
mod value;
mod walk;

pub use class::{ClassDef, HostClassDef};
pub use intrinsics::{
    CallFn, CreateInstanceFn, DefineOwnPropertyFn, DeriveBridgeFn, DisposeFn, GetFn,
    GetOwnPropertyFn, GetPrototypeFn, Intrinsics, OwnKeysFn, SetFn, SetPrototypeFn, TagOfFn,
    TypeLinkFn,
};
pub use property::{PropertyDescriptor, PropertyKey, PropertyKind, PropertyMap, SymbolId};
pub use value::{Function, NativeFn, Value};
pub use walk::{walk_ancestry, Ancestry, WalkStop, DEFAULT_MAX_DEPTH};

use std::fmt;

use rustc_hash::FxHashMap;

use crate::error::{HostFault, HostResult};

// ============================================================================
// Identifiers
// ============================================================================

/// Identity of an object in a realm
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of a type node in a realm
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(pub u32);

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// Tag a host class is instantiated by (e.g. `"box"`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HostTag(String);

impl HostTag {
    /// Create a tag
    pub fn new(tag: &str) -> Self {
        Self(tag.to_string())
    }

    /// Tag text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Property-bearing target: an object or a type node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// An instance
    Object(ObjectId),
    /// A type node's members
    Type(TypeId),
}

// ============================================================================
// Type nodes
// ============================================================================

/// Splice point of a bridge: leaving `junction` continues at `host`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Splice {
    /// Last node of the user chain before the universal root
    pub junction: TypeId,
    /// Host type the chain continues with
    pub host: TypeId,
}

/// Which hierarchy a type node belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeOrigin {
    /// The universal object root
    Root,
    /// Host-owned class
    Host,
    /// User-authored class
    User,
    /// Synthetic bridge
    Bridge,
}

/// What a type node is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    /// The universal object root
    Root,
    /// Host-owned class, optionally instantiable by tag
    Host {
        /// Instantiation tag
        tag: Option<HostTag>,
    },
    /// User-authored class
    User,
    /// Synthetic subtype of `base`, spliced onto a host hierarchy
    Bridge {
        /// User type this bridge derives from
        base: TypeId,
        /// Host splice; `None` for an unspliced (partial) bridge
        splice: Option<Splice>,
    },
}

impl TypeKind {
    /// Hierarchy this kind belongs to
    pub fn origin(&self) -> TypeOrigin {
        match self {
            Self::Root => TypeOrigin::Root,
            Self::Host { .. } => TypeOrigin::Host,
            Self::User => TypeOrigin::User,
            Self::Bridge { .. } => TypeOrigin::Bridge,
        }
    }
}

/// Ancestry data of one type node, as read by walkers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeLink {
    /// Hierarchy of the node
    pub origin: TypeOrigin,
    /// Parent node
    pub parent: Option<TypeId>,
    /// Splice carried by a bridge node
    pub splice: Option<Splice>,
}

/// A type node
#[derive(Debug, Clone)]
pub struct TypeNode {
    /// Identity
    pub id: TypeId,
    /// Display name
    pub name: String,
    /// Kind
    pub kind: TypeKind,
    /// Parent node
    pub parent: Option<TypeId>,
    /// Own members
    pub members: PropertyMap,
    /// Refuses to be spliced under a bridge
    pub sealed: bool,
    /// Every reflective operation fails
    pub revoked: bool,
}

impl TypeNode {
    fn link(&self) -> TypeLink {
        let splice = match &self.kind {
            TypeKind::Bridge { splice, .. } => *splice,
            _ => None,
        };
        TypeLink {
            origin: self.kind.origin(),
            parent: self.parent,
            splice,
        }
    }
}

// ============================================================================
// Objects
// ============================================================================

/// An object in the realm
#[derive(Debug, Clone)]
pub struct HostObject {
    /// Identity
    pub id: ObjectId,
    /// Host tag; `None` for ordinary objects
    pub tag: Option<HostTag>,
    /// Hierarchy pointer
    pub proto: Option<TypeId>,
    /// Own properties
    pub properties: PropertyMap,
    /// Whether new properties may be added and the pointer changed
    pub extensible: bool,
    /// Every operation except get/set fails
    pub revoked: bool,
}

// ============================================================================
// Realm
// ============================================================================

/// An object world with host and user hierarchies
#[derive(Debug)]
pub struct Realm {
    types: Vec<TypeNode>,
    objects: FxHashMap<ObjectId, HostObject>,
    tags: FxHashMap<HostTag, TypeId>,
    templates: FxHashMap<TypeId, PropertyMap>,
    next_object: u64,
    next_symbol: u32,
    intrinsics: Intrinsics,
}

impl Default for Realm {
    fn default() -> Self {
        Self::new()
    }
}

impl Realm {
    /// Create a realm holding only the universal object root
    pub fn new() -> Self {
        let root = TypeNode {
            id: TypeId(0),
            name: "Object".to_string(),
            kind: TypeKind::Root,
            parent: None,
            members: PropertyMap::default(),
            sealed: false,
            revoked: false,
        };
        Self {
            types: vec![root],
            objects: FxHashMap::default(),
            tags: FxHashMap::default(),
            templates: FxHashMap::default(),
            next_object: 1,
            next_symbol: SymbolId::FIRST_USER,
            intrinsics: Intrinsics::genuine(),
        }
    }

    /// The universal object root
    pub fn object_root(&self) -> TypeId {
        TypeId(0)
    }

    /// Allocate a fresh symbol
    pub fn new_symbol(&mut self) -> SymbolId {
        let id = SymbolId(self.next_symbol);
        self.next_symbol += 1;
        id
    }

    /// Live intrinsics table
    pub fn intrinsics(&self) -> &Intrinsics {
        &self.intrinsics
    }

    /// Mutable intrinsics table (host code may tamper with it)
    pub fn intrinsics_mut(&mut self) -> &mut Intrinsics {
        &mut self.intrinsics
    }

    // ===== Type definition =====

    fn push_type(
        &mut self,
        name: String,
        kind: TypeKind,
        parent: Option<TypeId>,
        members: PropertyMap,
    ) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(TypeNode {
            id,
            name,
            kind,
            parent,
            members,
            sealed: false,
            revoked: false,
        });
        id
    }

    fn node(&self, ty: TypeId) -> HostResult<&TypeNode> {
        self.types
            .get(ty.0 as usize)
            .ok_or(HostFault::UnknownType(ty))
    }

    fn live_node(&self, ty: TypeId) -> HostResult<&TypeNode> {
        let node = self.node(ty)?;
        if node.revoked {
            return Err(HostFault::RevokedType(ty));
        }
        Ok(node)
    }

    /// Register a host class. Its parent must be a host class or the root.
    pub fn register_host_class(&mut self, def: HostClassDef) -> HostResult<TypeId> {
        let parent = def.class.parent.unwrap_or(self.object_root());
        match self.node(parent)?.kind {
            TypeKind::Root | TypeKind::Host { .. } => {}
            _ => {
                return Err(HostFault::InvalidHierarchy(format!(
                    "host class '{}' cannot extend non-host type {}",
                    def.class.name, parent
                )))
            }
        }
        if let Some(tag) = &def.tag {
            if self.tags.contains_key(tag) {
                return Err(HostFault::DuplicateTag(tag.to_string()));
            }
        }

        let id = self.push_type(
            def.class.name,
            TypeKind::Host {
                tag: def.tag.clone(),
            },
            Some(parent),
            def.class.members,
        );
        if let Some(tag) = def.tag {
            self.tags.insert(tag, id);
            self.templates.insert(id, def.instance_template);
        }
        Ok(id)
    }

    /// Define a user class. Its parent must be a user class; a class with
    /// no parent extends the universal root.
    pub fn define_class(&mut self, def: ClassDef) -> HostResult<TypeId> {
        let parent = match def.parent {
            Some(parent) => {
                if self.node(parent)?.kind != TypeKind::User {
                    return Err(HostFault::InvalidHierarchy(format!(
                        "user class '{}' cannot extend non-user type {}",
                        def.name, parent
                    )));
                }
                parent
            }
            None => self.object_root(),
        };
        Ok(self.push_type(def.name, TypeKind::User, Some(parent), def.members))
    }

    /// Derive a new, empty subtype of the user type `base`, optionally
    /// spliced onto a host hierarchy. No existing node is modified.
    pub fn derive_bridge(&mut self, base: TypeId, splice: Option<Splice>) -> HostResult<TypeId> {
        let base_node = self.live_node(base)?;
        if base_node.kind != TypeKind::User {
            return Err(HostFault::InvalidHierarchy(format!(
                "bridge base {base} is not a user type"
            )));
        }
        let mut name = base_node.name.clone();

        if let Some(splice) = splice {
            let host = self.live_node(splice.host)?;
            if !matches!(host.kind, TypeKind::Host { .. }) {
                return Err(HostFault::InvalidHierarchy(format!(
                    "splice target {} is not a host type",
                    splice.host
                )));
            }
            if host.sealed {
                return Err(HostFault::SealedType(splice.host));
            }
            name = format!("{name}<{}>", host.name);
        }

        Ok(self.push_type(
            name,
            TypeKind::Bridge { base, splice },
            Some(base),
            PropertyMap::default(),
        ))
    }

    /// Look up a type node (trusted, structural read)
    pub fn type_node(&self, ty: TypeId) -> Option<&TypeNode> {
        self.types.get(ty.0 as usize)
    }

    /// All type nodes with the given display name
    pub fn find_types_by_name(&self, name: &str) -> Vec<TypeId> {
        self.types
            .iter()
            .filter(|node| node.name == name)
            .map(|node| node.id)
            .collect()
    }

    /// Host class registered for a tag
    pub fn host_class(&self, tag: &str) -> Option<TypeId> {
        self.tags.get(&HostTag::new(tag)).copied()
    }

    /// Number of type nodes, including the root
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Read the ancestry link of a type node
    pub fn type_link(&self, ty: TypeId) -> HostResult<TypeLink> {
        Ok(self.live_node(ty)?.link())
    }

    /// Walk a type's ancestry with the realm's own links
    pub fn ancestry(&self, ty: TypeId) -> Ancestry {
        walk_ancestry(ty, DEFAULT_MAX_DEPTH, |t| self.type_link(t).ok())
    }

    // ===== Hostile host behavior =====

    /// Rewire the parent of a host class. Cycles are allowed.
    pub fn set_host_parent(&mut self, ty: TypeId, parent: TypeId) -> HostResult<()> {
        self.node(parent)?;
        let node = self
            .types
            .get_mut(ty.0 as usize)
            .ok_or(HostFault::UnknownType(ty))?;
        if !matches!(node.kind, TypeKind::Host { .. }) {
            return Err(HostFault::InvalidHierarchy(format!(
                "only host classes can be rewired, {ty} is not one"
            )));
        }
        node.parent = Some(parent);
        Ok(())
    }

    /// Refuse future splices onto this host class
    pub fn seal_type(&mut self, ty: TypeId) -> HostResult<()> {
        let node = self
            .types
            .get_mut(ty.0 as usize)
            .ok_or(HostFault::UnknownType(ty))?;
        node.sealed = true;
        Ok(())
    }

    /// Make every reflective operation on the type fail
    pub fn revoke_type(&mut self, ty: TypeId) -> HostResult<()> {
        let node = self
            .types
            .get_mut(ty.0 as usize)
            .ok_or(HostFault::UnknownType(ty))?;
        node.revoked = true;
        Ok(())
    }

    /// Make every operation on the object except get/set fail
    pub fn revoke(&mut self, obj: ObjectId) -> HostResult<()> {
        self.objects
            .get_mut(&obj)
            .ok_or(HostFault::UnknownObject(obj))?
            .revoked = true;
        Ok(())
    }

    /// Forbid new properties and pointer changes
    pub fn prevent_extensions(&mut self, obj: ObjectId) -> HostResult<()> {
        self.live_object_mut(obj)?.extensible = false;
        Ok(())
    }

    /// Prevent extensions and lock every own property
    pub fn freeze(&mut self, obj: ObjectId) -> HostResult<()> {
        let object = self.live_object_mut(obj)?;
        object.extensible = false;
        for descriptor in object.properties.values_mut() {
            *descriptor = descriptor.clone().locked().read_only();
        }
        Ok(())
    }

    // ===== Objects =====

    fn allocate(&mut self, tag: Option<HostTag>, proto: TypeId, properties: PropertyMap) -> ObjectId {
        let id = ObjectId(self.next_object);
        self.next_object += 1;
        self.objects.insert(
            id,
            HostObject {
                id,
                tag,
                proto: Some(proto),
                properties,
                extensible: true,
                revoked: false,
            },
        );
        id
    }

    fn live_object(&self, obj: ObjectId) -> HostResult<&HostObject> {
        let object = self.objects.get(&obj).ok_or(HostFault::UnknownObject(obj))?;
        if object.revoked {
            return Err(HostFault::RevokedObject(obj));
        }
        Ok(object)
    }

    fn live_object_mut(&mut self, obj: ObjectId) -> HostResult<&mut HostObject> {
        let object = self
            .objects
            .get_mut(&obj)
            .ok_or(HostFault::UnknownObject(obj))?;
        if object.revoked {
            return Err(HostFault::RevokedObject(obj));
        }
        Ok(object)
    }

    /// Create an instance of a host tag, populated from its template
    pub fn create_instance(&mut self, tag: &HostTag) -> HostResult<ObjectId> {
        let class = *self
            .tags
            .get(tag)
            .ok_or_else(|| HostFault::UnknownTag(tag.to_string()))?;
        let properties = self.templates.get(&class).cloned().unwrap_or_default();
        Ok(self.allocate(Some(tag.clone()), class, properties))
    }

    /// Create an untagged object pointing at `proto`
    pub fn create_object(&mut self, proto: TypeId) -> HostResult<ObjectId> {
        self.node(proto)?;
        Ok(self.allocate(None, proto, PropertyMap::default()))
    }

    /// Discard an object
    pub fn dispose(&mut self, obj: ObjectId) -> HostResult<()> {
        self.live_object(obj)?;
        self.objects.remove(&obj);
        Ok(())
    }

    /// Check if an object exists (revoked objects included)
    pub fn contains(&self, obj: ObjectId) -> bool {
        self.objects.contains_key(&obj)
    }

    /// Number of live objects
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Read an object's host tag
    pub fn tag_of(&self, obj: ObjectId) -> HostResult<HostTag> {
        self.live_object(obj)?
            .tag
            .clone()
            .ok_or(HostFault::NoHostTag(obj))
    }

    /// Read an object's hierarchy pointer
    pub fn get_prototype_of(&self, obj: ObjectId) -> HostResult<Option<TypeId>> {
        Ok(self.live_object(obj)?.proto)
    }

    /// Redirect an object's hierarchy pointer
    pub fn set_prototype_of(&mut self, obj: ObjectId, proto: TypeId) -> HostResult<()> {
        self.node(proto)?;
        let object = self.live_object_mut(obj)?;
        if object.proto == Some(proto) {
            return Ok(());
        }
        if !object.extensible {
            return Err(HostFault::NotExtensible(obj));
        }
        object.proto = Some(proto);
        Ok(())
    }

    /// Check structural membership: `ty` is on the object's ancestry
    pub fn instance_of(&self, obj: ObjectId, ty: TypeId) -> HostResult<bool> {
        match self.get_prototype_of(obj)? {
            Some(proto) => Ok(self.ancestry(proto).contains(ty)),
            None => Ok(false),
        }
    }

    // ===== Properties =====

    fn properties_of(&self, target: Target) -> HostResult<&PropertyMap> {
        match target {
            Target::Object(obj) => Ok(&self.live_object(obj)?.properties),
            Target::Type(ty) => Ok(&self.live_node(ty)?.members),
        }
    }

    /// Own keys: string keys in insertion order, then symbol keys
    pub fn own_keys(&self, target: Target) -> HostResult<Vec<PropertyKey>> {
        let properties = self.properties_of(target)?;
        let strings = properties.keys().filter(|k| !k.is_symbol());
        let symbols = properties.keys().filter(|k| k.is_symbol());
        Ok(strings.chain(symbols).cloned().collect())
    }

    /// Read an own property descriptor
    pub fn get_own_property(
        &self,
        target: Target,
        key: &PropertyKey,
    ) -> HostResult<Option<PropertyDescriptor>> {
        Ok(self.properties_of(target)?.get(key).cloned())
    }

    /// Define (or redefine) an own property on an object
    pub fn define_own_property(
        &mut self,
        obj: ObjectId,
        key: PropertyKey,
        descriptor: PropertyDescriptor,
    ) -> HostResult<()> {
        let object = self.live_object_mut(obj)?;
        match object.properties.get(&key) {
            Some(existing) if !existing.is_configurable() => {
                if *existing == descriptor {
                    return Ok(());
                }
                Err(HostFault::NonConfigurable { key })
            }
            Some(_) => {
                object.properties.insert(key, descriptor);
                Ok(())
            }
            None if !object.extensible => Err(HostFault::NotExtensible(obj)),
            None => {
                object.properties.insert(key, descriptor);
                Ok(())
            }
        }
    }

    /// Find a property on the object or along its ancestry
    fn lookup(&self, obj: ObjectId, key: &PropertyKey) -> Option<(PropertyDescriptor, bool)> {
        let object = self.objects.get(&obj)?;
        if let Some(descriptor) = object.properties.get(key) {
            return Some((descriptor.clone(), true));
        }
        let proto = object.proto?;
        self.ancestry(proto)
            .chain
            .into_iter()
            .filter_map(|ty| self.type_node(ty))
            .find_map(|node| node.members.get(key).cloned())
            .map(|descriptor| (descriptor, false))
    }

    /// Ordinary property read; invokes getters with the object as `this`.
    /// Revoked objects read as `undefined`.
    pub fn get(&mut self, obj: ObjectId, key: &PropertyKey) -> HostResult<Value> {
        match self.objects.get(&obj) {
            None => return Err(HostFault::UnknownObject(obj)),
            Some(object) if object.revoked => return Ok(Value::Undefined),
            Some(_) => {}
        }
        match self.lookup(obj, key) {
            Some((PropertyDescriptor::Data { value, .. }, _)) => Ok(value),
            Some((PropertyDescriptor::Accessor { get: Some(getter), .. }, _)) => {
                getter.call(self, &Value::Object(obj), &[])
            }
            Some((PropertyDescriptor::Accessor { get: None, .. }, _)) | None => Ok(Value::Undefined),
        }
    }

    /// Ordinary property write; invokes setters with the object as `this`.
    /// Returns `false` when the write is refused. Revoked objects refuse
    /// every write.
    pub fn set(&mut self, obj: ObjectId, key: PropertyKey, value: Value) -> HostResult<bool> {
        match self.objects.get(&obj) {
            None => return Err(HostFault::UnknownObject(obj)),
            Some(object) if object.revoked => return Ok(false),
            Some(_) => {}
        }
        match self.lookup(obj, &key) {
            Some((PropertyDescriptor::Accessor { set: Some(setter), .. }, _)) => {
                setter.call(self, &Value::Object(obj), &[value])?;
                Ok(true)
            }
            Some((PropertyDescriptor::Accessor { set: None, .. }, _)) => Ok(false),
            Some((PropertyDescriptor::Data { writable: false, .. }, _)) => Ok(false),
            Some((PropertyDescriptor::Data { writable: true, .. }, true)) => {
                let object = self.live_object_mut(obj)?;
                if let Some(PropertyDescriptor::Data { value: slot, .. }) =
                    object.properties.get_mut(&key)
                {
                    *slot = value;
                }
                Ok(true)
            }
            Some((PropertyDescriptor::Data { writable: true, .. }, false)) | None => {
                match self.define_own_property(obj, key, PropertyDescriptor::data(value)) {
                    Ok(()) => Ok(true),
                    Err(HostFault::NotExtensible(_)) => Ok(false),
                    Err(fault) => Err(fault),
                }
            }
        }
    }

    /// Call a function
    pub fn call(&mut self, func: &Function, this: &Value, args: &[Value]) -> HostResult<Value> {
        func.call(self, this, args)
    }
}
