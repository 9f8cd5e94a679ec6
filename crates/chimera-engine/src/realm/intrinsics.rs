//! Realm intrinsics
//!
//! The table of foundational operations the host exposes to code running
//! against it. The table is plain data: host code may overwrite any entry at
//! any time (`realm.intrinsics_mut().own_keys = ...`), which is how a hostile
//! environment tampers with reflection. Consumers that need trustworthy
//! primitives copy the table once, before untrusted code runs, and never
//! consult the realm's live table again.

use super::property::{PropertyDescriptor, PropertyKey};
use super::value::{Function, Value};
use super::{HostTag, ObjectId, Realm, Splice, Target, TypeId, TypeLink};
use crate::error::HostResult;

/// Read an object's hierarchy pointer
pub type GetPrototypeFn = fn(&Realm, ObjectId) -> HostResult<Option<TypeId>>;
/// Redirect an object's hierarchy pointer
pub type SetPrototypeFn = fn(&mut Realm, ObjectId, TypeId) -> HostResult<()>;
/// Read a type node's link
pub type TypeLinkFn = fn(&Realm, TypeId) -> HostResult<TypeLink>;
/// Enumerate own string and symbol keys
pub type OwnKeysFn = fn(&Realm, Target) -> HostResult<Vec<PropertyKey>>;
/// Read an own property descriptor
pub type GetOwnPropertyFn =
    fn(&Realm, Target, &PropertyKey) -> HostResult<Option<PropertyDescriptor>>;
/// Define an own property on an object
pub type DefineOwnPropertyFn =
    fn(&mut Realm, ObjectId, PropertyKey, PropertyDescriptor) -> HostResult<()>;
/// Ordinary property read (invokes getters)
pub type GetFn = fn(&mut Realm, ObjectId, &PropertyKey) -> HostResult<Value>;
/// Ordinary property write (invokes setters)
pub type SetFn = fn(&mut Realm, ObjectId, PropertyKey, Value) -> HostResult<bool>;
/// Call a function
pub type CallFn = fn(&mut Realm, &Function, &Value, &[Value]) -> HostResult<Value>;
/// Read an object's host tag
pub type TagOfFn = fn(&Realm, ObjectId) -> HostResult<HostTag>;
/// Create a fresh instance of a host tag
pub type CreateInstanceFn = fn(&mut Realm, &HostTag) -> HostResult<ObjectId>;
/// Discard an object
pub type DisposeFn = fn(&mut Realm, ObjectId) -> HostResult<()>;
/// Derive a new bridge node from a user type
pub type DeriveBridgeFn = fn(&mut Realm, TypeId, Option<Splice>) -> HostResult<TypeId>;

/// Table of foundational realm operations
#[derive(Clone, Copy)]
pub struct Intrinsics {
    /// Read an object's hierarchy pointer
    pub get_prototype_of: GetPrototypeFn,
    /// Redirect an object's hierarchy pointer
    pub set_prototype_of: SetPrototypeFn,
    /// Read a type node's link
    pub type_link: TypeLinkFn,
    /// Enumerate own keys
    pub own_keys: OwnKeysFn,
    /// Read an own property descriptor
    pub get_own_property: GetOwnPropertyFn,
    /// Define an own property
    pub define_own_property: DefineOwnPropertyFn,
    /// Ordinary property read
    pub get: GetFn,
    /// Ordinary property write
    pub set: SetFn,
    /// Call a function
    pub call: CallFn,
    /// Read an object's host tag
    pub tag_of: TagOfFn,
    /// Create a fresh instance of a host tag
    pub create_instance: CreateInstanceFn,
    /// Discard an object
    pub dispose: DisposeFn,
    /// Derive a bridge node
    pub derive_bridge: DeriveBridgeFn,
}

impl Intrinsics {
    /// The realm's own, untampered operations
    pub fn genuine() -> Self {
        Self {
            get_prototype_of: Realm::get_prototype_of,
            set_prototype_of: Realm::set_prototype_of,
            type_link: Realm::type_link,
            own_keys: Realm::own_keys,
            get_own_property: Realm::get_own_property,
            define_own_property: Realm::define_own_property,
            get: Realm::get,
            set: Realm::set,
            call: Realm::call,
            tag_of: Realm::tag_of,
            create_instance: Realm::create_instance,
            dispose: Realm::dispose,
            derive_bridge: Realm::derive_bridge,
        }
    }
}

impl Default for Intrinsics {
    fn default() -> Self {
        Self::genuine()
    }
}

impl std::fmt::Debug for Intrinsics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Intrinsics").finish_non_exhaustive()
    }
}
