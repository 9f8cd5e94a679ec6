//! Property records and the per-policy conflict rules

use crate::policy::StrictnessPolicy;
use crate::realm::{Function, PropertyDescriptor, PropertyKey, PropertyKind, TypeId, Value};

/// Value side of a record
#[derive(Debug, Clone, PartialEq)]
pub enum RecordKind {
    /// Value + writable flag
    Data {
        /// Stored value
        value: Value,
        /// Whether assignments are allowed
        writable: bool,
    },
    /// Getter/setter halves
    Accessor {
        /// Getter half
        get: Option<Function>,
        /// Setter half
        set: Option<Function>,
    },
}

/// Merge state of one key
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyRecord {
    /// Property key
    pub key: PropertyKey,
    /// Value side
    pub kind: RecordKind,
    /// Shows up in enumeration
    pub enumerable: bool,
    /// Committed as non-configurable
    pub lockable: bool,
    /// Some contributing level declared the key read-only
    pub read_only: bool,
    /// Level that last contributed to the record
    pub origin: TypeId,
}

impl PropertyRecord {
    /// Classify a declared descriptor
    pub fn from_descriptor(key: PropertyKey, descriptor: PropertyDescriptor, origin: TypeId) -> Self {
        match descriptor {
            PropertyDescriptor::Data {
                value,
                writable,
                enumerable,
                configurable,
            } => Self {
                key,
                kind: RecordKind::Data { value, writable },
                enumerable,
                lockable: !configurable,
                read_only: !writable,
                origin,
            },
            PropertyDescriptor::Accessor {
                get,
                set,
                enumerable,
                configurable,
            } => Self {
                key,
                kind: RecordKind::Accessor { get, set },
                enumerable,
                lockable: !configurable,
                read_only: false,
                origin,
            },
        }
    }

    /// Descriptor to commit: configurable exactly when not lockable
    pub fn to_descriptor(&self) -> PropertyDescriptor {
        match &self.kind {
            RecordKind::Data { value, writable } => PropertyDescriptor::Data {
                value: value.clone(),
                writable: *writable,
                enumerable: self.enumerable,
                configurable: !self.lockable,
            },
            RecordKind::Accessor { get, set } => PropertyDescriptor::Accessor {
                get: get.clone(),
                set: set.clone(),
                enumerable: self.enumerable,
                configurable: !self.lockable,
            },
        }
    }

    /// Data or accessor
    pub fn property_kind(&self) -> PropertyKind {
        match self.kind {
            RecordKind::Data { .. } => PropertyKind::Data,
            RecordKind::Accessor { .. } => PropertyKind::Accessor,
        }
    }
}

/// What happened to an incoming definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Merged into the record
    Accepted,
    /// Merged, replacing a definition of the other kind
    KindChanged,
    /// Dropped; the existing record is kept
    Rejected,
}

/// Merge a more-derived definition into the running record for its key
pub fn resolve(
    policy: StrictnessPolicy,
    current: &PropertyRecord,
    incoming: PropertyRecord,
) -> (PropertyRecord, Resolution) {
    if policy == StrictnessPolicy::Flexible {
        return (incoming, Resolution::Accepted);
    }
    let guarded = policy == StrictnessPolicy::Strictest && current.lockable;
    if guarded {
        return (current.clone(), Resolution::Rejected);
    }

    let lockable = current.lockable || incoming.lockable;
    let read_only = current.read_only || incoming.read_only;
    match (&current.kind, incoming.kind) {
        (RecordKind::Data { .. }, RecordKind::Data { value, writable }) => {
            let merged = PropertyRecord {
                kind: RecordKind::Data {
                    value,
                    writable: writable && !read_only,
                },
                lockable,
                read_only,
                ..incoming
            };
            (merged, Resolution::Accepted)
        }
        (RecordKind::Accessor { get: old_get, set: old_set }, RecordKind::Accessor { get, set }) => {
            let merged = PropertyRecord {
                kind: RecordKind::Accessor {
                    get: get.or_else(|| old_get.clone()),
                    set: set.or_else(|| old_set.clone()),
                },
                lockable,
                read_only,
                ..incoming
            };
            (merged, Resolution::Accepted)
        }
        (_, kind) => {
            // A read-only level anywhere below still pins a later data definition
            let kind = match kind {
                RecordKind::Data { value, writable } => RecordKind::Data {
                    value,
                    writable: writable && !read_only,
                },
                accessor => accessor,
            };
            let merged = PropertyRecord {
                kind,
                lockable,
                read_only,
                ..incoming
            };
            (merged, Resolution::KindChanged)
        }
    }
}
