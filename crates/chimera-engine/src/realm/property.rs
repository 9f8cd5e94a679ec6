//! Property keys and descriptors
//!
//! A property is either a data property (value + writable flag) or an
//! accessor property (optional getter/setter pair). Both carry the
//! `enumerable` and `configurable` attributes.

use std::fmt;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use super::value::{Function, Value};

/// Insertion-ordered property table
pub type PropertyMap = IndexMap<PropertyKey, PropertyDescriptor, FxBuildHasher>;

/// Unique symbol identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(pub u32);

impl SymbolId {
    /// Slot recording the host type an instance was created with
    pub const NATIVE_ORIGIN: Self = Self(0);

    /// First id handed out by [`Realm::new_symbol`](super::Realm::new_symbol).
    /// Everything below is reserved for the engine.
    pub const FIRST_USER: u32 = 16;

    /// Check if this symbol is one of the engine-internal slots
    pub const fn is_internal(&self) -> bool {
        self.0 < Self::FIRST_USER
    }
}

/// A property key: either a string or a symbol
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PropertyKey {
    /// String key
    String(String),
    /// Symbol key
    Symbol(SymbolId),
}

impl PropertyKey {
    /// Key of the native-origin slot
    pub const fn native_origin() -> Self {
        Self::Symbol(SymbolId::NATIVE_ORIGIN)
    }

    /// Get the key as a string slice, if it is a string key
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Symbol(_) => None,
        }
    }

    /// Check if this is a symbol key
    pub fn is_symbol(&self) -> bool {
        matches!(self, Self::Symbol(_))
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Symbol(id) => write!(f, "Symbol({})", id.0),
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<SymbolId> for PropertyKey {
    fn from(id: SymbolId) -> Self {
        Self::Symbol(id)
    }
}

/// Whether a descriptor holds a value or an accessor pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    /// Value + writable flag
    Data,
    /// Getter and/or setter
    Accessor,
}

/// Full description of a property
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyDescriptor {
    /// Data descriptor
    Data {
        /// Stored value
        value: Value,
        /// Whether assignments are allowed
        writable: bool,
        /// Whether the key shows up in enumeration
        enumerable: bool,
        /// Whether the property may be redefined or deleted
        configurable: bool,
    },
    /// Accessor descriptor
    Accessor {
        /// Getter, called with the receiver as `this`
        get: Option<Function>,
        /// Setter, called with the receiver as `this` and the new value
        set: Option<Function>,
        /// Whether the key shows up in enumeration
        enumerable: bool,
        /// Whether the property may be redefined or deleted
        configurable: bool,
    },
}

impl PropertyDescriptor {
    /// Writable, enumerable, configurable data descriptor
    pub fn data(value: impl Into<Value>) -> Self {
        Self::Data {
            value: value.into(),
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// Non-writable, non-enumerable, non-configurable data descriptor
    pub fn frozen(value: impl Into<Value>) -> Self {
        Self::Data {
            value: value.into(),
            writable: false,
            enumerable: false,
            configurable: false,
        }
    }

    /// Method-style descriptor: writable, non-enumerable, configurable
    pub fn method(function: Function) -> Self {
        Self::Data {
            value: Value::Function(function),
            writable: true,
            enumerable: false,
            configurable: true,
        }
    }

    /// Enumerable, configurable accessor descriptor
    pub fn accessor(get: Option<Function>, set: Option<Function>) -> Self {
        Self::Accessor {
            get,
            set,
            enumerable: true,
            configurable: true,
        }
    }

    /// Builder: make non-writable (no-op for accessors)
    pub fn read_only(mut self) -> Self {
        if let Self::Data { writable, .. } = &mut self {
            *writable = false;
        }
        self
    }

    /// Builder: make non-configurable
    pub fn locked(mut self) -> Self {
        match &mut self {
            Self::Data { configurable, .. } | Self::Accessor { configurable, .. } => {
                *configurable = false;
            }
        }
        self
    }

    /// Builder: make non-enumerable
    pub fn hidden(mut self) -> Self {
        match &mut self {
            Self::Data { enumerable, .. } | Self::Accessor { enumerable, .. } => {
                *enumerable = false;
            }
        }
        self
    }

    /// Data or accessor
    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::Data { .. } => PropertyKind::Data,
            Self::Accessor { .. } => PropertyKind::Accessor,
        }
    }

    /// Is this descriptor configurable?
    pub fn is_configurable(&self) -> bool {
        match self {
            Self::Data { configurable, .. } | Self::Accessor { configurable, .. } => *configurable,
        }
    }

    /// Is this descriptor enumerable?
    pub fn is_enumerable(&self) -> bool {
        match self {
            Self::Data { enumerable, .. } | Self::Accessor { enumerable, .. } => *enumerable,
        }
    }

    /// Is this a data descriptor with writable=true?
    pub fn is_writable(&self) -> bool {
        match self {
            Self::Data { writable, .. } => *writable,
            Self::Accessor { .. } => false,
        }
    }

    /// Get the value if this is a data descriptor
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Data { value, .. } => Some(value),
            Self::Accessor { .. } => None,
        }
    }

    /// Getter half of an accessor
    pub fn getter(&self) -> Option<&Function> {
        match self {
            Self::Accessor { get, .. } => get.as_ref(),
            Self::Data { .. } => None,
        }
    }

    /// Setter half of an accessor
    pub fn setter(&self) -> Option<&Function> {
        match self {
            Self::Accessor { set, .. } => set.as_ref(),
            Self::Data { .. } => None,
        }
    }

    /// Bind every function held by this descriptor to `this`
    pub fn bound_to(self, this: &Value) -> Self {
        match self {
            Self::Data {
                value,
                writable,
                enumerable,
                configurable,
            } => Self::Data {
                value: match value {
                    Value::Function(f) => Value::Function(f.bind(this.clone())),
                    other => other,
                },
                writable,
                enumerable,
                configurable,
            },
            Self::Accessor {
                get,
                set,
                enumerable,
                configurable,
            } => Self::Accessor {
                get: get.map(|f| f.bind(this.clone())),
                set: set.map(|f| f.bind(this.clone())),
                enumerable,
                configurable,
            },
        }
    }
}
