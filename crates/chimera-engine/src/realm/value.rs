//! Runtime values and callable functions

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::{ObjectId, Realm, TypeId};
use crate::error::HostResult;

/// Global counter for generating unique function IDs
static NEXT_FUNCTION_ID: AtomicU64 = AtomicU64::new(1);

fn generate_function_id() -> u64 {
    NEXT_FUNCTION_ID.fetch_add(1, Ordering::Relaxed)
}

/// Native function body: `(realm, this, args) -> value`
pub type NativeFn = dyn Fn(&mut Realm, &Value, &[Value]) -> HostResult<Value> + Send + Sync;

/// A callable value, optionally bound to a fixed receiver
#[derive(Clone)]
pub struct Function {
    id: u64,
    name: Arc<str>,
    body: Arc<NativeFn>,
    bound_this: Option<Box<Value>>,
}

impl Function {
    /// Create a new unbound function
    pub fn new<F>(name: &str, body: F) -> Self
    where
        F: Fn(&mut Realm, &Value, &[Value]) -> HostResult<Value> + Send + Sync + 'static,
    {
        Self {
            id: generate_function_id(),
            name: Arc::from(name),
            body: Arc::new(body),
            bound_this: None,
        }
    }

    /// Unique function ID (shared by all bindings of the same function)
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Function name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if the receiver is fixed
    pub fn is_bound(&self) -> bool {
        self.bound_this.is_some()
    }

    /// Fixed receiver, if bound
    pub fn bound_this(&self) -> Option<&Value> {
        self.bound_this.as_deref()
    }

    /// Return a copy whose receiver is fixed to `this`.
    ///
    /// Binding an already-bound function keeps the first receiver.
    pub fn bind(&self, this: Value) -> Self {
        let mut bound = self.clone();
        if bound.bound_this.is_none() {
            bound.bound_this = Some(Box::new(this));
        }
        bound
    }

    /// Invoke the function. A bound receiver overrides `this`.
    pub fn call(&self, realm: &mut Realm, this: &Value, args: &[Value]) -> HostResult<Value> {
        let receiver = self.bound_this.as_deref().unwrap_or(this);
        (self.body)(realm, receiver, args)
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.bound_this == other.bound_this
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("bound", &self.is_bound())
            .finish()
    }
}

/// A value stored in a property or passed to a function
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value
    #[default]
    Undefined,
    /// Explicit null
    Null,
    /// Boolean
    Bool(bool),
    /// Number
    Number(f64),
    /// String
    String(String),
    /// Reference to an object in the realm
    Object(ObjectId),
    /// Reference to a type node in the realm
    Type(TypeId),
    /// Callable
    Function(Function),
}

impl Value {
    /// Check for `undefined`
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Object reference, if this is one
    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Self::Object(id) => Some(*id),
            _ => None,
        }
    }

    /// Type reference, if this is one
    pub fn as_type(&self) -> Option<TypeId> {
        match self {
            Self::Type(id) => Some(*id),
            _ => None,
        }
    }

    /// Function, if this is one
    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Self::Function(f) => Some(f),
            _ => None,
        }
    }

    /// String contents, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric value, if this is a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Short type name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Object(_) => "object",
            Self::Type(_) => "type",
            Self::Function(_) => "function",
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Self::Object(id)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Self::Function(f)
    }
}
