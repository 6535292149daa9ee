//! Host-side value representation and the caller-supplied factory contract.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::ProjectError;

/// Shared handle to a host object produced by a [`ClassFactory`].
pub type HostRef = Rc<RefCell<dyn HostObject>>;

/// A host-native value produced by projecting a decoded Ruby value.
///
/// Aggregates are behind `Rc` so that a cached projection hands out the same
/// host object on every call.
#[derive(Clone)]
pub enum HostValue {
    Null,
    Bool(bool),
    Int(i64),
    Str(Rc<str>),
    Array(Rc<[HostValue]>),
    /// Key-value pairs in insertion order.
    Map(Rc<Vec<(HostValue, HostValue)>>),
    Object(HostRef),
}

impl HostValue {
    pub fn str(value: &str) -> Self {
        HostValue::Str(Rc::from(value))
    }

    pub fn array(items: Vec<HostValue>) -> Self {
        HostValue::Array(items.into())
    }

    pub fn map(pairs: Vec<(HostValue, HostValue)>) -> Self {
        HostValue::Map(Rc::new(pairs))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, HostValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            HostValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            HostValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[HostValue]> {
        match self {
            HostValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(HostValue, HostValue)]> {
        match self {
            HostValue::Map(pairs) => Some(pairs),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&HostRef> {
        match self {
            HostValue::Object(obj) => Some(obj),
            _ => None,
        }
    }
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HostValue::Null, HostValue::Null) => true,
            (HostValue::Bool(a), HostValue::Bool(b)) => a == b,
            (HostValue::Int(a), HostValue::Int(b)) => a == b,
            (HostValue::Str(a), HostValue::Str(b)) => a == b,
            (HostValue::Array(a), HostValue::Array(b)) => a == b,
            (HostValue::Map(a), HostValue::Map(b)) => a == b,
            // Objects compare by identity, matching the projection cache.
            (HostValue::Object(a), HostValue::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Null => write!(f, "Null"),
            HostValue::Bool(b) => write!(f, "Bool({})", b),
            HostValue::Int(v) => write!(f, "Int({})", v),
            HostValue::Str(s) => write!(f, "Str({:?})", s),
            HostValue::Array(items) => f.debug_list().entries(items.iter()).finish(),
            HostValue::Map(pairs) => f.debug_map().entries(pairs.iter().cloned()).finish(),
            HostValue::Object(obj) => write!(f, "Object({})", obj.borrow().class_name()),
        }
    }
}

/// Contract implemented by host objects instantiated through the factory.
///
/// The projection direction uses `set_attr`, `load` and `marshal_load`; the
/// lifting direction uses `class_name`, `attrs`, `dump` and `marshal_dump`.
pub trait HostObject {
    fn class_name(&self) -> &str;

    /// Install an attribute; applying the same name twice must keep the later
    /// value.
    fn set_attr(&mut self, name: &str, value: HostValue) -> Result<(), ProjectError>;

    /// Accept the opaque payload of a user-defined (`_dump`) class.
    fn load(&mut self, _data: &[u8]) -> Result<(), ProjectError> {
        Err(ProjectError::failed(
            self.class_name(),
            "load is not supported",
        ))
    }

    /// Accept the decoded payload of a user-marshal (`marshal_dump`) class.
    fn marshal_load(&mut self, _data: HostValue) -> Result<(), ProjectError> {
        Err(ProjectError::failed(
            self.class_name(),
            "marshal_load is not supported",
        ))
    }

    /// Attributes to emit when lifting this object, in order.
    fn attrs(&self) -> Vec<(String, HostValue)> {
        Vec::new()
    }

    /// Opaque payload for the `_dump` contract, when this class owns one.
    fn dump(&self) -> Option<Vec<u8>> {
        None
    }

    /// Payload for the `marshal_dump` contract, when this class owns one.
    fn marshal_dump(&self) -> Option<HostValue> {
        None
    }
}

/// Caller-supplied factory mapping class names to fresh host objects.
///
/// Returning `None` signals that the class is unknown; projection of the
/// value then fails with `UnknownClass`.
pub trait ClassFactory {
    fn instantiate(&self, class_name: &str, arg: Option<&HostValue>) -> Option<HostRef>;
}
