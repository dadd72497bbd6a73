use super::Trap;
use crate::il::graph::{FieldId, TypeRef};
use std::rc::Rc;

/// Handle to an object on the interpreter heap
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ObjectRef(pub(super) usize);

/// Storage location that can be read and written through a managed pointer
#[derive(Clone, PartialEq, Debug)]
pub enum Address<'g> {
    Field(ObjectRef, FieldId<'g>),
    Static(FieldId<'g>),

    /// Local variable of an active frame (frame depth, local index)
    Local(usize, u16),
}

/// Value on the evaluation stack or in a storage location
///
/// Booleans are `Int32` (`0` or `1`), as on the real evaluation stack.
#[derive(Clone, PartialEq, Debug)]
pub enum Value<'g> {
    Null,
    Int32(i32),
    String(Rc<str>),
    Object(ObjectRef),
    Address(Address<'g>),
}

impl<'g> Value<'g> {
    /// Initial value of a field or local of the given type
    pub fn default_for(value_type: &TypeRef<'g>) -> Value<'g> {
        if value_type.is_value_type() {
            Value::Int32(0)
        } else {
            Value::Null
        }
    }

    /// Truthiness used by `brtrue` and `brfalse`
    pub fn is_true(&self) -> bool {
        !matches!(self, Value::Null | Value::Int32(0))
    }

    pub fn as_i32(&self) -> Result<i32, Trap> {
        match self {
            Value::Int32(value) => Ok(*value),
            other => Err(Trap::TypeMismatch {
                expected: "int32",
                found: format!("{:?}", other),
            }),
        }
    }

    /// Object behind a reference, failing on `null`
    pub fn as_object(&self) -> Result<ObjectRef, Trap> {
        match self {
            Value::Object(object) => Ok(*object),
            Value::Null => Err(Trap::NullReference),
            other => Err(Trap::TypeMismatch {
                expected: "object reference",
                found: format!("{:?}", other),
            }),
        }
    }

    pub fn as_address(&self) -> Result<&Address<'g>, Trap> {
        match self {
            Value::Address(address) => Ok(address),
            Value::Null => Err(Trap::NullReference),
            other => Err(Trap::TypeMismatch {
                expected: "managed pointer",
                found: format!("{:?}", other),
            }),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }
}

impl<'g> From<bool> for Value<'g> {
    fn from(value: bool) -> Value<'g> {
        Value::Int32(i32::from(value))
    }
}

impl<'g> From<ObjectRef> for Value<'g> {
    fn from(object: ObjectRef) -> Value<'g> {
        Value::Object(object)
    }
}

impl<'g> From<&str> for Value<'g> {
    fn from(value: &str) -> Value<'g> {
        Value::String(Rc::from(value))
    }
}
