use super::{ObjectRef, Trap, Value};
use crate::il::graph::{FieldId, TypeId};
use std::collections::HashMap;
use std::rc::Rc;

/// Instance allocated by `newobj`
pub struct Object<'g> {
    /// Runtime type (the most derived one)
    pub object_type: TypeId<'g>,

    /// Instance fields that have been written at least once
    pub fields: HashMap<FieldId<'g>, Value<'g>>,

    /// Set by `GC.SuppressFinalize`
    pub finalize_suppressed: bool,

    /// Set once a simulated collection has run the finalizer
    pub finalized: bool,

    /// Times a platform `Dispose()` ran on this object
    pub dispose_count: u32,

    /// Message of exception objects
    pub message: Option<Rc<str>>,
}

impl<'g> Object<'g> {
    /// Value of an instance field, defaulted if it was never written
    pub fn field(&self, field: FieldId<'g>) -> Value<'g> {
        self.fields
            .get(&field)
            .cloned()
            .unwrap_or_else(|| Value::default_for(&field.field_type))
    }
}

/// Objects are never freed: a collection only runs the finalizer
#[derive(Default)]
pub struct Heap<'g> {
    objects: Vec<Object<'g>>,
}

impl<'g> Heap<'g> {
    pub fn allocate(&mut self, object_type: TypeId<'g>) -> ObjectRef {
        self.objects.push(Object {
            object_type,
            fields: HashMap::new(),
            finalize_suppressed: false,
            finalized: false,
            dispose_count: 0,
            message: None,
        });
        ObjectRef(self.objects.len() - 1)
    }

    pub fn get(&self, object: ObjectRef) -> Result<&Object<'g>, Trap> {
        self.objects
            .get(object.0)
            .ok_or_else(|| Trap::InvalidReference(format!("{:?}", object)))
    }

    pub fn get_mut(&mut self, object: ObjectRef) -> Result<&mut Object<'g>, Trap> {
        self.objects
            .get_mut(object.0)
            .ok_or_else(|| Trap::InvalidReference(format!("{:?}", object)))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
