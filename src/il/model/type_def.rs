use super::{Field, Marker, Method};
use crate::il::code::MethodBody;
use crate::il::graph::{FieldData, FieldId, MethodData, MethodId, TypeGraph, TypeId};
use crate::il::Error;

/// Semantic representation of a type definition
pub struct Type<'g> {
    /// The current type
    pub id: TypeId<'g>,

    pub markers: Vec<Marker<'g>>,

    /// Fields, in declaration order
    ///
    /// Use [`Self::add_field`] for additional validation (like sanity checking that the field
    /// added really does belong on this type)
    pub fields: Vec<Field<'g>>,

    /// Methods, in declaration order
    ///
    /// Use [`Self::add_method`] for additional validation (like sanity checking that the method
    /// added really does belong on this type)
    pub methods: Vec<Method<'g>>,
}

impl<'g> Type<'g> {
    pub fn new(id: TypeId<'g>) -> Type<'g> {
        Type {
            id,
            markers: vec![],
            fields: vec![],
            methods: vec![],
        }
    }

    pub fn with_marker(mut self, marker: Marker<'g>) -> Type<'g> {
        self.markers.push(marker);
        self
    }

    /// Add a method to the type
    pub fn add_method(&mut self, method: Method<'g>) -> Result<(), Error> {
        if method.id.declaring_type != self.id {
            return Err(Error::ForeignMember(format!("{:?}", method.id)));
        }
        self.methods.push(method);
        Ok(())
    }

    /// Add a field to the type
    pub fn add_field(&mut self, field: Field<'g>) -> Result<(), Error> {
        if field.id.declaring_type != self.id {
            return Err(Error::ForeignMember(format!("{:?}", field.id)));
        }
        self.fields.push(field);
        Ok(())
    }

    /// Declare a new field in the graph and define it on this type
    pub fn declare_field(
        &mut self,
        graph: &TypeGraph<'g>,
        data: FieldData<'g>,
    ) -> Result<FieldId<'g>, Error> {
        if data.declaring_type != self.id {
            return Err(Error::ForeignMember(format!("{:?}", data)));
        }
        let id = graph.add_field(data);
        self.fields.push(Field::new(id));
        Ok(id)
    }

    /// Declare a new method in the graph and define it on this type with the given body
    pub fn declare_method(
        &mut self,
        graph: &TypeGraph<'g>,
        data: MethodData<'g>,
        body: MethodBody<'g>,
    ) -> Result<MethodId<'g>, Error> {
        if data.declaring_type != self.id {
            return Err(Error::ForeignMember(format!("{:?}", data)));
        }
        let id = graph.add_method(data);
        self.methods.push(Method::with_body(id, body));
        Ok(id)
    }

    pub fn method(&self, id: MethodId<'g>) -> Option<&Method<'g>> {
        self.methods.iter().find(|method| method.id == id)
    }

    pub fn method_mut(&mut self, id: MethodId<'g>) -> Option<&mut Method<'g>> {
        self.methods.iter_mut().find(|method| method.id == id)
    }

    pub fn find_method(&self, name: &str) -> Option<&Method<'g>> {
        self.methods
            .iter()
            .find(|method| method.id.name.as_ref() == name)
    }

    pub fn field(&self, id: FieldId<'g>) -> Option<&Field<'g>> {
        self.fields.iter().find(|field| field.id == id)
    }
}
