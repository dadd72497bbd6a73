use super::{Marker, Method, Type};
use crate::il::code::MethodBody;
use crate::il::graph::{MethodId, TypeId};
use std::collections::HashMap;

/// Reference from the module to another assembly
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssemblyReference {
    pub name: String,
    pub version: String,
}

impl AssemblyReference {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> AssemblyReference {
        AssemblyReference {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Semantic representation of a compiled module
pub struct Module<'g> {
    pub name: String,

    pub assembly_references: Vec<AssemblyReference>,

    /// Assembly level markers
    pub markers: Vec<Marker<'g>>,

    /// Types defined in the module (nested types included), in definition order
    pub types: Vec<Type<'g>>,
}

impl<'g> Module<'g> {
    pub fn new(name: impl Into<String>) -> Module<'g> {
        Module {
            name: name.into(),
            assembly_references: vec![],
            markers: vec![],
            types: vec![],
        }
    }

    pub fn add_type(&mut self, type_def: Type<'g>) {
        self.types.push(type_def);
    }

    pub fn type_def(&self, id: TypeId<'g>) -> Option<&Type<'g>> {
        self.types.iter().find(|type_def| type_def.id == id)
    }

    /// Every method defined in the module
    pub fn methods(&self) -> impl Iterator<Item = &Method<'g>> + '_ {
        self.types.iter().flat_map(|type_def| type_def.methods.iter())
    }

    /// Bodies of every method that has one
    pub fn method_bodies(&self) -> HashMap<MethodId<'g>, &MethodBody<'g>> {
        self.methods()
            .filter_map(|method| method.body.as_ref().map(|body| (method.id, body)))
            .collect()
    }

    pub fn references_assembly(&self, name: &str) -> bool {
        self.assembly_references
            .iter()
            .any(|reference| reference.name == name)
    }
}
