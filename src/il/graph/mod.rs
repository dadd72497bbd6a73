use super::{
    FieldFlags, GenericParameterFlags, MemberName, MethodFlags, Name, QualifiedName, TypeFlags,
};
use crate::util::RefId;
use elsa::map::FrozenMap;
use elsa::FrozenVec;
use std::fmt;
use std::fmt::Debug;
use typed_arena::Arena;

mod assignable;
mod platform_members;
mod platform_types;
mod references;

pub use assignable::*;
pub use platform_members::*;
pub use platform_types::*;
pub use references::*;

pub type TypeId<'g> = RefId<'g, TypeData<'g>>;
pub type MethodId<'g> = RefId<'g, MethodData<'g>>;
pub type FieldId<'g> = RefId<'g, FieldData<'g>>;

pub struct TypeGraphArenas<'g> {
    type_arena: Arena<TypeData<'g>>,
    method_arena: Arena<MethodData<'g>>,
    field_arena: Arena<FieldData<'g>>,
}

impl<'g> TypeGraphArenas<'g> {
    pub fn new() -> Self {
        TypeGraphArenas {
            type_arena: Arena::new(),
            method_arena: Arena::new(),
            field_arena: Arena::new(),
        }
    }
}

impl<'g> Default for TypeGraphArenas<'g> {
    fn default() -> Self {
        Self::new()
    }
}

/// Declarations of every type the weaver can see, along with their fields and methods
///
/// This covers both the types defined in the module being woven and the platform types they
/// refer to. The graph only grows: types, fields, and methods are arena allocated and handed out
/// as references, so a [`TypeId`] stays valid (and cheap to copy) for the whole session. Method
/// bodies and markers are not part of the graph - they live on the mutable
/// [`crate::il::model`] definitions.
pub struct TypeGraph<'g> {
    arenas: &'g TypeGraphArenas<'g>,
    types: FrozenMap<&'g QualifiedName, &'g TypeData<'g>>,
}

impl<'g> TypeGraph<'g> {
    /// New empty graph
    pub fn new(arenas: &'g TypeGraphArenas<'g>) -> Self {
        TypeGraph {
            arenas,
            types: FrozenMap::new(),
        }
    }

    /// Find a type by its fully qualified name
    pub fn lookup_type(&'g self, name: &QualifiedName) -> Option<TypeId<'g>> {
        self.types.get(name).map(RefId)
    }

    /// Add a new type to the graph
    ///
    /// A type registered under an existing name shadows the earlier one for lookups.
    pub fn add_type(&self, data: TypeData<'g>) -> TypeId<'g> {
        let data = &*self.arenas.type_arena.alloc(data);
        self.types.insert(&data.name, data);
        RefId(data)
    }

    /// Add a field to the graph and to its declaring type
    pub fn add_field(&self, field: FieldData<'g>) -> FieldId<'g> {
        let data = &*self.arenas.field_arena.alloc(field);
        data.declaring_type.0.fields.push(data);
        RefId(data)
    }

    /// Add a method to the graph and to its declaring type
    pub fn add_method(&self, method: MethodData<'g>) -> MethodId<'g> {
        let data = &*self.arenas.method_arena.alloc(method);
        data.declaring_type.0.methods.push(data);
        RefId(data)
    }

    /// Add the platform library types (root object, disposal capability, exchange primitive...)
    pub fn insert_platform_types(&'g self) -> PlatformLibrary<'g> {
        PlatformLibrary::add_to_graph(self)
    }
}

pub struct TypeData<'g> {
    /// Fully qualified name of the type
    pub name: QualifiedName,

    /// Base type is only ever missing for `System.Object` and interfaces
    pub base: Option<TypeId<'g>>,

    /// Interfaces implemented directly by this type
    pub interfaces: FrozenVec<&'g TypeData<'g>>,

    pub flags: TypeFlags,

    pub generic_parameters: Vec<GenericParameter<'g>>,

    /// Enclosing type, for nested types
    pub declaring_type: Option<TypeId<'g>>,

    /// Methods, in declaration order
    pub methods: FrozenVec<&'g MethodData<'g>>,

    /// Fields, in declaration order
    pub fields: FrozenVec<&'g FieldData<'g>>,
}

impl<'g> TypeData<'g> {
    pub fn new(name: QualifiedName, base: TypeId<'g>, flags: TypeFlags) -> TypeData<'g> {
        TypeData {
            name,
            base: Some(base),
            interfaces: FrozenVec::new(),
            flags,
            generic_parameters: vec![],
            declaring_type: None,
            methods: FrozenVec::new(),
            fields: FrozenVec::new(),
        }
    }

    /// Type without a base (only `System.Object`)
    pub fn root(name: QualifiedName, flags: TypeFlags) -> TypeData<'g> {
        TypeData {
            name,
            base: None,
            interfaces: FrozenVec::new(),
            flags,
            generic_parameters: vec![],
            declaring_type: None,
            methods: FrozenVec::new(),
            fields: FrozenVec::new(),
        }
    }

    pub fn interface(name: QualifiedName) -> TypeData<'g> {
        TypeData {
            name,
            base: None,
            interfaces: FrozenVec::new(),
            flags: TypeFlags::PUBLIC | TypeFlags::INTERFACE | TypeFlags::ABSTRACT,
            generic_parameters: vec![],
            declaring_type: None,
            methods: FrozenVec::new(),
            fields: FrozenVec::new(),
        }
    }

    pub fn with_generic_parameters(mut self, parameters: Vec<GenericParameter<'g>>) -> Self {
        self.generic_parameters = parameters;
        self
    }

    pub fn nested_in(mut self, declaring_type: TypeId<'g>) -> Self {
        self.declaring_type = Some(declaring_type);
        self
    }

    pub fn is_interface(&self) -> bool {
        self.flags.contains(TypeFlags::INTERFACE)
    }

    pub fn is_abstract(&self) -> bool {
        self.flags.contains(TypeFlags::ABSTRACT)
    }

    /// Enums derive from `System.Enum`
    pub fn is_enum(&self) -> bool {
        matches!(self.base, Some(base) if base.name == QualifiedName::ENUM)
    }

    /// Value types derive from `System.ValueType` (except `System.Enum` itself) or `System.Enum`
    pub fn is_value_type(&self) -> bool {
        match self.base {
            Some(base) if base.name == QualifiedName::ENUM => true,
            Some(base) if base.name == QualifiedName::VALUE_TYPE => {
                self.name != QualifiedName::ENUM
            }
            _ => false,
        }
    }

    pub fn has_generic_parameters(&self) -> bool {
        !self.generic_parameters.is_empty()
    }
}

impl<'g> TypeId<'g> {
    pub fn methods(self) -> Vec<MethodId<'g>> {
        self.0.methods.iter().map(RefId).collect()
    }

    pub fn fields(self) -> Vec<FieldId<'g>> {
        self.0.fields.iter().map(RefId).collect()
    }

    pub fn interfaces(self) -> Vec<TypeId<'g>> {
        self.0.interfaces.iter().map(RefId).collect()
    }

    /// Find a method by name and parameter type names (see [`MethodData::is_match`])
    pub fn find_method(self, name: &str, parameter_types: &[&str]) -> Option<MethodId<'g>> {
        self.0
            .methods
            .iter()
            .find(|method| method.is_match(name, parameter_types))
            .map(RefId)
    }

    pub fn find_field(self, name: &str) -> Option<FieldId<'g>> {
        self.0
            .fields
            .iter()
            .find(|field| field.name.as_str() == name)
            .map(RefId)
    }

    /// Reference to the type as seen from inside its own body
    ///
    /// For a generic definition this is the definition instantiated over its own parameters
    /// (`Foo<T>` rather than the open `Foo`).
    pub fn self_reference(self) -> TypeRef<'g> {
        if self.has_generic_parameters() {
            let arguments = (0..self.generic_parameters.len())
                .map(|idx| TypeRef::TypeParameter(self, idx as u16))
                .collect();
            TypeRef::Instance(self, arguments)
        } else {
            TypeRef::Named(self)
        }
    }
}

impl<'g> PartialEq for TypeData<'g> {
    fn eq(&self, other: &TypeData<'g>) -> bool {
        self.name == other.name
    }
}

impl<'g> Eq for TypeData<'g> {}

impl<'g> Debug for TypeData<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name.as_str())
    }
}

/// Generic parameter declared on a type or method
#[derive(Clone)]
pub struct GenericParameter<'g> {
    pub name: MemberName,
    pub flags: GenericParameterFlags,
    pub constraints: Vec<TypeRef<'g>>,
}

impl<'g> GenericParameter<'g> {
    pub fn new(name: MemberName) -> GenericParameter<'g> {
        GenericParameter {
            name,
            flags: GenericParameterFlags::empty(),
            constraints: vec![],
        }
    }

    pub fn constrained_to(name: MemberName, constraints: Vec<TypeRef<'g>>) -> GenericParameter<'g> {
        GenericParameter {
            name,
            flags: GenericParameterFlags::empty(),
            constraints,
        }
    }
}

#[derive(Clone)]
pub struct Parameter<'g> {
    pub name: MemberName,
    pub parameter_type: TypeRef<'g>,
}

impl<'g> Parameter<'g> {
    pub fn new(name: MemberName, parameter_type: TypeRef<'g>) -> Parameter<'g> {
        Parameter {
            name,
            parameter_type,
        }
    }
}

pub struct MethodData<'g> {
    /// Type declaring the method
    ///
    /// Note: this is a pointer back to the type (so don't derive `Debug`)
    pub declaring_type: TypeId<'g>,

    pub name: MemberName,

    pub flags: MethodFlags,

    pub parameters: Vec<Parameter<'g>>,

    /// Return type (`None` for `void`)
    pub return_type: Option<TypeRef<'g>>,

    pub generic_parameters: Vec<GenericParameter<'g>>,
}

impl<'g> MethodData<'g> {
    /// Parameterless method returning nothing
    pub fn new(declaring_type: TypeId<'g>, name: MemberName, flags: MethodFlags) -> Self {
        MethodData {
            declaring_type,
            name,
            flags,
            parameters: vec![],
            return_type: None,
            generic_parameters: vec![],
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<Parameter<'g>>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn returning(mut self, return_type: TypeRef<'g>) -> Self {
        self.return_type = Some(return_type);
        self
    }

    pub fn with_generic_parameters(mut self, parameters: Vec<GenericParameter<'g>>) -> Self {
        self.generic_parameters = parameters;
        self
    }

    pub fn is_static(&self) -> bool {
        self.flags.is_static()
    }

    pub fn is_virtual(&self) -> bool {
        self.flags.is_virtual()
    }

    pub fn is_constructor(&self) -> bool {
        self.name == MemberName::CTOR || self.name == MemberName::CCTOR
    }

    /// Finalizers are the instance `Finalize()` override
    pub fn is_finalizer(&self) -> bool {
        !self.is_static() && self.is_match(MemberName::FINALIZE.as_str(), &[])
    }

    /// Number of arguments on the evaluation stack for a call (including `this`)
    pub fn argument_count(&self) -> usize {
        self.parameters.len() + usize::from(!self.is_static())
    }

    /// Check that a method has a given name and exactly the given parameter types
    ///
    /// Parameter types are compared by short name (eg. `Int32&`, `T&`, `Object`).
    pub fn is_match(&self, name: &str, parameter_types: &[&str]) -> bool {
        if self.name.as_str() != name || self.parameters.len() != parameter_types.len() {
            return false;
        }
        self.parameters
            .iter()
            .zip(parameter_types)
            .all(|(param, expected)| param.parameter_type.short_name(Some(self)) == *expected)
    }
}

impl<'g> Debug for MethodData<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!(
            "{}::{}",
            self.declaring_type.name.as_str(),
            self.name.as_str()
        ))?;
        let mut tuple = f.debug_tuple("");
        for param in &self.parameters {
            tuple.field(&param.parameter_type);
        }
        tuple.finish()
    }
}

pub struct FieldData<'g> {
    /// Type declaring the field
    ///
    /// Note: this is a pointer back to the type (so don't derive `Debug`)
    pub declaring_type: TypeId<'g>,

    pub name: MemberName,

    pub field_type: TypeRef<'g>,

    pub flags: FieldFlags,
}

impl<'g> FieldData<'g> {
    pub fn new(
        declaring_type: TypeId<'g>,
        name: MemberName,
        field_type: TypeRef<'g>,
        flags: FieldFlags,
    ) -> Self {
        FieldData {
            declaring_type,
            name,
            field_type,
            flags,
        }
    }

    pub fn is_static(&self) -> bool {
        self.flags.is_static()
    }

    /// Name used in diagnostics: `Declaring.Type.field`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.declaring_type.name, self.name)
    }
}

impl<'g> Debug for FieldData<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!(
            "{}::{}:{:?}",
            self.declaring_type.name.as_str(),
            self.name.as_str(),
            self.field_type
        ))
    }
}
