use super::{FieldId, MethodData, MethodId, TypeId};
use crate::il::{Error, GenericParameterFlags, Name};
use std::fmt;

/// Type as it appears in a signature, a field, or an instruction operand
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum TypeRef<'g> {
    /// Non-generic type, or a generic definition without arguments
    Named(TypeId<'g>),

    /// Generic definition applied to arguments
    Instance(TypeId<'g>, Vec<TypeRef<'g>>),

    /// Generic parameter of a type (owner and index)
    TypeParameter(TypeId<'g>, u16),

    /// Generic parameter of the method in whose signature this appears
    MethodParameter(u16),

    Array(Box<TypeRef<'g>>),

    /// Managed pointer (`ref` parameters)
    ByRef(Box<TypeRef<'g>>),
}

impl<'g> TypeRef<'g> {
    pub fn by_ref(self) -> TypeRef<'g> {
        TypeRef::ByRef(Box::new(self))
    }

    /// Type definition behind named and instantiated types
    pub fn definition(&self) -> Option<TypeId<'g>> {
        match self {
            TypeRef::Named(def) | TypeRef::Instance(def, _) => Some(*def),
            _ => None,
        }
    }

    /// Is the type a generic definition that was never given arguments?
    pub fn is_open_generic(&self) -> bool {
        match self {
            TypeRef::Named(def) => def.has_generic_parameters(),
            TypeRef::Instance(_, arguments) => arguments.iter().any(TypeRef::is_open_generic),
            TypeRef::Array(elem) | TypeRef::ByRef(elem) => elem.is_open_generic(),
            TypeRef::TypeParameter(_, _) | TypeRef::MethodParameter(_) => false,
        }
    }

    pub fn is_value_type(&self) -> bool {
        match self {
            TypeRef::Named(def) | TypeRef::Instance(def, _) => def.is_value_type(),
            TypeRef::TypeParameter(owner, idx) => owner
                .generic_parameters
                .get(*idx as usize)
                .map(|param| {
                    param
                        .flags
                        .contains(GenericParameterFlags::NOT_NULLABLE_VALUE_TYPE_CONSTRAINT)
                })
                .unwrap_or(false),
            TypeRef::MethodParameter(_) | TypeRef::Array(_) | TypeRef::ByRef(_) => false,
        }
    }

    pub fn is_generic_parameter(&self) -> bool {
        matches!(self, TypeRef::TypeParameter(_, _) | TypeRef::MethodParameter(_))
    }

    /// Short name, matching how a metadata reader spells a parameter type: simple names,
    /// generic arity suffixes, and `&`/`[]` decorations (eg. `Int32&`, `T&`, `List`1`)
    pub fn short_name(&self, method: Option<&MethodData<'g>>) -> String {
        match self {
            TypeRef::Named(def) | TypeRef::Instance(def, _) => def.name.simple_name().to_owned(),
            TypeRef::TypeParameter(owner, idx) => owner
                .generic_parameters
                .get(*idx as usize)
                .map(|param| param.name.as_str().to_owned())
                .unwrap_or_else(|| format!("!{}", idx)),
            TypeRef::MethodParameter(idx) => method
                .and_then(|method| method.generic_parameters.get(*idx as usize))
                .map(|param| param.name.as_str().to_owned())
                .unwrap_or_else(|| format!("!!{}", idx)),
            TypeRef::Array(elem) => format!("{}[]", elem.short_name(method)),
            TypeRef::ByRef(elem) => format!("{}&", elem.short_name(method)),
        }
    }

    /// Generic parameter constraints, when this is a type parameter
    pub fn constraints(&self) -> &[TypeRef<'g>] {
        match self {
            TypeRef::TypeParameter(owner, idx) => owner
                .0
                .generic_parameters
                .get(*idx as usize)
                .map(|param| param.constraints.as_slice())
                .unwrap_or(&[]),
            _ => &[],
        }
    }
}

impl<'g> fmt::Display for TypeRef<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(def) => f.write_str(def.name.as_str()),
            TypeRef::Instance(def, arguments) => {
                f.write_str(def.name.as_str())?;
                f.write_str("<")?;
                for (idx, argument) in arguments.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(",")?;
                    }
                    argument.fmt(f)?;
                }
                f.write_str(">")
            }
            TypeRef::TypeParameter(_, _) => f.write_str(&self.short_name(None)),
            TypeRef::MethodParameter(idx) => write!(f, "!!{}", idx),
            TypeRef::Array(elem) => write!(f, "{}[]", elem),
            TypeRef::ByRef(elem) => write!(f, "{}&", elem),
        }
    }
}

impl<'g> fmt::Debug for TypeRef<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Method operand of a call instruction
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MethodRef<'g> {
    pub method: MethodId<'g>,

    /// Declaring type as seen by the caller (instantiated for generic types)
    pub declaring: TypeRef<'g>,

    /// Arguments for a generic method
    pub generic_arguments: Vec<TypeRef<'g>>,
}

impl<'g> MethodRef<'g> {
    /// Reference a method through its non-generic declaring type
    pub fn direct(method: MethodId<'g>) -> MethodRef<'g> {
        MethodRef {
            method,
            declaring: TypeRef::Named(method.declaring_type),
            generic_arguments: vec![],
        }
    }

    /// Reference a method from inside its own declaring type
    ///
    /// On a generic type, this goes through the type instantiated over its own parameters.
    pub fn on_self(method: MethodId<'g>) -> MethodRef<'g> {
        MethodRef {
            method,
            declaring: method.declaring_type.self_reference(),
            generic_arguments: vec![],
        }
    }

    /// Instantiate a generic method
    pub fn make_generic(mut self, arguments: Vec<TypeRef<'g>>) -> Result<MethodRef<'g>, Error> {
        if arguments.is_empty() {
            return Ok(self);
        }
        if self.method.generic_parameters.len() != arguments.len() {
            return Err(Error::GenericArity {
                member: format!("{:?}", self.method),
                expected: self.method.generic_parameters.len(),
                found: arguments.len(),
            });
        }
        self.generic_arguments = arguments;
        Ok(self)
    }
}

impl<'g> fmt::Display for MethodRef<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.method.return_type {
            Some(return_type) => write!(f, "{} ", return_type)?,
            None => f.write_str("void ")?,
        }
        write!(f, "{}::{}", self.declaring, self.method.name)?;
        if !self.generic_arguments.is_empty() {
            f.write_str("<")?;
            for (idx, argument) in self.generic_arguments.iter().enumerate() {
                if idx > 0 {
                    f.write_str(",")?;
                }
                argument.fmt(f)?;
            }
            f.write_str(">")?;
        }
        f.write_str("(")?;
        for (idx, param) in self.method.parameters.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            param.parameter_type.fmt(f)?;
        }
        f.write_str(")")
    }
}

impl<'g> fmt::Debug for MethodRef<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Field operand of a load/store instruction
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct FieldRef<'g> {
    pub field: FieldId<'g>,

    /// Declaring type as seen by the accessor (instantiated for generic types)
    pub declaring: TypeRef<'g>,
}

impl<'g> FieldRef<'g> {
    pub fn direct(field: FieldId<'g>) -> FieldRef<'g> {
        FieldRef {
            field,
            declaring: TypeRef::Named(field.declaring_type),
        }
    }

    /// Reference a field from inside its own declaring type
    pub fn on_self(field: FieldId<'g>) -> FieldRef<'g> {
        FieldRef {
            field,
            declaring: field.declaring_type.self_reference(),
        }
    }
}

impl<'g> fmt::Display for FieldRef<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}::{}",
            self.field.field_type, self.declaring, self.field.name
        )
    }
}

impl<'g> fmt::Debug for FieldRef<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
