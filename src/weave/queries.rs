//! Predicates and lookups over the type graph and the module model

use super::Settings;
use crate::il::code::{Instruction, MethodBody};
use crate::il::graph::{Assignable, MethodRef, TypeId, TypeRef};
use crate::il::model::{Marker, Module, Type};
use crate::il::{Name, QualifiedName};

/// Simple names of the markers a code generator leaves on its output
const GENERATED_CODE_MARKERS: [&str; 2] = ["CompilerGeneratedAttribute", "GeneratedCodeAttribute"];

/// Reference types other than interfaces (so not enums or structs either)
pub fn is_class(type_def: TypeId<'_>) -> bool {
    type_def.base.is_some() && !type_def.is_enum() && !type_def.is_interface() && !type_def.is_value_type()
}

/// Is the type (or one of its enclosing types) marked as generated code?
pub fn is_generated_code<'g>(module: &Module<'g>, type_def: &Type<'g>) -> bool {
    let marked = type_def.markers.iter().any(|marker| {
        GENERATED_CODE_MARKERS.contains(&marker.marker_type.name.simple_name())
    });
    if marked {
        return true;
    }
    match type_def.id.declaring_type.and_then(|outer| module.type_def(outer)) {
        Some(outer) => is_generated_code(module, outer),
        None => false,
    }
}

pub fn contains_skip_weaving(markers: &[Marker<'_>], settings: &Settings) -> bool {
    markers
        .iter()
        .any(|marker| marker.is(&settings.skip_weaving_marker))
}

/// Does the type satisfy `System.IDisposable`?
///
/// This holds for the interface itself, for types implementing it somewhere along their base
/// chain, and for type parameters with a constraint that does. Arrays never do.
pub fn is_disposable<'g>(type_ref: &TypeRef<'g>, idisposable: TypeId<'g>) -> bool {
    type_ref.is_assignable(&TypeRef::Named(idisposable))
}

/// Handles to pending computations (`Task`, `Task<T>`, ...) must never be disposed by generated
/// code
pub fn is_task(type_ref: &TypeRef<'_>) -> bool {
    match type_ref.definition() {
        Some(def) => def.name.starts_with(QualifiedName::TASK.as_str()),
        None => false,
    }
}

/// Can the body be overwritten without losing anything the author wrote?
///
/// Ignoring `nop` and `ret`, the body must either be empty or consist of exactly
/// `newobj NotImplementedException::.ctor(); throw`.
pub fn is_empty_or_not_implemented(body: Option<&MethodBody<'_>>) -> bool {
    let body = match body {
        Some(body) => body,
        None => return true,
    };
    let significant: Vec<&Instruction<'_>> = body
        .iter()
        .map(|(_, instruction)| instruction)
        .filter(|instruction| !matches!(instruction, Instruction::Nop | Instruction::Ret))
        .collect();

    match significant.as_slice() {
        [] => true,
        [Instruction::NewObj(ctor), Instruction::Throw] => {
            ctor.method.declaring_type.name == QualifiedName::NOT_IMPLEMENTED_EXCEPTION
        }
        _ => false,
    }
}

pub fn field_exists(type_def: TypeId<'_>, name: &str) -> bool {
    type_def.find_field(name).is_some()
}

pub fn method_exists(type_def: TypeId<'_>, name: &str) -> bool {
    type_def
        .methods()
        .iter()
        .any(|method| method.name.as_str() == name)
}

/// Call a method with `callvirt` if it is virtual (so overrides run), `call` otherwise
pub fn call_instruction(method: MethodRef<'_>) -> Instruction<'_> {
    if method.method.is_virtual() {
        Instruction::CallVirt(method)
    } else {
        Instruction::Call(method)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::il::graph::{
        FieldData, GenericParameter, MethodData, TypeData, TypeGraph, TypeGraphArenas,
    };
    use crate::il::model::Marker;
    use crate::il::{FieldFlags, MemberName, MethodFlags, TypeFlags};

    #[test]
    fn classes_and_disposables() {
        let arenas = TypeGraphArenas::new();
        let graph = TypeGraph::new(&arenas);
        let platform = graph.insert_platform_types();
        let types = &platform.types;

        assert!(is_class(types.memory_stream));
        assert!(!is_class(types.idisposable));
        assert!(!is_class(types.int32));
        assert!(!is_class(types.object));

        let holder = graph.add_type(
            TypeData::new(QualifiedName::name("Holder`1"), types.object, TypeFlags::PUBLIC)
                .with_generic_parameters(vec![GenericParameter::constrained_to(
                    MemberName::name("T"),
                    vec![TypeRef::Named(types.idisposable)],
                )]),
        );
        assert!(is_disposable(&TypeRef::Named(types.memory_stream), types.idisposable));
        assert!(is_disposable(&TypeRef::Named(types.idisposable), types.idisposable));
        assert!(is_disposable(&TypeRef::TypeParameter(holder, 0), types.idisposable));
        assert!(!is_disposable(&TypeRef::Named(types.string), types.idisposable));

        assert!(is_task(&TypeRef::Named(types.task)));
        assert!(is_task(&TypeRef::Instance(
            types.task_of_t,
            vec![types.int32_ref()]
        )));
        assert!(!is_task(&TypeRef::Named(types.stream)));
    }

    #[test]
    fn generated_code_is_inherited_by_nested_types() {
        let arenas = TypeGraphArenas::new();
        let graph = TypeGraph::new(&arenas);
        let platform = graph.insert_platform_types();
        let types = &platform.types;

        let outer = graph.add_type(TypeData::new(
            QualifiedName::name("Proxies.Outer"),
            types.object,
            TypeFlags::PUBLIC,
        ));
        let inner = graph.add_type(
            TypeData::new(
                QualifiedName::name("Proxies.Outer").nested("Inner"),
                types.object,
                TypeFlags::NESTED_PUBLIC,
            )
            .nested_in(outer),
        );

        let mut module = Module::new("Proxies.dll");
        module.add_type(Type::new(outer).with_marker(Marker::new(types.generated_code)));
        module.add_type(Type::new(inner));

        let nested = module.type_def(inner).unwrap();
        assert!(is_generated_code(&module, nested));
    }

    #[test]
    fn empty_and_not_implemented_bodies() {
        let arenas = TypeGraphArenas::new();
        let graph = TypeGraph::new(&arenas);
        let platform = graph.insert_platform_types();
        let members = &platform.members;

        let mut empty = MethodBody::new();
        empty.push(Instruction::Nop);
        empty.push(Instruction::Ret);
        assert!(is_empty_or_not_implemented(Some(&empty)));

        let mut not_implemented = MethodBody::new();
        not_implemented.push(Instruction::NewObj(MethodRef::direct(
            members.not_implemented_exception.ctor,
        )));
        not_implemented.push(Instruction::Throw);
        assert!(is_empty_or_not_implemented(Some(&not_implemented)));

        let mut other_exception = MethodBody::new();
        other_exception.push(Instruction::LdStr(String::from("no")));
        other_exception.push(Instruction::NewObj(MethodRef::direct(
            members.invalid_operation_exception.ctor_string,
        )));
        other_exception.push(Instruction::Throw);
        assert!(!is_empty_or_not_implemented(Some(&other_exception)));
    }

    #[test]
    fn member_lookups_by_name() {
        let arenas = TypeGraphArenas::new();
        let graph = TypeGraph::new(&arenas);
        let platform = graph.insert_platform_types();
        let types = &platform.types;

        let class = graph.add_type(TypeData::new(
            QualifiedName::name("Sample"),
            types.object,
            TypeFlags::PUBLIC,
        ));
        graph.add_field(FieldData::new(
            class,
            MemberName::name("disposed"),
            types.boolean_ref(),
            FieldFlags::PRIVATE,
        ));
        let virtual_method = graph.add_method(MethodData::new(
            class,
            MemberName::name("DisposeManaged"),
            MethodFlags::FAMILY | MethodFlags::VIRTUAL,
        ));

        assert!(field_exists(class, "disposed"));
        assert!(!field_exists(class, "disposeSignaled"));
        assert!(method_exists(class, "DisposeManaged"));
        assert!(matches!(
            call_instruction(MethodRef::direct(virtual_method)),
            Instruction::CallVirt(_)
        ));
    }
}
