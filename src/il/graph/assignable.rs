use crate::il::graph::{TypeId, TypeRef};
use std::iter;

/// Subtyping relationship between types
pub trait Assignable {
    /// Is the first type assignable to the second?
    fn is_assignable(&self, super_type: &Self) -> bool;
}

/// Classes are only reached through the base chain. Interfaces can also be reached through the
/// interfaces of anything on that chain, or through the interfaces those extend.
impl<'g> Assignable for TypeId<'g> {
    fn is_assignable(&self, super_type: &TypeId<'g>) -> bool {
        let mut chain = iter::successors(Some(*self), |type_id| type_id.base);
        if super_type.is_interface() {
            chain.any(|type_id| implements(type_id, *super_type))
        } else {
            chain.any(|type_id| type_id == *super_type)
        }
    }
}

fn implements<'g>(type_id: TypeId<'g>, interface: TypeId<'g>) -> bool {
    type_id == interface
        || type_id
            .interfaces()
            .into_iter()
            .any(|extended| implements(extended, interface))
}

/// Arrays, pointers, and method generic parameters are never assignable to named types. Type
/// parameters are assignable when one of their constraints is.
impl<'g> Assignable for TypeRef<'g> {
    fn is_assignable(&self, super_type: &TypeRef<'g>) -> bool {
        if self == super_type {
            return true;
        }
        let super_def = match super_type.definition() {
            Some(def) => def,
            None => return false,
        };
        match self {
            TypeRef::Named(def) | TypeRef::Instance(def, _) => def.is_assignable(&super_def),
            TypeRef::TypeParameter(_, _) => self
                .constraints()
                .iter()
                .any(|constraint| constraint.is_assignable(super_type)),
            TypeRef::MethodParameter(_) | TypeRef::Array(_) | TypeRef::ByRef(_) => false,
        }
    }
}

#[cfg(test)]
mod test {
    use crate::il::graph::{
        Assignable, GenericParameter, TypeData, TypeGraph, TypeGraphArenas, TypeRef,
    };
    use crate::il::{MemberName, QualifiedName, TypeFlags};

    #[test]
    fn base_chain_and_interfaces() {
        let arenas = TypeGraphArenas::new();
        let graph = TypeGraph::new(&arenas);
        let platform = graph.insert_platform_types();
        let types = &platform.types;

        assert!(types.stream.is_assignable(&types.idisposable));
        assert!(types.memory_stream.is_assignable(&types.stream));
        assert!(types.memory_stream.is_assignable(&types.idisposable));
        assert!(types.memory_stream.is_assignable(&types.object));
        assert!(!types.string.is_assignable(&types.idisposable));
        assert!(!types.object.is_assignable(&types.stream));
    }

    #[test]
    fn type_parameters_go_through_constraints() {
        let arenas = TypeGraphArenas::new();
        let graph = TypeGraph::new(&arenas);
        let platform = graph.insert_platform_types();
        let types = &platform.types;

        let holder = graph.add_type(
            TypeData::new(QualifiedName::name("Holder`2"), types.object, TypeFlags::PUBLIC)
                .with_generic_parameters(vec![
                    GenericParameter::constrained_to(
                        MemberName::name("T"),
                        vec![TypeRef::Named(types.stream)],
                    ),
                    GenericParameter::new(MemberName::name("U")),
                ]),
        );

        let disposable = TypeRef::Named(types.idisposable);
        assert!(TypeRef::TypeParameter(holder, 0).is_assignable(&disposable));
        assert!(!TypeRef::TypeParameter(holder, 1).is_assignable(&disposable));
        assert!(!TypeRef::Array(Box::new(TypeRef::Named(types.stream))).is_assignable(&disposable));
    }
}
