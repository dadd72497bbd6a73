use crate::il::graph::{MethodId, TypeId};
use crate::il::Name;

/// Implementation of a virtual method for a receiver of the given runtime type
///
/// Walks from the runtime type towards the root and picks the first virtual instance method with
/// the same name and arity. For interface methods, an explicit implementation (named after the
/// interface, eg. `System.IDisposable.Dispose`) also matches. Non-virtual methods resolve to
/// themselves.
pub fn resolve_virtual<'g>(receiver: TypeId<'g>, method: MethodId<'g>) -> MethodId<'g> {
    if !method.is_virtual() {
        return method;
    }

    let declaring = method.declaring_type;
    let explicit_name = if declaring.is_interface() {
        Some(format!("{}.{}", declaring.name, method.name))
    } else {
        None
    };

    let mut current = Some(receiver);
    while let Some(type_id) = current {
        if type_id == declaring {
            return method;
        }
        let found = type_id.methods().into_iter().find(|candidate| {
            !candidate.is_static()
                && candidate.is_virtual()
                && candidate.argument_count() == method.argument_count()
                && (candidate.name == method.name
                    || explicit_name.as_deref() == Some(candidate.name.as_str()))
        });
        if let Some(found) = found {
            return found;
        }
        current = type_id.base;
    }
    method
}

#[cfg(test)]
mod test {
    use super::resolve_virtual;
    use crate::il::graph::{MethodData, TypeData, TypeGraph, TypeGraphArenas};
    use crate::il::{MemberName, MethodFlags, QualifiedName, TypeFlags};

    #[test]
    fn overrides_and_explicit_implementations() {
        let arenas = TypeGraphArenas::new();
        let graph = TypeGraph::new(&arenas);
        let platform = graph.insert_platform_types();
        let types = &platform.types;
        let members = &platform.members;

        let base = graph.add_type(TypeData::new(
            QualifiedName::name("Base"),
            types.object,
            TypeFlags::PUBLIC,
        ));
        let hook = graph.add_method(MethodData::new(
            base,
            MemberName::name("DisposeManaged"),
            MethodFlags::FAMILY | MethodFlags::VIRTUAL | MethodFlags::NEW_SLOT,
        ));
        let derived = graph.add_type(TypeData::new(
            QualifiedName::name("Derived"),
            base,
            TypeFlags::PUBLIC,
        ));
        let hook_override = graph.add_method(MethodData::new(
            derived,
            MemberName::name("DisposeManaged"),
            MethodFlags::FAMILY | MethodFlags::VIRTUAL,
        ));
        let explicit = graph.add_method(MethodData::new(
            derived,
            MemberName::name("System.IDisposable.Dispose"),
            MethodFlags::PRIVATE | MethodFlags::VIRTUAL | MethodFlags::FINAL,
        ));

        assert_eq!(resolve_virtual(derived, hook), hook_override);
        assert_eq!(resolve_virtual(base, hook), hook);
        assert_eq!(resolve_virtual(derived, members.idisposable.dispose), explicit);
        assert_eq!(
            resolve_virtual(types.memory_stream, members.idisposable.dispose),
            members.stream.dispose
        );
        assert_eq!(
            resolve_virtual(derived, members.object.finalize),
            members.object.finalize
        );
    }
}
