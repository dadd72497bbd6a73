use super::Error;
use crate::il::graph::{MethodId, TypeGraph, TypeId, TypeRef};
use crate::il::{MemberName, Name, QualifiedName};
use log::debug;

/// External symbols the generated code calls into
///
/// These are resolved once, at the start of a session, and then shared by every type processed.
/// Failing to find any of them is fatal: there is no way to emit the escape check or the guard
/// without them.
pub struct CoreReferences<'g> {
    /// `System.Object::Finalize()`, chained to at the end of a synthesized finalizer
    pub object_finalize: MethodId<'g>,

    /// `System.GC::SuppressFinalize(object)`
    pub suppress_finalize: MethodId<'g>,

    /// `System.IDisposable::Dispose()`
    pub dispose: MethodId<'g>,

    /// `System.Threading.Interlocked::Exchange(ref int, int)`
    pub exchange_int32: MethodId<'g>,

    /// `System.Threading.Interlocked::Exchange<T>(ref T, T)`
    pub exchange_generic: MethodId<'g>,

    /// `System.ObjectDisposedException::.ctor(string)`
    pub disposed_exception_ctor: MethodId<'g>,

    pub object: TypeId<'g>,
    pub idisposable: TypeId<'g>,
    pub int32: TypeId<'g>,
    pub boolean: TypeId<'g>,
}

impl<'g> CoreReferences<'g> {
    pub fn resolve(graph: &'g TypeGraph<'g>) -> Result<CoreReferences<'g>, Error> {
        let object = find_type(graph, &QualifiedName::OBJECT)?;
        let gc = find_type(graph, &QualifiedName::GC)?;
        let idisposable = find_type(graph, &QualifiedName::IDISPOSABLE)?;
        let interlocked = find_type(graph, &QualifiedName::INTERLOCKED)?;
        let disposed_exception = find_type(graph, &QualifiedName::OBJECT_DISPOSED_EXCEPTION)?;

        let references = CoreReferences {
            object_finalize: find_method(object, &MemberName::FINALIZE, &[])?,
            suppress_finalize: find_method(gc, &MemberName::SUPPRESS_FINALIZE, &["Object"])?,
            dispose: find_method(idisposable, &MemberName::DISPOSE, &[])?,
            exchange_int32: find_method(interlocked, &MemberName::EXCHANGE, &["Int32&", "Int32"])?,
            exchange_generic: find_method(interlocked, &MemberName::EXCHANGE, &["T&", "T"])?,
            disposed_exception_ctor: find_method(disposed_exception, &MemberName::CTOR, &["String"])?,
            object,
            idisposable,
            int32: find_type(graph, &QualifiedName::INT32)?,
            boolean: find_type(graph, &QualifiedName::BOOLEAN)?,
        };
        debug!("Resolved core references");
        Ok(references)
    }

    pub fn int32_ref(&self) -> TypeRef<'g> {
        TypeRef::Named(self.int32)
    }

    pub fn boolean_ref(&self) -> TypeRef<'g> {
        TypeRef::Named(self.boolean)
    }
}

fn find_type<'g>(graph: &'g TypeGraph<'g>, name: &QualifiedName) -> Result<TypeId<'g>, Error> {
    graph
        .lookup_type(name)
        .ok_or_else(|| Error::MissingReference(format!("Could not find type '{}'", name)))
}

fn find_method<'g>(
    type_def: TypeId<'g>,
    name: &MemberName,
    parameter_types: &[&str],
) -> Result<MethodId<'g>, Error> {
    type_def
        .find_method(name.as_str(), parameter_types)
        .ok_or_else(|| {
            Error::MissingReference(format!(
                "Could not find '{}' on '{}'",
                name,
                type_def.name.simple_name()
            ))
        })
}
