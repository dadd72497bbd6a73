use super::{
    GenericParameter, MethodData, MethodId, Parameter, PlatformTypes, TypeGraph, TypeRef,
};
use crate::il::{GenericParameterFlags, MemberName, MethodFlags};

/// Members of the platform types the weaver emits calls to
pub struct PlatformMembers<'g> {
    pub object: ObjectMembers<'g>,
    pub idisposable: DisposableMembers<'g>,
    pub gc: GcMembers<'g>,
    pub interlocked: InterlockedMembers<'g>,
    pub exception: ExceptionMembers<'g>,
    pub invalid_operation_exception: ExceptionConstructor<'g>,
    pub object_disposed_exception: ExceptionConstructor<'g>,
    pub not_implemented_exception: NotImplementedExceptionMembers<'g>,
    pub task: DisposableClassMembers<'g>,
    pub stream: DisposableClassMembers<'g>,
    pub memory_stream: ConstructorOnly<'g>,
}

/// Members of `System.Object`
pub struct ObjectMembers<'g> {
    pub ctor: MethodId<'g>,
    pub finalize: MethodId<'g>,
}

/// `Dispose()` on `System.IDisposable` (and on the platform types implementing it)
pub struct DisposableMembers<'g> {
    pub dispose: MethodId<'g>,
}

/// Members of `System.GC`
pub struct GcMembers<'g> {
    pub suppress_finalize: MethodId<'g>,
}

/// Members of `System.Threading.Interlocked`
pub struct InterlockedMembers<'g> {
    /// `int Exchange(ref int, int)`
    pub exchange_int32: MethodId<'g>,

    /// `T Exchange<T>(ref T, T) where T : class`
    pub exchange_generic: MethodId<'g>,
}

/// Members of `System.Exception`
pub struct ExceptionMembers<'g> {
    pub ctor_string: MethodId<'g>,
    pub get_message: MethodId<'g>,
}

/// Exceptions constructed from a message (or object name)
pub struct ExceptionConstructor<'g> {
    pub ctor_string: MethodId<'g>,
}

/// Members of `System.NotImplementedException`
pub struct NotImplementedExceptionMembers<'g> {
    pub ctor: MethodId<'g>,
}

/// Constructor and `Dispose()` of a platform class implementing `System.IDisposable`
pub struct DisposableClassMembers<'g> {
    pub ctor: MethodId<'g>,
    pub dispose: MethodId<'g>,
}

pub struct ConstructorOnly<'g> {
    pub ctor: MethodId<'g>,
}

const CTOR_FLAGS: MethodFlags = MethodFlags::from_bits_truncate(
    MethodFlags::PUBLIC.bits()
        | MethodFlags::HIDE_BY_SIG.bits()
        | MethodFlags::SPECIAL_NAME.bits()
        | MethodFlags::RT_SPECIAL_NAME.bits(),
);

const INTERFACE_IMPL_FLAGS: MethodFlags = MethodFlags::from_bits_truncate(
    MethodFlags::PUBLIC.bits()
        | MethodFlags::FINAL.bits()
        | MethodFlags::VIRTUAL.bits()
        | MethodFlags::HIDE_BY_SIG.bits()
        | MethodFlags::NEW_SLOT.bits(),
);

const STATIC_FLAGS: MethodFlags = MethodFlags::from_bits_truncate(
    MethodFlags::PUBLIC.bits() | MethodFlags::STATIC.bits() | MethodFlags::HIDE_BY_SIG.bits(),
);

impl<'g> PlatformMembers<'g> {
    pub fn add_to_graph(graph: &TypeGraph<'g>, types: &PlatformTypes<'g>) -> PlatformMembers<'g> {
        let string = types.string_ref();

        let object = ObjectMembers {
            ctor: graph.add_method(MethodData::new(types.object, MemberName::CTOR, CTOR_FLAGS)),
            finalize: graph.add_method(MethodData::new(
                types.object,
                MemberName::FINALIZE,
                MethodFlags::FAMILY | MethodFlags::VIRTUAL | MethodFlags::HIDE_BY_SIG,
            )),
        };

        let idisposable = DisposableMembers {
            dispose: graph.add_method(MethodData::new(
                types.idisposable,
                MemberName::DISPOSE,
                MethodFlags::PUBLIC
                    | MethodFlags::VIRTUAL
                    | MethodFlags::ABSTRACT
                    | MethodFlags::NEW_SLOT
                    | MethodFlags::HIDE_BY_SIG,
            )),
        };

        let gc = GcMembers {
            suppress_finalize: graph.add_method(
                MethodData::new(types.gc, MemberName::SUPPRESS_FINALIZE, STATIC_FLAGS)
                    .with_parameters(vec![Parameter::new(
                        MemberName::name("obj"),
                        types.object_ref(),
                    )]),
            ),
        };

        let interlocked = InterlockedMembers {
            exchange_int32: graph.add_method(
                MethodData::new(types.interlocked, MemberName::EXCHANGE, STATIC_FLAGS)
                    .with_parameters(vec![
                        Parameter::new(MemberName::name("location1"), types.int32_ref().by_ref()),
                        Parameter::new(MemberName::name("value"), types.int32_ref()),
                    ])
                    .returning(types.int32_ref()),
            ),
            exchange_generic: graph.add_method(
                MethodData::new(types.interlocked, MemberName::EXCHANGE, STATIC_FLAGS)
                    .with_generic_parameters(vec![reference_parameter("T")])
                    .with_parameters(vec![
                        Parameter::new(
                            MemberName::name("location1"),
                            TypeRef::MethodParameter(0).by_ref(),
                        ),
                        Parameter::new(MemberName::name("value"), TypeRef::MethodParameter(0)),
                    ])
                    .returning(TypeRef::MethodParameter(0)),
            ),
        };

        let exception = ExceptionMembers {
            ctor_string: graph.add_method(
                MethodData::new(types.exception, MemberName::CTOR, CTOR_FLAGS)
                    .with_parameters(vec![Parameter::new(
                        MemberName::name("message"),
                        string.clone(),
                    )]),
            ),
            get_message: graph.add_method(
                MethodData::new(
                    types.exception,
                    MemberName::GET_MESSAGE,
                    MethodFlags::PUBLIC
                        | MethodFlags::VIRTUAL
                        | MethodFlags::HIDE_BY_SIG
                        | MethodFlags::SPECIAL_NAME,
                )
                .returning(string.clone()),
            ),
        };

        let invalid_operation_exception = ExceptionConstructor {
            ctor_string: graph.add_method(
                MethodData::new(types.invalid_operation_exception, MemberName::CTOR, CTOR_FLAGS)
                    .with_parameters(vec![Parameter::new(
                        MemberName::name("message"),
                        string.clone(),
                    )]),
            ),
        };

        let object_disposed_exception = ExceptionConstructor {
            ctor_string: graph.add_method(
                MethodData::new(types.object_disposed_exception, MemberName::CTOR, CTOR_FLAGS)
                    .with_parameters(vec![Parameter::new(
                        MemberName::name("objectName"),
                        string,
                    )]),
            ),
        };

        let not_implemented_exception = NotImplementedExceptionMembers {
            ctor: graph.add_method(MethodData::new(
                types.not_implemented_exception,
                MemberName::CTOR,
                CTOR_FLAGS,
            )),
        };

        let task = DisposableClassMembers {
            ctor: graph.add_method(MethodData::new(types.task, MemberName::CTOR, CTOR_FLAGS)),
            dispose: graph.add_method(MethodData::new(
                types.task,
                MemberName::DISPOSE,
                INTERFACE_IMPL_FLAGS,
            )),
        };

        let stream = DisposableClassMembers {
            ctor: graph.add_method(MethodData::new(
                types.stream,
                MemberName::CTOR,
                (CTOR_FLAGS - MethodFlags::PUBLIC) | MethodFlags::FAMILY,
            )),
            dispose: graph.add_method(MethodData::new(
                types.stream,
                MemberName::DISPOSE,
                INTERFACE_IMPL_FLAGS,
            )),
        };

        let memory_stream = ConstructorOnly {
            ctor: graph.add_method(MethodData::new(
                types.memory_stream,
                MemberName::CTOR,
                CTOR_FLAGS,
            )),
        };

        PlatformMembers {
            object,
            idisposable,
            gc,
            interlocked,
            exception,
            invalid_operation_exception,
            object_disposed_exception,
            not_implemented_exception,
            task,
            stream,
            memory_stream,
        }
    }
}

/// Generic parameter constrained to reference types (the shape of `Interlocked.Exchange<T>`)
fn reference_parameter<'g>(name: &'static str) -> GenericParameter<'g> {
    let mut param = GenericParameter::new(MemberName::name(name));
    param.flags = GenericParameterFlags::REFERENCE_TYPE_CONSTRAINT;
    param
}

#[cfg(test)]
mod test {
    use crate::il::graph::{TypeGraph, TypeGraphArenas};

    #[test]
    fn lookups_by_signature() {
        let arenas = TypeGraphArenas::new();
        let graph = TypeGraph::new(&arenas);
        let platform = graph.insert_platform_types();
        let types = &platform.types;
        let members = &platform.members;

        assert_eq!(
            types.interlocked.find_method("Exchange", &["Int32&", "Int32"]),
            Some(members.interlocked.exchange_int32)
        );
        assert_eq!(
            types.interlocked.find_method("Exchange", &["T&", "T"]),
            Some(members.interlocked.exchange_generic)
        );
        assert_eq!(
            types.gc.find_method("SuppressFinalize", &["Object"]),
            Some(members.gc.suppress_finalize)
        );
        assert!(members.object.finalize.is_finalizer());
        assert!(members.object.finalize.is_virtual());
        assert_eq!(members.exception.ctor_string.argument_count(), 2);
    }
}
