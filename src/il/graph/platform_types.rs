use super::{GenericParameter, PlatformMembers, TypeData, TypeGraph, TypeId, TypeRef};
use crate::il::{MemberName, QualifiedName, TypeFlags};

/// Platform library: the types and members the weaver and the interpreter rely on
pub struct PlatformLibrary<'g> {
    pub types: PlatformTypes<'g>,
    pub members: PlatformMembers<'g>,
}

impl<'g> PlatformLibrary<'g> {
    pub fn add_to_graph(graph: &'g TypeGraph<'g>) -> PlatformLibrary<'g> {
        let types = PlatformTypes::add_to_graph(graph);
        let members = PlatformMembers::add_to_graph(graph, &types);
        PlatformLibrary { types, members }
    }
}

/// Types inside `System.*`
pub struct PlatformTypes<'g> {
    pub object: TypeId<'g>,
    pub value_type: TypeId<'g>,
    pub enum_: TypeId<'g>,
    pub boolean: TypeId<'g>,
    pub int32: TypeId<'g>,
    pub string: TypeId<'g>,
    pub attribute: TypeId<'g>,
    pub exception: TypeId<'g>,
    pub invalid_operation_exception: TypeId<'g>,
    pub object_disposed_exception: TypeId<'g>,
    pub not_implemented_exception: TypeId<'g>,
    pub idisposable: TypeId<'g>,
    pub gc: TypeId<'g>,
    pub interlocked: TypeId<'g>,
    pub task: TypeId<'g>,
    pub task_of_t: TypeId<'g>,
    pub task_completion_source: TypeId<'g>,
    pub stream: TypeId<'g>,
    pub memory_stream: TypeId<'g>,
    pub compiler_generated: TypeId<'g>,
    pub generated_code: TypeId<'g>,
}

impl<'g> PlatformTypes<'g> {
    pub fn add_to_graph(graph: &TypeGraph<'g>) -> PlatformTypes<'g> {
        let public = TypeFlags::PUBLIC | TypeFlags::BEFORE_FIELD_INIT;
        let sealed = public | TypeFlags::SEALED;
        let static_class = sealed | TypeFlags::ABSTRACT;

        let object = graph.add_type(TypeData::root(QualifiedName::OBJECT, public));

        let value_type = graph.add_type(TypeData::new(
            QualifiedName::VALUE_TYPE,
            object,
            public | TypeFlags::ABSTRACT,
        ));
        let enum_ = graph.add_type(TypeData::new(
            QualifiedName::ENUM,
            value_type,
            public | TypeFlags::ABSTRACT,
        ));
        let boolean = graph.add_type(TypeData::new(QualifiedName::BOOLEAN, value_type, sealed));
        let int32 = graph.add_type(TypeData::new(QualifiedName::INT32, value_type, sealed));
        let string = graph.add_type(TypeData::new(QualifiedName::STRING, object, sealed));
        let attribute = graph.add_type(TypeData::new(
            QualifiedName::name("System.Attribute"),
            object,
            public | TypeFlags::ABSTRACT,
        ));

        let exception = graph.add_type(TypeData::new(QualifiedName::EXCEPTION, object, public));
        let invalid_operation_exception = graph.add_type(TypeData::new(
            QualifiedName::INVALID_OPERATION_EXCEPTION,
            exception,
            public,
        ));
        let object_disposed_exception = graph.add_type(TypeData::new(
            QualifiedName::OBJECT_DISPOSED_EXCEPTION,
            invalid_operation_exception,
            public,
        ));
        let not_implemented_exception = graph.add_type(TypeData::new(
            QualifiedName::NOT_IMPLEMENTED_EXCEPTION,
            exception,
            public,
        ));

        let idisposable = graph.add_type(TypeData::interface(QualifiedName::IDISPOSABLE));
        let gc = graph.add_type(TypeData::new(QualifiedName::GC, object, static_class));
        let interlocked =
            graph.add_type(TypeData::new(QualifiedName::INTERLOCKED, object, static_class));

        let task = graph.add_type(TypeData::new(QualifiedName::TASK, object, public));
        let task_of_t = graph.add_type(
            TypeData::new(QualifiedName::TASK_OF_T, task, public)
                .with_generic_parameters(vec![GenericParameter::new(MemberName::name("TResult"))]),
        );
        let task_completion_source = graph.add_type(
            TypeData::new(QualifiedName::TASK_COMPLETION_SOURCE, object, public)
                .with_generic_parameters(vec![GenericParameter::new(MemberName::name("TResult"))]),
        );

        let stream = graph.add_type(TypeData::new(
            QualifiedName::STREAM,
            object,
            public | TypeFlags::ABSTRACT,
        ));
        let memory_stream =
            graph.add_type(TypeData::new(QualifiedName::MEMORY_STREAM, stream, public));

        let compiler_generated = graph.add_type(TypeData::new(
            QualifiedName::COMPILER_GENERATED,
            attribute,
            sealed,
        ));
        let generated_code =
            graph.add_type(TypeData::new(QualifiedName::GENERATED_CODE, attribute, sealed));

        task.interfaces.push(idisposable.0);
        stream.interfaces.push(idisposable.0);

        PlatformTypes {
            object,
            value_type,
            enum_,
            boolean,
            int32,
            string,
            attribute,
            exception,
            invalid_operation_exception,
            object_disposed_exception,
            not_implemented_exception,
            idisposable,
            gc,
            interlocked,
            task,
            task_of_t,
            task_completion_source,
            stream,
            memory_stream,
            compiler_generated,
            generated_code,
        }
    }

    pub fn object_ref(&self) -> TypeRef<'g> {
        TypeRef::Named(self.object)
    }

    pub fn int32_ref(&self) -> TypeRef<'g> {
        TypeRef::Named(self.int32)
    }

    pub fn boolean_ref(&self) -> TypeRef<'g> {
        TypeRef::Named(self.boolean)
    }

    pub fn string_ref(&self) -> TypeRef<'g> {
        TypeRef::Named(self.string)
    }
}
