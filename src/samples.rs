//! Sample types covering every disposal shape and the special cases around them
//!
//! These are built directly as type graph declarations and method bodies, the way a compiler
//! front end would have produced them. Every authored method body gets a sequence point so that
//! the debugger-related parts of weaving have something to act on.
//!
//! Two modules are built over the same graph: [`Samples::module`] weaves without errors, while
//! every type in [`Samples::invalid_module`] breaks one of the rules.

use crate::il::code::{Instruction, MethodBody, SequencePoint};
use crate::il::graph::{
    FieldData, FieldId, FieldRef, GenericParameter, MethodData, MethodId, MethodRef, Parameter,
    PlatformLibrary, TypeData, TypeGraph, TypeId, TypeRef,
};
use crate::il::model::{AssemblyReference, Constant, Field, Marker, Method, Module, Type};
use crate::il::{Error, FieldFlags, MemberName, MethodFlags, QualifiedName, TypeFlags};
use std::rc::Rc;

/// Opt-out markers, declared by the `Janitor` assembly
pub struct Markers<'g> {
    pub skip_weaving: TypeId<'g>,
    pub skip_weaving_namespace: TypeId<'g>,
}

/// Types of [`Samples::module`]
pub struct SampleTypes<'g> {
    /// Disposable class opted out of weaving, whose `Dispose` records an event
    pub resource: TypeId<'g>,

    pub simple: TypeId<'g>,
    pub with_managed: TypeId<'g>,
    pub with_unmanaged: TypeId<'g>,
    pub with_managed_and_unmanaged: TypeId<'g>,

    /// Not woven itself: overrides the virtual managed hook of its base
    pub derived: TypeId<'g>,

    pub with_unmanaged_and_disposable_field: TypeId<'g>,
    pub with_explicit_dispose: TypeId<'g>,
    pub with_task: TypeId<'g>,
    pub generic_holder: TypeId<'g>,
    pub with_not_implemented_dispose: TypeId<'g>,
    pub with_static_and_skipped_fields: TypeId<'g>,
    pub with_existing_finalizer: TypeId<'g>,

    // Never woven
    pub skipped_by_marker: TypeId<'g>,
    pub in_skipped_namespace: TypeId<'g>,
    pub generated_proxy: TypeId<'g>,
    pub abstract_base: TypeId<'g>,
    pub resource_interface: TypeId<'g>,
}

/// Types of [`Samples::invalid_module`]
pub struct InvalidTypes<'g> {
    pub with_readonly_field: TypeId<'g>,
    pub with_dispose_code: TypeId<'g>,
    pub with_two_dispose_methods: TypeId<'g>,
    pub base: TypeId<'g>,
    pub with_base_class: TypeId<'g>,
    pub with_collision: TypeId<'g>,
    pub handle: TypeId<'g>,
    pub with_value_type_field: TypeId<'g>,
    pub pool: TypeId<'g>,
    pub with_open_generic_field: TypeId<'g>,
}

pub struct Samples<'g> {
    pub platform: PlatformLibrary<'g>,
    pub markers: Markers<'g>,

    /// `static void Samples.Events::Record(string)`, which has no body: the host provides it
    pub record_event: MethodId<'g>,

    pub types: SampleTypes<'g>,
    pub module: Module<'g>,

    pub invalid: InvalidTypes<'g>,
    pub invalid_module: Module<'g>,
}

/// Name of the namespace opted out through an assembly marker
pub const SKIPPED_NAMESPACE: &str = "Legacy";

const DISPOSE_FLAGS: MethodFlags = MethodFlags::from_bits_truncate(
    MethodFlags::PUBLIC.bits()
        | MethodFlags::FINAL.bits()
        | MethodFlags::VIRTUAL.bits()
        | MethodFlags::HIDE_BY_SIG.bits()
        | MethodFlags::NEW_SLOT.bits(),
);

const CTOR_FLAGS: MethodFlags = MethodFlags::from_bits_truncate(
    MethodFlags::PUBLIC.bits()
        | MethodFlags::HIDE_BY_SIG.bits()
        | MethodFlags::SPECIAL_NAME.bits()
        | MethodFlags::RT_SPECIAL_NAME.bits(),
);

const METHOD_FLAGS: MethodFlags = MethodFlags::from_bits_truncate(
    MethodFlags::PUBLIC.bits() | MethodFlags::HIDE_BY_SIG.bits(),
);

const HOOK_FLAGS: MethodFlags = MethodFlags::from_bits_truncate(
    MethodFlags::PRIVATE.bits() | MethodFlags::HIDE_BY_SIG.bits(),
);

const VIRTUAL_HOOK_FLAGS: MethodFlags = MethodFlags::from_bits_truncate(
    MethodFlags::FAMILY.bits()
        | MethodFlags::VIRTUAL.bits()
        | MethodFlags::HIDE_BY_SIG.bits()
        | MethodFlags::NEW_SLOT.bits(),
);

const CLASS_FLAGS: TypeFlags =
    TypeFlags::from_bits_truncate(TypeFlags::PUBLIC.bits() | TypeFlags::BEFORE_FIELD_INIT.bits());

impl<'g> Samples<'g> {
    /// Add the platform, the markers, and both sample modules to an empty graph
    pub fn build(graph: &'g TypeGraph<'g>) -> Result<Samples<'g>, Error> {
        let platform = graph.insert_platform_types();

        let attribute = platform.types.attribute;
        let sealed = CLASS_FLAGS | TypeFlags::SEALED;
        let markers = Markers {
            skip_weaving: graph.add_type(TypeData::new(
                QualifiedName::name("Janitor.SkipWeaving"),
                attribute,
                sealed,
            )),
            skip_weaving_namespace: graph.add_type(TypeData::new(
                QualifiedName::name("Janitor.SkipWeavingNamespace"),
                attribute,
                sealed,
            )),
        };

        let events = graph.add_type(TypeData::new(
            QualifiedName::name("Samples.Events"),
            platform.types.object,
            sealed | TypeFlags::ABSTRACT,
        ));
        let record_event = graph.add_method(
            MethodData::new(
                events,
                MemberName::name("Record"),
                METHOD_FLAGS | MethodFlags::STATIC,
            )
            .with_parameters(vec![Parameter::new(
                MemberName::name("message"),
                platform.types.string_ref(),
            )]),
        );

        let mut builder = SampleBuilder {
            graph,
            platform: &platform,
            markers: &markers,
            record_event,
            document: Rc::from("Samples.cs"),
            next_line: 1,
        };

        let mut module = Module::new("Samples.dll");
        module
            .assembly_references
            .push(AssemblyReference::new("System.Runtime", "4.2.2.0"));
        module
            .assembly_references
            .push(AssemblyReference::new("Janitor", "1.0.0.0"));
        module.markers.push(
            Marker::new(markers.skip_weaving_namespace)
                .with_argument(Constant::String(String::from(SKIPPED_NAMESPACE))),
        );
        let mut events_type = Type::new(events);
        events_type.add_method(Method::new(record_event))?;
        module.add_type(events_type);
        let types = builder.build_valid(&mut module)?;

        let mut invalid_module = Module::new("Invalid.dll");
        invalid_module
            .assembly_references
            .push(AssemblyReference::new("Janitor", "1.0.0.0"));
        let invalid = builder.build_invalid(&mut invalid_module)?;

        Ok(Samples {
            platform,
            markers,
            record_event,
            types,
            module,
            invalid,
            invalid_module,
        })
    }
}

struct SampleBuilder<'p, 'g> {
    graph: &'g TypeGraph<'g>,
    platform: &'p PlatformLibrary<'g>,
    markers: &'p Markers<'g>,
    record_event: MethodId<'g>,
    document: Rc<str>,
    next_line: u32,
}

impl<'p, 'g> SampleBuilder<'p, 'g> {
    fn build_valid(&mut self, module: &mut Module<'g>) -> Result<SampleTypes<'g>, Error> {
        let object = self.platform.types.object;
        let stream = TypeRef::Named(self.platform.types.stream);

        // [SkipWeaving] class Resource : IDisposable { void Dispose() { Events.Record(..); } }
        let mut resource = self.disposable_class("Samples.Resource", object);
        resource.markers.push(self.skip_marker());
        self.default_constructor(&mut resource, vec![])?;
        let body = self.recording_body("Resource.Dispose");
        self.method(&mut resource, "Dispose", DISPOSE_FLAGS, body)?;
        let resource_id = resource.id;
        module.add_type(resource);

        // class Simple : IDisposable { Stream stream = new MemoryStream(); ... }
        let mut simple = self.disposable_class("Samples.Simple", object);
        let simple_stream = self.field(&mut simple, "stream", stream.clone())?;
        let init = self.assign_new_memory_stream(simple_stream);
        self.default_constructor(&mut simple, init)?;
        let body = self.recording_body("Simple.Method");
        self.method(&mut simple, "Method", METHOD_FLAGS, body)?;
        let body = self.recording_body("Simple.Helper");
        self.method(&mut simple, "Helper", HOOK_FLAGS, body)?;
        let body = self.recording_body("Simple.Reset");
        let family = (METHOD_FLAGS - MethodFlags::PUBLIC) | MethodFlags::FAMILY;
        self.method(&mut simple, "Reset", family, body)?;
        let body = self.recording_body("Simple.Flush");
        let assembly = (METHOD_FLAGS - MethodFlags::PUBLIC) | MethodFlags::ASSEMBLY;
        self.method(&mut simple, "Flush", assembly, body)?;
        let body = self.recording_body("Simple.Count");
        self.method(&mut simple, "Count", METHOD_FLAGS | MethodFlags::STATIC, body)?;
        self.empty_dispose(&mut simple)?;
        let simple_id = simple.id;
        module.add_type(simple);

        // class WithManaged : IDisposable { void DisposeManaged() { stream.Dispose(); stream = null; } }
        let mut with_managed = self.disposable_class("Samples.WithManaged", object);
        let managed_stream = self.field(&mut with_managed, "stream", stream.clone())?;
        let init = self.assign_new_memory_stream(managed_stream);
        self.default_constructor(&mut with_managed, init)?;
        let body = self.recording_body("WithManaged.Method");
        self.method(&mut with_managed, "Method", METHOD_FLAGS, body)?;
        let mut body = MethodBody::new();
        body.push(Instruction::LdArg(0));
        body.push(Instruction::LdFld(FieldRef::direct(managed_stream)));
        body.push(Instruction::LdNull);
        body.push(Instruction::Ceq);
        body.push(Instruction::Ret);
        self.method_returning(
            &mut with_managed,
            "get_IsDisposed",
            METHOD_FLAGS | MethodFlags::SPECIAL_NAME,
            self.platform.types.boolean_ref(),
            body,
        )?;
        let mut body = MethodBody::new();
        body.push(Instruction::LdArg(0));
        body.push(Instruction::LdFld(FieldRef::direct(managed_stream)));
        body.push(Instruction::CallVirt(self.dispose_interface()));
        body.push(Instruction::LdArg(0));
        body.push(Instruction::LdNull);
        body.push(Instruction::StFld(FieldRef::direct(managed_stream)));
        body.extend(self.record("WithManaged.DisposeManaged"));
        body.push(Instruction::Ret);
        self.method(&mut with_managed, "DisposeManaged", HOOK_FLAGS, body)?;
        self.empty_dispose(&mut with_managed)?;
        let with_managed_id = with_managed.id;
        module.add_type(with_managed);

        // class WithUnmanaged : IDisposable { void DisposeUnmanaged() { ... } }
        let mut with_unmanaged = self.disposable_class("Samples.WithUnmanaged", object);
        self.default_constructor(&mut with_unmanaged, vec![])?;
        let body = self.recording_body("WithUnmanaged.Method");
        self.method(&mut with_unmanaged, "Method", METHOD_FLAGS, body)?;
        let body = self.recording_body("WithUnmanaged.DisposeUnmanaged");
        self.method(&mut with_unmanaged, "DisposeUnmanaged", HOOK_FLAGS, body)?;
        self.empty_dispose(&mut with_unmanaged)?;
        let with_unmanaged_id = with_unmanaged.id;
        module.add_type(with_unmanaged);

        // class WithManagedAndUnmanaged : IDisposable, with both hooks virtual
        let mut both = self.disposable_class("Samples.WithManagedAndUnmanaged", object);
        let both_ctor = self.default_constructor(&mut both, vec![])?;
        let body = self.recording_body("WithManagedAndUnmanaged.Method");
        self.method(&mut both, "Method", METHOD_FLAGS, body)?;
        let body = self.recording_body("WithManagedAndUnmanaged.DisposeManaged");
        let base_managed = self.method(&mut both, "DisposeManaged", VIRTUAL_HOOK_FLAGS, body)?;
        let body = self.recording_body("WithManagedAndUnmanaged.DisposeUnmanaged");
        self.method(&mut both, "DisposeUnmanaged", VIRTUAL_HOOK_FLAGS, body)?;
        self.empty_dispose(&mut both)?;
        let both_id = both.id;
        module.add_type(both);

        // class Derived : WithManagedAndUnmanaged {
        //     protected override void DisposeManaged() { Events.Record(..); base.DisposeManaged(); }
        // }
        let mut derived = self.class("Samples.Derived", both_id);
        self.constructor(&mut derived, both_ctor, vec![])?;
        let mut body = MethodBody::new();
        body.extend(self.record("Derived.DisposeManaged"));
        body.push(Instruction::LdArg(0));
        body.push(Instruction::Call(MethodRef::direct(base_managed)));
        body.push(Instruction::Ret);
        self.method(
            &mut derived,
            "DisposeManaged",
            VIRTUAL_HOOK_FLAGS - MethodFlags::NEW_SLOT,
            body,
        )?;
        let derived_id = derived.id;
        module.add_type(derived);

        // class WithUnmanagedAndDisposableField : IDisposable { Stream stream; void DisposeUnmanaged() }
        let mut with_field = self.disposable_class("Samples.WithUnmanagedAndDisposableField", object);
        let field_stream = self.field(&mut with_field, "stream", stream.clone())?;
        let init = self.assign_new_memory_stream(field_stream);
        self.default_constructor(&mut with_field, init)?;
        let body = self.recording_body("WithUnmanagedAndDisposableField.DisposeUnmanaged");
        self.method(&mut with_field, "DisposeUnmanaged", HOOK_FLAGS, body)?;
        self.empty_dispose(&mut with_field)?;
        let with_field_id = with_field.id;
        module.add_type(with_field);

        // class WithExplicitDisposeMethod : IDisposable { void IDisposable.Dispose() {} }
        let mut explicit = self.disposable_class("Samples.WithExplicitDisposeMethod", object);
        let explicit_stream = self.field(&mut explicit, "stream", stream.clone())?;
        let init = self.assign_new_memory_stream(explicit_stream);
        self.default_constructor(&mut explicit, init)?;
        let body = self.recording_body("WithExplicitDisposeMethod.Method");
        self.method(&mut explicit, "Method", METHOD_FLAGS, body)?;
        let mut body = MethodBody::new();
        body.push(Instruction::Nop);
        body.push(Instruction::Ret);
        self.method(
            &mut explicit,
            "System.IDisposable.Dispose",
            (DISPOSE_FLAGS - MethodFlags::PUBLIC) | MethodFlags::PRIVATE,
            body,
        )?;
        let explicit_id = explicit.id;
        module.add_type(explicit);

        // class WithTask : IDisposable { Task task = new Task(); Stream stream = new MemoryStream(); }
        let mut with_task = self.disposable_class("Samples.WithTask", object);
        let task = self.field(
            &mut with_task,
            "task",
            TypeRef::Named(self.platform.types.task),
        )?;
        let task_stream = self.field(&mut with_task, "stream", stream.clone())?;
        let mut init = vec![
            Instruction::LdArg(0),
            Instruction::NewObj(MethodRef::direct(self.platform.members.task.ctor)),
            Instruction::StFld(FieldRef::direct(task)),
        ];
        init.extend(self.assign_new_memory_stream(task_stream));
        self.default_constructor(&mut with_task, init)?;
        self.empty_dispose(&mut with_task)?;
        let with_task_id = with_task.id;
        module.add_type(with_task);

        // class GenericHolder<T> : IDisposable where T : IDisposable { T value; }
        let holder = self.graph.add_type(
            TypeData::new(
                QualifiedName::name("Samples.GenericHolder`1"),
                object,
                CLASS_FLAGS,
            )
            .with_generic_parameters(vec![GenericParameter::constrained_to(
                MemberName::name("T"),
                vec![TypeRef::Named(self.platform.types.idisposable)],
            )]),
        );
        holder.interfaces.push(self.platform.types.idisposable.0);
        let mut generic_holder = Type::new(holder);
        let value_type = TypeRef::TypeParameter(holder, 0);
        let value = self.field(&mut generic_holder, "value", value_type.clone())?;
        let mut body = MethodBody::new();
        body.push(Instruction::LdArg(0));
        body.push(Instruction::Call(MethodRef::direct(
            self.platform.members.object.ctor,
        )));
        body.push(Instruction::LdArg(0));
        body.push(Instruction::LdArg(1));
        body.push(Instruction::StFld(FieldRef::on_self(value)));
        body.push(Instruction::Ret);
        let ctor = MethodData::new(holder, MemberName::CTOR, CTOR_FLAGS)
            .with_parameters(vec![Parameter::new(MemberName::name("value"), value_type)]);
        self.add_method(&mut generic_holder, ctor, body)?;
        let mut body = MethodBody::new();
        body.push(Instruction::LdArg(0));
        body.push(Instruction::LdFld(FieldRef::on_self(value)));
        body.push(Instruction::Box(TypeRef::TypeParameter(holder, 0)));
        body.push(Instruction::LdNull);
        body.push(Instruction::Ceq);
        body.push(Instruction::LdcI4(0));
        body.push(Instruction::Ceq);
        body.push(Instruction::Ret);
        self.method_returning(
            &mut generic_holder,
            "get_HasValue",
            METHOD_FLAGS | MethodFlags::SPECIAL_NAME,
            self.platform.types.boolean_ref(),
            body,
        )?;
        self.empty_dispose(&mut generic_holder)?;
        module.add_type(generic_holder);

        // class WithNotImplementedDispose : IDisposable { void Dispose() { throw new NotImplementedException(); } }
        let mut not_implemented = self.disposable_class("Samples.WithNotImplementedDispose", object);
        let not_implemented_stream = self.field(&mut not_implemented, "stream", stream.clone())?;
        let init = self.assign_new_memory_stream(not_implemented_stream);
        self.default_constructor(&mut not_implemented, init)?;
        let mut body = MethodBody::new();
        body.push(Instruction::NewObj(MethodRef::direct(
            self.platform.members.not_implemented_exception.ctor,
        )));
        body.push(Instruction::Throw);
        self.method(&mut not_implemented, "Dispose", DISPOSE_FLAGS, body)?;
        let not_implemented_id = not_implemented.id;
        module.add_type(not_implemented);

        // class WithStaticAndSkippedFields : IDisposable {
        //     static Stream shared;
        //     [SkipWeaving] Stream kept = new MemoryStream();
        //     Stream owned = new MemoryStream();
        // }
        let mut static_and_skipped = self.disposable_class("Samples.WithStaticAndSkippedFields", object);
        self.field_with_flags(
            &mut static_and_skipped,
            "shared",
            stream.clone(),
            FieldFlags::PRIVATE | FieldFlags::STATIC,
            None,
        )?;
        let kept = self.field_with_flags(
            &mut static_and_skipped,
            "kept",
            stream.clone(),
            FieldFlags::PRIVATE,
            Some(self.skip_marker()),
        )?;
        let owned = self.field(&mut static_and_skipped, "owned", stream.clone())?;
        let mut init = self.assign_new_memory_stream(kept);
        init.extend(self.assign_new_memory_stream(owned));
        self.default_constructor(&mut static_and_skipped, init)?;
        self.empty_dispose(&mut static_and_skipped)?;
        let static_and_skipped_id = static_and_skipped.id;
        module.add_type(static_and_skipped);

        // class WithExistingFinalizer : IDisposable { void DisposeUnmanaged(); ~WithExistingFinalizer() }
        let mut with_finalizer = self.disposable_class("Samples.WithExistingFinalizer", object);
        self.default_constructor(&mut with_finalizer, vec![])?;
        let body = self.recording_body("WithExistingFinalizer.DisposeUnmanaged");
        self.method(&mut with_finalizer, "DisposeUnmanaged", HOOK_FLAGS, body)?;
        let mut body = MethodBody::new();
        body.extend(self.record("WithExistingFinalizer.Finalize"));
        body.push(Instruction::LdArg(0));
        body.push(Instruction::Call(MethodRef::direct(
            self.platform.members.object.finalize,
        )));
        body.push(Instruction::Ret);
        self.method(
            &mut with_finalizer,
            "Finalize",
            MethodFlags::FAMILY | MethodFlags::VIRTUAL | MethodFlags::HIDE_BY_SIG,
            body,
        )?;
        self.empty_dispose(&mut with_finalizer)?;
        let with_finalizer_id = with_finalizer.id;
        module.add_type(with_finalizer);

        // Types the weaver must leave alone (each would be an error if it were woven)
        let mut skipped = self.disposable_class("Samples.SkippedByMarker", object);
        skipped.markers.push(self.skip_marker());
        self.dispose_with_code(&mut skipped)?;
        let skipped_id = skipped.id;
        module.add_type(skipped);

        let mut in_namespace = self.disposable_class("Legacy.InSkippedNamespace", object);
        self.dispose_with_code(&mut in_namespace)?;
        let in_namespace_id = in_namespace.id;
        module.add_type(in_namespace);

        let mut proxy = self.disposable_class("Samples.GeneratedProxy", object);
        proxy
            .markers
            .push(Marker::new(self.platform.types.compiler_generated));
        self.dispose_with_code(&mut proxy)?;
        let proxy_id = proxy.id;
        module.add_type(proxy);

        let abstract_id = self.graph.add_type(TypeData::new(
            QualifiedName::name("Samples.AbstractBase"),
            object,
            CLASS_FLAGS | TypeFlags::ABSTRACT,
        ));
        abstract_id
            .interfaces
            .push(self.platform.types.idisposable.0);
        let mut abstract_base = Type::new(abstract_id);
        let abstract_stream = self.field(&mut abstract_base, "stream", stream)?;
        let init = self.assign_new_memory_stream(abstract_stream);
        let ctor_flags = (CTOR_FLAGS - MethodFlags::PUBLIC) | MethodFlags::FAMILY;
        let mut body = MethodBody::new();
        body.push(Instruction::LdArg(0));
        body.push(Instruction::Call(MethodRef::direct(
            self.platform.members.object.ctor,
        )));
        body.extend(init);
        body.push(Instruction::Ret);
        self.add_method(
            &mut abstract_base,
            MethodData::new(abstract_id, MemberName::CTOR, ctor_flags),
            body,
        )?;
        self.empty_dispose(&mut abstract_base)?;
        module.add_type(abstract_base);

        let interface_id = self
            .graph
            .add_type(TypeData::interface(QualifiedName::name("Samples.IResource")));
        let mut resource_interface = Type::new(interface_id);
        let dispose = self.graph.add_method(MethodData::new(
            interface_id,
            MemberName::DISPOSE,
            MethodFlags::PUBLIC
                | MethodFlags::VIRTUAL
                | MethodFlags::ABSTRACT
                | MethodFlags::NEW_SLOT
                | MethodFlags::HIDE_BY_SIG,
        ));
        resource_interface.add_method(Method::new(dispose))?;
        module.add_type(resource_interface);

        Ok(SampleTypes {
            resource: resource_id,
            simple: simple_id,
            with_managed: with_managed_id,
            with_unmanaged: with_unmanaged_id,
            with_managed_and_unmanaged: both_id,
            derived: derived_id,
            with_unmanaged_and_disposable_field: with_field_id,
            with_explicit_dispose: explicit_id,
            with_task: with_task_id,
            generic_holder: holder,
            with_not_implemented_dispose: not_implemented_id,
            with_static_and_skipped_fields: static_and_skipped_id,
            with_existing_finalizer: with_finalizer_id,
            skipped_by_marker: skipped_id,
            in_skipped_namespace: in_namespace_id,
            generated_proxy: proxy_id,
            abstract_base: abstract_id,
            resource_interface: interface_id,
        })
    }

    fn build_invalid(&mut self, module: &mut Module<'g>) -> Result<InvalidTypes<'g>, Error> {
        let object = self.platform.types.object;
        let stream = TypeRef::Named(self.platform.types.stream);

        let mut readonly = self.disposable_class("Invalid.WithReadonlyField", object);
        let readonly_stream = self.field_with_flags(
            &mut readonly,
            "stream",
            stream.clone(),
            FieldFlags::PRIVATE | FieldFlags::INIT_ONLY,
            None,
        )?;
        let init = self.assign_new_memory_stream(readonly_stream);
        self.default_constructor(&mut readonly, init)?;
        self.empty_dispose(&mut readonly)?;
        let readonly_id = readonly.id;
        module.add_type(readonly);

        let mut with_code = self.disposable_class("Invalid.WithDisposeCode", object);
        self.dispose_with_code(&mut with_code)?;
        let with_code_id = with_code.id;
        module.add_type(with_code);

        let mut two_disposes = self.disposable_class("Invalid.WithTwoDisposeMethods", object);
        self.empty_dispose(&mut two_disposes)?;
        let mut body = MethodBody::new();
        body.push(Instruction::Ret);
        self.method(
            &mut two_disposes,
            "System.IDisposable.Dispose",
            (DISPOSE_FLAGS - MethodFlags::PUBLIC) | MethodFlags::PRIVATE,
            body,
        )?;
        let two_disposes_id = two_disposes.id;
        module.add_type(two_disposes);

        let mut base = self.class("Invalid.Base", object);
        let base_ctor = self.default_constructor(&mut base, vec![])?;
        let base_id = base.id;
        module.add_type(base);

        let mut with_base = self.disposable_class("Invalid.WithBaseClass", base_id);
        self.constructor(&mut with_base, base_ctor, vec![])?;
        self.empty_dispose(&mut with_base)?;
        let with_base_id = with_base.id;
        module.add_type(with_base);

        let mut collision = self.disposable_class("Invalid.WithCollision", object);
        self.field(
            &mut collision,
            "disposed",
            self.platform.types.boolean_ref(),
        )?;
        self.empty_dispose(&mut collision)?;
        let collision_id = collision.id;
        module.add_type(collision);

        // struct Handle : IDisposable
        let handle = self.graph.add_type(TypeData::new(
            QualifiedName::name("Invalid.Handle"),
            self.platform.types.value_type,
            CLASS_FLAGS | TypeFlags::SEALED,
        ));
        handle.interfaces.push(self.platform.types.idisposable.0);
        module.add_type(Type::new(handle));

        let mut with_value_type = self.disposable_class("Invalid.WithValueTypeField", object);
        self.field(&mut with_value_type, "handle", TypeRef::Named(handle))?;
        self.empty_dispose(&mut with_value_type)?;
        let with_value_type_id = with_value_type.id;
        module.add_type(with_value_type);

        // [SkipWeaving] class Pool<T> : IDisposable
        let pool = self.graph.add_type(
            TypeData::new(QualifiedName::name("Invalid.Pool`1"), object, CLASS_FLAGS)
                .with_generic_parameters(vec![GenericParameter::new(MemberName::name("T"))]),
        );
        pool.interfaces.push(self.platform.types.idisposable.0);
        module.add_type(Type::new(pool).with_marker(self.skip_marker()));

        let mut with_open_generic = self.disposable_class("Invalid.WithOpenGenericField", object);
        self.field(&mut with_open_generic, "pool", TypeRef::Named(pool))?;
        self.empty_dispose(&mut with_open_generic)?;
        let with_open_generic_id = with_open_generic.id;
        module.add_type(with_open_generic);

        Ok(InvalidTypes {
            with_readonly_field: readonly_id,
            with_dispose_code: with_code_id,
            with_two_dispose_methods: two_disposes_id,
            base: base_id,
            with_base_class: with_base_id,
            with_collision: collision_id,
            handle,
            with_value_type_field: with_value_type_id,
            pool,
            with_open_generic_field: with_open_generic_id,
        })
    }

    fn skip_marker(&self) -> Marker<'g> {
        Marker::new(self.markers.skip_weaving)
    }

    fn class(&self, name: &'static str, base: TypeId<'g>) -> Type<'g> {
        Type::new(
            self.graph
                .add_type(TypeData::new(QualifiedName::name(name), base, CLASS_FLAGS)),
        )
    }

    /// Class implementing `System.IDisposable`
    fn disposable_class(&self, name: &'static str, base: TypeId<'g>) -> Type<'g> {
        let class = self.class(name, base);
        class.id.interfaces.push(self.platform.types.idisposable.0);
        class
    }

    fn field(
        &self,
        type_def: &mut Type<'g>,
        name: &'static str,
        field_type: TypeRef<'g>,
    ) -> Result<FieldId<'g>, Error> {
        self.field_with_flags(type_def, name, field_type, FieldFlags::PRIVATE, None)
    }

    fn field_with_flags(
        &self,
        type_def: &mut Type<'g>,
        name: &'static str,
        field_type: TypeRef<'g>,
        flags: FieldFlags,
        marker: Option<Marker<'g>>,
    ) -> Result<FieldId<'g>, Error> {
        let id = self.graph.add_field(FieldData::new(
            type_def.id,
            MemberName::name(name),
            field_type,
            flags,
        ));
        let mut field = Field::new(id);
        field.markers.extend(marker);
        type_def.add_field(field)?;
        Ok(id)
    }

    /// Add an authored method, with a sequence point on its first instruction
    fn add_method(
        &mut self,
        type_def: &mut Type<'g>,
        method: MethodData<'g>,
        mut body: MethodBody<'g>,
    ) -> Result<MethodId<'g>, Error> {
        if let Some(first) = body.first() {
            body.sequence_points.push(SequencePoint::new(
                first,
                self.document.clone(),
                self.next_line,
            ));
            self.next_line += 4;
        }
        type_def.declare_method(self.graph, method, body)
    }

    fn method(
        &mut self,
        type_def: &mut Type<'g>,
        name: &'static str,
        flags: MethodFlags,
        body: MethodBody<'g>,
    ) -> Result<MethodId<'g>, Error> {
        let method = MethodData::new(type_def.id, MemberName::name(name), flags);
        self.add_method(type_def, method, body)
    }

    fn method_returning(
        &mut self,
        type_def: &mut Type<'g>,
        name: &'static str,
        flags: MethodFlags,
        return_type: TypeRef<'g>,
        body: MethodBody<'g>,
    ) -> Result<MethodId<'g>, Error> {
        let method =
            MethodData::new(type_def.id, MemberName::name(name), flags).returning(return_type);
        self.add_method(type_def, method, body)
    }

    /// Constructor calling `System.Object::.ctor()` then running the initializers
    fn default_constructor(
        &mut self,
        type_def: &mut Type<'g>,
        init: Vec<Instruction<'g>>,
    ) -> Result<MethodId<'g>, Error> {
        let object_ctor = self.platform.members.object.ctor;
        self.constructor(type_def, object_ctor, init)
    }

    fn constructor(
        &mut self,
        type_def: &mut Type<'g>,
        base_ctor: MethodId<'g>,
        init: Vec<Instruction<'g>>,
    ) -> Result<MethodId<'g>, Error> {
        let mut body = MethodBody::new();
        body.push(Instruction::LdArg(0));
        body.push(Instruction::Call(MethodRef::direct(base_ctor)));
        body.extend(init);
        body.push(Instruction::Ret);
        let method = MethodData::new(type_def.id, MemberName::CTOR, CTOR_FLAGS);
        self.add_method(type_def, method, body)
    }

    /// `public void Dispose() { }`
    fn empty_dispose(&mut self, type_def: &mut Type<'g>) -> Result<MethodId<'g>, Error> {
        let mut body = MethodBody::new();
        body.push(Instruction::Nop);
        body.push(Instruction::Ret);
        self.method(type_def, "Dispose", DISPOSE_FLAGS, body)
    }

    /// `public void Dispose()` that records an event
    fn dispose_with_code(&mut self, type_def: &mut Type<'g>) -> Result<MethodId<'g>, Error> {
        let event = format!("{}.Dispose", type_def.id.name.simple_name());
        let mut body = MethodBody::new();
        body.push(Instruction::LdStr(event));
        body.push(Instruction::Call(MethodRef::direct(self.record_event)));
        body.push(Instruction::Ret);
        self.method(type_def, "Dispose", DISPOSE_FLAGS, body)
    }

    fn record(&self, event: &str) -> Vec<Instruction<'g>> {
        vec![
            Instruction::LdStr(event.to_owned()),
            Instruction::Call(MethodRef::direct(self.record_event)),
        ]
    }

    /// Body that only records an event
    fn recording_body(&self, event: &str) -> MethodBody<'g> {
        let mut body = MethodBody::new();
        body.extend(self.record(event));
        body.push(Instruction::Ret);
        body
    }

    /// `this.field = new MemoryStream();`
    fn assign_new_memory_stream(&self, field: FieldId<'g>) -> Vec<Instruction<'g>> {
        vec![
            Instruction::LdArg(0),
            Instruction::NewObj(MethodRef::direct(self.platform.members.memory_stream.ctor)),
            Instruction::StFld(FieldRef::direct(field)),
        ]
    }

    fn dispose_interface(&self) -> MethodRef<'g> {
        MethodRef::direct(self.platform.members.idisposable.dispose)
    }
}

#[cfg(test)]
mod test {
    use super::Samples;
    use crate::il::graph::{TypeGraph, TypeGraphArenas};
    use crate::il::verifier;

    #[test]
    fn sample_bodies_verify() {
        let arenas = TypeGraphArenas::new();
        let graph = TypeGraph::new(&arenas);
        let samples = Samples::build(&graph).unwrap();

        verifier::verify_module(&samples.module).unwrap();
        verifier::verify_module(&samples.invalid_module).unwrap();
        assert!(samples.module.references_assembly("Janitor"));
    }
}
