mod harness;

use harness::{method_id, TestError, Woven};
use janitor::il::graph::{TypeGraph, TypeGraphArenas};
use janitor::interp::{Trap, Value};
use janitor::weave::Settings;

#[test]
fn simple_disposes_its_fields_once() -> Result<(), TestError> {
    let arenas = TypeGraphArenas::new();
    let graph = TypeGraph::new(&arenas);
    let woven = Woven::samples(&graph, Settings::new()?)?;
    let simple = woven.samples.types.simple;
    let mut runtime = woven.runtime();

    let instance = runtime.create(simple)?;
    let stream = runtime.field_object(instance, simple, "stream");
    runtime.invoke(instance, simple, "Method")?;
    assert_eq!(runtime.take_events(), vec!["Simple.Method"]);

    runtime.dispose(instance)?;
    assert_eq!(runtime.field(instance, simple, "stream"), Value::Null);
    assert_eq!(runtime.dispose_count(stream), 1);
    let result = runtime.invoke(instance, simple, "Method");
    runtime.assert_disposed(result, "Simple");

    // Every later call is a no-op
    runtime.dispose(instance)?;
    runtime.dispose(instance)?;
    assert_eq!(runtime.dispose_count(stream), 1);
    assert!(runtime.take_events().is_empty());
    Ok(())
}

#[test]
fn disposed_instances_throw() -> Result<(), TestError> {
    let arenas = TypeGraphArenas::new();
    let graph = TypeGraph::new(&arenas);
    let woven = Woven::samples(&graph, Settings::new()?)?;
    let simple = woven.samples.types.simple;
    let mut runtime = woven.runtime();

    let instance = runtime.create(simple)?;
    runtime.invoke(instance, simple, "Helper")?;
    runtime.dispose(instance)?;

    let result = runtime.invoke(instance, simple, "Method");
    runtime.assert_disposed(result, "Simple");
    let result = runtime.invoke(instance, simple, "Helper");
    runtime.assert_disposed(result, "Simple");
    for name in ["Reset", "Flush"] {
        let result = runtime.invoke(instance, simple, name);
        runtime.assert_disposed(result, "Simple");
    }
    assert_eq!(runtime.take_events(), vec!["Simple.Helper"]);

    // Statics belong to no instance
    runtime.interp.call(method_id(simple, "Count"), vec![])?;
    assert_eq!(runtime.take_events(), vec!["Simple.Count"]);

    // Disposal stays callable
    runtime.dispose(instance)?;

    let invalid_operation = woven.samples.platform.types.invalid_operation_exception;
    match runtime.invoke(instance, simple, "Method") {
        Err(Trap::Exception(exception)) => {
            assert!(runtime.interp.is_instance_of(exception, invalid_operation))
        }
        other => panic!("expected an exception, got {:?}", other),
    }
    Ok(())
}

#[test]
fn historical_settings_leave_private_helpers_callable() -> Result<(), TestError> {
    let arenas = TypeGraphArenas::new();
    let graph = TypeGraph::new(&arenas);
    let mut settings = Settings::new()?;
    settings.guard_private_methods = false;
    let woven = Woven::samples(&graph, settings)?;
    let simple = woven.samples.types.simple;
    let mut runtime = woven.runtime();

    let instance = runtime.create(simple)?;
    runtime.dispose(instance)?;
    assert_eq!(runtime.invoke(instance, simple, "Helper")?, None);
    assert_eq!(runtime.take_events(), vec!["Simple.Helper"]);
    let result = runtime.invoke(instance, simple, "Method");
    runtime.assert_disposed(result, "Simple");
    Ok(())
}

#[test]
fn managed_hook_runs_once() -> Result<(), TestError> {
    let arenas = TypeGraphArenas::new();
    let graph = TypeGraph::new(&arenas);
    let woven = Woven::samples(&graph, Settings::new()?)?;
    let with_managed = woven.samples.types.with_managed;
    let mut runtime = woven.runtime();

    let instance = runtime.create(with_managed)?;
    let stream = runtime.field_object(instance, with_managed, "stream");
    assert_eq!(
        runtime.invoke(instance, with_managed, "get_IsDisposed")?,
        Some(Value::Int32(0))
    );

    runtime.dispose(instance)?;
    runtime.dispose(instance)?;
    assert_eq!(runtime.take_events(), vec!["WithManaged.DisposeManaged"]);
    assert_eq!(runtime.dispose_count(stream), 1);
    assert!(!runtime.finalize_suppressed(instance));

    // Exempt from the guard, so callers can still ask
    assert_eq!(
        runtime.invoke(instance, with_managed, "get_IsDisposed")?,
        Some(Value::Int32(1))
    );
    let result = runtime.invoke(instance, with_managed, "Method");
    runtime.assert_disposed(result, "WithManaged");
    Ok(())
}

#[test]
fn unmanaged_hook_runs_on_dispose_or_collection() -> Result<(), TestError> {
    let arenas = TypeGraphArenas::new();
    let graph = TypeGraph::new(&arenas);
    let woven = Woven::samples(&graph, Settings::new()?)?;
    let with_unmanaged = woven.samples.types.with_unmanaged;
    let mut runtime = woven.runtime();

    let disposed = runtime.create(with_unmanaged)?;
    runtime.dispose(disposed)?;
    assert_eq!(runtime.take_events(), vec!["WithUnmanaged.DisposeUnmanaged"]);
    assert!(runtime.finalize_suppressed(disposed));
    assert!(!runtime.interp.collect(disposed)?);
    assert!(runtime.take_events().is_empty());

    let abandoned = runtime.create(with_unmanaged)?;
    assert!(runtime.interp.collect(abandoned)?);
    assert_eq!(runtime.take_events(), vec!["WithUnmanaged.DisposeUnmanaged"]);
    assert!(!runtime.interp.collect(abandoned)?);

    // The finalizer went through the same sequence, so explicit disposal has nothing left to do
    runtime.dispose(abandoned)?;
    assert!(runtime.take_events().is_empty());
    let result = runtime.invoke(abandoned, with_unmanaged, "Method");
    runtime.assert_disposed(result, "WithUnmanaged");
    Ok(())
}

#[test]
fn overridden_managed_hook_runs_only_on_explicit_disposal() -> Result<(), TestError> {
    let arenas = TypeGraphArenas::new();
    let graph = TypeGraph::new(&arenas);
    let woven = Woven::samples(&graph, Settings::new()?)?;
    let types = &woven.samples.types;
    let mut runtime = woven.runtime();

    let base = runtime.create(types.with_managed_and_unmanaged)?;
    runtime.dispose(base)?;
    assert_eq!(
        runtime.take_events(),
        vec![
            "WithManagedAndUnmanaged.DisposeManaged",
            "WithManagedAndUnmanaged.DisposeUnmanaged",
        ]
    );

    let derived = runtime.create(types.derived)?;
    runtime.dispose(derived)?;
    assert_eq!(
        runtime.take_events(),
        vec![
            "Derived.DisposeManaged",
            "WithManagedAndUnmanaged.DisposeManaged",
            "WithManagedAndUnmanaged.DisposeUnmanaged",
        ]
    );
    let result = runtime.invoke(derived, types.with_managed_and_unmanaged, "Method");
    runtime.assert_disposed(result, "WithManagedAndUnmanaged");

    let abandoned = runtime.create(types.derived)?;
    assert!(runtime.interp.collect(abandoned)?);
    assert_eq!(
        runtime.take_events(),
        vec!["WithManagedAndUnmanaged.DisposeUnmanaged"]
    );
    Ok(())
}

#[test]
fn derived_managed_hook_disposes_fields_on_explicit_path_only() -> Result<(), TestError> {
    let arenas = TypeGraphArenas::new();
    let graph = TypeGraph::new(&arenas);
    let woven = Woven::samples(&graph, Settings::new()?)?;
    let type_id = woven.samples.types.with_unmanaged_and_disposable_field;
    let mut runtime = woven.runtime();

    let disposed = runtime.create(type_id)?;
    let stream = runtime.field_object(disposed, type_id, "stream");
    runtime.dispose(disposed)?;
    assert_eq!(runtime.dispose_count(stream), 1);
    assert_eq!(runtime.field(disposed, type_id, "stream"), Value::Null);
    assert_eq!(
        runtime.take_events(),
        vec!["WithUnmanagedAndDisposableField.DisposeUnmanaged"]
    );

    // Other managed objects may already be gone when the finalizer runs
    let abandoned = runtime.create(type_id)?;
    let stream = runtime.field_object(abandoned, type_id, "stream");
    assert!(runtime.interp.collect(abandoned)?);
    assert_eq!(runtime.dispose_count(stream), 0);
    assert_eq!(
        runtime.field(abandoned, type_id, "stream"),
        Value::Object(stream)
    );
    assert_eq!(
        runtime.take_events(),
        vec!["WithUnmanagedAndDisposableField.DisposeUnmanaged"]
    );
    Ok(())
}

#[test]
fn explicit_interface_entry_point() -> Result<(), TestError> {
    let arenas = TypeGraphArenas::new();
    let graph = TypeGraph::new(&arenas);
    let woven = Woven::samples(&graph, Settings::new()?)?;
    let explicit = woven.samples.types.with_explicit_dispose;
    let mut runtime = woven.runtime();

    let instance = runtime.create(explicit)?;
    let stream = runtime.field_object(instance, explicit, "stream");
    runtime.dispose(instance)?;
    assert_eq!(runtime.dispose_count(stream), 1);

    let result = runtime.invoke(instance, explicit, "Method");
    runtime.assert_disposed(result, "WithExplicitDisposeMethod");
    Ok(())
}

#[test]
fn pending_computations_are_not_disposed() -> Result<(), TestError> {
    let arenas = TypeGraphArenas::new();
    let graph = TypeGraph::new(&arenas);
    let woven = Woven::samples(&graph, Settings::new()?)?;
    let with_task = woven.samples.types.with_task;
    let mut runtime = woven.runtime();

    let instance = runtime.create(with_task)?;
    let task = runtime.field_object(instance, with_task, "task");
    let stream = runtime.field_object(instance, with_task, "stream");
    runtime.dispose(instance)?;

    assert_eq!(runtime.dispose_count(task), 0);
    assert_eq!(runtime.field(instance, with_task, "task"), Value::Object(task));
    assert_eq!(runtime.dispose_count(stream), 1);
    Ok(())
}

#[test]
fn static_and_skipped_fields_are_kept() -> Result<(), TestError> {
    let arenas = TypeGraphArenas::new();
    let graph = TypeGraph::new(&arenas);
    let woven = Woven::samples(&graph, Settings::new()?)?;
    let type_id = woven.samples.types.with_static_and_skipped_fields;
    let mut runtime = woven.runtime();

    let instance = runtime.create(type_id)?;
    let kept = runtime.field_object(instance, type_id, "kept");
    let owned = runtime.field_object(instance, type_id, "owned");
    runtime.dispose(instance)?;

    assert_eq!(runtime.dispose_count(kept), 0);
    assert_eq!(runtime.field(instance, type_id, "kept"), Value::Object(kept));
    assert_eq!(runtime.dispose_count(owned), 1);
    assert_eq!(runtime.field(instance, type_id, "owned"), Value::Null);
    Ok(())
}

#[test]
fn not_implemented_dispose_is_replaced() -> Result<(), TestError> {
    let arenas = TypeGraphArenas::new();
    let graph = TypeGraph::new(&arenas);
    let woven = Woven::samples(&graph, Settings::new()?)?;
    let type_id = woven.samples.types.with_not_implemented_dispose;
    let mut runtime = woven.runtime();

    let instance = runtime.create(type_id)?;
    let stream = runtime.field_object(instance, type_id, "stream");
    runtime.dispose(instance)?;
    assert_eq!(runtime.dispose_count(stream), 1);
    Ok(())
}

#[test]
fn not_implemented_dispose_throws_before_weaving() -> Result<(), TestError> {
    let arenas = TypeGraphArenas::new();
    let graph = TypeGraph::new(&arenas);
    let samples = janitor::samples::Samples::build(&graph)?;
    let type_id = samples.types.with_not_implemented_dispose;
    let mut runtime = harness::Runtime::new(&samples);

    let instance = runtime.create(type_id)?;
    match runtime.dispose(instance) {
        Err(Trap::Exception(exception)) => assert_eq!(
            runtime.interp.exception_message(exception),
            Some("The method or operation is not implemented.")
        ),
        other => panic!("expected NotImplementedException, got {:?}", other),
    }
    Ok(())
}

#[test]
fn generic_field_disposed_through_constraint() -> Result<(), TestError> {
    let arenas = TypeGraphArenas::new();
    let graph = TypeGraph::new(&arenas);
    let woven = Woven::samples(&graph, Settings::new()?)?;
    let types = &woven.samples.types;
    let holder = types.generic_holder;
    let holder_ctor = holder
        .find_method(".ctor", &["T"])
        .expect("GenericHolder(T) constructor");
    let mut runtime = woven.runtime();

    // Holding a sample type whose own `Dispose` records an event
    let resource = runtime.create(types.resource)?;
    let instance = runtime
        .interp
        .new_object(holder_ctor, vec![Value::Object(resource)])?;
    assert_eq!(
        runtime.invoke(instance, holder, "get_HasValue")?,
        Some(Value::Int32(1))
    );
    runtime.dispose(instance)?;
    runtime.dispose(instance)?;
    assert_eq!(runtime.take_events(), vec!["Resource.Dispose"]);
    assert_eq!(runtime.field(instance, holder, "value"), Value::Null);
    let result = runtime.invoke(instance, holder, "get_HasValue");
    runtime.assert_disposed(result, "GenericHolder`1");

    // Holding a platform stream
    let memory_stream = woven.samples.platform.members.memory_stream.ctor;
    let stream = runtime.interp.new_object(memory_stream, vec![])?;
    let instance = runtime
        .interp
        .new_object(holder_ctor, vec![Value::Object(stream)])?;
    runtime.dispose(instance)?;
    assert_eq!(runtime.dispose_count(stream), 1);

    // Nothing held, nothing to dispose
    let empty = runtime.interp.new_object(holder_ctor, vec![Value::Null])?;
    runtime.dispose(empty)?;
    let result = runtime.invoke(empty, holder, "get_HasValue");
    runtime.assert_disposed(result, "GenericHolder`1");
    Ok(())
}

#[test]
fn existing_finalizer_is_left_in_charge() -> Result<(), TestError> {
    let arenas = TypeGraphArenas::new();
    let graph = TypeGraph::new(&arenas);
    let woven = Woven::samples(&graph, Settings::new()?)?;
    let type_id = woven.samples.types.with_existing_finalizer;
    let mut runtime = woven.runtime();

    let disposed = runtime.create(type_id)?;
    runtime.dispose(disposed)?;
    assert_eq!(
        runtime.take_events(),
        vec!["WithExistingFinalizer.DisposeUnmanaged"]
    );
    assert!(runtime.finalize_suppressed(disposed));

    let abandoned = runtime.create(type_id)?;
    assert!(runtime.interp.collect(abandoned)?);
    assert_eq!(runtime.take_events(), vec!["WithExistingFinalizer.Finalize"]);
    Ok(())
}

#[test]
fn skipped_type_keeps_its_own_dispose() -> Result<(), TestError> {
    let arenas = TypeGraphArenas::new();
    let graph = TypeGraph::new(&arenas);
    let woven = Woven::samples(&graph, Settings::new()?)?;
    let resource = woven.samples.types.resource;
    let mut runtime = woven.runtime();

    let instance = runtime.create(resource)?;
    runtime.dispose(instance)?;
    runtime.dispose(instance)?;
    assert_eq!(
        runtime.take_events(),
        vec!["Resource.Dispose", "Resource.Dispose"]
    );
    assert!(resource.find_method("ThrowIfDisposed", &[]).is_none());
    Ok(())
}

#[test]
fn runaway_code_is_stopped() -> Result<(), TestError> {
    let arenas = TypeGraphArenas::new();
    let graph = TypeGraph::new(&arenas);
    let woven = Woven::samples(&graph, Settings::new()?)?;
    let simple = woven.samples.types.simple;
    let mut runtime = woven.runtime();

    let instance = runtime.create(simple)?;
    runtime.interp.set_step_limit(3);
    let method = method_id(simple, "Method");
    assert_eq!(
        runtime.interp.call(method, vec![Value::Object(instance)]),
        Err(Trap::StepLimit)
    );
    Ok(())
}
