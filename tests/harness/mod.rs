#![allow(dead_code)]

use janitor::il::graph::{FieldId, MethodId, TypeGraph, TypeId};
use janitor::il::model::{Method, Type};
use janitor::interp::{Interpreter, ObjectRef, Trap, Value};
use janitor::samples::Samples;
use janitor::weave::{Diagnostics, ModuleWeaver, Settings, WeaveReport};
use janitor::{il, weave};
use std::cell::RefCell;
use std::rc::Rc;

/// Sample modules after weaving one of them
pub struct Woven<'g> {
    pub samples: Samples<'g>,
    pub report: WeaveReport<'g>,
    pub diagnostics: Diagnostics,
}

impl<'g> Woven<'g> {
    /// Weave the valid sample module
    pub fn samples(graph: &'g TypeGraph<'g>, settings: Settings) -> Result<Woven<'g>, TestError> {
        Self::weave(graph, settings, false)
    }

    /// Weave the module whose types all break a rule
    pub fn invalid(graph: &'g TypeGraph<'g>, settings: Settings) -> Result<Woven<'g>, TestError> {
        Self::weave(graph, settings, true)
    }

    fn weave(
        graph: &'g TypeGraph<'g>,
        settings: Settings,
        invalid: bool,
    ) -> Result<Woven<'g>, TestError> {
        let mut samples = Samples::build(graph)?;
        let weaver = ModuleWeaver::new(graph, settings);
        let mut diagnostics = Diagnostics::new();
        let module = if invalid {
            &mut samples.invalid_module
        } else {
            &mut samples.module
        };
        let report = weaver.execute(module, &mut diagnostics)?;
        Ok(Woven {
            samples,
            report,
            diagnostics,
        })
    }

    pub fn type_def(&self, type_id: TypeId<'g>) -> &Type<'g> {
        self.samples
            .module
            .type_def(type_id)
            .or_else(|| self.samples.invalid_module.type_def(type_id))
            .unwrap_or_else(|| panic!("{:?} is not in a sample module", type_id))
    }

    /// Parameterless instance method declared on the type
    pub fn method(&self, type_id: TypeId<'g>, name: &str) -> &Method<'g> {
        let id = method_id(type_id, name);
        self.type_def(type_id)
            .method(id)
            .unwrap_or_else(|| panic!("{:?} has no definition", id))
    }

    pub fn runtime(&self) -> Runtime<'_, 'g> {
        Runtime::new(&self.samples)
    }
}

pub fn method_id<'g>(type_id: TypeId<'g>, name: &str) -> MethodId<'g> {
    type_id
        .find_method(name, &[])
        .unwrap_or_else(|| panic!("{:?} has no method {}", type_id, name))
}

pub fn field_id<'g>(type_id: TypeId<'g>, name: &str) -> FieldId<'g> {
    type_id
        .find_field(name)
        .unwrap_or_else(|| panic!("{:?} has no field {}", type_id, name))
}

/// Interpreter over the woven sample module, recording the events sample code emits
pub struct Runtime<'m, 'g> {
    pub interp: Interpreter<'m, 'g>,
    events: Rc<RefCell<Vec<String>>>,
    dispose: MethodId<'g>,
    disposed_exception: TypeId<'g>,
}

impl<'m, 'g> Runtime<'m, 'g> {
    pub fn new(samples: &'m Samples<'g>) -> Runtime<'m, 'g> {
        let mut interp = Interpreter::new(&samples.platform, &samples.module);
        let events = Rc::new(RefCell::new(vec![]));
        let recorded = events.clone();
        interp.register_native(samples.record_event, move |_, args| {
            let event = args.first().and_then(Value::as_str).unwrap_or_default();
            recorded.borrow_mut().push(event.to_owned());
            Ok(None)
        });
        Runtime {
            interp,
            events,
            dispose: samples.platform.members.idisposable.dispose,
            disposed_exception: samples.platform.types.object_disposed_exception,
        }
    }

    /// Instantiate a type through its parameterless constructor
    pub fn create(&mut self, type_id: TypeId<'g>) -> Result<ObjectRef, Trap> {
        self.interp.new_object(method_id(type_id, ".ctor"), vec![])
    }

    /// Call `IDisposable.Dispose()` the way a consumer would
    pub fn dispose(&mut self, object: ObjectRef) -> Result<(), Trap> {
        self.interp
            .call_virtual(self.dispose, vec![Value::Object(object)])
            .map(|_| ())
    }

    /// Call a parameterless instance method
    pub fn invoke(
        &mut self,
        object: ObjectRef,
        type_id: TypeId<'g>,
        name: &str,
    ) -> Result<Option<Value<'g>>, Trap> {
        self.interp
            .call_virtual(method_id(type_id, name), vec![Value::Object(object)])
    }

    pub fn field(&self, object: ObjectRef, type_id: TypeId<'g>, name: &str) -> Value<'g> {
        self.interp
            .field(object, field_id(type_id, name))
            .unwrap_or_else(|trap| panic!("reading {}: {:?}", name, trap))
    }

    /// Object held by a field, failing if the field is null
    pub fn field_object(&self, object: ObjectRef, type_id: TypeId<'g>, name: &str) -> ObjectRef {
        match self.field(object, type_id, name) {
            Value::Object(held) => held,
            other => panic!("field {} holds {:?}", name, other),
        }
    }

    pub fn dispose_count(&self, object: ObjectRef) -> u32 {
        self.interp
            .object(object)
            .map(|object| object.dispose_count)
            .unwrap_or_else(|trap| panic!("{:?}", trap))
    }

    pub fn finalize_suppressed(&self, object: ObjectRef) -> bool {
        self.interp
            .object(object)
            .map(|object| object.finalize_suppressed)
            .unwrap_or_else(|trap| panic!("{:?}", trap))
    }

    /// Events recorded since the last call
    pub fn take_events(&self) -> Vec<String> {
        self.events.borrow_mut().drain(..).collect()
    }

    /// Check that a call failed because the instance was disposed
    pub fn assert_disposed<T: std::fmt::Debug>(&self, result: Result<T, Trap>, object_name: &str) {
        let exception = match result {
            Err(Trap::Exception(exception)) => exception,
            other => panic!("expected ObjectDisposedException, got {:?}", other),
        };
        assert!(self
            .interp
            .is_instance_of(exception, self.disposed_exception));
        assert_eq!(
            self.interp.exception_message(exception),
            Some(
                format!(
                    "Cannot access a disposed object.\nObject name: '{}'.",
                    object_name
                )
                .as_str()
            )
        );
    }
}

#[derive(Debug)]
pub enum TestError {
    Model(il::Error),
    Weave(weave::Error),
    Trap(Trap),
}

impl From<il::Error> for TestError {
    fn from(err: il::Error) -> TestError {
        TestError::Model(err)
    }
}

impl From<weave::Error> for TestError {
    fn from(err: weave::Error) -> TestError {
        TestError::Weave(err)
    }
}

impl From<Trap> for TestError {
    fn from(err: Trap) -> TestError {
        TestError::Trap(err)
    }
}
