//! Execute method bodies in process
//!
//! This is a plain stack interpreter over [`Instruction`]s, with just enough of a runtime to run
//! woven code and observe what it does from the outside: a heap of objects with fields, virtual
//! and interface dispatch, exception regions, and native implementations of the platform
//! methods the weaver calls into. A simulated collection runs an object's finalizer unless
//! finalization was suppressed.
//!
//! ### Example
//!
//! ```
//! use janitor::il::graph::{TypeGraph, TypeGraphArenas};
//! use janitor::interp::{Interpreter, Value};
//! use janitor::samples::Samples;
//!
//! let arenas = TypeGraphArenas::new();
//! let graph = TypeGraph::new(&arenas);
//! let samples = Samples::build(&graph).unwrap();
//!
//! let mut interp = Interpreter::new(&samples.platform, &samples.module);
//! interp.register_native(samples.record_event, |_, _| Ok(None));
//!
//! let ctor = samples.types.simple.find_method(".ctor", &[]).unwrap();
//! let simple = interp.new_object(ctor, vec![]).unwrap();
//! let method = samples.types.simple.find_method("Method", &[]).unwrap();
//! assert_eq!(interp.call(method, vec![Value::Object(simple)]), Ok(None));
//! ```

mod dispatch;
mod errors;
mod heap;
mod natives;
mod value;

pub use dispatch::*;
pub use errors::*;
pub use heap::*;
pub use value::*;

use crate::il::code::{HandlerKind, InsnId, Instruction, MethodBody};
use crate::il::graph::{Assignable, FieldId, MethodId, PlatformLibrary, TypeId};
use crate::il::model::Module;
use log::trace;
use std::collections::HashMap;
use std::rc::Rc;

/// Host implementation of a method without a body
pub type Native<'m, 'g> =
    Rc<dyn Fn(&mut Interpreter<'m, 'g>, Vec<Value<'g>>) -> Result<Option<Value<'g>>, Trap>>;

const MAX_CALL_DEPTH: usize = 256;
const DEFAULT_STEP_LIMIT: usize = 1_000_000;

pub struct Interpreter<'m, 'g> {
    bodies: HashMap<MethodId<'g>, &'m MethodBody<'g>>,
    natives: HashMap<MethodId<'g>, Native<'m, 'g>>,
    heap: Heap<'g>,
    statics: HashMap<FieldId<'g>, Value<'g>>,
    frames: Vec<Frame<'g>>,
    object_finalize: MethodId<'g>,

    /// Instructions executed so far, across all calls
    steps: usize,
    step_limit: usize,
}

struct Frame<'g> {
    arguments: Vec<Value<'g>>,
    locals: Vec<Value<'g>>,
}

/// What to do after an instruction
enum Flow<'g> {
    Next,
    Jump(InsnId),
    Leave(InsnId),
    EndFinally,
    Return(Option<Value<'g>>),
}

/// Why a `finally` handler is running
enum Continuation {
    Leave { from: usize, target: usize },
    Unwind { from: usize, exception: ObjectRef },
}

/// Exception region with its boundaries resolved to positions
struct Region<'g> {
    kind: HandlerKind<'g>,
    try_start: usize,
    try_end: usize,
    handler_start: usize,
}

impl<'g> Region<'g> {
    fn protects(&self, position: usize) -> bool {
        self.try_start <= position && position < self.try_end
    }
}

impl<'m, 'g> Interpreter<'m, 'g> {
    pub fn new(platform: &PlatformLibrary<'g>, module: &'m Module<'g>) -> Interpreter<'m, 'g> {
        let mut interp = Interpreter {
            bodies: module.method_bodies(),
            natives: HashMap::new(),
            heap: Heap::default(),
            statics: HashMap::new(),
            frames: vec![],
            object_finalize: platform.members.object.finalize,
            steps: 0,
            step_limit: DEFAULT_STEP_LIMIT,
        };
        natives::register_platform(&mut interp, platform);
        interp
    }

    /// Provide (or replace) the implementation of a method
    pub fn register_native<F>(&mut self, method: MethodId<'g>, native: F)
    where
        F: Fn(&mut Interpreter<'m, 'g>, Vec<Value<'g>>) -> Result<Option<Value<'g>>, Trap>
            + 'static,
    {
        self.natives.insert(method, Rc::new(native));
    }

    pub fn set_step_limit(&mut self, step_limit: usize) {
        self.step_limit = step_limit;
    }

    pub fn heap(&self) -> &Heap<'g> {
        &self.heap
    }

    pub fn object(&self, object: ObjectRef) -> Result<&Object<'g>, Trap> {
        self.heap.get(object)
    }

    /// Read an instance field directly
    pub fn field(&self, object: ObjectRef, field: FieldId<'g>) -> Result<Value<'g>, Trap> {
        Ok(self.heap.get(object)?.field(field))
    }

    pub fn type_of(&self, object: ObjectRef) -> Result<TypeId<'g>, Trap> {
        Ok(self.heap.get(object)?.object_type)
    }

    pub fn is_instance_of(&self, object: ObjectRef, type_id: TypeId<'g>) -> bool {
        self.heap
            .get(object)
            .map(|object| object.object_type.is_assignable(&type_id))
            .unwrap_or(false)
    }

    pub fn exception_message(&self, exception: ObjectRef) -> Option<&str> {
        self.heap
            .get(exception)
            .ok()
            .and_then(|object| object.message.as_deref())
    }

    /// Allocate an object of the constructor's declaring type and run the constructor on it
    pub fn new_object(
        &mut self,
        ctor: MethodId<'g>,
        arguments: Vec<Value<'g>>,
    ) -> Result<ObjectRef, Trap> {
        let object = self.heap.allocate(ctor.declaring_type);
        let mut with_this = Vec::with_capacity(arguments.len() + 1);
        with_this.push(Value::Object(object));
        with_this.extend(arguments);
        self.call(ctor, with_this)?;
        Ok(object)
    }

    /// Call exactly the given method (the receiver, if any, is the first argument)
    pub fn call(
        &mut self,
        method: MethodId<'g>,
        arguments: Vec<Value<'g>>,
    ) -> Result<Option<Value<'g>>, Trap> {
        if let Some(native) = self.natives.get(&method).cloned() {
            trace!("Native call to {:?}", method);
            return native(self, arguments);
        }
        let body = *self
            .bodies
            .get(&method)
            .ok_or_else(|| Trap::MissingBody(format!("{:?}", method)))?;
        if self.frames.len() >= MAX_CALL_DEPTH {
            return Err(Trap::StackOverflow);
        }

        self.frames.push(Frame {
            arguments,
            locals: body.locals.iter().map(Value::default_for).collect(),
        });
        let result = self.run(method, body);
        self.frames.pop();
        result
    }

    /// Call the override of a virtual method selected by the receiver's runtime type
    pub fn call_virtual(
        &mut self,
        method: MethodId<'g>,
        arguments: Vec<Value<'g>>,
    ) -> Result<Option<Value<'g>>, Trap> {
        let receiver = natives::argument(&arguments, 0)?.as_object()?;
        let target = resolve_virtual(self.type_of(receiver)?, method);
        self.call(target, arguments)
    }

    /// Simulate the collection of an unreachable object
    ///
    /// The finalizer runs at most once and not at all if finalization was suppressed. Returns
    /// whether it ran.
    pub fn collect(&mut self, object: ObjectRef) -> Result<bool, Trap> {
        let state = self.heap.get_mut(object)?;
        if state.finalize_suppressed || state.finalized {
            return Ok(false);
        }
        state.finalized = true;
        self.call_virtual(self.object_finalize, vec![Value::Object(object)])?;
        Ok(true)
    }

    pub fn load(&self, address: &Address<'g>) -> Result<Value<'g>, Trap> {
        match address {
            Address::Field(object, field) => self.field(*object, *field),
            Address::Static(field) => Ok(self
                .statics
                .get(field)
                .cloned()
                .unwrap_or_else(|| Value::default_for(&field.field_type))),
            Address::Local(depth, idx) => self
                .frames
                .get(*depth)
                .and_then(|frame| frame.locals.get(*idx as usize))
                .cloned()
                .ok_or_else(|| Trap::InvalidReference(format!("{:?}", address))),
        }
    }

    pub fn store(&mut self, address: &Address<'g>, value: Value<'g>) -> Result<(), Trap> {
        match address {
            Address::Field(object, field) => {
                self.heap.get_mut(*object)?.fields.insert(*field, value);
            }
            Address::Static(field) => {
                self.statics.insert(*field, value);
            }
            Address::Local(depth, idx) => {
                let slot = self
                    .frames
                    .get_mut(*depth)
                    .and_then(|frame| frame.locals.get_mut(*idx as usize))
                    .ok_or_else(|| Trap::InvalidReference(format!("{:?}", address)))?;
                *slot = value;
            }
        }
        Ok(())
    }

    fn run(
        &mut self,
        method: MethodId<'g>,
        body: &'m MethodBody<'g>,
    ) -> Result<Option<Value<'g>>, Trap> {
        let ids = body.ids();
        let positions = body.positions();
        let position_of = |id: InsnId| -> Result<usize, Trap> {
            positions
                .get(&id)
                .copied()
                .ok_or_else(|| Trap::InvalidReference(format!("{:?}", id)))
        };
        let regions = body
            .handlers
            .iter()
            .map(|handler| {
                Ok(Region {
                    kind: handler.kind,
                    try_start: position_of(handler.try_start)?,
                    try_end: position_of(handler.try_end)?,
                    handler_start: position_of(handler.handler_start)?,
                })
            })
            .collect::<Result<Vec<Region<'g>>, Trap>>()?;

        let depth = self.frames.len() - 1;
        let returns_value = method.return_type.is_some();
        let mut stack: Vec<Value<'g>> = vec![];
        let mut pending: Vec<(usize, Continuation)> = vec![];
        let mut constrained = false;
        let mut pc = 0;

        loop {
            self.steps += 1;
            if self.steps > self.step_limit {
                return Err(Trap::StepLimit);
            }
            let instruction = match ids.get(pc).and_then(|id| body.get(*id)) {
                Some(instruction) => instruction,
                None => return Err(Trap::FellOffEnd(format!("{:?}", method))),
            };

            let flow = self.step(instruction, depth, returns_value, &mut stack, &mut constrained);
            pc = match flow {
                Ok(Flow::Next) => pc + 1,
                Ok(Flow::Jump(target)) => position_of(target)?,
                Ok(Flow::Return(value)) => return Ok(value),
                Ok(Flow::Leave(target)) => {
                    stack.clear();
                    let target = position_of(target)?;
                    match next_finally(&regions, 0, pc, target) {
                        Some(idx) => {
                            pending.push((idx, Continuation::Leave { from: pc, target }));
                            regions[idx].handler_start
                        }
                        None => target,
                    }
                }
                Ok(Flow::EndFinally) => {
                    stack.clear();
                    match pending.pop() {
                        Some((idx, Continuation::Leave { from, target })) => {
                            match next_finally(&regions, idx + 1, from, target) {
                                Some(next) => {
                                    pending.push((next, Continuation::Leave { from, target }));
                                    regions[next].handler_start
                                }
                                None => target,
                            }
                        }
                        Some((idx, Continuation::Unwind { from, exception })) => {
                            self.unwind(&regions, idx + 1, from, exception, &mut stack, &mut pending)?
                        }
                        None => return Err(Trap::UnexpectedEndFinally),
                    }
                }
                Err(Trap::Exception(exception)) => {
                    stack.clear();
                    constrained = false;
                    self.unwind(&regions, 0, pc, exception, &mut stack, &mut pending)?
                }
                Err(trap) => return Err(trap),
            };
        }
    }

    /// Find where an exception raised at `from` goes, starting at region `first`
    ///
    /// A `catch` gets the exception pushed on the stack; a `finally` is recorded as pending so
    /// that `endfinally` resumes the search. With no handler left, the exception leaves the
    /// method.
    fn unwind(
        &self,
        regions: &[Region<'g>],
        first: usize,
        from: usize,
        exception: ObjectRef,
        stack: &mut Vec<Value<'g>>,
        pending: &mut Vec<(usize, Continuation)>,
    ) -> Result<usize, Trap> {
        for (idx, region) in regions.iter().enumerate().skip(first) {
            if !region.protects(from) {
                continue;
            }
            match region.kind {
                HandlerKind::Catch(caught) if self.is_instance_of(exception, caught) => {
                    stack.push(Value::Object(exception));
                    return Ok(region.handler_start);
                }
                HandlerKind::Catch(_) => (),
                HandlerKind::Finally => {
                    pending.push((idx, Continuation::Unwind { from, exception }));
                    return Ok(region.handler_start);
                }
            }
        }
        Err(Trap::Exception(exception))
    }

    fn step(
        &mut self,
        instruction: &Instruction<'g>,
        depth: usize,
        returns_value: bool,
        stack: &mut Vec<Value<'g>>,
        constrained: &mut bool,
    ) -> Result<Flow<'g>, Trap> {
        use Instruction::*;

        match instruction {
            Nop => (),

            LdArg(idx) => {
                let value = self.frame(depth)?.arguments.get(*idx as usize).cloned();
                stack.push(value.ok_or_else(|| Trap::InvalidReference(format!("arg {}", idx)))?);
            }
            StArg(idx) => {
                let value = pop(stack)?;
                let slot = self.frame_mut(depth)?.arguments.get_mut(*idx as usize);
                *slot.ok_or_else(|| Trap::InvalidReference(format!("arg {}", idx)))? = value;
            }
            LdLoc(idx) => stack.push(self.load(&Address::Local(depth, *idx))?),
            LdLocA(idx) => stack.push(Value::Address(Address::Local(depth, *idx))),
            StLoc(idx) => {
                let value = pop(stack)?;
                self.store(&Address::Local(depth, *idx), value)?;
            }

            LdNull => stack.push(Value::Null),
            LdcI4(value) => stack.push(Value::Int32(*value)),
            LdStr(value) => stack.push(Value::from(value.as_str())),

            LdFld(field) => {
                let object = pop(stack)?.as_object()?;
                stack.push(self.field(object, field.field)?);
            }
            LdFldA(field) => {
                let object = pop(stack)?.as_object()?;
                stack.push(Value::Address(Address::Field(object, field.field)));
            }
            StFld(field) => {
                let value = pop(stack)?;
                let object = pop(stack)?.as_object()?;
                self.store(&Address::Field(object, field.field), value)?;
            }
            LdSFld(field) => stack.push(self.load(&Address::Static(field.field))?),
            StSFld(field) => {
                let value = pop(stack)?;
                self.store(&Address::Static(field.field), value)?;
            }

            Dup => {
                let value = pop(stack)?;
                stack.push(value.clone());
                stack.push(value);
            }
            Pop => {
                pop(stack)?;
            }
            Add => {
                let rhs = pop(stack)?.as_i32()?;
                let lhs = pop(stack)?.as_i32()?;
                stack.push(Value::Int32(lhs.wrapping_add(rhs)));
            }
            Ceq => {
                let rhs = pop(stack)?;
                let lhs = pop(stack)?;
                stack.push(Value::from(lhs == rhs));
            }

            Call(method) => {
                let arguments = pop_arguments(stack, method.method.argument_count())?;
                let result = self.call(method.method, arguments)?;
                stack.extend(result);
            }
            CallVirt(method) => {
                let mut arguments = pop_arguments(stack, method.method.argument_count())?;
                if std::mem::take(constrained) {
                    // The receiver is a pointer to the value to call the method on
                    if let Some(receiver) = arguments.first_mut() {
                        let address = receiver.as_address()?.clone();
                        *receiver = self.load(&address)?;
                    }
                }
                let result = if method.method.is_virtual() {
                    self.call_virtual(method.method, arguments)?
                } else {
                    natives::argument(&arguments, 0)?.as_object()?;
                    self.call(method.method, arguments)?
                };
                stack.extend(result);
            }
            Constrained(_) => *constrained = true,
            NewObj(ctor) => {
                let arguments = pop_arguments(stack, ctor.method.parameters.len())?;
                let object = self.new_object(ctor.method, arguments)?;
                stack.push(Value::Object(object));
            }

            // Only reference types are ever boxed here, for which boxing is the identity
            Box(_) => (),

            Br(target) => return Ok(Flow::Jump(*target)),
            BrTrue(target) => {
                if pop(stack)?.is_true() {
                    return Ok(Flow::Jump(*target));
                }
            }
            BrFalse(target) => {
                if !pop(stack)?.is_true() {
                    return Ok(Flow::Jump(*target));
                }
            }
            Leave(target) => return Ok(Flow::Leave(*target)),
            EndFinally => return Ok(Flow::EndFinally),

            Throw => {
                let exception = pop(stack)?.as_object()?;
                return Err(Trap::Exception(exception));
            }
            Ret => {
                let value = if returns_value {
                    Some(pop(stack)?)
                } else {
                    None
                };
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Next)
    }

    fn frame(&self, depth: usize) -> Result<&Frame<'g>, Trap> {
        self.frames
            .get(depth)
            .ok_or_else(|| Trap::InvalidReference(format!("frame {}", depth)))
    }

    fn frame_mut(&mut self, depth: usize) -> Result<&mut Frame<'g>, Trap> {
        self.frames
            .get_mut(depth)
            .ok_or_else(|| Trap::InvalidReference(format!("frame {}", depth)))
    }
}

/// Innermost `finally` (at or after region `first`) exited when jumping from `from` to `target`
fn next_finally(regions: &[Region<'_>], first: usize, from: usize, target: usize) -> Option<usize> {
    regions
        .iter()
        .enumerate()
        .skip(first)
        .find(|(_, region)| {
            region.kind == HandlerKind::Finally && region.protects(from) && !region.protects(target)
        })
        .map(|(idx, _)| idx)
}

fn pop<'g>(stack: &mut Vec<Value<'g>>) -> Result<Value<'g>, Trap> {
    stack.pop().ok_or(Trap::StackUnderflow)
}

/// Pop call arguments, restoring their left-to-right order
fn pop_arguments<'g>(stack: &mut Vec<Value<'g>>, count: usize) -> Result<Vec<Value<'g>>, Trap> {
    if stack.len() < count {
        return Err(Trap::StackUnderflow);
    }
    Ok(stack.split_off(stack.len() - count))
}

#[cfg(test)]
mod test {
    use super::{Interpreter, Trap, Value};
    use crate::il::code::{ExceptionHandler, HandlerKind, Instruction, MethodBody};
    use crate::il::graph::{
        FieldData, FieldRef, MethodData, MethodRef, TypeData, TypeGraph, TypeGraphArenas,
    };
    use crate::il::model::{Field, Method, Module, Type};
    use crate::il::{FieldFlags, MemberName, MethodFlags, QualifiedName, TypeFlags};

    #[test]
    fn finally_runs_on_leave_and_on_exception() {
        let arenas = TypeGraphArenas::new();
        let graph = TypeGraph::new(&arenas);
        let platform = graph.insert_platform_types();
        let types = &platform.types;
        let members = &platform.members;

        let class = graph.add_type(TypeData::new(
            QualifiedName::name("Counter"),
            types.object,
            TypeFlags::PUBLIC,
        ));
        let count = graph.add_field(FieldData::new(
            class,
            MemberName::name("count"),
            types.int32_ref(),
            FieldFlags::PUBLIC | FieldFlags::STATIC,
        ));
        let run = graph.add_method(
            MethodData::new(
                class,
                MemberName::name("Run"),
                MethodFlags::PUBLIC | MethodFlags::STATIC,
            )
            .with_parameters(vec![crate::il::graph::Parameter::new(
                MemberName::name("fail"),
                types.boolean_ref(),
            )]),
        );

        // try { if (fail) throw new InvalidOperationException("boom"); } finally { count++; }
        let mut body = MethodBody::new();
        let ret = body.create(Instruction::Ret);
        let leave = body.create(Instruction::Leave(ret));
        let try_start = body.push(Instruction::LdArg(0));
        body.push(Instruction::BrFalse(leave));
        body.push(Instruction::LdStr(String::from("boom")));
        body.push(Instruction::NewObj(MethodRef::direct(
            members.invalid_operation_exception.ctor_string,
        )));
        body.push(Instruction::Throw);
        body.place(leave).unwrap();
        let handler_start = body.push(Instruction::LdSFld(FieldRef::direct(count)));
        body.push(Instruction::LdcI4(1));
        body.push(Instruction::Add);
        body.push(Instruction::StSFld(FieldRef::direct(count)));
        body.push(Instruction::EndFinally);
        body.place(ret).unwrap();
        body.handlers.push(ExceptionHandler {
            kind: HandlerKind::Finally,
            try_start,
            try_end: handler_start,
            handler_start,
            handler_end: ret,
        });

        let mut class_def = Type::new(class);
        class_def.add_field(Field::new(count)).unwrap();
        class_def.add_method(Method::with_body(run, body)).unwrap();
        let mut module = Module::new("Counter.dll");
        module.add_type(class_def);

        let mut interp = Interpreter::new(&platform, &module);
        assert_eq!(interp.call(run, vec![Value::from(false)]), Ok(None));

        let exception = match interp.call(run, vec![Value::from(true)]) {
            Err(Trap::Exception(exception)) => exception,
            other => panic!("expected an exception, got {:?}", other),
        };
        assert!(interp.is_instance_of(exception, types.exception));
        assert_eq!(interp.exception_message(exception), Some("boom"));

        let static_count = super::Address::Static(count);
        assert_eq!(interp.load(&static_count), Ok(Value::Int32(2)));
    }

    #[test]
    fn missing_body_traps() {
        let arenas = TypeGraphArenas::new();
        let graph = TypeGraph::new(&arenas);
        let platform = graph.insert_platform_types();
        let module = Module::new("Empty.dll");

        let mut interp = Interpreter::new(&platform, &module);
        let result = interp.call(platform.members.idisposable.dispose, vec![Value::Null]);
        assert!(matches!(result, Err(Trap::MissingBody(_))));
    }
}
