use super::{Interpreter, Trap, Value};
use crate::il::graph::{MethodId, PlatformLibrary};
use std::rc::Rc;

const NOT_IMPLEMENTED_MESSAGE: &str = "The method or operation is not implemented.";

/// Native implementations of the platform methods that have no body
pub(super) fn register_platform<'m, 'g>(
    interp: &mut Interpreter<'m, 'g>,
    platform: &PlatformLibrary<'g>,
) {
    let members = &platform.members;

    for ctor in [
        members.object.ctor,
        members.task.ctor,
        members.stream.ctor,
        members.memory_stream.ctor,
    ] {
        interp.register_native(ctor, |_, _| Ok(None));
    }
    interp.register_native(members.object.finalize, |_, _| Ok(None));

    interp.register_native(members.gc.suppress_finalize, |interp, args| {
        let object = argument(&args, 0)?.as_object()?;
        interp.heap.get_mut(object)?.finalize_suppressed = true;
        Ok(None)
    });

    for exchange in [
        members.interlocked.exchange_int32,
        members.interlocked.exchange_generic,
    ] {
        interp.register_native(exchange, |interp, args| {
            let location = argument(&args, 0)?.as_address()?.clone();
            let value = argument(&args, 1)?.clone();
            let previous = interp.load(&location)?;
            interp.store(&location, value)?;
            Ok(Some(previous))
        });
    }

    for dispose in [members.task.dispose, members.stream.dispose] {
        interp.register_native(dispose, |interp, args| {
            let object = argument(&args, 0)?.as_object()?;
            interp.heap.get_mut(object)?.dispose_count += 1;
            Ok(None)
        });
    }

    for ctor in [
        members.exception.ctor_string,
        members.invalid_operation_exception.ctor_string,
    ] {
        register_message_ctor(interp, ctor, |message| message.to_owned());
    }
    register_message_ctor(
        interp,
        members.object_disposed_exception.ctor_string,
        |object_name| {
            format!(
                "Cannot access a disposed object.\nObject name: '{}'.",
                object_name
            )
        },
    );
    interp.register_native(members.not_implemented_exception.ctor, |interp, args| {
        let object = argument(&args, 0)?.as_object()?;
        interp.heap.get_mut(object)?.message = Some(Rc::from(NOT_IMPLEMENTED_MESSAGE));
        Ok(None)
    });

    interp.register_native(members.exception.get_message, |interp, args| {
        let object = argument(&args, 0)?.as_object()?;
        Ok(Some(match &interp.heap.get(object)?.message {
            Some(message) => Value::String(message.clone()),
            None => Value::Null,
        }))
    });
}

/// Exception constructor taking a string and deriving the message from it
fn register_message_ctor<'m, 'g>(
    interp: &mut Interpreter<'m, 'g>,
    ctor: MethodId<'g>,
    message: fn(&str) -> String,
) {
    interp.register_native(ctor, move |interp, args| {
        let object = argument(&args, 0)?.as_object()?;
        let text = argument(&args, 1)?.as_str().unwrap_or_default();
        interp.heap.get_mut(object)?.message = Some(Rc::from(message(text)));
        Ok(None)
    });
}

pub(super) fn argument<'a, 'g>(args: &'a [Value<'g>], index: usize) -> Result<&'a Value<'g>, Trap> {
    args.get(index)
        .ok_or_else(|| Trap::InvalidReference(format!("argument {}", index)))
}
