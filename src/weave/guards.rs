use super::{Error, SynthesizedState, TypeProcessor};
use crate::il::code::{Instruction, SequencePoint};
use crate::il::graph::{MethodId, MethodRef};
use crate::il::model::Method;
use crate::il::{MemberName, Name, Visibility};
use log::trace;

impl<'a, 'g> TypeProcessor<'a, 'g> {
    /// Prepend `ThrowIfDisposed()` to every method that should be unusable after disposal
    pub(super) fn inject_guards(&mut self, state: &SynthesizedState<'g>) -> Result<(), Error> {
        let guard = MethodRef::on_self(state.guard);
        let targets: Vec<MethodId<'g>> = self
            .target
            .methods
            .iter()
            .filter(|method| self.needs_guard(method))
            .map(|method| method.id)
            .collect();

        for id in targets {
            let method = match self.target.method_mut(id) {
                Some(method) => method,
                None => continue,
            };
            let body = match method.body.as_mut() {
                Some(body) => body,
                None => continue,
            };

            trace!("Guarding {:?}", id);
            let prologue =
                body.insert_at_start(vec![Instruction::LdArg(0), Instruction::Call(guard.clone())]);

            // Debuggers step straight through a hidden sequence point to the next visible one
            let document = body.sequence_points.first().map(|point| point.document.clone());
            if let (Some(document), Some(first)) = (document, prologue.first()) {
                body.sequence_points
                    .insert(0, SequencePoint::hidden(*first, document));
            }
        }
        Ok(())
    }

    fn needs_guard(&self, method: &Method<'g>) -> bool {
        let id = method.id;
        let name = &id.name;

        if id.is_constructor() || id.is_finalizer() || id.is_static() || !method.has_body() {
            return false;
        }
        if id == self.entry || self.introduced.contains(&id) {
            return false;
        }
        if self.is_disposal_name(name)
            || name == &self.settings.guard_method_name
            || self.settings.exempt_method_names.contains(name)
        {
            return false;
        }
        if !self.settings.guard_private_methods && id.flags.visibility() == Visibility::Private {
            return false;
        }
        true
    }

    /// Entry points, hooks, and the internal `Dispose(bool)` routine
    fn is_disposal_name(&self, name: &MemberName) -> bool {
        name.starts_with(MemberName::DISPOSE.as_str())
            || self.settings.entry_method_names.contains(name)
            || name == &self.settings.managed_hook_name
            || name == &self.settings.unmanaged_hook_name
    }
}
