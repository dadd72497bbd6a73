use super::type_processor::PRIVATE_METHOD;
use super::{Error, SynthesizedState, TypeProcessor};
use crate::il::code::{ExceptionHandler, HandlerKind, Instruction, MethodBody};
use crate::il::graph::{MethodData, MethodId, MethodRef, Parameter};
use crate::il::{MemberName, MethodFlags};
use std::fmt;

/// What the disposal entry point ends up doing, decided by which hooks the type declares
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisposalShape<'g> {
    /// No hooks: the entry point disposes the fields itself
    Simple,

    /// The entry point calls the managed hook
    ManagedOnly { managed: MethodId<'g> },

    /// The entry point goes through `Dispose(bool)` and a finalizer is attached
    UnmanagedOnly { unmanaged: MethodId<'g> },

    /// Like [`DisposalShape::UnmanagedOnly`], with the managed hook only called on explicit
    /// disposal
    ManagedAndUnmanaged {
        managed: MethodId<'g>,
        unmanaged: MethodId<'g>,
    },
}

impl<'g> DisposalShape<'g> {
    pub fn classify(
        managed: Option<MethodId<'g>>,
        unmanaged: Option<MethodId<'g>>,
    ) -> DisposalShape<'g> {
        match (managed, unmanaged) {
            (None, None) => DisposalShape::Simple,
            (Some(managed), None) => DisposalShape::ManagedOnly { managed },
            (None, Some(unmanaged)) => DisposalShape::UnmanagedOnly { unmanaged },
            (Some(managed), Some(unmanaged)) => {
                DisposalShape::ManagedAndUnmanaged { managed, unmanaged }
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DisposalShape::Simple => "simple",
            DisposalShape::ManagedOnly { .. } => "managed only",
            DisposalShape::UnmanagedOnly { .. } => "unmanaged only",
            DisposalShape::ManagedAndUnmanaged { .. } => "managed and unmanaged",
        }
    }

    /// Does the shape release unmanaged state (and so need a finalizer)?
    pub fn has_finalizer(&self) -> bool {
        matches!(
            self,
            DisposalShape::UnmanagedOnly { .. } | DisposalShape::ManagedAndUnmanaged { .. }
        )
    }
}

impl<'g> fmt::Display for DisposalShape<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl<'a, 'g> TypeProcessor<'a, 'g> {
    /// Rewrite the entry point (and add the supporting methods) for the given shape
    pub(super) fn synthesize(
        &mut self,
        shape: &DisposalShape<'g>,
        state: &SynthesizedState<'g>,
    ) -> Result<(), Error> {
        match *shape {
            DisposalShape::Simple => self.synthesize_simple(state),
            DisposalShape::ManagedOnly { managed } => self.synthesize_managed_only(managed, state),
            DisposalShape::UnmanagedOnly { unmanaged } => {
                let routine = self.create_dispose_routine(None, unmanaged, state)?;
                self.synthesize_with_finalizer(routine)
            }
            DisposalShape::ManagedAndUnmanaged { managed, unmanaged } => {
                let routine = self.create_dispose_routine(Some(managed), unmanaged, state)?;
                self.synthesize_with_finalizer(routine)
            }
        }
    }

    fn synthesize_simple(&mut self, state: &SynthesizedState<'g>) -> Result<(), Error> {
        let mut body = MethodBody::new();
        self.emit_escape_check(&mut body, state)?;
        self.emit_field_disposal(&mut body, &[state.signaled, state.disposed])?;
        self.emit_set_disposed(&mut body, state);
        body.push(Instruction::Ret);
        self.replace_entry_body(body)
    }

    fn synthesize_managed_only(
        &mut self,
        managed: MethodId<'g>,
        state: &SynthesizedState<'g>,
    ) -> Result<(), Error> {
        let mut body = MethodBody::new();
        self.emit_escape_check(&mut body, state)?;
        self.call_on_this(&mut body, managed);
        self.emit_set_disposed(&mut body, state);
        body.push(Instruction::Ret);
        self.replace_entry_body(body)
    }

    /// Entry point becomes `Dispose(true); GC.SuppressFinalize(this);` and a finalizer calling
    /// `Dispose(false)` is attached
    fn synthesize_with_finalizer(&mut self, routine: MethodId<'g>) -> Result<(), Error> {
        let mut body = MethodBody::new();
        body.push(Instruction::LdArg(0));
        body.push(Instruction::LdcI4(1));
        body.push(Instruction::Call(MethodRef::on_self(routine)));
        body.push(Instruction::LdArg(0));
        body.push(Instruction::Call(MethodRef::direct(
            self.references.suppress_finalize,
        )));
        body.push(Instruction::Ret);
        self.replace_entry_body(body)?;
        self.attach_finalizer(routine)
    }

    /// Private `Dispose(bool disposing)` where managed and unmanaged release converge
    ///
    /// ```text
    /// if (Interlocked.Exchange(ref disposeSignaled, 1) != 0) return;
    /// if (disposing) DisposeManaged();
    /// DisposeUnmanaged();
    /// disposed = true;
    /// ```
    fn create_dispose_routine(
        &mut self,
        managed: Option<MethodId<'g>>,
        unmanaged: MethodId<'g>,
        state: &SynthesizedState<'g>,
    ) -> Result<MethodId<'g>, Error> {
        let mut body = MethodBody::new();
        self.emit_escape_check(&mut body, state)?;
        if let Some(managed) = managed {
            let skip_managed = body.create(Instruction::Nop);
            body.push(Instruction::LdArg(1));
            body.push(Instruction::BrFalse(skip_managed));
            self.call_on_this(&mut body, managed);
            body.place(skip_managed)?;
        }
        self.call_on_this(&mut body, unmanaged);
        self.emit_set_disposed(&mut body, state);
        body.push(Instruction::Ret);

        let method = MethodData::new(self.target.id, MemberName::DISPOSE, PRIVATE_METHOD)
            .with_parameters(vec![Parameter::new(
                self.settings.disposing_parameter_name.clone(),
                self.references.boolean_ref(),
            )]);
        self.declare_method(method, body)
    }

    /// Finalizer calling `Dispose(false)`, chaining to the base finalizer even if that throws
    fn attach_finalizer(&mut self, routine: MethodId<'g>) -> Result<(), Error> {
        if self
            .target
            .id
            .methods()
            .iter()
            .any(|method| method.is_finalizer())
        {
            self.diagnostics.warning(format!(
                "Type `{}` already declares a finalizer. No finalizer was added, so `{}` will not run when an undisposed instance is collected.",
                self.target.id.name, self.settings.unmanaged_hook_name
            ));
            return Ok(());
        }

        let mut body = MethodBody::new();
        let ret = body.create(Instruction::Ret);
        let try_start = body.push(Instruction::LdArg(0));
        body.push(Instruction::LdcI4(0));
        body.push(Instruction::Call(MethodRef::on_self(routine)));
        body.push(Instruction::Leave(ret));
        let handler_start = body.push(Instruction::LdArg(0));
        body.push(Instruction::Call(MethodRef::direct(
            self.references.object_finalize,
        )));
        body.push(Instruction::EndFinally);
        body.place(ret)?;
        body.handlers.push(ExceptionHandler {
            kind: HandlerKind::Finally,
            try_start,
            try_end: handler_start,
            handler_start,
            handler_end: ret,
        });

        let finalizer = MethodData::new(
            self.target.id,
            MemberName::FINALIZE,
            MethodFlags::FAMILY | MethodFlags::VIRTUAL | MethodFlags::HIDE_BY_SIG,
        );
        self.declare_method(finalizer, body)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::DisposalShape;
    use crate::il::graph::{MethodData, TypeData, TypeGraph, TypeGraphArenas};
    use crate::il::{MemberName, MethodFlags, QualifiedName, TypeFlags};

    #[test]
    fn classification_by_hooks() {
        let arenas = TypeGraphArenas::new();
        let graph = TypeGraph::new(&arenas);
        let platform = graph.insert_platform_types();
        let class = graph.add_type(TypeData::new(
            QualifiedName::name("Sample"),
            platform.types.object,
            TypeFlags::PUBLIC,
        ));
        let managed = graph.add_method(MethodData::new(
            class,
            MemberName::name("DisposeManaged"),
            MethodFlags::PRIVATE,
        ));
        let unmanaged = graph.add_method(MethodData::new(
            class,
            MemberName::name("DisposeUnmanaged"),
            MethodFlags::PRIVATE,
        ));

        assert_eq!(DisposalShape::classify(None, None), DisposalShape::Simple);
        assert_eq!(
            DisposalShape::classify(Some(managed), None),
            DisposalShape::ManagedOnly { managed }
        );
        let both = DisposalShape::classify(Some(managed), Some(unmanaged));
        assert_eq!(both, DisposalShape::ManagedAndUnmanaged { managed, unmanaged });
        assert!(both.has_finalizer());
        assert!(!DisposalShape::Simple.has_finalizer());
        assert_eq!(
            DisposalShape::classify(None, Some(unmanaged)).to_string(),
            "unmanaged only"
        );
    }
}
