use super::{
    queries, CoreReferences, Diagnostics, DisposalShape, Error, MemberKind, Settings, Violation,
};
use crate::il::code::{Instruction, MethodBody};
use crate::il::graph::{
    FieldData, FieldId, FieldRef, MethodData, MethodId, MethodRef, TypeGraph,
};
use crate::il::model::Type;
use crate::il::{FieldFlags, MemberName, MethodFlags, Name};
use log::debug;

/// Members added to every woven type
pub struct SynthesizedState<'g> {
    /// `int` exchanged to `1` by the first caller into the disposal sequence
    pub signaled: FieldId<'g>,

    /// `bool` set once disposal has finished, read by the guard
    pub disposed: FieldId<'g>,

    /// Private method throwing `ObjectDisposedException` when `disposed` is set
    pub guard: MethodId<'g>,
}

/// Weaves a single type
///
/// The type must already have been checked for eligibility and for a well formed entry method
/// (see [`super::ModuleWeaver`]). Problems found here are recorded in the diagnostics and stop
/// the weaving of this type only.
pub struct TypeProcessor<'a, 'g> {
    pub graph: &'g TypeGraph<'g>,
    pub references: &'a CoreReferences<'g>,
    pub settings: &'a Settings,
    pub diagnostics: &'a mut Diagnostics,

    /// Type being woven
    pub target: &'a mut Type<'g>,

    /// Existing disposal entry method, whose body gets replaced
    pub entry: MethodId<'g>,

    /// Methods added by the weaver (these never get a guard)
    pub(super) introduced: Vec<MethodId<'g>>,
}

/// Flags of the private helpers the weaver adds
pub(super) const PRIVATE_METHOD: MethodFlags = MethodFlags::from_bits_truncate(
    MethodFlags::PRIVATE.bits() | MethodFlags::HIDE_BY_SIG.bits(),
);

impl<'a, 'g> TypeProcessor<'a, 'g> {
    pub fn new(
        graph: &'g TypeGraph<'g>,
        references: &'a CoreReferences<'g>,
        settings: &'a Settings,
        diagnostics: &'a mut Diagnostics,
        target: &'a mut Type<'g>,
        entry: MethodId<'g>,
    ) -> TypeProcessor<'a, 'g> {
        TypeProcessor {
            graph,
            references,
            settings,
            diagnostics,
            target,
            entry,
            introduced: vec![],
        }
    }

    /// Weave the type, returning the disposal shape used
    ///
    /// `None` means a name collision was found and the type was left untouched.
    pub fn process(&mut self) -> Result<Option<DisposalShape<'g>>, Error> {
        let managed = self.find_hook(&self.settings.managed_hook_name);
        let unmanaged = self.find_hook(&self.settings.unmanaged_hook_name);

        if let Some(violation) = self.find_collision() {
            self.diagnostics.violation(violation);
            return Ok(None);
        }

        let managed = match (managed, unmanaged) {
            (None, Some(_)) => self.derive_managed_hook()?,
            _ => managed,
        };

        let state = self.create_state()?;
        let shape = DisposalShape::classify(managed, unmanaged);
        debug!("Weaving {} as {}", self.target.id.name, shape.name());
        self.synthesize(&shape, &state)?;
        self.inject_guards(&state)?;
        Ok(Some(shape))
    }

    /// Instance method with the given name and no parameters
    fn find_hook(&self, name: &MemberName) -> Option<MethodId<'g>> {
        self.target
            .id
            .methods()
            .into_iter()
            .find(|method| !method.is_static() && method.is_match(name.as_str(), &[]))
    }

    /// First synthesized name already declared on the type
    fn find_collision(&self) -> Option<Violation> {
        let type_name = self.target.id.name.to_string();
        let fields = [
            &self.settings.signaled_field_name,
            &self.settings.disposed_field_name,
        ];
        for field in fields {
            if queries::field_exists(self.target.id, field.as_str()) {
                return Some(Violation::NameCollision {
                    type_name,
                    member_name: field.to_string(),
                    kind: MemberKind::Field,
                });
            }
        }
        let guard = &self.settings.guard_method_name;
        if queries::method_exists(self.target.id, guard.as_str()) {
            return Some(Violation::NameCollision {
                type_name,
                member_name: guard.to_string(),
                kind: MemberKind::Method,
            });
        }
        None
    }

    /// Build a private managed hook out of the disposable fields of the type
    ///
    /// Returns `None` (and adds nothing) when no field needs disposing.
    fn derive_managed_hook(&mut self) -> Result<Option<MethodId<'g>>, Error> {
        let mut body = MethodBody::new();
        let disposed_fields = self.emit_field_disposal(&mut body, &[])?;
        if disposed_fields == 0 {
            return Ok(None);
        }
        body.push(Instruction::Ret);

        let method = MethodData::new(
            self.target.id,
            self.settings.managed_hook_name.clone(),
            PRIVATE_METHOD,
        );
        let method = self.declare_method(method, body)?;
        debug!(
            "Derived {} from {} disposable field(s)",
            self.settings.managed_hook_name, disposed_fields
        );
        Ok(Some(method))
    }

    /// Add the signaling field, the disposed flag, and the guard method
    fn create_state(&mut self) -> Result<SynthesizedState<'g>, Error> {
        let signaled = self.target.declare_field(
            self.graph,
            FieldData::new(
                self.target.id,
                self.settings.signaled_field_name.clone(),
                self.references.int32_ref(),
                FieldFlags::PRIVATE,
            ),
        )?;
        let disposed = self.target.declare_field(
            self.graph,
            FieldData::new(
                self.target.id,
                self.settings.disposed_field_name.clone(),
                self.references.boolean_ref(),
                FieldFlags::PRIVATE,
            ),
        )?;

        // if (disposed) throw new ObjectDisposedException("<simple name>");
        let mut body = MethodBody::new();
        let ret = body.create(Instruction::Ret);
        body.push(Instruction::LdArg(0));
        body.push(Instruction::LdFld(FieldRef::on_self(disposed)));
        body.push(Instruction::BrFalse(ret));
        body.push(Instruction::LdStr(
            self.target.id.name.simple_name().to_owned(),
        ));
        body.push(Instruction::NewObj(MethodRef::direct(
            self.references.disposed_exception_ctor,
        )));
        body.push(Instruction::Throw);
        body.place(ret)?;

        let guard = self.declare_method(
            MethodData::new(
                self.target.id,
                self.settings.guard_method_name.clone(),
                PRIVATE_METHOD,
            ),
            body,
        )?;

        Ok(SynthesizedState {
            signaled,
            disposed,
            guard,
        })
    }

    /// Add a method to the type, remembering that the weaver introduced it
    pub(super) fn declare_method(
        &mut self,
        method: MethodData<'g>,
        body: MethodBody<'g>,
    ) -> Result<MethodId<'g>, Error> {
        let id = self.target.declare_method(self.graph, method, body)?;
        self.introduced.push(id);
        Ok(id)
    }

    /// Replace the body of the entry method
    pub(super) fn replace_entry_body(&mut self, body: MethodBody<'g>) -> Result<(), Error> {
        let entry = self.entry;
        let method = self
            .target
            .method_mut(entry)
            .ok_or_else(|| crate::il::Error::MissingMember(format!("{:?}", entry)))?;
        method.body = Some(body);
        Ok(())
    }

    /// Call one of the target type's own instance methods on `this`
    pub(super) fn call_on_this(&self, body: &mut MethodBody<'g>, method: MethodId<'g>) {
        body.push(Instruction::LdArg(0));
        body.push(queries::call_instruction(MethodRef::on_self(method)));
    }

    /// `if (Interlocked.Exchange(ref disposeSignaled, 1) != 0) return;`
    pub(super) fn emit_escape_check(
        &self,
        body: &mut MethodBody<'g>,
        state: &SynthesizedState<'g>,
    ) -> Result<(), Error> {
        let proceed = body.create(Instruction::Nop);
        body.push(Instruction::LdArg(0));
        body.push(Instruction::LdFldA(FieldRef::on_self(state.signaled)));
        body.push(Instruction::LdcI4(1));
        body.push(Instruction::Call(MethodRef::direct(
            self.references.exchange_int32,
        )));
        body.push(Instruction::BrFalse(proceed));
        body.push(Instruction::Ret);
        body.place(proceed)?;
        Ok(())
    }

    /// `disposed = true;`
    pub(super) fn emit_set_disposed(&self, body: &mut MethodBody<'g>, state: &SynthesizedState<'g>) {
        body.push(Instruction::LdArg(0));
        body.push(Instruction::LdcI4(1));
        body.push(Instruction::StFld(FieldRef::on_self(state.disposed)));
    }
}
