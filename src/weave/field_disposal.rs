use super::{queries, Error, TypeProcessor, Violation};
use crate::il::code::{Instruction, MethodBody};
use crate::il::graph::{FieldId, FieldRef, MethodRef};
use log::trace;

impl<'a, 'g> TypeProcessor<'a, 'g> {
    /// Dispose and null out every disposable instance field, last declared first
    ///
    /// Fields listed in `excluded` (the weaver's own state) and fields marked to be skipped are
    /// left alone, as are pending computations. Fields that can't be nulled out (readonly fields,
    /// value types, open generics) are reported and left out. Returns the number of fields for
    /// which code was emitted.
    pub(super) fn emit_field_disposal(
        &mut self,
        body: &mut MethodBody<'g>,
        excluded: &[FieldId<'g>],
    ) -> Result<usize, Error> {
        let candidates: Vec<FieldId<'g>> = self
            .target
            .fields
            .iter()
            .rev()
            .filter(|field| {
                !excluded.contains(&field.id)
                    && !queries::contains_skip_weaving(&field.markers, self.settings)
            })
            .map(|field| field.id)
            .collect();

        let mut emitted = 0;
        for field in candidates {
            if field.is_static()
                || !queries::is_disposable(&field.field_type, self.references.idisposable)
                || queries::is_task(&field.field_type)
            {
                continue;
            }

            let field_name = field.qualified_name();
            if field.flags.is_init_only() {
                self.diagnostics
                    .violation(Violation::ReadonlyField { field_name });
                continue;
            }
            if field.field_type.is_value_type() {
                self.diagnostics
                    .violation(Violation::ValueTypeField { field_name });
                continue;
            }
            if field.field_type.is_open_generic() {
                self.diagnostics
                    .violation(Violation::GenericField { field_name });
                continue;
            }

            trace!("Disposing field {}", field_name);
            if field.field_type.is_generic_parameter() {
                self.emit_constrained_disposal(body, field)?;
            } else {
                self.emit_reference_disposal(body, field)?;
            }
            emitted += 1;
        }
        Ok(emitted)
    }

    /// Exchange that swaps a null into the field and returns the previous value
    fn exchange_for(&self, field: FieldId<'g>) -> Result<MethodRef<'g>, Error> {
        let exchange = MethodRef::direct(self.references.exchange_generic)
            .make_generic(vec![field.field_type.clone()])?;
        Ok(exchange)
    }

    /// ```text
    /// var value = Interlocked.Exchange(ref field, null);
    /// if (value != null) value.Dispose();
    /// ```
    fn emit_reference_disposal(
        &self,
        body: &mut MethodBody<'g>,
        field: FieldId<'g>,
    ) -> Result<(), Error> {
        let dispose = body.create(Instruction::CallVirt(MethodRef::direct(
            self.references.dispose,
        )));
        let end = body.create(Instruction::Nop);

        body.push(Instruction::LdArg(0));
        body.push(Instruction::LdFldA(FieldRef::on_self(field)));
        body.push(Instruction::LdNull);
        body.push(Instruction::Call(self.exchange_for(field)?));
        body.push(Instruction::Dup);
        body.push(Instruction::BrTrue(dispose));
        body.push(Instruction::Pop);
        body.push(Instruction::Br(end));
        body.place(dispose)?;
        body.place(end)?;
        Ok(())
    }

    /// Fields typed by a type parameter go through a local, so that `Dispose` can be called via
    /// the constraint on whatever the parameter ends up being
    ///
    /// ```text
    /// T value = Interlocked.Exchange<T>(ref field, null);
    /// if ((object)value != null) ((IDisposable)value).Dispose(); // constrained. T
    /// ```
    fn emit_constrained_disposal(
        &self,
        body: &mut MethodBody<'g>,
        field: FieldId<'g>,
    ) -> Result<(), Error> {
        let field_type = field.field_type.clone();
        let local = body.add_local(field_type.clone());
        let end = body.create(Instruction::Nop);

        body.push(Instruction::LdArg(0));
        body.push(Instruction::LdFldA(FieldRef::on_self(field)));
        body.push(Instruction::LdNull);
        body.push(Instruction::Call(self.exchange_for(field)?));
        body.push(Instruction::StLoc(local));
        body.push(Instruction::LdLoc(local));
        body.push(Instruction::Box(field_type.clone()));
        body.push(Instruction::BrFalse(end));
        body.push(Instruction::LdLocA(local));
        body.push(Instruction::Constrained(field_type));
        body.push(Instruction::CallVirt(MethodRef::direct(
            self.references.dispose,
        )));
        body.place(end)?;
        Ok(())
    }
}
