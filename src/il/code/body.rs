use super::Instruction;
use crate::il::graph::{TypeId, TypeRef};
use crate::il::Error;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Stable handle to an instruction inside one [`MethodBody`]
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct InsnId(u32);

impl fmt::Debug for InsnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i{}", self.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HandlerKind<'g> {
    Finally,

    /// Catch exceptions assignable to the given type
    Catch(TypeId<'g>),
}

/// Protected region and its handler
///
/// Boundaries are half open: `try_end` and `handler_end` are the first instruction _after_ the
/// region (usually `try_end == handler_start`).
#[derive(Clone, Debug)]
pub struct ExceptionHandler<'g> {
    pub kind: HandlerKind<'g>,
    pub try_start: InsnId,
    pub try_end: InsnId,
    pub handler_start: InsnId,
    pub handler_end: InsnId,
}

impl<'g> ExceptionHandler<'g> {
    pub fn boundaries(&self) -> [InsnId; 4] {
        [
            self.try_start,
            self.try_end,
            self.handler_start,
            self.handler_end,
        ]
    }
}

/// Debug line information attached to an instruction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequencePoint {
    pub instruction: InsnId,
    pub document: Rc<str>,
    pub start_line: u32,
    pub end_line: u32,
}

impl SequencePoint {
    /// Line number that tells a debugger to step through to the next visible sequence point
    pub const HIDDEN_LINE: u32 = 0x00fe_efee;

    pub fn new(instruction: InsnId, document: Rc<str>, line: u32) -> SequencePoint {
        SequencePoint {
            instruction,
            document,
            start_line: line,
            end_line: line,
        }
    }

    pub fn hidden(instruction: InsnId, document: Rc<str>) -> SequencePoint {
        SequencePoint::new(instruction, document, Self::HIDDEN_LINE)
    }

    pub fn is_hidden(&self) -> bool {
        self.start_line == Self::HIDDEN_LINE
    }
}

/// Mutable method body
///
/// Instructions are allocated in an arena and then placed (at most once) into the instruction
/// order. Handles stay valid for as long as the body is not [cleared](Self::clear).
#[derive(Default)]
pub struct MethodBody<'g> {
    /// Every instruction ever created, indexed by handle
    instructions: Vec<Instruction<'g>>,

    /// Whether the instruction at a given handle has been placed
    placed: Vec<bool>,

    /// Order of placed instructions
    order: Vec<InsnId>,

    /// Types of local variables
    pub locals: Vec<TypeRef<'g>>,

    pub handlers: Vec<ExceptionHandler<'g>>,

    /// Debug line information, ordered by the position of the instruction
    pub sequence_points: Vec<SequencePoint>,
}

impl<'g> MethodBody<'g> {
    pub fn new() -> MethodBody<'g> {
        MethodBody {
            instructions: vec![],
            placed: vec![],
            order: vec![],
            locals: vec![],
            handlers: vec![],
            sequence_points: vec![],
        }
    }

    /// Allocate an instruction without placing it
    pub fn create(&mut self, instruction: Instruction<'g>) -> InsnId {
        let id = InsnId(self.instructions.len() as u32);
        self.instructions.push(instruction);
        self.placed.push(false);
        id
    }

    /// Place a previously created instruction at the end of the body
    pub fn place(&mut self, id: InsnId) -> Result<(), Error> {
        let placed = self
            .placed
            .get_mut(id.0 as usize)
            .ok_or(Error::DanglingInstruction(id))?;
        if *placed {
            return Err(Error::InstructionAlreadyPlaced(id));
        }
        *placed = true;
        self.order.push(id);
        Ok(())
    }

    /// Create and place an instruction at the end of the body
    pub fn push(&mut self, instruction: Instruction<'g>) -> InsnId {
        let id = self.create(instruction);
        self.placed[id.0 as usize] = true;
        self.order.push(id);
        id
    }

    pub fn extend(&mut self, instructions: impl IntoIterator<Item = Instruction<'g>>) {
        for instruction in instructions {
            self.push(instruction);
        }
    }

    /// Insert new instructions before everything currently in the body
    ///
    /// Returns the handles of the new instructions, in order.
    pub fn insert_at_start(&mut self, instructions: Vec<Instruction<'g>>) -> Vec<InsnId> {
        let ids: Vec<InsnId> = instructions
            .into_iter()
            .map(|instruction| {
                let id = self.create(instruction);
                self.placed[id.0 as usize] = true;
                id
            })
            .collect();
        self.order.splice(0..0, ids.iter().copied());
        ids
    }

    /// Declare a new local variable, returning its index
    pub fn add_local(&mut self, local_type: TypeRef<'g>) -> u16 {
        self.locals.push(local_type);
        (self.locals.len() - 1) as u16
    }

    /// Drop all code, locals, handlers, and debug information
    pub fn clear(&mut self) {
        self.instructions.clear();
        self.placed.clear();
        self.order.clear();
        self.locals.clear();
        self.handlers.clear();
        self.sequence_points.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn first(&self) -> Option<InsnId> {
        self.order.first().copied()
    }

    pub fn is_placed(&self, id: InsnId) -> bool {
        self.placed.get(id.0 as usize).copied().unwrap_or(false)
    }

    pub fn get(&self, id: InsnId) -> Option<&Instruction<'g>> {
        self.instructions.get(id.0 as usize)
    }

    /// Get an instruction, failing if it was never placed
    pub fn instruction(&self, id: InsnId) -> Result<&Instruction<'g>, Error> {
        match self.get(id) {
            Some(instruction) if self.is_placed(id) => Ok(instruction),
            _ => Err(Error::DanglingInstruction(id)),
        }
    }

    /// Placed instructions, in order
    pub fn iter(&self) -> impl Iterator<Item = (InsnId, &Instruction<'g>)> + '_ {
        self.order
            .iter()
            .map(move |id| (*id, &self.instructions[id.0 as usize]))
    }

    pub fn ids(&self) -> &[InsnId] {
        &self.order
    }

    /// Position of every placed instruction
    pub fn positions(&self) -> HashMap<InsnId, usize> {
        self.order
            .iter()
            .enumerate()
            .map(|(position, id)| (*id, position))
            .collect()
    }
}

/// IL listing of the body, with positions in place of byte offsets
impl<'g> fmt::Display for MethodBody<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let positions = self.positions();
        let label = |id: InsnId| -> String {
            match positions.get(&id) {
                Some(position) => format!("IL_{:04x}", position),
                None => format!("<unplaced {:?}>", id),
            }
        };

        if !self.locals.is_empty() {
            f.write_str(".locals (")?;
            for (idx, local) in self.locals.iter().enumerate() {
                if idx > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", local)?;
            }
            f.write_str(")\n")?;
        }

        for (position, (id, instruction)) in self.iter().enumerate() {
            if let Some(point) = self.sequence_points.iter().find(|p| p.instruction == id) {
                if point.is_hidden() {
                    writeln!(f, "  // hidden")?;
                } else {
                    writeln!(f, "  // line {}", point.start_line)?;
                }
            }
            write!(f, "IL_{:04x}: ", position)?;
            match instruction.branch_target() {
                Some(target) => writeln!(f, "{} {}", instruction.mnemonic(), label(target))?,
                None => writeln!(f, "{:?}", instruction)?,
            }
        }

        for handler in &self.handlers {
            write!(
                f,
                ".try {} to {} ",
                label(handler.try_start),
                label(handler.try_end)
            )?;
            match handler.kind {
                HandlerKind::Finally => f.write_str("finally")?,
                HandlerKind::Catch(class) => write!(f, "catch {:?}", class)?,
            }
            writeln!(
                f,
                " handler {} to {}",
                label(handler.handler_start),
                label(handler.handler_end)
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn handles_survive_insertion() {
        let mut body = MethodBody::new();
        let ret = body.create(Instruction::Ret);
        let jump = body.push(Instruction::BrFalse(ret));
        body.push(Instruction::Nop);
        body.place(ret).unwrap();

        let guard = body.insert_at_start(vec![Instruction::LdArg(0), Instruction::Pop]);
        let positions = body.positions();

        assert_eq!(positions[&guard[0]], 0);
        assert_eq!(positions[&guard[1]], 1);
        assert_eq!(positions[&jump], 2);
        assert_eq!(positions[&ret], 4);
        assert_eq!(body.get(jump), Some(&Instruction::BrFalse(ret)));
    }

    #[test]
    fn placing_twice_is_an_error() {
        let mut body = MethodBody::new();
        let nop = body.push(Instruction::Nop);
        assert!(matches!(
            body.place(nop),
            Err(Error::InstructionAlreadyPlaced(id)) if id == nop
        ));

        let unplaced = body.create(Instruction::Ret);
        assert!(body.instruction(unplaced).is_err());
        body.clear();
        assert!(body.place(unplaced).is_err());
        assert!(body.is_empty());
    }

    #[test]
    fn listing_resolves_jump_targets() {
        let mut body = MethodBody::new();
        let ret = body.create(Instruction::Ret);
        body.push(Instruction::LdArg(1));
        body.push(Instruction::BrTrue(ret));
        body.push(Instruction::Nop);
        body.place(ret).unwrap();

        let listing = body.to_string();
        assert_eq!(
            listing,
            "IL_0000: ldarg.1\nIL_0001: brtrue IL_0003\nIL_0002: nop\nIL_0003: ret\n"
        );
    }
}
