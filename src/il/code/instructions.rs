use super::InsnId;
use crate::il::graph::{FieldRef, MethodRef, TypeRef};
use std::fmt;

/// Instructions of the abstract stack machine
///
/// Short and long encodings of the same operation are not distinguished (there is one `ldarg`,
/// one `brfalse`), since nothing here is concerned with byte offsets.
#[derive(Clone, PartialEq)]
pub enum Instruction<'g> {
    Nop,

    LdArg(u16),
    StArg(u16),
    LdLoc(u16),
    LdLocA(u16),
    StLoc(u16),

    LdNull,
    LdcI4(i32),
    LdStr(String),

    LdFld(FieldRef<'g>),
    LdFldA(FieldRef<'g>),
    StFld(FieldRef<'g>),
    LdSFld(FieldRef<'g>),
    StSFld(FieldRef<'g>),

    Dup,
    Pop,
    Add,
    Ceq,

    Call(MethodRef<'g>),
    CallVirt(MethodRef<'g>),

    /// Prefix on a `callvirt` whose receiver is a pointer to a value of the given type
    Constrained(TypeRef<'g>),

    NewObj(MethodRef<'g>),
    Box(TypeRef<'g>),

    Br(InsnId),
    BrTrue(InsnId),
    BrFalse(InsnId),

    /// Exit a protected region (running `finally` handlers on the way out)
    Leave(InsnId),
    EndFinally,

    Throw,
    Ret,
}

impl<'g> Instruction<'g> {
    /// Number of values popped and pushed
    ///
    /// `ret` is reported as popping nothing: how many values it expects depends on the method's
    /// return type. `leave` and `endfinally` empty the stack, which is also not captured here.
    pub fn stack_effect(&self) -> (usize, usize) {
        use Instruction::*;
        match self {
            Nop | Br(_) | Leave(_) | EndFinally | Ret | Constrained(_) => (0, 0),
            LdArg(_) | LdLoc(_) | LdLocA(_) | LdNull | LdcI4(_) | LdStr(_) => (0, 1),
            LdSFld(_) => (0, 1),
            StArg(_) | StLoc(_) | StSFld(_) | Pop | BrTrue(_) | BrFalse(_) | Throw => (1, 0),
            LdFld(_) | LdFldA(_) | Box(_) => (1, 1),
            StFld(_) => (2, 0),
            Dup => (1, 2),
            Add | Ceq => (2, 1),
            Call(method) | CallVirt(method) => (
                method.method.argument_count(),
                usize::from(method.method.return_type.is_some()),
            ),
            NewObj(ctor) => (ctor.method.parameters.len(), 1),
        }
    }

    /// Explicit jump target, if any
    pub fn branch_target(&self) -> Option<InsnId> {
        match self {
            Instruction::Br(target)
            | Instruction::BrTrue(target)
            | Instruction::BrFalse(target)
            | Instruction::Leave(target) => Some(*target),
            _ => None,
        }
    }

    /// Does control never continue to the next instruction?
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Instruction::Br(_)
                | Instruction::Leave(_)
                | Instruction::EndFinally
                | Instruction::Throw
                | Instruction::Ret
        )
    }

    pub fn mnemonic(&self) -> &'static str {
        use Instruction::*;
        match self {
            Nop => "nop",
            LdArg(_) => "ldarg",
            StArg(_) => "starg",
            LdLoc(_) => "ldloc",
            LdLocA(_) => "ldloca",
            StLoc(_) => "stloc",
            LdNull => "ldnull",
            LdcI4(_) => "ldc.i4",
            LdStr(_) => "ldstr",
            LdFld(_) => "ldfld",
            LdFldA(_) => "ldflda",
            StFld(_) => "stfld",
            LdSFld(_) => "ldsfld",
            StSFld(_) => "stsfld",
            Dup => "dup",
            Pop => "pop",
            Add => "add",
            Ceq => "ceq",
            Call(_) => "call",
            CallVirt(_) => "callvirt",
            Constrained(_) => "constrained.",
            NewObj(_) => "newobj",
            Box(_) => "box",
            Br(_) => "br",
            BrTrue(_) => "brtrue",
            BrFalse(_) => "brfalse",
            Leave(_) => "leave",
            EndFinally => "endfinally",
            Throw => "throw",
            Ret => "ret",
        }
    }
}

/// Prints the instruction the way an IL listing would, except that jump targets are shown as
/// handles (the body listing resolves them to positions)
impl<'g> fmt::Debug for Instruction<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        match self {
            LdArg(n) | StArg(n) | LdLoc(n) | StLoc(n) if *n <= 3 => {
                write!(f, "{}.{}", self.mnemonic(), n)
            }
            LdArg(n) | StArg(n) | LdLoc(n) | StLoc(n) | LdLocA(n) => {
                write!(f, "{} {}", self.mnemonic(), n)
            }
            LdcI4(n) if (-1..=8).contains(n) => match *n {
                -1 => f.write_str("ldc.i4.m1"),
                n => write!(f, "ldc.i4.{}", n),
            },
            LdcI4(n) => write!(f, "ldc.i4 {}", n),
            LdStr(s) => write!(f, "ldstr {:?}", s),
            LdFld(field) | LdFldA(field) | StFld(field) | LdSFld(field) | StSFld(field) => {
                write!(f, "{} {}", self.mnemonic(), field)
            }
            Call(method) | CallVirt(method) | NewObj(method) => {
                write!(f, "{} {}", self.mnemonic(), method)
            }
            Constrained(ty) | Box(ty) => write!(f, "{} {}", self.mnemonic(), ty),
            Br(target) | BrTrue(target) | BrFalse(target) | Leave(target) => {
                write!(f, "{} {:?}", self.mnemonic(), target)
            }
            _ => f.write_str(self.mnemonic()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::Instruction;
    use crate::il::graph::{MethodRef, TypeGraph, TypeGraphArenas};

    #[test]
    fn call_effects_follow_signatures() {
        let arenas = TypeGraphArenas::new();
        let graph = TypeGraph::new(&arenas);
        let platform = graph.insert_platform_types();
        let members = &platform.members;

        let exchange = Instruction::Call(MethodRef::direct(members.interlocked.exchange_int32));
        assert_eq!(exchange.stack_effect(), (2, 1));

        let dispose = Instruction::CallVirt(MethodRef::direct(members.idisposable.dispose));
        assert_eq!(dispose.stack_effect(), (1, 0));

        let new_exception =
            Instruction::NewObj(MethodRef::direct(members.object_disposed_exception.ctor_string));
        assert_eq!(new_exception.stack_effect(), (1, 1));
    }

    #[test]
    fn short_forms_in_listing() {
        assert_eq!(format!("{:?}", Instruction::LdArg(0)), "ldarg.0");
        assert_eq!(format!("{:?}", Instruction::LdArg(7)), "ldarg 7");
        assert_eq!(format!("{:?}", Instruction::LdcI4(1)), "ldc.i4.1");
        assert_eq!(format!("{:?}", Instruction::LdcI4(-1)), "ldc.i4.m1");
        assert_eq!(format!("{:?}", Instruction::LdcI4(300)), "ldc.i4 300");
        assert_eq!(format!("{:?}", Instruction::LdStr(String::from("Simple"))), "ldstr \"Simple\"");
    }
}
