//! Method bodies and the instructions inside them
//!
//! ### Structure
//!
//! A [`MethodBody`] is an ordered sequence of [`Instruction`]s, plus the metadata that refers
//! into that sequence: exception regions ([`ExceptionHandler`]), debug line information
//! ([`SequencePoint`]), and the types of local variables.
//!
//! Instructions live in an arena owned by the body and are referred to by [`InsnId`] handles.
//! Branch targets and region boundaries are handles rather than positions, so inserting new
//! instructions anywhere in the body (eg. prepending a guard) leaves every existing jump and
//! region pointing at the same instruction it did before.
//!
//! ### Building code
//!
//! Straight-line code is just [`MethodBody::push`]. For a forward jump, the target is created
//! first (without being placed), the jump refers to it, and the target is placed once the code
//! before it is emitted:
//!
//! ```
//! use janitor::il::code::{Instruction, MethodBody};
//!
//! let mut body = MethodBody::new();
//! let ret = body.create(Instruction::Ret);
//! body.push(Instruction::LdArg(1));
//! body.push(Instruction::BrFalse(ret));
//! body.push(Instruction::Nop);
//! body.place(ret).unwrap();
//! assert_eq!(body.len(), 4);
//! ```

mod body;
mod instructions;

pub use body::*;
pub use instructions::*;
