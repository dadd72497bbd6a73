//! Structural verification of method bodies
//!
//! This is not a type checker. It checks the properties that any runtime loader would reject a
//! body for before even looking at types:
//!
//!   - every jump target and region boundary is an instruction placed in the body
//!   - every instruction is reached with the same stack height along every path
//!   - nothing pops from an empty stack
//!   - arguments and locals are in range
//!   - `ret` leaves exactly the return value (if any) on the stack
//!   - control never runs past the last instruction
//!
//! Stack heights are propagated with a worklist over instruction positions, starting from the
//! first instruction and from each handler entry (with the caught exception on the stack for
//! `catch` handlers).

use crate::il::code::{HandlerKind, InsnId, Instruction, MethodBody};
use crate::il::graph::MethodId;
use crate::il::model::Module;
use crate::il::{Error, VerifierErrorKind};
use std::collections::{HashMap, HashSet};

/// Verify a body, returning the maximum stack depth
pub fn verify_body<'g>(method: MethodId<'g>, body: &MethodBody<'g>) -> Result<usize, Error> {
    let fail = |position: usize, kind: VerifierErrorKind| Error::VerifierError {
        method: format!("{:?}", method),
        position,
        kind,
    };

    let positions: HashMap<InsnId, usize> = body.positions();
    let resolve = |id: InsnId, from: usize| -> Result<usize, Error> {
        positions
            .get(&id)
            .copied()
            .ok_or_else(|| fail(from, VerifierErrorKind::UnplacedTarget(id)))
    };

    let ids = body.ids();
    if ids.is_empty() {
        return Err(fail(0, VerifierErrorKind::FallsOffEnd));
    }

    let mut worklist: Vec<(usize, usize)> = vec![(0, 0)];
    let mut max_stack = 0;
    let mut region_starts: HashSet<usize> = HashSet::new();
    for handler in &body.handlers {
        for boundary in handler.boundaries() {
            resolve(boundary, 0)?;
        }
        region_starts.insert(resolve(handler.try_start, 0)?);
        let entry_height = match handler.kind {
            HandlerKind::Finally => 0,
            HandlerKind::Catch(_) => 1,
        };
        max_stack = max_stack.max(entry_height);
        worklist.push((resolve(handler.handler_start, 0)?, entry_height));
    }

    let argument_count = method.argument_count();
    let return_depth = usize::from(method.return_type.is_some());
    let mut heights: Vec<Option<usize>> = vec![None; ids.len()];

    while let Some((position, height)) = worklist.pop() {
        match heights[position] {
            Some(expected) if expected != height => {
                return Err(fail(
                    position,
                    VerifierErrorKind::InconsistentStackHeight {
                        expected,
                        found: height,
                    },
                ))
            }
            Some(_) => continue,
            None => heights[position] = Some(height),
        }
        if region_starts.contains(&position) && height != 0 {
            return Err(fail(position, VerifierErrorKind::NonEmptyStackAtRegion(height)));
        }

        let instruction = body.instruction(ids[position])?;
        match instruction {
            Instruction::LdArg(n) | Instruction::StArg(n) if *n as usize >= argument_count => {
                return Err(fail(position, VerifierErrorKind::ArgumentOutOfRange(*n)))
            }
            Instruction::LdLoc(n) | Instruction::LdLocA(n) | Instruction::StLoc(n)
                if *n as usize >= body.locals.len() =>
            {
                return Err(fail(position, VerifierErrorKind::LocalOutOfRange(*n)))
            }
            Instruction::Constrained(_) => {
                let next = ids.get(position + 1).map(|id| body.get(*id));
                if !matches!(next, Some(Some(Instruction::CallVirt(_)))) {
                    return Err(fail(position, VerifierErrorKind::DanglingPrefix));
                }
            }
            Instruction::Ret => {
                if height != return_depth {
                    return Err(fail(position, VerifierErrorKind::BadReturnDepth(height)));
                }
                continue;
            }
            Instruction::Leave(target) => {
                worklist.push((resolve(*target, position)?, 0));
                continue;
            }
            Instruction::EndFinally => continue,
            _ => (),
        }

        let (pops, pushes) = instruction.stack_effect();
        if height < pops {
            return Err(fail(position, VerifierErrorKind::EmptyStack));
        }
        let next_height = height - pops + pushes;
        max_stack = max_stack.max(next_height);

        if let Some(target) = instruction.branch_target() {
            worklist.push((resolve(target, position)?, next_height));
        }
        if !instruction.is_terminal() {
            if position + 1 >= ids.len() {
                return Err(fail(position, VerifierErrorKind::FallsOffEnd));
            }
            worklist.push((position + 1, next_height));
        }
    }

    Ok(max_stack)
}

/// Verify every body in the module
pub fn verify_module(module: &Module<'_>) -> Result<(), Error> {
    for method in module.methods() {
        if let Some(body) = &method.body {
            verify_body(method.id, body)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::verify_body;
    use crate::il::code::{ExceptionHandler, HandlerKind, Instruction, MethodBody};
    use crate::il::graph::{MethodData, MethodRef, TypeData, TypeGraph, TypeGraphArenas};
    use crate::il::{Error, MemberName, MethodFlags, QualifiedName, TypeFlags, VerifierErrorKind};

    fn kind_of(result: Result<usize, Error>) -> VerifierErrorKind {
        match result {
            Err(Error::VerifierError { kind, .. }) => kind,
            other => panic!("expected verifier error, got {:?}", other),
        }
    }

    #[test]
    fn finally_region_verifies() {
        let arenas = TypeGraphArenas::new();
        let graph = TypeGraph::new(&arenas);
        let platform = graph.insert_platform_types();
        let class = graph.add_type(TypeData::new(
            QualifiedName::name("Sample"),
            platform.types.object,
            TypeFlags::PUBLIC,
        ));
        let method = graph.add_method(MethodData::new(
            class,
            MemberName::FINALIZE,
            MethodFlags::FAMILY | MethodFlags::VIRTUAL,
        ));

        let mut body = MethodBody::new();
        let ret = body.create(Instruction::Ret);
        let try_start = body.push(Instruction::Nop);
        body.push(Instruction::Leave(ret));
        let handler_start = body.push(Instruction::LdArg(0));
        body.push(Instruction::Call(MethodRef::direct(
            platform.members.object.finalize,
        )));
        body.push(Instruction::EndFinally);
        body.place(ret).unwrap();
        body.handlers.push(ExceptionHandler {
            kind: HandlerKind::Finally,
            try_start,
            try_end: handler_start,
            handler_start,
            handler_end: ret,
        });

        assert_eq!(verify_body(method, &body).unwrap(), 1);
    }

    #[test]
    fn rejects_malformed_bodies() {
        let arenas = TypeGraphArenas::new();
        let graph = TypeGraph::new(&arenas);
        let platform = graph.insert_platform_types();
        let class = graph.add_type(TypeData::new(
            QualifiedName::name("Sample"),
            platform.types.object,
            TypeFlags::PUBLIC,
        ));
        let method = graph.add_method(MethodData::new(
            class,
            MemberName::name("Run"),
            MethodFlags::PUBLIC,
        ));

        let mut underflow = MethodBody::new();
        underflow.push(Instruction::Pop);
        underflow.push(Instruction::Ret);
        assert_eq!(kind_of(verify_body(method, &underflow)), VerifierErrorKind::EmptyStack);

        let mut leftover = MethodBody::new();
        leftover.push(Instruction::LdArg(0));
        leftover.push(Instruction::Ret);
        assert_eq!(
            kind_of(verify_body(method, &leftover)),
            VerifierErrorKind::BadReturnDepth(1)
        );

        let mut out_of_range = MethodBody::new();
        out_of_range.push(Instruction::LdArg(1));
        out_of_range.push(Instruction::Pop);
        out_of_range.push(Instruction::Ret);
        assert_eq!(
            kind_of(verify_body(method, &out_of_range)),
            VerifierErrorKind::ArgumentOutOfRange(1)
        );

        let mut dangling = MethodBody::new();
        let target = dangling.create(Instruction::Ret);
        dangling.push(Instruction::Br(target));
        assert_eq!(
            kind_of(verify_body(method, &dangling)),
            VerifierErrorKind::UnplacedTarget(target)
        );

        let mut mismatch = MethodBody::new();
        let join = mismatch.create(Instruction::Ret);
        mismatch.push(Instruction::LdcI4(1));
        mismatch.push(Instruction::BrTrue(join));
        mismatch.push(Instruction::LdNull);
        mismatch.place(join).unwrap();
        assert!(matches!(
            kind_of(verify_body(method, &mismatch)),
            VerifierErrorKind::InconsistentStackHeight { .. } | VerifierErrorKind::BadReturnDepth(1)
        ));
    }
}
