use super::code::InsnId;

#[derive(Debug)]
pub enum Error {
    /// A type could not be found in the graph
    MissingType(String),

    /// A field or method could not be found on a type
    MissingMember(String),

    /// More than one member matches a lookup that expects exactly one
    AmbiguousMember(String, String),

    MalformedName(String),

    /// An instruction handle refers to an instruction that was never placed in the body
    DanglingInstruction(InsnId),

    /// An instruction is placed into a body twice (indicates a bug)
    InstructionAlreadyPlaced(InsnId),

    /// A member is attached to a type model that does not declare it
    ForeignMember(String),

    GenericArity {
        member: String,
        expected: usize,
        found: usize,
    },

    /// Error trying to verify a method body
    VerifierError {
        method: String,
        position: usize,
        kind: VerifierErrorKind,
    },
}

#[derive(Debug, PartialEq, Eq)]
pub enum VerifierErrorKind {
    /// Popping from an empty stack
    EmptyStack,

    /// Two paths reach the same instruction with different stack heights
    InconsistentStackHeight { expected: usize, found: usize },

    /// Branch target or region boundary that is not placed in the body
    UnplacedTarget(InsnId),

    ArgumentOutOfRange(u16),
    LocalOutOfRange(u16),

    /// Return with the wrong number of values on the stack
    BadReturnDepth(usize),

    /// Execution can run past the last instruction
    FallsOffEnd,

    /// `constrained.` prefix that is not followed by `callvirt`
    DanglingPrefix,

    /// Protected region entered with values on the stack
    NonEmptyStackAtRegion(usize),
}

impl From<String> for Error {
    fn from(err: String) -> Error {
        Error::MalformedName(err)
    }
}
