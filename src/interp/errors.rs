use super::ObjectRef;

/// Reasons execution stops abnormally
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trap {
    /// Managed exception that no handler caught
    Exception(ObjectRef),

    NullReference,

    /// Popping from an empty evaluation stack (indicates a body that would not verify)
    StackUnderflow,

    /// Method with neither a body nor a native implementation
    MissingBody(String),

    TypeMismatch {
        expected: &'static str,
        found: String,
    },

    /// Object handle, argument, local, or jump target that does not exist
    InvalidReference(String),

    /// `endfinally` without a pending `leave` or exception
    UnexpectedEndFinally,

    /// Execution ran past the last instruction of a body
    FellOffEnd(String),

    StackOverflow,

    /// Execution went on for longer than the configured number of steps
    StepLimit,
}
