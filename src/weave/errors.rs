use crate::il;
use std::fmt;

/// Errors that abort a whole weaving session
#[derive(Debug)]
pub enum Error {
    Model(il::Error),
    MalformedName(String),

    /// A symbol the generated code depends on is not in the referenced assemblies
    MissingReference(String),
}

impl From<il::Error> for Error {
    fn from(err: il::Error) -> Error {
        Error::Model(err)
    }
}

/// Reason a type (or one of its fields) cannot be woven
///
/// These are recorded on the error channel of the diagnostics and do not stop the session. The
/// rendered message names the offending type or field and says how to fix it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    MultipleEntryMethods {
        type_name: String,
    },
    EntryMethodHasCode {
        type_name: String,
    },
    UnsupportedBaseType {
        type_name: String,
    },

    /// A member with a name the weaver needs is already declared
    NameCollision {
        type_name: String,
        member_name: String,
        kind: MemberKind,
    },

    ReadonlyField {
        field_name: String,
    },
    ValueTypeField {
        field_name: String,
    },

    /// Field typed by a generic definition that was never given arguments
    GenericField {
        field_name: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Field,
    Method,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Field => f.write_str("field"),
            MemberKind::Method => f.write_str("method"),
        }
    }
}

const SKIP_HINT: &str = "add a `[Janitor.SkipWeaving]` attribute to the type.";

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::MultipleEntryMethods { type_name } => write!(
                f,
                "Type `{}` contains more than one `Dispose` method. Either remove one or {}",
                type_name, SKIP_HINT
            ),
            Violation::EntryMethodHasCode { type_name } => write!(
                f,
                "Type `{}` contains a `Dispose` method with code. Either remove the code or {}",
                type_name, SKIP_HINT
            ),
            Violation::UnsupportedBaseType { type_name } => write!(
                f,
                "Type `{}` has a base class which is not currently supported. Either remove the base class or {}",
                type_name, SKIP_HINT
            ),
            Violation::NameCollision {
                type_name,
                member_name,
                kind,
            } => write!(
                f,
                "Type `{}` contains a `{}` {}. Either remove this {} or {}",
                type_name, member_name, kind, kind, SKIP_HINT
            ),
            Violation::ReadonlyField { field_name } => write!(
                f,
                "Could not add dispose for field '{}' since it is marked as readonly. Change this field to not be readonly.",
                field_name
            ),
            Violation::ValueTypeField { field_name } => write!(
                f,
                "Could not add dispose for field '{}' since it is a value type.",
                field_name
            ),
            Violation::GenericField { field_name } => write!(
                f,
                "Could not add dispose for field '{}' since it has generic parameters.",
                field_name
            ),
        }
    }
}
