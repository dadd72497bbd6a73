use std::borrow::Cow;
use std::fmt::{Debug, Display, Error as FmtError, Formatter};

/// Names of methods, fields, and generic parameters
///
/// Explicit interface implementations are named after the interface (eg.
/// `System.IDisposable.Dispose`), so dots are allowed.
#[derive(Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct MemberName(Cow<'static, str>);

/// Fully qualified names of types, written as `Namespace.Name` with nested types separated by
/// `/` (eg. `Outer.Namespace.Parent/Child`)
#[derive(Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct QualifiedName(Cow<'static, str>);

impl AsRef<str> for MemberName {
    fn as_ref(&self) -> &str {
        self.0.as_ref()
    }
}

impl AsRef<str> for QualifiedName {
    fn as_ref(&self) -> &str {
        self.0.as_ref()
    }
}

pub trait Name: Sized {
    /// Check if a string would be a valid name
    fn check_valid(name: impl AsRef<str>) -> Result<(), String>;

    /// Extract the raw underlying string data
    fn as_cow(&self) -> &Cow<'static, str>;

    /// Extract the raw underlying string name
    fn as_str(&self) -> &str {
        self.as_cow().as_ref()
    }

    /// Try to construct a name from a string
    fn from_string(name: String) -> Result<Self, String>;
}

impl Name for MemberName {
    fn check_valid(name: impl AsRef<str>) -> Result<(), String> {
        let name = name.as_ref();
        if name.is_empty() {
            Err(String::from("Member name is empty"))
        } else if name.contains(&['/', ';', '&', '['][..]) {
            Err(format!("Member name '{}' contains an illegal character", name))
        } else {
            Ok(())
        }
    }

    fn as_cow(&self) -> &Cow<'static, str> {
        &self.0
    }

    fn from_string(name: String) -> Result<Self, String> {
        Self::check_valid(&name)?;
        Ok(MemberName(Cow::Owned(name)))
    }
}

impl Name for QualifiedName {
    fn check_valid(name: impl AsRef<str>) -> Result<(), String> {
        let name = name.as_ref();
        if name.is_empty() {
            return Err(String::from("Qualified name is empty"));
        }
        for segment in name.split(&['.', '/'][..]) {
            if segment.is_empty() {
                return Err(format!("Qualified name '{}' has an empty segment", name));
            }
            if segment.contains(&[';', '&', '[', ']'][..]) {
                return Err(format!(
                    "Qualified name '{}' contains an illegal character",
                    name
                ));
            }
        }
        Ok(())
    }

    fn as_cow(&self) -> &Cow<'static, str> {
        &self.0
    }

    fn from_string(name: String) -> Result<Self, String> {
        Self::check_valid(&name)?;
        Ok(QualifiedName(Cow::Owned(name)))
    }
}

impl Debug for MemberName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.write_str(self.0.as_ref())
    }
}

impl Debug for QualifiedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.write_str(self.0.as_ref())
    }
}

impl Display for MemberName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.write_str(self.0.as_ref())
    }
}

impl Display for QualifiedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.write_str(self.0.as_ref())
    }
}

impl MemberName {
    pub const fn name(value: &'static str) -> MemberName {
        MemberName(Cow::Borrowed(value))
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }

    // Platform names
    pub const CTOR: Self = Self::name(".ctor");
    pub const CCTOR: Self = Self::name(".cctor");
    pub const DISPOSE: Self = Self::name("Dispose");
    pub const EXCHANGE: Self = Self::name("Exchange");
    pub const FINALIZE: Self = Self::name("Finalize");
    pub const SUPPRESS_FINALIZE: Self = Self::name("SuppressFinalize");
    pub const GET_MESSAGE: Self = Self::name("get_Message");
}

impl QualifiedName {
    pub const fn name(value: &'static str) -> QualifiedName {
        QualifiedName(Cow::Borrowed(value))
    }

    /// Namespace of the type
    ///
    /// Nested types take on the namespace of their outermost declaring type.
    pub fn namespace(&self) -> &str {
        let outermost = self.0.split('/').next().unwrap_or("");
        match outermost.rfind('.') {
            Some(idx) => &outermost[..idx],
            None => "",
        }
    }

    /// Simple name of the type (no namespace and no declaring types)
    pub fn simple_name(&self) -> &str {
        let innermost = self.0.rsplit('/').next().unwrap_or("");
        if self.0.contains('/') {
            innermost
        } else {
            match innermost.rfind('.') {
                Some(idx) => &innermost[idx + 1..],
                None => innermost,
            }
        }
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }

    /// Name of a type nested inside this one
    pub fn nested(&self, inner: &str) -> QualifiedName {
        QualifiedName(Cow::Owned(format!("{}/{}", self.as_str(), inner)))
    }

    // Platform names
    pub const BOOLEAN: Self = Self::name("System.Boolean");
    pub const COMPILER_GENERATED: Self =
        Self::name("System.Runtime.CompilerServices.CompilerGeneratedAttribute");
    pub const ENUM: Self = Self::name("System.Enum");
    pub const EXCEPTION: Self = Self::name("System.Exception");
    pub const GC: Self = Self::name("System.GC");
    pub const GENERATED_CODE: Self = Self::name("System.CodeDom.Compiler.GeneratedCodeAttribute");
    pub const IDISPOSABLE: Self = Self::name("System.IDisposable");
    pub const INT32: Self = Self::name("System.Int32");
    pub const INTERLOCKED: Self = Self::name("System.Threading.Interlocked");
    pub const INVALID_OPERATION_EXCEPTION: Self = Self::name("System.InvalidOperationException");
    pub const MEMORY_STREAM: Self = Self::name("System.IO.MemoryStream");
    pub const NOT_IMPLEMENTED_EXCEPTION: Self = Self::name("System.NotImplementedException");
    pub const OBJECT: Self = Self::name("System.Object");
    pub const OBJECT_DISPOSED_EXCEPTION: Self = Self::name("System.ObjectDisposedException");
    pub const STREAM: Self = Self::name("System.IO.Stream");
    pub const STRING: Self = Self::name("System.String");
    pub const TASK: Self = Self::name("System.Threading.Tasks.Task");
    pub const TASK_OF_T: Self = Self::name("System.Threading.Tasks.Task`1");
    pub const TASK_COMPLETION_SOURCE: Self =
        Self::name("System.Threading.Tasks.TaskCompletionSource`1");
    pub const VALUE_TYPE: Self = Self::name("System.ValueType");
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn namespaces_and_simple_names() {
        let name = QualifiedName::name("System.Threading.Interlocked");
        assert_eq!(name.namespace(), "System.Threading");
        assert_eq!(name.simple_name(), "Interlocked");

        let global = QualifiedName::name("Simple");
        assert_eq!(global.namespace(), "");
        assert_eq!(global.simple_name(), "Simple");

        let nested = QualifiedName::name("Outer.Space.Parent").nested("Child");
        assert_eq!(nested.as_str(), "Outer.Space.Parent/Child");
        assert_eq!(nested.namespace(), "Outer.Space");
        assert_eq!(nested.simple_name(), "Child");
    }

    #[test]
    fn rejects_malformed_names() {
        assert!(QualifiedName::from_string(String::from("")).is_err());
        assert!(QualifiedName::from_string(String::from("System..Object")).is_err());
        assert!(MemberName::from_string(String::from("Int32&")).is_err());
        assert!(MemberName::from_string(String::from("System.IDisposable.Dispose")).is_ok());
    }
}
