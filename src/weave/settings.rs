use super::Error;
use crate::il::{MemberName, Name, QualifiedName};

pub struct Settings {
    /// Names of the disposal entry point (plain and explicit interface implementation)
    pub entry_method_names: Vec<MemberName>,

    /// Hook releasing managed state (other disposable objects)
    pub managed_hook_name: MemberName,

    /// Hook releasing unmanaged state (native handles)
    pub unmanaged_hook_name: MemberName,

    /// Integer field exchanged atomically on the way into disposal
    pub signaled_field_name: MemberName,

    /// Boolean field read by the guard check
    pub disposed_field_name: MemberName,

    /// Method throwing if the instance is disposed
    pub guard_method_name: MemberName,

    /// Parameter of the `Dispose(bool)` routine generated when there is an unmanaged hook
    pub disposing_parameter_name: MemberName,

    /// Methods that never get a guard (eg. so callers can query disposal state)
    pub exempt_method_names: Vec<MemberName>,

    /// Marker excluding a type or field from weaving
    pub skip_weaving_marker: QualifiedName,

    /// Assembly level marker excluding a whole namespace from weaving
    pub skip_namespace_marker: QualifiedName,

    /// Assembly declaring the markers (the reference is removed after weaving)
    pub marker_assembly_name: String,

    /// Namespaces to skip on top of the ones named by assembly markers
    pub skipped_namespaces: Vec<String>,

    /// Inject guards into private methods too
    ///
    /// Methods introduced by the weaver never get guards either way. Turning this off reproduces
    /// older releases, where private helpers stayed callable after disposal.
    pub guard_private_methods: bool,

    /// Weave abstract classes
    ///
    /// Abstract classes are skipped by default since an instance of one is always an instance of
    /// some subclass, and subclasses with a base other than `System.Object` are not supported.
    pub weave_abstract_types: bool,
}

impl Settings {
    pub fn new() -> Result<Settings, Error> {
        fn make_name<N: Name>(name: impl Into<String>) -> Result<N, Error> {
            N::from_string(name.into()).map_err(Error::MalformedName)
        }

        Ok(Settings {
            entry_method_names: vec![
                make_name("Dispose")?,
                make_name("System.IDisposable.Dispose")?,
            ],
            managed_hook_name: make_name("DisposeManaged")?,
            unmanaged_hook_name: make_name("DisposeUnmanaged")?,
            signaled_field_name: make_name("disposeSignaled")?,
            disposed_field_name: make_name("disposed")?,
            guard_method_name: make_name("ThrowIfDisposed")?,
            disposing_parameter_name: make_name("disposing")?,
            exempt_method_names: vec![make_name("IsDisposed")?, make_name("get_IsDisposed")?],
            skip_weaving_marker: make_name("Janitor.SkipWeaving")?,
            skip_namespace_marker: make_name("Janitor.SkipWeavingNamespace")?,
            marker_assembly_name: String::from("Janitor"),
            skipped_namespaces: vec![],
            guard_private_methods: true,
            weave_abstract_types: false,
        })
    }

    /// Skip an extra namespace
    pub fn skip_namespace(&mut self, namespace: impl Into<String>) -> Result<(), Error> {
        let namespace = namespace.into();
        if !namespace.is_empty() {
            QualifiedName::check_valid(&namespace).map_err(Error::MalformedName)?;
        }
        self.skipped_namespaces.push(namespace);
        Ok(())
    }
}
