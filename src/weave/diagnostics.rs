use super::Violation;
use log::{error, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

/// Sink for everything the weaver has to say about a session
///
/// Messages are kept (so the host can fail the build on errors after the whole module has been
/// processed) and also forwarded to the `log` facade at the matching level.
#[derive(Default)]
pub struct Diagnostics {
    records: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Diagnostics {
        Diagnostics { records: vec![] }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        self.push(Severity::Info, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.push(Severity::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!("{}", message);
        self.push(Severity::Error, message);
    }

    pub fn violation(&mut self, violation: Violation) {
        self.error(violation.to_string())
    }

    fn push(&mut self, severity: Severity, message: String) {
        self.records.push(Diagnostic { severity, message });
    }

    pub fn has_errors(&self) -> bool {
        self.records
            .iter()
            .any(|record| record.severity == Severity::Error)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.records.iter()
    }

    /// Messages recorded with a given severity
    pub fn messages(&self, severity: Severity) -> Vec<&str> {
        self.records
            .iter()
            .filter(|record| record.severity == severity)
            .map(|record| record.message.as_str())
            .collect()
    }

    pub fn errors(&self) -> Vec<&str> {
        self.messages(Severity::Error)
    }

    pub fn warnings(&self) -> Vec<&str> {
        self.messages(Severity::Warning)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::{Diagnostics, Severity};

    #[test]
    fn errors_fail_the_session() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.info("\tRemoving reference to 'Janitor'.");
        diagnostics.warning("finalizer already present");
        assert!(!diagnostics.has_errors());

        diagnostics.error("broken");
        assert!(diagnostics.has_errors());
        assert_eq!(diagnostics.errors(), vec!["broken"]);
        assert_eq!(diagnostics.messages(Severity::Info).len(), 1);
        assert_eq!(diagnostics.len(), 3);
    }
}
