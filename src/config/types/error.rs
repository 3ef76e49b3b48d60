//! Configuration errors and validation diagnostics.

use super::FieldPath;
use owo_colors::OwoColorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading `sheaf.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("cannot parse config file")]
    Toml(#[from] toml::de::Error),

    #[error("{0}")]
    Validation(String),

    // no #[from]: the diagnostics already render every entry
    #[error("{0}")]
    Diagnostics(ConfigDiagnostics),
}

/// How a diagnostic affects loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fails the load.
    Error,
    Warning,
    /// Informational, e.g. a compressor missing from PATH.
    Hint,
    /// The field is set but its behavior may change.
    Experimental,
}

#[derive(Debug, Clone)]
struct Entry {
    field: FieldPath,
    severity: Severity,
    message: String,
    hint: Option<String>,
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let section = self.field.section();
        if !section.is_empty() {
            write!(f, "{}{}{} ", "[".dimmed(), section.cyan(), "]".dimmed())?;
        }
        writeln!(f, "{}", self.field.key().cyan().bold())?;
        write!(f, "{} {}", "→".red(), self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, "\n  {} {}", "hint:".yellow(), hint)?;
        }
        Ok(())
    }
}

/// Diagnostics collected over one validation pass.
///
/// Only [`Severity::Error`] entries fail [`into_result`](Self::into_result);
/// the rest are printed by [`report`](Self::report).
#[derive(Debug, Default)]
pub struct ConfigDiagnostics {
    entries: Vec<Entry>,
}

impl ConfigDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(
        &mut self,
        field: FieldPath,
        severity: Severity,
        message: String,
        hint: Option<String>,
    ) {
        self.entries.push(Entry {
            field,
            severity,
            message,
            hint,
        });
    }

    pub fn error(&mut self, field: FieldPath, message: impl Into<String>) {
        self.push(field, Severity::Error, message.into(), None);
    }

    pub fn error_with_hint(
        &mut self,
        field: FieldPath,
        message: impl Into<String>,
        hint: impl Into<String>,
    ) {
        self.push(field, Severity::Error, message.into(), Some(hint.into()));
    }

    pub fn warn(&mut self, field: FieldPath, message: impl Into<String>) {
        self.push(field, Severity::Warning, message.into(), None);
    }

    pub fn hint(&mut self, field: FieldPath, message: impl Into<String>) {
        self.push(field, Severity::Hint, message.into(), None);
    }

    pub fn experimental(&mut self, field: FieldPath) {
        self.push(field, Severity::Experimental, String::new(), None);
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|e| e.severity == Severity::Error)
    }

    #[cfg(test)]
    pub fn count(&self, severity: Severity) -> usize {
        self.entries.iter().filter(|e| e.severity == severity).count()
    }

    fn of(&self, severity: Severity) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(move |e| e.severity == severity)
    }

    /// Log everything that is not an error.
    pub fn report(&self) {
        for entry in self.of(Severity::Warning) {
            crate::log!("warning"; "{}: {}", entry.field.as_str(), entry.message);
        }
        for entry in self.of(Severity::Hint) {
            crate::log!("hint"; "{}: {}", entry.field.as_str(), entry.message);
        }
        let experimental: Vec<_> = self
            .of(Severity::Experimental)
            .map(|e| e.field.as_str())
            .collect();
        if !experimental.is_empty() {
            crate::log!("hint"; "experimental, may change: {}", experimental.join(", "));
        }
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.has_errors() { Err(self) } else { Ok(()) }
    }
}

impl fmt::Display for ConfigDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}\n", "config validation failed:".red().bold())?;
        let errors: Vec<_> = self.of(Severity::Error).collect();
        for (i, entry) in errors.iter().enumerate() {
            if i > 0 {
                writeln!(f, "\n")?;
            }
            write!(f, "{entry}")?;
        }
        if errors.len() > 1 {
            let count = errors.len().to_string();
            write!(f, "\n\n{} {}", count.red().bold(), "errors".dimmed())?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigDiagnostics {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Io(
            PathBuf::from("sheaf.toml"),
            Error::new(ErrorKind::NotFound, "file not found"),
        );
        assert_eq!(err.to_string(), "cannot read `sheaf.toml`");
    }

    #[test]
    fn test_only_errors_fail() {
        let field = FieldPath::new("asset_bundler.server_url");
        let mut diag = ConfigDiagnostics::new();
        diag.warn(field, "looks odd");
        diag.hint(field, "`x` not found in PATH");
        diag.experimental(field);
        assert!(diag.into_result().is_ok());

        let mut diag = ConfigDiagnostics::new();
        diag.warn(field, "looks odd");
        diag.error_with_hint(field, "invalid URL", "use https://cdn.example.com");
        let err = diag.into_result().unwrap_err();
        assert_eq!(err.count(Severity::Error), 1);

        let display = err.to_string();
        assert!(display.contains("asset_bundler"));
        assert!(display.contains("server_url"));
        assert!(display.contains("invalid URL"));
        assert!(display.contains("use https://cdn.example.com"));
        assert!(!display.contains("looks odd"));
    }
}
