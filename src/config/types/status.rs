//! Status checks for `#[config(status = ...)]` fields.
//!
//! `#[derive(Config)]` emits a `validate_field_status` method that calls
//! [`check_field_status`] for every marked field whose value differs from
//! its default.

use super::FieldPath;
use crate::config::ConfigDiagnostics;

/// Status a config field can be marked with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStatus {
    Experimental,
    Deprecated,
}

/// Record a diagnostic for a user-set field with a special status.
pub fn check_field_status(
    field_path: &'static str,
    status: FieldStatus,
    diag: &mut ConfigDiagnostics,
) {
    let field = FieldPath::new(field_path);
    match status {
        FieldStatus::Deprecated => diag.warn(field, "deprecated, will be removed"),
        FieldStatus::Experimental => diag.experimental(field),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::Severity;

    #[test]
    fn test_status_severity() {
        let mut diag = ConfigDiagnostics::new();
        check_field_status("asset_bundler.cdn", FieldStatus::Deprecated, &mut diag);
        check_field_status("asset_bundler.compile", FieldStatus::Experimental, &mut diag);

        assert!(!diag.has_errors());
        assert_eq!(diag.count(Severity::Warning), 1);
        assert_eq!(diag.count(Severity::Experimental), 1);
        assert!(diag.into_result().is_ok());
    }
}
