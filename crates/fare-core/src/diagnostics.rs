//! Issue collection for batch operations that keep going past bad input.
//!
//! Survey loading and profile aggregation skip malformed rows instead of
//! aborting the run. Every skipped row or questionable value is recorded here
//! so the driver can print or serialize what was dropped.
//!
//! # Example
//!
//! ```
//! use fare_core::diagnostics::Diagnostics;
//!
//! let mut diag = Diagnostics::new();
//! diag.add_warning_at_row("survey", "missing Fare_Paid", 14);
//! diag.add_error_at_row("survey", "unreadable row", 15);
//!
//! assert_eq!(diag.warning_count(), 1);
//! assert!(diag.has_errors());
//! assert_eq!(diag.summary(), "1 warning, 1 error");
//! ```

use serde::Serialize;

/// Severity level for diagnostic issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Input was skipped or defaulted but the operation continued
    Warning,
    /// The operation could not use this input at all
    Error,
}

/// A single diagnostic issue
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    /// Category for grouping (e.g. "survey", "profile")
    pub category: String,
    pub message: String,
    /// 1-based data row for file-based operations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
}

impl DiagnosticIssue {
    pub fn new(
        severity: Severity,
        category: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category: category.into(),
            message: message.into(),
            row: None,
        }
    }

    pub fn with_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }
}

impl std::fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };

        write!(f, "[{}:{}] {}", severity, self.category, self.message)?;

        if let Some(row) = self.row {
            write!(f, " at row {}", row)?;
        }

        Ok(())
    }
}

/// Collection of diagnostic issues for an operation
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, issue: DiagnosticIssue) {
        self.issues.push(issue);
    }

    pub fn add_warning_at_row(&mut self, category: &str, message: &str, row: usize) {
        self.add(DiagnosticIssue::new(Severity::Warning, category, message).with_row(row));
    }

    pub fn add_error_at_row(&mut self, category: &str, message: &str, row: usize) {
        self.add(DiagnosticIssue::new(Severity::Error, category, message).with_row(row));
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn summary(&self) -> String {
        let warnings = self.warning_count();
        let errors = self.error_count();

        match (warnings, errors) {
            (0, 0) => "No issues".to_string(),
            (w, 0) => format!("{} warning{}", w, if w == 1 { "" } else { "s" }),
            (0, e) => format!("{} error{}", e, if e == 1 { "" } else { "s" }),
            (w, e) => format!(
                "{} warning{}, {} error{}",
                w,
                if w == 1 { "" } else { "s" },
                e,
                if e == 1 { "" } else { "s" }
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_diagnostics() {
        let diag = Diagnostics::new();
        assert!(!diag.has_issues());
        assert_eq!(diag.summary(), "No issues");
    }

    #[test]
    fn test_mixed_counts() {
        let mut diag = Diagnostics::new();
        diag.add_warning_at_row("survey", "a", 2);
        diag.add_error_at_row("survey", "b", 3);
        diag.add_warning_at_row("survey", "c", 5);

        assert_eq!(diag.warning_count(), 2);
        assert_eq!(diag.error_count(), 1);
        assert!(diag.has_errors());
        assert_eq!(diag.summary(), "2 warnings, 1 error");
    }

    #[test]
    fn test_issue_display() {
        let issue = DiagnosticIssue::new(Severity::Warning, "survey", "negative fare").with_row(7);
        assert_eq!(issue.to_string(), "[warning:survey] negative fare at row 7");
    }

    #[test]
    fn test_serialization_skips_empty_fields() {
        let mut diag = Diagnostics::new();
        diag.add(DiagnosticIssue::new(Severity::Warning, "survey", "skipped"));
        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains("\"severity\":\"warning\""));
        assert!(!json.contains("\"row\""));
    }
}
