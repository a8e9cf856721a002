//! Document validator.
//!
//! Runs documents through a [`PromptChecker`] and enriches each diagnostic
//! with a root cause, a suggestion and a code frame. Validation is purely
//! local: it never touches the remote service.

use crate::catalog::explain;
use crate::checker::{PromptChecker, StaticChecker};
use crate::frame::code_frame;
use crate::types::{Diagnostic, DocumentIssues, ValidationIssue, ValidationReport};
use std::sync::Arc;

/// Code used when the checker fails outright.
pub const PARSE_ERROR_CODE: &str = "parse-error";

/// Static validator for prompt documents.
#[derive(Clone)]
pub struct Validator {
    checker: Arc<dyn PromptChecker>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("checker", &self.checker.name())
            .finish()
    }
}

impl Validator {
    /// Validator backed by the built-in [`StaticChecker`].
    pub fn new() -> Self {
        Self::with_checker(Arc::new(StaticChecker))
    }

    /// Validator backed by a custom checker.
    pub fn with_checker(checker: Arc<dyn PromptChecker>) -> Self {
        Self { checker }
    }

    /// Validate one document.
    ///
    /// A fatal checker failure is reported as a single error issue.
    pub fn validate(&self, content: &str, path: &str) -> Vec<ValidationIssue> {
        match self.checker.check(content, path) {
            Ok(diagnostics) => diagnostics
                .into_iter()
                .map(|diagnostic| enrich(diagnostic, content))
                .collect(),
            Err(err) => {
                tracing::debug!("Checker failed on {}: {}", path, err);
                vec![enrich(
                    Diagnostic::error(PARSE_ERROR_CODE, err.to_string()),
                    content,
                )]
            }
        }
    }

    /// Validate a batch of `(path, content)` pairs.
    ///
    /// Every document is checked before deciding; the batch is valid only
    /// if no document has an error-type issue.
    pub fn validate_all<'a, I>(&self, documents: I) -> ValidationReport
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        for (path, content) in documents {
            let issues = self.validate(content, path);
            if issues.is_empty() {
                continue;
            }

            let entry = DocumentIssues {
                name: path.to_string(),
                issues,
            };
            if entry.has_errors() {
                errors.push(entry);
            } else {
                warnings.push(entry);
            }
        }

        tracing::debug!(
            "Validated batch: {} failing, {} with warnings",
            errors.len(),
            warnings.len()
        );

        ValidationReport {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Errors-only view of [`Validator::validate`].
    pub fn errors(&self, content: &str, path: &str) -> Vec<ValidationIssue> {
        self.validate(content, path)
            .into_iter()
            .filter(ValidationIssue::is_error)
            .collect()
    }
}

/// Turn a raw diagnostic into a user-facing issue.
pub fn enrich(diagnostic: Diagnostic, content: &str) -> ValidationIssue {
    let explanation = explain(&diagnostic.code);
    let code_frame = diagnostic
        .location
        .and_then(|location| code_frame(content, location));

    ValidationIssue {
        issue_type: diagnostic.severity,
        code: diagnostic.code,
        message: diagnostic.message,
        root_cause: explanation.root_cause.to_string(),
        suggestion: explanation.suggestion.to_string(),
        location: diagnostic.location,
        code_frame,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptops_core::{AppError, AppResult};

    struct BrokenChecker;

    impl PromptChecker for BrokenChecker {
        fn name(&self) -> &str {
            "broken"
        }

        fn check(&self, _content: &str, _path: &str) -> AppResult<Vec<Diagnostic>> {
            Err(AppError::Other("unexpected end of input".to_string()))
        }
    }

    #[test]
    fn test_validate_enriches_issue() {
        let validator = Validator::new();
        let issues = validator.validate("---\nmodel: x\n---\n<user>hello", "greet");

        assert_eq!(issues.len(), 1);
        let issue = &issues[0];
        assert!(issue.is_error());
        assert_eq!(issue.code, "unclosed-message-tag");
        assert!(issue.suggestion.contains("</user>"));
        assert!(issue.code_frame.as_deref().unwrap().contains("> 4 | <user>hello"));
    }

    #[test]
    fn test_fatal_checker_error_is_single_issue() {
        let validator = Validator::with_checker(Arc::new(BrokenChecker));
        let issues = validator.validate("anything", "p");

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, PARSE_ERROR_CODE);
        assert!(issues[0].is_error());
        assert!(issues[0].message.contains("unexpected end of input"));
    }

    #[test]
    fn test_validate_all_is_all_or_nothing() {
        let validator = Validator::new();
        let docs = [
            ("a", "---\nmodel: x\n---\nFine"),
            ("b", "<user>never closed"),
            ("c", "---\nmodel: x\n---\nAlso fine"),
        ];

        let report = validator.validate_all(docs.iter().copied());
        assert!(!report.valid);
        assert_eq!(report.failing_paths(), vec!["b"]);
    }

    #[test]
    fn test_validate_all_reports_every_failure() {
        let validator = Validator::new();
        let docs = [("a", "{{oops"), ("b", "fine"), ("c", "</user>")];

        let report = validator.validate_all(docs.iter().copied());
        assert_eq!(report.failing_paths(), vec!["a", "c"]);
    }

    #[test]
    fn test_warnings_do_not_invalidate() {
        let validator = Validator::new();
        let docs = [("a", "---\ntemperature: 1\n---\nHi")];

        let report = validator.validate_all(docs.iter().copied());
        assert!(report.valid);
        assert!(report.errors.is_empty());
        assert_eq!(report.warnings[0].name, "a");
    }

    #[test]
    fn test_errors_filters_warnings() {
        let validator = Validator::new();
        assert!(validator.errors("---\nfoo: 1\n---\nHi", "p").is_empty());
    }
}
