//! Validation types.
//!
//! This module defines the diagnostics produced by a prompt checker and the
//! enriched issues and reports handed to callers.

use serde::{Deserialize, Serialize};

/// A local prompt document: slash-separated path plus content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalDocument {
    pub path: String,
    pub content: String,
}

impl LocalDocument {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Severity of a diagnostic or issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    Error,
    Warning,
}

impl IssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::Error => "error",
            IssueType::Warning => "warning",
        }
    }
}

/// 1-based position in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Raw compile diagnostic emitted by a [`crate::PromptChecker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Stable diagnostic identifier (e.g. "unclosed-message-tag")
    pub code: String,
    pub message: String,
    pub severity: IssueType,
    pub location: Option<SourceLocation>,
}

impl Diagnostic {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            severity: IssueType::Error,
            location: None,
        }
    }

    pub fn warning(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            severity: IssueType::Warning,
            location: None,
        }
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.location = Some(SourceLocation::new(line, column));
        self
    }
}

/// A diagnostic enriched with an explanation and fix guidance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    #[serde(rename = "type")]
    pub issue_type: IssueType,

    pub code: String,

    pub message: String,

    /// Plain-language explanation of what went wrong
    pub root_cause: String,

    /// Concrete fix guidance
    pub suggestion: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,

    /// Rendered source excerpt around `location`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_frame: Option<String>,
}

impl ValidationIssue {
    pub fn is_error(&self) -> bool {
        self.issue_type == IssueType::Error
    }
}

/// Issues found in one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentIssues {
    /// Document path
    pub name: String,
    pub issues: Vec<ValidationIssue>,
}

impl DocumentIssues {
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(ValidationIssue::is_error)
    }
}

/// Outcome of validating a batch of documents.
///
/// The batch is valid only when no document carries an error-type issue.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,

    /// Documents with at least one error (their warnings included)
    pub errors: Vec<DocumentIssues>,

    /// Documents with warnings only
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<DocumentIssues>,
}

impl ValidationReport {
    /// Paths of the documents that block the batch.
    pub fn failing_paths(&self) -> Vec<&str> {
        self.errors.iter().map(|doc| doc.name.as_str()).collect()
    }

    /// Total number of error-type issues.
    pub fn error_count(&self) -> usize {
        self.errors
            .iter()
            .flat_map(|doc| doc.issues.iter())
            .filter(|issue| issue.is_error())
            .count()
    }
}
