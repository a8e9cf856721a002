//! Human-readable rendering of deploy failures.
//!
//! Output here is meant to be read directly by whoever triggered the
//! deploy, human or agent: every failing document is listed with its code,
//! root cause and a concrete fix.

use crate::localizer::FailedDocument;
use promptops_prompt::{ValidationIssue, ValidationReport};
use serde_json::Value;
use std::fmt::Write;

/// Flatten nested remote error `details` into readable lines.
///
/// Understands arrays, per-document entries (`path` or `documentPath`
/// with nested `errors`) and `message`/`code` pairs. Anything else is
/// rendered as compact JSON.
///
/// ```
/// use promptops_deploy::flatten_error_details;
/// use serde_json::json;
///
/// let details = json!([{ "path": "greet", "errors": [{ "code": "E1", "message": "bad" }] }]);
/// assert_eq!(flatten_error_details(&details), vec!["greet: [E1] bad"]);
/// ```
pub fn flatten_error_details(details: &Value) -> Vec<String> {
    let mut lines = Vec::new();
    collect(details, None, &mut lines);
    lines
}

const NESTED_KEYS: &[&str] = &["errors", "issues", "details"];

fn collect(value: &Value, prefix: Option<&str>, lines: &mut Vec<String>) {
    match value {
        Value::Null => {}
        Value::String(text) => push(lines, prefix, text),
        Value::Bool(_) | Value::Number(_) => push(lines, prefix, &value.to_string()),
        Value::Array(items) => {
            for item in items {
                collect(item, prefix, lines);
            }
        }
        Value::Object(map) => {
            let path = map
                .get("path")
                .or_else(|| map.get("documentPath"))
                .and_then(Value::as_str);
            let prefix = path.or(prefix);
            let before = lines.len();

            if let Some(message) = map.get("message").and_then(Value::as_str) {
                match map.get("code").and_then(Value::as_str) {
                    Some(code) => push(lines, prefix, &format!("[{}] {}", code, message)),
                    None => push(lines, prefix, message),
                }
            }

            for key in NESTED_KEYS {
                if let Some(nested) = map.get(*key) {
                    collect(nested, prefix, lines);
                }
            }

            if lines.len() == before {
                push(lines, prefix, &value.to_string());
            }
        }
    }
}

fn push(lines: &mut Vec<String>, prefix: Option<&str>, text: &str) {
    match prefix {
        Some(prefix) => lines.push(format!("{}: {}", prefix, text)),
        None => lines.push(text.to_string()),
    }
}

/// Render the documents blamed for a rejected publish.
pub fn format_failures(failures: &[FailedDocument]) -> String {
    let mut out = format!(
        "Deployment rejected: {} document(s) failed validation.\n",
        failures.len()
    );

    for (idx, failure) in failures.iter().enumerate() {
        let _ = writeln!(out, "\n{}. {}", idx + 1, failure.path);
        let _ = writeln!(out, "   Code: {}", failure.code);
        let _ = writeln!(out, "   Error: {}", failure.message);
        let _ = writeln!(out, "   Root cause: {}", failure.root_cause);
        if let Some(location) = failure.location {
            let _ = writeln!(
                out,
                "   Location: line {}, column {}",
                location.line, location.column
            );
        }
        if let Some(frame) = &failure.code_frame {
            let _ = writeln!(out, "   Code frame:\n{}", indent(frame, 6));
        }
        let _ = writeln!(out, "   Suggestion: {}", failure.suggestion);
    }

    out.trim_end().to_string()
}

/// Render a failed validation report.
pub fn format_validation_report(report: &ValidationReport) -> String {
    let mut out = format!(
        "Validation failed for {} document(s); nothing was deployed.\n",
        report.errors.len()
    );

    for doc in &report.errors {
        let _ = writeln!(out, "\n{}", doc.name);
        for issue in &doc.issues {
            out.push_str(&format_issue(issue));
        }
    }

    out.trim_end().to_string()
}

/// Render one validation issue, indented under its document.
pub fn format_issue(issue: &ValidationIssue) -> String {
    let mut out = format!(
        "  {} [{}] {}",
        issue.issue_type.as_str(),
        issue.code,
        issue.message
    );
    if let Some(location) = issue.location {
        let _ = write!(out, " (line {}, column {})", location.line, location.column);
    }
    out.push('\n');

    let _ = writeln!(out, "    Root cause: {}", issue.root_cause);
    if let Some(frame) = &issue.code_frame {
        let _ = writeln!(out, "{}", indent(frame, 4));
    }
    let _ = writeln!(out, "    Suggestion: {}", issue.suggestion);
    out
}

fn indent(text: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    text.lines()
        .map(|line| format!("{}{}", pad, line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptops_prompt::{SourceLocation, Validator};
    use serde_json::json;

    #[test]
    fn test_flatten_nested_document_errors() {
        let details = json!({
            "errors": [
                { "documentPath": "a", "errors": ["missing model", { "message": "bad tag", "code": "TAG" }] },
                { "path": "b", "message": "too long" }
            ]
        });

        assert_eq!(
            flatten_error_details(&details),
            vec!["a: missing model", "a: [TAG] bad tag", "b: too long"]
        );
    }

    #[test]
    fn test_flatten_unknown_shape_falls_back_to_json() {
        let details = json!({ "limit": 3 });
        assert_eq!(flatten_error_details(&details), vec![r#"{"limit":3}"#]);
        assert!(flatten_error_details(&Value::Null).is_empty());
    }

    #[test]
    fn test_format_failures_lists_every_field() {
        let failure = FailedDocument {
            path: "support/reply".to_string(),
            code: "unclosed-message-tag".to_string(),
            message: "<user> is never closed".to_string(),
            root_cause: "A message tag is opened but never closed.".to_string(),
            suggestion: "Close it.".to_string(),
            location: Some(SourceLocation::new(4, 1)),
            code_frame: Some("> 4 | <user>hi\n    | ^".to_string()),
        };

        let text = format_failures(&[failure]);
        let path_at = text.find("support/reply").unwrap();
        let code_at = text.find("Code: unclosed-message-tag").unwrap();
        let cause_at = text.find("Root cause:").unwrap();
        let location_at = text.find("Location: line 4, column 1").unwrap();
        let frame_at = text.find("      > 4 | <user>hi").unwrap();
        let suggestion_at = text.find("Suggestion: Close it.").unwrap();

        assert!(path_at < code_at);
        assert!(code_at < cause_at);
        assert!(cause_at < location_at);
        assert!(location_at < frame_at);
        assert!(frame_at < suggestion_at);
    }

    #[test]
    fn test_format_validation_report() {
        let report = Validator::new().validate_all([("broken", "<user>hi")]);
        let text = format_validation_report(&report);

        assert!(text.starts_with("Validation failed for 1 document(s)"));
        assert!(text.contains("broken\n  error [unclosed-message-tag]"));
        assert!(text.contains("Suggestion:"));
    }
}
