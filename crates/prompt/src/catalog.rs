//! Diagnostic catalog.
//!
//! Fixed lookup from diagnostic code to a plain-language root cause and a
//! concrete fix. Codes the catalog does not know get a generic entry.

/// Explanation attached to a diagnostic code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Explanation {
    pub root_cause: &'static str,
    pub suggestion: &'static str,
}

const GENERIC: Explanation = Explanation {
    root_cause: "The prompt service rejected this document for a reason this tool does not recognize.",
    suggestion: "Review the prompt language documentation for this error code and compare the document against a known-good prompt.",
};

const CATALOG: &[(&str, Explanation)] = &[
    (
        "unclosed-config",
        Explanation {
            root_cause: "The document opens a configuration block with `---` but never closes it.",
            suggestion: "Add a closing `---` line after the last configuration key.",
        },
    ),
    (
        "invalid-config",
        Explanation {
            root_cause: "The configuration block between the `---` lines is not a valid YAML mapping.",
            suggestion: "Write the configuration as `key: value` pairs, check indentation and quote values containing `:` or `#`.",
        },
    ),
    (
        "missing-model",
        Explanation {
            root_cause: "The configuration does not name a model, so the service falls back to its project default.",
            suggestion: "Add a `model:` key to the configuration block.",
        },
    ),
    (
        "template-syntax-error",
        Explanation {
            root_cause: "A `{{ ... }}` expression or block in the template body could not be parsed.",
            suggestion: "Check that every `{{` has a matching `}}` and that block helpers use `{{#name}}` ... `{{/name}}`.",
        },
    ),
    (
        "mismatched-block",
        Explanation {
            root_cause: "A template block is closed with a different name than the one that opened it.",
            suggestion: "Make the closing `{{/name}}` match the innermost open `{{#name}}` block.",
        },
    ),
    (
        "invalid-parameter",
        Explanation {
            root_cause: "A template helper received a parameter it cannot interpret.",
            suggestion: "Check the helper's arguments: quote string literals and reference variables by name.",
        },
    ),
    (
        "unclosed-message-tag",
        Explanation {
            root_cause: "A message tag such as `<user>` is opened but never closed.",
            suggestion: "Close the message with the matching tag, e.g. `</user>`.",
        },
    ),
    (
        "unexpected-closing-tag",
        Explanation {
            root_cause: "A closing message tag does not match the currently open message.",
            suggestion: "Remove the stray closing tag or close the messages in the order they were opened.",
        },
    ),
    (
        "nested-message-tag",
        Explanation {
            root_cause: "A message tag is opened inside another message; messages cannot be nested.",
            suggestion: "Close the outer message before starting the next one.",
        },
    ),
    (
        "empty-prompt",
        Explanation {
            root_cause: "The document has no prompt text after the configuration block.",
            suggestion: "Add the prompt body, or delete the document if it is no longer needed.",
        },
    ),
    (
        "parse-error",
        Explanation {
            root_cause: "The checker could not parse the document at all.",
            suggestion: "Fix the syntax error reported in the message, starting from the first line it points to.",
        },
    ),
];

/// Look up the explanation for a diagnostic code.
pub fn explain(code: &str) -> Explanation {
    lookup(code).unwrap_or(GENERIC)
}

/// Look up a code without falling back.
pub fn lookup(code: &str) -> Option<Explanation> {
    CATALOG
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, explanation)| *explanation)
}
