//! Static prompt checker.
//!
//! A prompt document is an optional YAML configuration block delimited by
//! `---` lines, followed by a Handlebars template body. The body is split
//! into messages with `<system>`, `<user>`, `<assistant>` and `<tool>` tags.
//!
//! The checker never renders anything; it only reports compile diagnostics.

use crate::types::{Diagnostic, SourceLocation};
use handlebars::{Template, TemplateErrorReason};
use promptops_core::AppResult;

/// Tags that delimit chat messages.
pub const MESSAGE_TAGS: &[&str] = &["system", "user", "assistant", "tool"];

/// Trait for prompt-language static checkers.
pub trait PromptChecker: Send + Sync {
    /// Get the checker name.
    fn name(&self) -> &str;

    /// Check a document and return its compile diagnostics.
    ///
    /// An `Err` means the checker could not process the document at all.
    fn check(&self, content: &str, path: &str) -> AppResult<Vec<Diagnostic>>;
}

/// Built-in checker for configuration, template and message-tag syntax.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticChecker;

/// The configuration block and the template body of a document.
struct Sections<'a> {
    config: Option<&'a str>,
    body: &'a str,
    /// 1-based line where `body` starts
    body_line: usize,
}

/// Line of the first configuration key (right after the opening `---`).
const CONFIG_FIRST_LINE: usize = 2;

impl PromptChecker for StaticChecker {
    fn name(&self) -> &str {
        "static"
    }

    fn check(&self, content: &str, path: &str) -> AppResult<Vec<Diagnostic>> {
        tracing::trace!("Checking prompt {}", path);

        let sections = match split_sections(content) {
            Ok(sections) => sections,
            Err(diagnostic) => return Ok(vec![diagnostic]),
        };

        let mut diagnostics = Vec::new();

        if let Some(config) = sections.config {
            check_config(config, &mut diagnostics);
        }

        check_template(sections.body, sections.body_line, &mut diagnostics);
        check_message_tags(sections.body, sections.body_line, &mut diagnostics);

        if sections.body.trim().is_empty() {
            diagnostics.push(Diagnostic::warning(
                "empty-prompt",
                "Document has no prompt text",
            ));
        }

        diagnostics.sort_by_key(|d| {
            d.location
                .map(|l| (l.line, l.column))
                .unwrap_or((usize::MAX, 0))
        });

        Ok(diagnostics)
    }
}

fn split_sections(content: &str) -> Result<Sections<'_>, Diagnostic> {
    let whole = Sections {
        config: None,
        body: content,
        body_line: 1,
    };

    let mut lines = content.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Ok(whole);
    };
    if first.trim() != "---" {
        return Ok(whole);
    }

    let config_start = first.len();
    let mut offset = config_start;
    let mut line_no = 1;

    for line in lines {
        line_no += 1;
        if line.trim() == "---" {
            return Ok(Sections {
                config: Some(&content[config_start..offset]),
                body: &content[offset + line.len()..],
                body_line: line_no + 1,
            });
        }
        offset += line.len();
    }

    Err(Diagnostic::error(
        "unclosed-config",
        "Configuration block opened with `---` is never closed",
    )
    .at(1, 1))
}

fn check_config(config: &str, diagnostics: &mut Vec<Diagnostic>) {
    match serde_yaml::from_str::<serde_yaml::Value>(config) {
        Err(err) => {
            let (line, column) = err
                .location()
                .map(|l| (CONFIG_FIRST_LINE + l.line().max(1) - 1, l.column().max(1)))
                .unwrap_or((CONFIG_FIRST_LINE, 1));
            diagnostics.push(
                Diagnostic::error("invalid-config", format!("Invalid configuration: {}", err))
                    .at(line, column),
            );
        }
        Ok(value) if value.is_null() || value.is_mapping() => {
            if value.get("model").is_none() {
                diagnostics.push(
                    Diagnostic::warning("missing-model", "Configuration does not set `model`")
                        .at(1, 1),
                );
            }
        }
        Ok(_) => diagnostics.push(
            Diagnostic::error(
                "invalid-config",
                "Configuration must be a mapping of `key: value` pairs",
            )
            .at(CONFIG_FIRST_LINE, 1),
        ),
    }
}

fn check_template(body: &str, body_line: usize, diagnostics: &mut Vec<Diagnostic>) {
    let Err(err) = Template::compile(body) else {
        return;
    };

    let code = match err.reason() {
        TemplateErrorReason::MismatchingClosedHelper(..)
        | TemplateErrorReason::MismatchingClosedDecorator(..) => "mismatched-block",
        TemplateErrorReason::InvalidParam(..) => "invalid-parameter",
        _ => "template-syntax-error",
    };

    let mut diagnostic = Diagnostic::error(code, err.reason().to_string());
    if let Some((line, column)) = err.pos() {
        diagnostic = diagnostic.at(body_line + line.max(1) - 1, column.max(1));
    }
    diagnostics.push(diagnostic);
}

/// A message tag found in the body.
struct Tag {
    name: &'static str,
    closing: bool,
    self_closing: bool,
    /// Byte length of the whole tag, `<` to `>`
    len: usize,
}

fn check_message_tags(body: &str, body_line: usize, diagnostics: &mut Vec<Diagnostic>) {
    let mut open: Vec<(&'static str, SourceLocation)> = Vec::new();
    let mut cursor = 0;

    while let Some(found) = body[cursor..].find('<') {
        let start = cursor + found;
        let Some(tag) = parse_tag(&body[start..]) else {
            cursor = start + 1;
            continue;
        };
        cursor = start + tag.len;

        if tag.self_closing {
            continue;
        }

        let location = locate(body, start, body_line);

        if tag.closing {
            match open.iter().rposition(|(name, _)| *name == tag.name) {
                Some(idx) => {
                    for (name, opened_at) in open.drain(idx + 1..) {
                        diagnostics.push(unclosed(name, opened_at));
                    }
                    open.pop();
                }
                None => {
                    let message = match open.last() {
                        Some((current, _)) => format!(
                            "Found </{}> while <{}> is still open",
                            tag.name, current
                        ),
                        None => format!("Found </{}> without a matching <{}>", tag.name, tag.name),
                    };
                    diagnostics.push(
                        Diagnostic::error("unexpected-closing-tag", message)
                            .at(location.line, location.column),
                    );
                }
            }
        } else {
            if let Some((outer, _)) = open.last() {
                diagnostics.push(
                    Diagnostic::error(
                        "nested-message-tag",
                        format!("<{}> is opened inside <{}>", tag.name, outer),
                    )
                    .at(location.line, location.column),
                );
            }
            open.push((tag.name, location));
        }
    }

    for (name, opened_at) in open {
        diagnostics.push(unclosed(name, opened_at));
    }
}

fn unclosed(name: &str, at: SourceLocation) -> Diagnostic {
    Diagnostic::error("unclosed-message-tag", format!("<{}> is never closed", name))
        .at(at.line, at.column)
}

/// Parse a message tag at the start of `input` (which begins with `<`).
fn parse_tag(input: &str) -> Option<Tag> {
    let rest = input.strip_prefix('<')?;
    let (closing, rest) = match rest.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, rest),
    };

    let name_len = rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(rest.len());
    let name = *MESSAGE_TAGS.iter().find(|tag| **tag == &rest[..name_len])?;

    let after = &rest[name_len..];
    let end = after.find('>')?;
    let attributes = &after[..end];
    if attributes.contains('<') {
        return None;
    }
    if !(attributes.is_empty() || attributes == "/" || attributes.starts_with(char::is_whitespace))
    {
        return None;
    }

    Some(Tag {
        name,
        closing,
        self_closing: !closing && attributes.trim_end().ends_with('/'),
        len: 1 + usize::from(closing) + name_len + end + 1,
    })
}

/// 1-based line/column of a byte offset in `body`.
fn locate(body: &str, offset: usize, body_line: usize) -> SourceLocation {
    let prefix = &body[..offset];
    let line = body_line + prefix.matches('\n').count();
    let column = prefix.rsplit('\n').next().unwrap_or("").chars().count() + 1;
    SourceLocation::new(line, column)
}
