//! Code frame rendering.

use crate::types::SourceLocation;

/// Lines of context shown above and below the offending line.
const CONTEXT_LINES: usize = 2;

/// Render a source excerpt around `location` with a caret under the column.
///
/// ```text
///   1 | ---
/// > 2 | model gpt-4o
///     |       ^
///   3 | ---
/// ```
///
/// Returns `None` when the location is outside the source.
pub fn code_frame(source: &str, location: SourceLocation) -> Option<String> {
    let lines: Vec<&str> = source.lines().collect();
    if location.line == 0 || location.line > lines.len() {
        return None;
    }

    let first = location.line.saturating_sub(CONTEXT_LINES).max(1);
    let last = (location.line + CONTEXT_LINES).min(lines.len());
    let width = last.to_string().len();

    let mut frame = Vec::new();
    for number in first..=last {
        let text = lines[number - 1];
        let marker = if number == location.line { '>' } else { ' ' };
        let row = format!("{} {:>width$} | {}", marker, number, text, width = width);
        frame.push(row.trim_end().to_string());

        if number == location.line {
            let column = location.column.max(1);
            frame.push(format!(
                "  {} | {}^",
                " ".repeat(width),
                " ".repeat(column - 1)
            ));
        }
    }

    Some(frame.join("\n"))
}
