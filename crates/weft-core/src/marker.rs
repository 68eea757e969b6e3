//! Module-scoped sentinel comments bracketing woven contributions.
//!
//! A contribution from module `Audit` looks like:
//!
//! ```text
//! // weave-start:Audit
//! audit("invoice");
//! // weave-end:Audit
//! ```
//!
//! Sentinels only match as whole lines, so statement text containing the
//! same characters mid-line never collides.

use std::sync::LazyLock;

use regex::Regex;

const START_TAG: &str = "weave-start";
const END_TAG: &str = "weave-end";

static MARKER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^//\s?(weave-start|weave-end):([A-Za-z][A-Za-z0-9]*)$").unwrap()
});

pub fn render_start(module: &str) -> String {
    format!("// {START_TAG}:{module}")
}

pub fn render_end(module: &str) -> String {
    format!("// {END_TAG}:{module}")
}

/// A sentinel recognised on a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerLine<'a> {
    Start(&'a str),
    End(&'a str),
}

pub fn parse_line(line: &str) -> Option<MarkerLine<'_>> {
    let caps = MARKER_LINE.captures(line.trim())?;
    let module = caps.get(2)?.as_str();
    match caps.get(1)?.as_str() {
        START_TAG => Some(MarkerLine::Start(module)),
        _ => Some(MarkerLine::End(module)),
    }
}

/// True iff a start sentinel for `module` is present in `body`.
pub fn contains(body: &str, module: &str) -> bool {
    body.lines()
        .any(|line| parse_line(line) == Some(MarkerLine::Start(module)))
}

/// One run of a dispatcher body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Unmarked text; the first one is the provider fragment.
    Plain(String),
    /// A contribution bracketed by `module`'s sentinels (sentinels excluded).
    Marked { module: String, text: String },
}

impl Segment {
    pub fn is_marked_by(&self, module: &str) -> bool {
        matches!(self, Segment::Marked { module: m, .. } if m == module)
    }

    fn render(&self) -> String {
        match self {
            Segment::Plain(text) => text.clone(),
            Segment::Marked { module, text } if text.is_empty() => {
                format!("{}\n{}", render_start(module), render_end(module))
            }
            Segment::Marked { module, text } => {
                format!("{}\n{}\n{}", render_start(module), text, render_end(module))
            }
        }
    }
}

/// Split `body` into plain and marked segments.
///
/// Each start sentinel pairs with the first following end sentinel of the
/// same module. A start sentinel with no matching end stays plain text.
/// Whitespace-only plain runs are dropped.
pub fn split_segments(body: &str) -> Vec<Segment> {
    let lines: Vec<&str> = body.lines().collect();
    let mut segments = Vec::new();
    let mut plain: Vec<&str> = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if let Some(MarkerLine::Start(module)) = parse_line(lines[i]) {
            let close = lines[i + 1..]
                .iter()
                .position(|l| parse_line(l) == Some(MarkerLine::End(module)));
            if let Some(offset) = close {
                flush_plain(&mut plain, &mut segments);
                let inner = &lines[i + 1..i + 1 + offset];
                segments.push(Segment::Marked {
                    module: module.to_string(),
                    text: trim_blank_lines(&inner.join("\n")),
                });
                i += offset + 2;
                continue;
            }
        }
        plain.push(lines[i]);
        i += 1;
    }
    flush_plain(&mut plain, &mut segments);
    segments
}

/// Serialize segments, separated by one blank line.
pub fn join_segments(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(Segment::render)
        .filter(|s| !s.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Wrap `text` in `module`'s sentinels.
pub fn wrap(module: &str, text: &str) -> String {
    Segment::Marked {
        module: module.to_string(),
        text: trim_blank_lines(text),
    }
    .render()
}

/// Remove the first start..end span of `module` and re-trim the body.
///
/// Returns `body` unchanged when no complete span exists. Only the first
/// span is removed if the same module somehow appears twice.
pub fn extract_and_strip(body: &str, module: &str) -> String {
    let mut segments = split_segments(body);
    match segments.iter().position(|s| s.is_marked_by(module)) {
        Some(idx) => {
            segments.remove(idx);
            join_segments(&segments)
        }
        None => body.to_string(),
    }
}

fn flush_plain(plain: &mut Vec<&str>, segments: &mut Vec<Segment>) {
    if plain.is_empty() {
        return;
    }
    let text = trim_blank_lines(&plain.join("\n"));
    plain.clear();
    if !text.is_empty() {
        segments.push(Segment::Plain(text));
    }
}

fn trim_blank_lines(text: &str) -> String {
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    let Some(first) = lines.iter().position(|l| !l.is_empty()) else {
        return String::new();
    };
    let last = lines.iter().rposition(|l| !l.is_empty()).unwrap_or(first);
    lines[first..=last].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_embed_module_name() {
        assert_eq!(render_start("Audit"), "// weave-start:Audit");
        assert_eq!(render_end("Audit"), "// weave-end:Audit");
        assert_eq!(parse_line("   // weave-end:Audit  "), Some(MarkerLine::End("Audit")));
        assert_eq!(parse_line("x(); // weave-start:Audit"), None);
    }

    #[test]
    fn contains_checks_start_sentinel_of_that_module() {
        let body = "log();\n\n// weave-start:Audit\naudit();\n// weave-end:Audit";
        assert!(contains(body, "Audit"));
        assert!(!contains(body, "Aud"));
        assert!(!contains(body, "Crm"));
    }

    #[test]
    fn split_and_join_round_trip() {
        let body = "log();\n\n// weave-start:Audit\naudit();\n// weave-end:Audit\n\n// weave-start:Crm\ncrm();\n// weave-end:Crm";
        let segments = split_segments(body);
        assert_eq!(
            segments,
            vec![
                Segment::Plain("log();".into()),
                Segment::Marked {
                    module: "Audit".into(),
                    text: "audit();".into()
                },
                Segment::Marked {
                    module: "Crm".into(),
                    text: "crm();".into()
                },
            ]
        );
        assert_eq!(join_segments(&segments), body);
    }

    #[test]
    fn strip_removes_only_that_module() {
        let body = format!("log();\n\n{}\n\n{}", wrap("Audit", "audit();"), wrap("Crm", "crm();"));
        let stripped = extract_and_strip(&body, "Audit");
        assert_eq!(stripped, format!("log();\n\n{}", wrap("Crm", "crm();")));
        assert!(!contains(&stripped, "Audit"));
        assert!(contains(&stripped, "Crm"));
    }

    #[test]
    fn strip_without_span_returns_body_unchanged() {
        let body = "log();\n\n\n  ";
        assert_eq!(extract_and_strip(body, "Audit"), body);
    }

    #[test]
    fn unterminated_start_is_plain_text() {
        let body = "log();\n// weave-start:Audit\naudit();";
        assert_eq!(split_segments(body), vec![Segment::Plain(body.into())]);
        assert_eq!(extract_and_strip(body, "Audit"), body);
        // still detected, so a second insertion is refused
        assert!(contains(body, "Audit"));
    }

    #[test]
    fn only_first_duplicate_span_is_removed() {
        let body = format!("{}\n\n{}", wrap("Audit", "one();"), wrap("Audit", "two();"));
        assert_eq!(extract_and_strip(&body, "Audit"), wrap("Audit", "two();"));
    }

    #[test]
    fn span_is_non_greedy() {
        let body = "// weave-start:Audit\na();\n// weave-end:Audit\nkeep();\n// weave-end:Audit";
        assert_eq!(extract_and_strip(body, "Audit"), "keep();\n// weave-end:Audit");
    }

    #[test]
    fn stripping_last_contribution_can_leave_empty_body() {
        assert_eq!(extract_and_strip(&wrap("Audit", "a();"), "Audit"), "");
    }
}
