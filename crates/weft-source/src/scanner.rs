//! Lexical scan of class text.
//!
//! Finds the class body and the `[modifiers] function name(...) { ... }`
//! declarations directly inside it. Statements are never parsed; comments
//! and quoted strings are skipped so braces inside them do not count.

use weft_core::Visibility;

const MODIFIERS: &[&str] = &[
    "public",
    "protected",
    "private",
    "static",
    "final",
    "abstract",
];

#[derive(Debug, Clone)]
pub(crate) struct ClassLayout {
    pub open: usize,
    pub close: usize,
    pub methods: Vec<MethodSpan>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BodySpan {
    /// Byte offsets of the opening and closing brace.
    Block(usize, usize),
    /// Declaration ends with `;` (abstract or interface method).
    Missing,
    Unbalanced,
}

#[derive(Debug, Clone)]
pub(crate) struct MethodSpan {
    pub name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    /// Start of the declaration line, or `sig_start` when other code
    /// precedes the declaration on that line.
    pub line_start: usize,
    pub sig_start: usize,
    pub sig_end: usize,
    pub body: BodySpan,
    /// One past the last byte of the declaration.
    pub end: usize,
}

pub(crate) fn scan(src: &str) -> Result<ClassLayout, &'static str> {
    let bytes = src.as_bytes();
    let after_kw = find_keyword(src, "class").ok_or("no class declaration")?;
    let open = find_byte(bytes, after_kw, b'{').ok_or("class has no body")?;
    let close = matching(bytes, open, b'{', b'}').ok_or("unbalanced class body")?;

    let mut methods = Vec::new();
    let mut i = open + 1;
    while i < close {
        if let Some(next) = skip_literal(bytes, i) {
            i = next;
            continue;
        }
        let c = bytes[i];
        if c == b'{' {
            i = matching(bytes, i, b'{', b'}').map_or(close, |e| e + 1);
            continue;
        }
        if is_ident_start(c) && !follows_ident(bytes, i) {
            let end = ident_end(bytes, i);
            if &src[i..end] == "function" {
                if let Some(span) = scan_method(src, i, end, close) {
                    i = span.end;
                    methods.push(span);
                    continue;
                }
            }
            i = end;
            continue;
        }
        i += 1;
    }

    Ok(ClassLayout {
        open,
        close,
        methods,
    })
}

fn scan_method(src: &str, kw_start: usize, kw_end: usize, limit: usize) -> Option<MethodSpan> {
    let bytes = src.as_bytes();
    let mut j = skip_ws(bytes, kw_end);
    if bytes.get(j) == Some(&b'&') {
        j = skip_ws(bytes, j + 1);
    }
    if j >= limit || !is_ident_start(bytes[j]) {
        return None;
    }
    let name_end = ident_end(bytes, j);
    let name = src[j..name_end].to_string();

    let paren = skip_ws(bytes, name_end);
    if bytes.get(paren) != Some(&b'(') {
        return None;
    }
    let paren_close = matching(bytes, paren, b'(', b')')?;
    if paren_close >= limit {
        return None;
    }

    let mut sig_start = kw_start;
    let mut visibility = None;
    let mut is_static = false;
    loop {
        let word_end = skip_ws_back(bytes, sig_start);
        let word_start = ident_start_back(bytes, word_end);
        let word = src[word_start..word_end].to_ascii_lowercase();
        if word.is_empty() || !MODIFIERS.contains(&word.as_str()) {
            break;
        }
        if word == "static" {
            is_static = true;
        } else if let Some(v) = Visibility::from_keyword(&word) {
            visibility = Some(v);
        }
        sig_start = word_start;
    }

    let ls = line_start(src, sig_start);
    let line_start = if src[ls..sig_start].trim().is_empty() {
        ls
    } else {
        sig_start
    };

    let mut b = paren_close + 1;
    let (sig_end, body, end) = loop {
        if b >= limit {
            break (limit, BodySpan::Missing, limit);
        }
        if let Some(next) = skip_literal(bytes, b) {
            b = next;
            continue;
        }
        match bytes[b] {
            b'{' => match matching(bytes, b, b'{', b'}') {
                Some(c) if c < limit => break (b, BodySpan::Block(b, c), c + 1),
                _ => break (b, BodySpan::Unbalanced, limit),
            },
            b';' => break (b, BodySpan::Missing, b + 1),
            _ => b += 1,
        }
    };

    Some(MethodSpan {
        name,
        visibility: visibility.unwrap_or(Visibility::Public),
        is_static,
        line_start,
        sig_start,
        sig_end,
        body,
        end,
    })
}

/// Offset of the start of the line containing `pos`.
pub(crate) fn line_start(src: &str, pos: usize) -> usize {
    src[..pos].rfind('\n').map_or(0, |p| p + 1)
}

/// Leading indentation of the line containing `pos`.
pub(crate) fn line_indent(src: &str, pos: usize) -> &str {
    let line = &src[line_start(src, pos)..];
    let rest = line.trim_start_matches([' ', '\t']);
    &line[..line.len() - rest.len()]
}

/// Offset just past the `keyword` of the first declaration using it.
fn find_keyword(src: &str, keyword: &str) -> Option<usize> {
    let bytes = src.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if let Some(next) = skip_literal(bytes, i) {
            i = next;
            continue;
        }
        if is_ident_start(bytes[i]) && !follows_ident(bytes, i) {
            let end = ident_end(bytes, i);
            let preceded_by_scope = i >= 2 && &bytes[i - 2..i] == b"::";
            if &src[i..end] == keyword && !preceded_by_scope {
                return Some(end);
            }
            i = end;
            continue;
        }
        i += 1;
    }
    None
}

fn find_byte(bytes: &[u8], from: usize, target: u8) -> Option<usize> {
    let mut i = from;
    while i < bytes.len() {
        if let Some(next) = skip_literal(bytes, i) {
            i = next;
            continue;
        }
        if bytes[i] == target {
            return Some(i);
        }
        i += 1;
    }
    None
}

fn matching(bytes: &[u8], open: usize, open_ch: u8, close_ch: u8) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        if let Some(next) = skip_literal(bytes, i) {
            i = next;
            continue;
        }
        let c = bytes[i];
        if c == open_ch {
            depth += 1;
        } else if c == close_ch {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

/// If a comment or quoted string starts at `i`, the offset just past it.
fn skip_literal(bytes: &[u8], i: usize) -> Option<usize> {
    match bytes[i] {
        b'/' if bytes.get(i + 1) == Some(&b'/') => Some(line_end(bytes, i)),
        b'/' if bytes.get(i + 1) == Some(&b'*') => Some(
            bytes[i + 2..]
                .windows(2)
                .position(|w| w == b"*/")
                .map_or(bytes.len(), |p| i + 2 + p + 2),
        ),
        // `#[...]` is an attribute, not a comment
        b'#' if bytes.get(i + 1) != Some(&b'[') => Some(line_end(bytes, i)),
        b'\'' | b'"' => Some(string_end(bytes, i)),
        _ => None,
    }
}

fn string_end(bytes: &[u8], open: usize) -> usize {
    let quote = bytes[open];
    let mut j = open + 1;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            c if c == quote => return j + 1,
            _ => j += 1,
        }
    }
    bytes.len()
}

fn line_end(bytes: &[u8], from: usize) -> usize {
    bytes[from..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |p| from + p)
}

fn skip_ws(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

fn skip_ws_back(bytes: &[u8], mut i: usize) -> usize {
    while i > 0 && bytes[i - 1].is_ascii_whitespace() {
        i -= 1;
    }
    i
}

fn ident_start_back(bytes: &[u8], mut i: usize) -> usize {
    while i > 0 && is_ident(bytes[i - 1]) {
        i -= 1;
    }
    i
}

fn ident_end(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && is_ident(bytes[i]) {
        i += 1;
    }
    i
}

fn follows_ident(bytes: &[u8], i: usize) -> bool {
    i > 0 && (is_ident(bytes[i - 1]) || bytes[i - 1] == b'$')
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c >= 0x80
}

fn is_ident(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c >= 0x80
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOOKS: &str = r#"<?php

namespace Module\Billing;

class BillingHooks
{
    /**
     * Called once per invoice { not a brace }
     */
    protected static function Billing_onInvoice(array $invoice)
    {
        log("invoice }");
        if ($invoice) { notify('{'); }
    }

    public static function Audit_onEntry() { audit(); }

    private function helper(): void
    {
        // }
    }

    abstract public function pending();
}
"#;

    #[test]
    fn finds_methods_in_declaration_order() {
        let layout = scan(HOOKS).unwrap();
        let names: Vec<_> = layout.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Billing_onInvoice", "Audit_onEntry", "helper", "pending"]
        );
    }

    #[test]
    fn reads_modifiers() {
        let layout = scan(HOOKS).unwrap();
        let invoice = &layout.methods[0];
        assert_eq!(invoice.visibility, Visibility::Protected);
        assert!(invoice.is_static);
        let helper = &layout.methods[2];
        assert_eq!(helper.visibility, Visibility::Private);
        assert!(!helper.is_static);
    }

    #[test]
    fn body_braces_ignore_strings_and_comments() {
        let layout = scan(HOOKS).unwrap();
        let BodySpan::Block(open, close) = layout.methods[0].body else {
            panic!("expected a block body");
        };
        let inner = &HOOKS[open + 1..close];
        assert!(inner.contains("log(\"invoice }\");"));
        assert!(inner.trim_end().ends_with("notify('{'); }"));
    }

    #[test]
    fn signature_spans_modifiers_to_brace() {
        let layout = scan(HOOKS).unwrap();
        let m = &layout.methods[2];
        assert_eq!(
            HOOKS[m.sig_start..m.sig_end].trim_end(),
            "private function helper(): void"
        );
        assert_eq!(line_indent(HOOKS, m.sig_start), "    ");
    }

    #[test]
    fn abstract_declaration_has_no_body() {
        let layout = scan(HOOKS).unwrap();
        assert_eq!(layout.methods[3].body, BodySpan::Missing);
    }

    #[test]
    fn closures_inside_bodies_are_not_members() {
        let src = "class A {\n    public static function a() {\n        $f = function ($x) { return $x; };\n    }\n}\n";
        let layout = scan(src).unwrap();
        assert_eq!(layout.methods.len(), 1);
    }

    #[test]
    fn class_constant_reference_is_not_a_declaration() {
        let src = "$x = Foo::class;\nclass Real {\n}\n";
        let layout = scan(src).unwrap();
        assert!(layout.methods.is_empty());
        assert_eq!(&src[layout.close..layout.close + 1], "}");
    }

    #[test]
    fn unbalanced_class_is_rejected() {
        assert_eq!(
            scan("class A {\n public function a() {\n}\n").unwrap_err(),
            "unbalanced class body"
        );
        assert_eq!(scan("<?php echo 1;").unwrap_err(), "no class declaration");
    }
}
