//! `MethodSource` over class text held by a `ClassStore`.
//!
//! Every operation reloads and rescans the class, edits exactly one span,
//! and hands the complete new text to the store in a single write.
//!
//! Removing the only member of a class whose opening brace shares a line
//! with the declaration folds the body back onto that line, undoing what
//! `append_method` does to a one-line `class X {}`.

use weft_core::method::dedent;
use weft_core::{Method, MethodFilter, MethodSource, Result, WeaveError};

use crate::scanner::{self, line_indent, line_start, BodySpan, ClassLayout, MethodSpan};
use crate::store::ClassStore;

#[derive(Debug, Clone)]
pub struct Catalog<S> {
    store: S,
}

impl<S: ClassStore> Catalog<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn load(&self, class: &str) -> Result<(String, ClassLayout)> {
        let src = self.store.load(class)?;
        let layout = scanner::scan(&src).map_err(|reason| WeaveError::MalformedClass {
            class: class.to_string(),
            reason,
        })?;
        Ok((src, layout))
    }
}

impl<S: ClassStore> MethodSource for Catalog<S> {
    fn has_class(&self, class: &str) -> bool {
        self.store.contains(class)
    }

    fn list_methods(&self, class: &str, filter: MethodFilter) -> Result<Vec<String>> {
        let (_, layout) = self.load(class)?;
        Ok(layout
            .methods
            .into_iter()
            .filter(|m| filter.matches(m.visibility, m.is_static))
            .map(|m| m.name)
            .collect())
    }

    fn get_method(&self, class: &str, name: &str) -> Result<Method> {
        let (src, layout) = self.load(class)?;
        let span = find(&layout, class, name)?;
        let (open, close) = block(span, class)?;
        Ok(Method {
            name: span.name.clone(),
            visibility: span.visibility,
            is_static: span.is_static,
            signature: src[span.sig_start..span.sig_end].trim_end().to_string(),
            body: dedent(&src[open + 1..close]),
        })
    }

    fn set_inner_body(&mut self, class: &str, name: &str, body: &str) -> Result<()> {
        let (src, layout) = self.load(class)?;
        let span = find(&layout, class, name)?;
        let (open, close) = block(span, class)?;

        let decl_indent = line_indent(&src, span.sig_start);
        let inner = dedent(body);
        let mut region = String::from("\n");
        if !inner.is_empty() {
            region.push_str(&reindent(
                &inner,
                &format!("{decl_indent}{}", indent_unit(&src)),
            ));
            region.push('\n');
        }
        region.push_str(decl_indent);

        let text = format!("{}{}{}", &src[..=open], region, &src[close..]);
        self.store.store(class, &text)
    }

    fn append_method(&mut self, method: &Method, target: &str) -> Result<bool> {
        let (src, layout) = self.load(target)?;
        if layout.methods.iter().any(|m| m.name == method.name) {
            return Ok(false);
        }

        let unit = indent_unit(&src);
        let indent = match layout.methods.first() {
            Some(first) => line_indent(&src, first.sig_start).to_string(),
            None => format!("{}{unit}", line_indent(&src, layout.close)),
        };
        let decl = reindent(&method.declaration(unit), &indent);

        let close_line = line_start(&src, layout.close);
        let at = if src[close_line..layout.close].trim().is_empty() {
            close_line
        } else {
            layout.close
        };
        let text = format!("{}\n{}\n{}", &src[..at], decl, &src[at..]);
        self.store.store(target, &text)?;
        Ok(true)
    }

    fn remove_method(&mut self, name: &str, target: &str) -> Result<bool> {
        let (src, layout) = self.load(target)?;
        let Some(span) = layout.methods.iter().find(|m| m.name == name) else {
            return Ok(false);
        };
        if span.body == BodySpan::Unbalanced {
            return Err(malformed(target, name, span.body));
        }

        if let Some(text) = fold_one_line_class(&src, &layout, span) {
            self.store.store(target, &text)?;
            return Ok(true);
        }

        let mut start = span.line_start;
        let mut end = span.end;
        let own_line = start == line_start(&src, start);
        if own_line {
            let rest = &src[end..];
            let trailing = rest.len() - rest.trim_start_matches([' ', '\t']).len();
            if rest[trailing..].starts_with('\n') {
                end += trailing + 1;
            }
            // the blank separator line `append_method` puts before a method
            if start > 0 {
                let prev = line_start(&src, start - 1);
                if src[prev..start].trim().is_empty() {
                    start = prev;
                }
            }
        }

        let text = format!("{}{}", &src[..start], &src[end..]);
        self.store.store(target, &text)?;
        Ok(true)
    }

    fn has_method(&self, class: &str, name: &str) -> Result<bool> {
        let (_, layout) = self.load(class)?;
        Ok(layout.methods.iter().any(|m| m.name == name))
    }
}

/// Inverse of appending to a one-line class body: the sole member sits on
/// the line right after `... {` and the closing brace follows it directly.
fn fold_one_line_class(src: &str, layout: &ClassLayout, span: &MethodSpan) -> Option<String> {
    let open_line = line_start(src, layout.open);
    let inline_open = !src[open_line..layout.open].trim().is_empty();
    let only_member = layout.methods.len() == 1;
    let own_line = span.line_start == line_start(src, span.line_start);
    let before = &src[layout.open + 1..span.line_start];
    let directly_after_open = before.ends_with('\n') && !before[..before.len() - 1].contains('\n');
    let close_follows = src.get(span.end..layout.close) == Some("\n");
    if inline_open && only_member && own_line && directly_after_open && close_follows {
        Some(format!("{}{}", &src[..span.line_start - 1], &src[layout.close..]))
    } else {
        None
    }
}

fn find<'a>(layout: &'a ClassLayout, class: &str, name: &str) -> Result<&'a MethodSpan> {
    layout
        .methods
        .iter()
        .find(|m| m.name == name)
        .ok_or_else(|| WeaveError::MethodNotFound {
            class: class.to_string(),
            method: name.to_string(),
        })
}

fn block(span: &MethodSpan, class: &str) -> Result<(usize, usize)> {
    match span.body {
        BodySpan::Block(open, close) => Ok((open, close)),
        other => Err(malformed(class, &span.name, other)),
    }
}

fn malformed(class: &str, method: &str, body: BodySpan) -> WeaveError {
    WeaveError::MalformedBody {
        class: class.to_string(),
        method: method.to_string(),
        reason: match body {
            BodySpan::Missing => "declaration has no body",
            _ => "unbalanced braces in body",
        },
    }
}

/// Indent unit of a source file: a tab if any line is tab-indented.
fn indent_unit(src: &str) -> &'static str {
    if src.lines().any(|l| l.starts_with('\t')) {
        "\t"
    } else {
        "    "
    }
}

fn reindent(text: &str, indent: &str) -> String {
    text.lines()
        .map(|l| {
            if l.is_empty() {
                String::new()
            } else {
                format!("{indent}{l}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
