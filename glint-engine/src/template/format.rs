// Template Formatting
// Interpolates `{tag}` and `{{ tag }}` placeholders, routing values through formatters

use crate::expression::diagnostics::{Diagnostic, DiagnosticKind};
use crate::template::formatters::{choose, pluralize, FormatOutput, FormatterRegistry};
use crate::value::{Context, Value, UNDEFINED};

use tracing::trace;

/// A placeholder found in template text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder<'t> {
    /// Byte offset of the opening brace
    pub start: usize,
    /// Byte offset just past the closing brace
    pub end: usize,
    /// Text between the braces, trimmed for `{{ }}`
    pub inner: &'t str,
    pub inner_from: usize,
}

/// Find every placeholder in `text`, left to right.
///
/// `{{ inner }}` is tried before `{inner}`; neither form may contain braces
/// or be blank. Braces that do not open a placeholder are left as literal text.
pub fn scan_placeholders(text: &str) -> Vec<Placeholder<'_>> {
    let mut results = Vec::new();
    let mut current_pos = 0;

    while let Some(found) = text[current_pos..].find('{') {
        let start = current_pos + found;

        // Check for {{ inner }}
        if text[start + 1..].starts_with('{') {
            let body = &text[start + 2..];
            if let Some(close) = body.find("}}") {
                let raw = &body[..close];
                let inner = raw.trim();
                if !raw.contains(['{', '}']) && !inner.is_empty() {
                    let leading = raw.len() - raw.trim_start().len();
                    let end = start + 2 + close + 2;
                    results.push(Placeholder {
                        start,
                        end,
                        inner,
                        inner_from: start + 2 + leading,
                    });
                    current_pos = end;
                    continue;
                }
            }
        }

        // Check for {inner}
        let body = &text[start + 1..];
        if let Some(close) = body.find('}') {
            let inner = &body[..close];
            if !inner.contains('{') && !inner.trim().is_empty() {
                let end = start + 1 + close + 1;
                results.push(Placeholder {
                    start,
                    end,
                    inner,
                    inner_from: start + 1,
                });
                current_pos = end;
                continue;
            }
        }

        current_pos = start + 1;
    }

    results
}

/// Interpolate every placeholder in `text` against `context`.
///
/// Diagnostic spans are byte offsets into `text`. Placeholders whose value
/// is absent render as `undefined`.
pub fn format_template(
    text: &str,
    context: &Context,
    locale: Option<&str>,
    formatters: &FormatterRegistry,
) -> (String, Vec<Diagnostic>) {
    let mut output = String::with_capacity(text.len());
    let mut diagnostics = Vec::new();
    let mut last = 0;

    for placeholder in scan_placeholders(text) {
        output.push_str(&text[last..placeholder.start]);

        let rendered = render(&placeholder, text, context, locale, formatters, &mut diagnostics);
        output.push_str(rendered.as_deref().unwrap_or(UNDEFINED));

        last = placeholder.end;
    }
    output.push_str(&text[last..]);

    (output, diagnostics)
}

/// Render one placeholder: `tag[:formatter[:arg|arg...]]`
fn render(
    placeholder: &Placeholder<'_>,
    text: &str,
    context: &Context,
    locale: Option<&str>,
    formatters: &FormatterRegistry,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<String> {
    let inner = placeholder.inner;
    let inner_from = placeholder.inner_from;

    // Seeded choice shorthand: {first|second|third}
    if inner.contains('|') && !inner.contains(':') {
        if let Some(seed) = choice_seed(context, placeholder.start) {
            let options: Vec<&str> = inner.split('|').collect();
            trace!(at = placeholder.start, "seeded choice");
            return merge(choose(Some(&seed), locale, &options), inner_from, diagnostics);
        }
    }

    let mut parts = inner.splitn(3, ':');
    let tag = parts.next().unwrap_or_default();
    let formatter_key = parts.next();
    let params = parts.next();

    let value = context.lookup(tag);
    if value.is_none() {
        diagnostics.push(Diagnostic::spanning(
            DiagnosticKind::VariableNotFound,
            format!("Variable '{}' not found", tag),
            text,
            inner_from,
            inner_from + tag.len(),
        ));
    }

    let Some(key) = formatter_key else {
        return value.map(|v| v.as_string());
    };
    let key_from = inner_from + tag.len() + 1;

    if let (Some(formatter), Some(params)) = (formatters.get(key), params) {
        trace!(formatter = key, "formatter");
        let args: Vec<&str> = params.split('|').collect();
        let params_from = key_from + key.len() + 1;
        return merge(
            formatter.format(value.as_ref(), locale, &args),
            params_from,
            diagnostics,
        );
    }

    if formatters.contains(key) || params.is_some() {
        return value.map(|v| v.as_string());
    }

    // Inline options: {flag:yes|no}, {count:item|items}
    let options: Vec<&str> = key.split('|').collect();
    match &value {
        Some(Value::Array(_)) => merge(choose(value.as_ref(), locale, &options), key_from, diagnostics),
        Some(Value::Bool(b)) => {
            if options.len() < 2 {
                diagnostics.push(Diagnostic::spanning(
                    DiagnosticKind::InvalidFormatterArguments,
                    "a boolean choice needs two options",
                    text,
                    key_from,
                    key_from + key.len(),
                ));
            }
            let index = Value::Number(if *b { 1.0 } else { 0.0 });
            merge(choose(Some(&index), locale, &options), key_from, diagnostics)
        }
        Some(Value::Number(_)) => {
            merge(pluralize(value.as_ref(), locale, &options), key_from, diagnostics)
        }
        _ => value.as_ref().map(Value::as_string),
    }
}

/// Seed for the choice shorthand, built from the context's `#` entry.
///
/// A bare number is the index, salted with the placeholder offset; an
/// `[index, salt]` pair has the offset prepended to its salt.
fn choice_seed(context: &Context, offset: usize) -> Option<Value> {
    match context.get("#")? {
        Value::Number(index) => Some(Value::Array(vec![
            Value::Number(*index),
            Value::String(offset.to_string()),
        ])),
        Value::Array(pair) if pair.len() == 2 => Some(Value::Array(vec![
            pair[0].clone(),
            Value::String(format!("{}{}", offset, pair[1].as_string())),
        ])),
        _ => None,
    }
}

/// Move formatter diagnostics onto the template and hand back the text
fn merge(output: FormatOutput, offset: usize, diagnostics: &mut Vec<Diagnostic>) -> Option<String> {
    diagnostics.extend(output.diagnostics.into_iter().map(|d| d.shifted(offset)));
    output.text
}
