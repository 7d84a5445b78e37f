// Output formatting helpers for CLI commands

use glint_engine::{Diagnostic, Value};

/// Print a status message: "    Checking message"
pub fn status(action: &str, message: &str) {
    eprintln!("\x1b[1;36m{:>12}\x1b[0m {}", action, message);
}

/// Print a success message with checkmark
pub fn success(message: &str) {
    eprintln!("\x1b[1;32m  \u{2713}\x1b[0m {}", message);
}

/// Print a warning message
pub fn warning(message: &str) {
    eprintln!("\x1b[33m  !\x1b[0m {}", message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("\x1b[1;31merror:\x1b[0m {}", message);
}

/// Print an info message
pub fn info(message: &str) {
    eprintln!("\x1b[36m  i\x1b[0m {}", message);
}

/// Print a dim/muted message
pub fn dim(message: &str) {
    eprintln!("\x1b[2m{}\x1b[0m", message);
}

/// Print a diagnostic with the offending source underlined
pub fn diagnostic(source: &str, diagnostic: &Diagnostic) {
    eprintln!(
        "\x1b[1;31m  \u{2717}\x1b[0m [{}] {} \x1b[2m({}..{})\x1b[0m",
        diagnostic.kind, diagnostic.message, diagnostic.from, diagnostic.to
    );
    eprintln!("      {}", source);
    eprintln!("\x1b[31m      {}\x1b[0m", caret_line(source, diagnostic.from, diagnostic.to));
}

/// Markers under `source[from..to]`, at least one caret wide
pub fn caret_line(source: &str, from: usize, to: usize) -> String {
    let width_of = |end: usize| {
        let end = end.min(source.len());
        source
            .char_indices()
            .take_while(|(i, _)| *i < end)
            .count()
    };

    let start = width_of(from);
    let span = width_of(to).saturating_sub(start).max(1);
    format!("{}{}", " ".repeat(start), "^".repeat(span))
}

/// Printable form of an evaluation result: JSON, `undefined` when absent,
/// strings unquoted when `raw`
pub fn render_value(value: Option<&Value>, raw: bool) -> String {
    match value {
        None => glint_engine::value::UNDEFINED.to_string(),
        Some(Value::String(s)) if raw => s.clone(),
        Some(value) => value.to_json(),
    }
}
