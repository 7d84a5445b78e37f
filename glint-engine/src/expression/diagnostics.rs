// Diagnostics and References
// Non-fatal problems and identifier lookups recorded while compiling or formatting

use serde::Serialize;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    ParseError,
    UnknownOperation,
    UnsupportedOperation,
    ReservedKeyword,
    VariableNotFound,
    InvalidFormatterArguments,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::ParseError => "ParseError",
            DiagnosticKind::UnknownOperation => "UnknownOperation",
            DiagnosticKind::UnsupportedOperation => "UnsupportedOperation",
            DiagnosticKind::ReservedKeyword => "ReservedKeyword",
            DiagnosticKind::VariableNotFound => "VariableNotFound",
            DiagnosticKind::InvalidFormatterArguments => "InvalidFormatterArguments",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
}

/// A problem found in an expression or template, located by byte span
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Source text covered by the span
    pub content: String,
    pub from: usize,
    pub to: usize,
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        kind: DiagnosticKind,
        message: impl Into<String>,
        content: impl Into<String>,
        from: usize,
        to: usize,
    ) -> Self {
        Self {
            content: content.into(),
            from,
            to,
            severity: Severity::Error,
            kind,
            message: message.into(),
        }
    }

    /// Diagnostic covering `source[from..to]`
    pub fn spanning(
        kind: DiagnosticKind,
        message: impl Into<String>,
        source: &str,
        from: usize,
        to: usize,
    ) -> Self {
        let content = source.get(from..to).unwrap_or_default();
        Self::new(kind, message, content, from, to)
    }

    /// Move the span by `offset`, for diagnostics produced against a substring
    pub fn shifted(mut self, offset: usize) -> Self {
        self.from += offset;
        self.to += offset;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {}..{}: {}",
            self.kind, self.from, self.to, self.message
        )
    }
}

/// An identifier the evaluator tried to resolve against the context
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub from: usize,
    pub to: usize,
    pub name: String,
}

impl Reference {
    pub fn new(name: impl Into<String>, from: usize, to: usize) -> Self {
        Self {
            from,
            to,
            name: name.into(),
        }
    }
}
