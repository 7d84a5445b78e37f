// Expression Compiler
// Per-call session state shared by the parser and the evaluator

use crate::expression::diagnostics::{Diagnostic, DiagnosticKind, Reference};
use crate::expression::lexer::{tokenize, LexError, Token};
use crate::template::FormatterRegistry;

/// One compile or evaluate session over a single expression.
///
/// Owns the token stream, the parse cursor and the diagnostics and references
/// gathered along the way. Build a fresh compiler per expression.
pub struct Compiler<'a> {
    pub(crate) source: &'a str,
    pub(crate) tokens: Vec<Token>,
    pub(crate) cursor: usize,
    pub(crate) depth: usize,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) references: Vec<Reference>,
    pub(crate) formatters: &'a FormatterRegistry,
    pub(crate) locale: Option<&'a str>,
}

impl<'a> Compiler<'a> {
    /// Compiler over `source` using the built-in formatters
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            tokens: Vec::new(),
            cursor: 0,
            depth: 0,
            diagnostics: Vec::new(),
            references: Vec::new(),
            formatters: FormatterRegistry::builtin(),
            locale: None,
        }
    }

    pub fn with_formatters(mut self, formatters: &'a FormatterRegistry) -> Self {
        self.formatters = formatters;
        self
    }

    /// Locale handed to backtick templates
    pub fn with_locale(mut self, locale: Option<&'a str>) -> Self {
        self.locale = locale;
        self
    }

    /// Use an already tokenized stream instead of lexing `source`
    pub fn with_tokens(mut self, tokens: Vec<Token>) -> Self {
        self.tokens = tokens;
        self.cursor = 0;
        self
    }

    /// Lex the source into the token stream and rewind the cursor
    pub fn tokenize(&mut self) -> Result<&[Token], LexError> {
        self.tokens = tokenize(self.source)?;
        self.cursor = 0;
        Ok(&self.tokens)
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    pub fn into_parts(self) -> (Vec<Diagnostic>, Vec<Reference>) {
        (self.diagnostics, self.references)
    }

    /// Take the next token, advancing the cursor
    pub(crate) fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.cursor).cloned();
        if token.is_some() {
            self.cursor += 1;
        }
        token
    }

    /// The token `distance` places behind the cursor
    pub(crate) fn look_back(&self, distance: usize) -> Option<&Token> {
        self.cursor
            .checked_sub(distance)
            .and_then(|index| self.tokens.get(index))
    }

    /// Record a diagnostic whose content is the source text under the span
    pub(crate) fn report(
        &mut self,
        kind: DiagnosticKind,
        from: usize,
        to: usize,
        message: impl Into<String>,
    ) {
        self.diagnostics
            .push(Diagnostic::spanning(kind, message, self.source, from, to));
    }
}
