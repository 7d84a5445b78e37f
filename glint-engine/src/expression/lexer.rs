// Expression Lexer
// Splits expression text into raw lexemes carrying their source offsets

use serde::Serialize;
use thiserror::Error;

use std::fmt;

/// A raw lexeme and its byte span in the source expression.
///
/// `content` keeps the text exactly as written: quoted strings and backtick
/// templates retain their delimiters, identifiers retain any `$.` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub content: String,
    pub from: usize,
    pub to: usize,
}

impl Token {
    pub fn new(content: impl Into<String>, from: usize, to: usize) -> Self {
        Self {
            content: content.into(),
            from,
            to,
        }
    }

    /// Whether the token's text is exactly `text`
    pub fn is(&self, text: &str) -> bool {
        self.content == text
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.content)
    }
}

/// Lexer error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("lex error at position {position}: {message}")]
pub struct LexError {
    pub message: String,
    pub position: usize,
}

impl LexError {
    fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

/// Tokenize a whole expression
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(input).tokenize()
}

/// Lexer for glint expressions
pub struct Lexer<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }

        Ok(tokens)
    }

    /// Get the next token, `None` at end of input
    pub fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        self.skip_whitespace();

        let Some(&(start, ch)) = self.chars.peek() else {
            return Ok(None);
        };

        match ch {
            '(' | ')' | '+' | '-' | '*' | '/' | '%' | '?' | ':' => {
                self.advance();
            }

            // == and ===
            '=' => {
                self.advance();
                if !self.eat('=') {
                    return Err(LexError::new("expected '==' or '==='", start));
                }
                self.eat('=');
            }
            // ! != !==
            '!' => {
                self.advance();
                if self.eat('=') {
                    self.eat('=');
                }
            }
            '<' | '>' => {
                self.advance();
                self.eat('=');
            }
            '&' | '|' => {
                self.advance();
                if !self.eat(ch) {
                    return Err(LexError::new(format!("expected '{ch}{ch}' operator"), start));
                }
            }

            '\'' | '"' | '`' => self.read_delimited(ch, start)?,

            '0'..='9' => self.read_number(),
            '.' if self.next_is_digit() => self.read_number(),

            c if is_identifier_start(c) => self.read_identifier(),

            _ => {
                return Err(LexError::new(
                    format!("unexpected character: '{}'", ch),
                    start,
                ))
            }
        }

        let end = self.offset();
        Ok(Some(Token::new(&self.input[start..end], start, end)))
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        self.chars.next()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    /// Byte offset of the next unread character
    fn offset(&mut self) -> usize {
        self.chars
            .peek()
            .map(|&(pos, _)| pos)
            .unwrap_or(self.input.len())
    }

    fn next_is_digit(&self) -> bool {
        let mut lookahead = self.chars.clone();
        lookahead.next();
        matches!(lookahead.peek(), Some(&(_, c)) if c.is_ascii_digit())
    }

    fn skip_whitespace(&mut self) {
        while let Some(&(_, ch)) = self.chars.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Scan a quoted string or backtick template up to its closing delimiter.
    /// A backslash keeps the next character inside the literal; the text is
    /// not unescaped.
    fn read_delimited(&mut self, delimiter: char, start: usize) -> Result<(), LexError> {
        self.advance(); // opening delimiter

        loop {
            match self.advance() {
                Some((_, '\\')) => {
                    self.advance();
                }
                Some((_, c)) if c == delimiter => return Ok(()),
                Some(_) => {}
                None => {
                    let what = if delimiter == '`' { "template" } else { "string" };
                    return Err(LexError::new(format!("unterminated {what}"), start));
                }
            }
        }
    }

    fn read_number(&mut self) {
        self.eat_digits();

        if self.peek_char() == Some('.') && self.next_is_digit() {
            self.advance();
            self.eat_digits();
        }

        // Exponent, only when digits follow
        if matches!(self.peek_char(), Some('e' | 'E')) {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            if matches!(lookahead.peek(), Some(&(_, '+' | '-'))) {
                lookahead.next();
            }
            if matches!(lookahead.peek(), Some(&(_, c)) if c.is_ascii_digit()) {
                self.advance();
                if matches!(self.peek_char(), Some('+' | '-')) {
                    self.advance();
                }
                self.eat_digits();
            }
        }
    }

    fn eat_digits(&mut self) {
        while matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }
    }

    /// Identifiers are dot-paths: `hero.stats.hp`, `$.flags.seen`
    fn read_identifier(&mut self) {
        while matches!(self.peek_char(), Some(c) if is_identifier_part(c)) {
            self.advance();
        }
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '.'
}
