// Expression Engine Module
// Tokenizer, rotation parser, evaluator and the compile/evaluate entry points

pub mod compiler;
pub mod diagnostics;
pub mod engine;
pub mod evaluator;
pub mod lexer;
pub mod parser;

pub use compiler::Compiler;
pub use diagnostics::{Diagnostic, DiagnosticKind, Reference, Severity};
pub use engine::{compile, evaluate, format, CompileResult, ExpressionEngine};
pub use lexer::{tokenize, LexError, Lexer, Token};
pub use parser::{precedence, Node, Operand, Operator};
