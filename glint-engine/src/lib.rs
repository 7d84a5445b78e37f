// Glint Engine Library
// Embeddable expression compiler and template formatting engine

pub mod config;
pub mod error;
pub mod expression;
pub mod template;
pub mod value;

// Re-export commonly used types
pub use config::EngineOptions;
pub use error::{EngineError, EngineResult};
pub use value::{Context, Value};

// Re-export expression types
pub use expression::{
    compile, evaluate, format, CompileResult, Compiler, Diagnostic, DiagnosticKind,
    ExpressionEngine, LexError, Reference, Severity, Token,
};

// Re-export template types
pub use template::{FormatOutput, Formatter, FormatterRegistry};
