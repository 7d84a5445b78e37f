// Template Engine Module
// Inline `{tag:formatter:args}` interpolation with pluggable formatters

pub mod format;
pub mod formatters;
pub mod plural;

pub use format::{format_template, scan_placeholders, Placeholder};
pub use formatters::{choose, pluralize, regex_rewrite, FormatOutput, Formatter, FormatterRegistry};
pub use plural::{categories, plural_category, PluralCategory};
