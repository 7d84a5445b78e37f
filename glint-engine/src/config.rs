// Engine Configuration
// Host-level options applied to every compile, evaluate and format call

use serde::{Deserialize, Serialize};

use std::collections::HashMap;

/// Options for an [`ExpressionEngine`](crate::ExpressionEngine)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineOptions {
    /// Locale used when neither the caller nor the context's `locale` key names one
    pub default_locale: Option<String>,

    /// Extra formatter aliases: alias name -> registered formatter name
    pub formatter_aliases: HashMap<String, String>,
}

impl EngineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = Some(locale.into());
        self
    }

    pub fn with_formatter_alias(
        mut self,
        alias: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        self.formatter_aliases.insert(alias.into(), target.into());
        self
    }
}
