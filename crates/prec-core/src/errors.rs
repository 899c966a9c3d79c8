//! Error surface of the prec crates.
//!
//! Every failure is a [`PrecError`] whose variant names the stage that failed
//! and whose [`ErrorInfo`] carries a stable code plus the sample, column, path
//! or category it concerns.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Code, message and context of an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable kebab-case code, e.g. `zero-weight-sum`.
    pub code: String,
    /// What went wrong.
    pub message: String,
    /// Where it went wrong: sample, trigger, column, path, category.
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// How to fix it, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Payload with no context and no hint.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds or replaces a context entry.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets the hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            let pairs: Vec<String> = self
                .context
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect();
            write!(f, " | context: [{}]", pairs.join(", "))?;
        }
        match &self.hint {
            Some(hint) => write!(f, " | hint: {hint}"),
            None => Ok(()),
        }
    }
}

/// Error of any stage of shape building, tagged by stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum PrecError {
    /// Regime, weight flags, category scheme or configuration file.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Cut, predicate or derived-column expression.
    #[error("expression error: {0}")]
    Expression(ErrorInfo),
    /// Samples, columns and table shapes.
    #[error("data error: {0}")]
    Data(ErrorInfo),
    /// Weight readers and normalization.
    #[error("weight error: {0}")]
    Weight(ErrorInfo),
    /// Reading or writing cache entries.
    #[error("cache error: {0}")]
    Cache(ErrorInfo),
    /// Kernel density and mixture construction.
    #[error("pdf error: {0}")]
    Pdf(ErrorInfo),
    /// JSON and YAML encoding.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl PrecError {
    /// Payload of the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            PrecError::Config(info)
            | PrecError::Expression(info)
            | PrecError::Data(info)
            | PrecError::Weight(info)
            | PrecError::Cache(info)
            | PrecError::Pdf(info)
            | PrecError::Serde(info) => info,
        }
    }

    fn info_mut(&mut self) -> &mut ErrorInfo {
        match self {
            PrecError::Config(info)
            | PrecError::Expression(info)
            | PrecError::Data(info)
            | PrecError::Weight(info)
            | PrecError::Cache(info)
            | PrecError::Pdf(info)
            | PrecError::Serde(info) => info,
        }
    }

    /// Stable error code.
    pub fn code(&self) -> &str {
        &self.info().code
    }

    /// Variant name as serialized in the `family` tag.
    pub fn family(&self) -> &'static str {
        match self {
            PrecError::Config(_) => "Config",
            PrecError::Expression(_) => "Expression",
            PrecError::Data(_) => "Data",
            PrecError::Weight(_) => "Weight",
            PrecError::Cache(_) => "Cache",
            PrecError::Pdf(_) => "Pdf",
            PrecError::Serde(_) => "Serde",
        }
    }

    /// Adds context to the payload, keeping entries set closer to the failure.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.info_mut().context.entry(key.into()).or_insert_with(|| value.into());
        self
    }
}
