//! Structured error types shared across the trial sequencing crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`TrialError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (resource names, phases, indices, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Rendered underlying failure that triggered this error, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
            cause: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Records the underlying failure.
    pub fn with_cause(mut self, cause: impl Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }

    /// Returns the value stored under `key` in the context map.
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context.get(key).map(String::as_str)
    }
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        if let Some(cause) = &self.cause {
            write!(f, " | cause: {cause}")?;
        }
        Ok(())
    }
}

/// Canonical error type for the trial sequencing engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum TrialError {
    /// Invalid handler configuration (unknown method, malformed condition list, bad index).
    #[error("configuration error: {0}")]
    Configuration(ErrorInfo),
    /// Malformed row selection expression.
    #[error("selection syntax error: {0}")]
    SelectionSyntax(ErrorInfo),
    /// Failure while retrieving or decoding a condition resource.
    #[error("import error: {0}")]
    Import(ErrorInfo),
    /// Table format the parser does not understand.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(ErrorInfo),
}

impl TrialError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            TrialError::Configuration(info)
            | TrialError::SelectionSyntax(info)
            | TrialError::Import(info)
            | TrialError::UnsupportedFormat(info) => info,
        }
    }

    /// Shorthand for a configuration error.
    pub fn configuration(code: impl Into<String>, message: impl Into<String>) -> Self {
        TrialError::Configuration(ErrorInfo::new(code, message))
    }

    /// Shorthand for a selection syntax error.
    pub fn selection(code: impl Into<String>, message: impl Into<String>) -> Self {
        TrialError::SelectionSyntax(ErrorInfo::new(code, message))
    }

    /// Wraps `cause` into an import error tagged with the resource and the failing phase.
    pub fn import(resource: &str, phase: &str, cause: impl Display) -> Self {
        TrialError::Import(
            ErrorInfo::new(
                format!("import-{phase}"),
                format!("unable to import conditions from `{resource}`"),
            )
            .with_context("resource", resource)
            .with_context("phase", phase)
            .with_cause(cause),
        )
    }
}
