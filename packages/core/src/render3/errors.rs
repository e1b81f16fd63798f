//! Runtime Errors
//!
//! Corresponds to packages/core/src/render3/errors.ts and src/errors.ts
//!
//! One error type for the whole runtime, carrying the framework error code.
//! Negative codes mark errors whose message alone is ambiguous and which the
//! docs index by code; the rendered form is `NG0<abs(code)>: <message>`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum RuntimeErrorCode {
    // Change detection
    ExpressionChangedAfterChecked = -100,
    RecursiveApplicationRender = -101,
    // Directive matching
    MultipleComponentsMatch = -300,
    ExportNotFound = -301,
    PipeNotFound = -302,
    // Bindings
    UnknownProperty = 303,
    UnknownElement = 304,
    // Misc runtime
    ViewAlreadyDestroyed = 911,
    /// Errors raised by embedder code (templates, hooks, host bindings) that
    /// the runtime only transports.
    UserCode = 0,
}

impl RuntimeErrorCode {
    pub fn as_ng_code(self) -> i32 {
        (self as i32).abs()
    }
}

impl std::fmt::Display for RuntimeErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NG0{}", self.as_ng_code())
    }
}

/// A runtime error with the framework code baked into the message, matching
/// the upstream `RuntimeError` formatting.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{code}: {message}")]
pub struct RuntimeError {
    pub code: RuntimeErrorCode,
    pub message: String,
}

impl RuntimeError {
    pub fn new(code: RuntimeErrorCode, message: impl Into<String>) -> Self {
        RuntimeError {
            code,
            message: message.into(),
        }
    }

    /// Wraps an error produced by embedder code so it can travel through the
    /// refresh/create passes unchanged.
    pub fn user(message: impl Into<String>) -> Self {
        RuntimeError::new(RuntimeErrorCode::UserCode, message)
    }
}

/// Installed by the embedder. The root detect-changes entry reports errors
/// here before re-raising them; the runtime itself recovers nothing.
pub trait ErrorHandler {
    fn handle_error(&self, error: &RuntimeError);
}
