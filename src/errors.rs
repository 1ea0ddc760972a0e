//! Error taxonomy for the extension layer.
//!
//! None of these ever propagate to the host: every intercepted entry point
//! absorbs them locally, routes diagnostics to `tracing`, and lets the
//! host's dialogue and save flow continue.

use crate::assoc::QueryId;
use thiserror::Error;

/// Errors raised inside extension evaluation and effects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtensionError {
    /// A reference list an action depends on is empty.
    #[error("missing references for \"{action}\"")]
    MissingReference { action: String },

    /// A persistent-variable record lacks its "value" field.
    #[error("variable \"{string_id}\" is missing its value field")]
    MissingField { string_id: String },

    /// No acting character could be resolved for a condition list.
    #[error("no speaker for dialogue condition")]
    MissingSubject,

    /// No target character could be resolved; evaluation continues without one.
    #[error("no target for dialogue condition")]
    MissingTarget,

    /// A query was evaluated without ever being recorded. This indicates a
    /// latent bug in the recording path, not a normal runtime error.
    #[error("no data association recorded for query {0}")]
    AssociationNotFound(QueryId),
}

/// Errors from installing the override points.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    #[error("could not install hook for {0}")]
    InstallFailed(&'static str),
}
