use crate::context::ContextKey;
use crate::interaction::InteractionName;
use thiserror::Error;

/// Errors that can occur while defining or running interactions and
/// workflows.
///
/// Every failure is fail-fast: it propagates immediately to the caller of
/// [`process`](crate::Interaction::process) or
/// [`perform`](crate::Workflow::perform). The core performs no recovery,
/// no retries, and supplies no default values.
///
/// # Non-Exhaustive
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code. When matching
/// on this error, always include a wildcard pattern:
///
/// ```
/// use interflow::InteractionError;
///
/// fn handle_error(error: InteractionError) {
///     match error {
///         InteractionError::MissingContext { key } => {
///             eprintln!("context key {} was never set", key);
///         }
///         InteractionError::MissingValue { key } => {
///             eprintln!("{} holds no value", key);
///         }
///         InteractionError::FailedCheck { target } => {
///             eprintln!("check failed for {}", target);
///         }
///         _ => eprintln!("error: {}", error),
///     }
/// }
/// ```
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum InteractionError {
    /// A key was absent from the context entirely.
    ///
    /// Raised by the need accessor ([`Context::require`](crate::Context::require))
    /// and by the presence check for allow-nil needs at the start of a
    /// run.
    #[error("missing required context key '{key}'")]
    MissingContext {
        /// The key that was never present
        key: ContextKey,
    },

    /// A required value was null (or the key absent) when the run began,
    /// or a promised value was null (or unset) after the execution body
    /// finished.
    #[error("missing value for '{key}'")]
    MissingValue {
        /// The key whose value was null
        key: ContextKey,
    },

    /// A confirmation rule did not pass.
    #[error("state of '{target}' could not be confirmed")]
    FailedCheck {
        /// The target whose rules failed
        target: ContextKey,
    },

    /// The workflow definition is invalid.
    ///
    /// Raised at build time, before any instance runs: enabling
    /// transactions with no transaction provider configured, or building
    /// a workflow with no interactions registered.
    #[error("invalid workflow configuration: {0}")]
    Configuration(String),

    /// The registry had no entry for the qualified interaction name.
    #[error("no interaction registered for '{0}'")]
    NotRegistered(InteractionName),

    /// A custom failure raised by an interaction body or a check rule.
    #[error("interaction failed: {0}")]
    Custom(String),
}

impl InteractionError {
    /// Convenience constructor for failures raised inside an execution
    /// body or a check rule.
    pub fn custom(msg: impl Into<String>) -> Self {
        InteractionError::Custom(msg.into())
    }
}
