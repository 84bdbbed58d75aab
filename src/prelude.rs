//! Commonly used types and traits

pub use crate::context::{Context, ContextKey};
pub use crate::define_interaction;
pub use crate::error::InteractionError;
pub use crate::interaction::{Contract, Interaction, InteractionName, Rule};
pub use crate::workflow::{InteractionRegistry, Workflow};
