//! # Interflow
//!
//! A contract-checked interaction and workflow DSL for Rust.
//!
//! Interactions are single units of business logic with declared input
//! requirements ("needs"), declared output guarantees ("promises"), and
//! optional pre/post condition checks ("verifies"/"confirms"). Workflows
//! are ordered sequences of interactions sharing one mutable [`Context`],
//! optionally wrapped in a transaction boundary supplied by an external
//! provider.
//!
//! ## Features
//!
//! - **Type-safe**: [`InteractionName`] and [`ContextKey`] newtypes prevent
//!   typos at compile time
//! - **Declarative contracts**: needs, promises, and check rules are
//!   declared once per type and validated around every run
//! - **Explicit resolution**: workflows resolve symbolic names through an
//!   [`InteractionRegistry`], no reflection
//! - **Pluggable transactions**: a process-wide [`TransactionProvider`]
//!   wraps a workflow's traversal, or a no-op pass-through when unset
//! - **Error Handling**: structured errors with `thiserror`, fail-fast
//!   propagation
//! - **Lightweight**: synchronous, single-threaded, minimal dependencies
//!
//! ## Quick Start
//!
//! ```rust
//! use interflow::prelude::*;
//! use serde_json::json;
//!
//! define_interaction!(Charge);
//!
//! impl Interaction for Charge {
//!     fn contract(&self) -> Contract {
//!         Contract::new().needs(["amount"]).promises(["receipt"])
//!     }
//!
//!     fn execute(&self, ctx: &mut Context) -> Result<(), InteractionError> {
//!         ctx.insert("receipt", json!(true));
//!         Ok(())
//!     }
//! }
//!
//! let mut ctx = Context::new();
//! ctx.insert("amount", json!(10));
//!
//! Charge.process(&mut ctx).expect("contract satisfied");
//!
//! assert_eq!(ctx.get("receipt"), Some(&json!(true)));
//! ```
//!
//! ## Workflows
//!
//! ```rust
//! use interflow::prelude::*;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! define_interaction!(Charge);
//!
//! impl Interaction for Charge {
//!     fn contract(&self) -> Contract {
//!         Contract::new().needs(["amount"]).promises(["receipt"])
//!     }
//!
//!     fn execute(&self, ctx: &mut Context) -> Result<(), InteractionError> {
//!         ctx.insert("receipt", json!(true));
//!         Ok(())
//!     }
//! }
//!
//! define_interaction!(SendReceipt);
//!
//! impl Interaction for SendReceipt {
//!     fn contract(&self) -> Contract {
//!         Contract::new().needs(["receipt"]).promises(["delivered"])
//!     }
//!
//!     fn execute(&self, ctx: &mut Context) -> Result<(), InteractionError> {
//!         ctx.insert("delivered", json!(true));
//!         Ok(())
//!     }
//! }
//!
//! let mut registry = InteractionRegistry::new();
//! registry.register_default::<Charge>("billing/charge");
//! registry.register_default::<SendReceipt>("billing/send_receipt");
//!
//! let workflow = Workflow::builder(Arc::new(registry))
//!     .interactions(["charge", "send_receipt"])
//!     .prefix("billing")
//!     .build()
//!     .expect("valid workflow");
//!
//! let mut ctx = Context::new();
//! ctx.insert("amount", json!(10));
//! workflow.perform(&mut ctx).expect("workflow failed");
//!
//! assert_eq!(ctx.get("delivered"), Some(&json!(true)));
//! ```
//!
//! ## Check Rules
//!
//! Verifications run before a unit is worth executing; confirmations raise
//! when a post-state cannot be confirmed:
//!
//! ```rust
//! use interflow::prelude::*;
//! use serde_json::json;
//!
//! define_interaction!(Withdraw);
//!
//! impl Interaction for Withdraw {
//!     fn contract(&self) -> Contract {
//!         Contract::new()
//!             .needs(["balance"])
//!             .verifies("balance", Rule::predicate(|v| v.as_i64().unwrap_or(0) > 0))
//!             .confirms("balance", Rule::predicate(|v| v.as_i64().unwrap_or(-1) >= 0))
//!     }
//!
//!     fn execute(&self, ctx: &mut Context) -> Result<(), InteractionError> {
//!         ctx.insert("balance", json!(0));
//!         Ok(())
//!     }
//! }
//!
//! let mut ctx = Context::new();
//! ctx.insert("balance", json!(10));
//!
//! assert!(Withdraw.verifications_pass(&ctx).expect("rules evaluated"));
//! Withdraw.process(&mut ctx).expect("contract satisfied");
//! Withdraw.confirm_state_of_targets(&ctx).expect("state confirmed");
//! ```

mod context;
mod error;
mod interaction;
pub mod transaction;
mod workflow;

pub mod prelude;

pub use context::{Context, ContextKey};
pub use error::InteractionError;
pub use interaction::{
    run_interaction, run_workflow, CheckFn, Contract, Interaction, InteractionName, PredicateFn,
    Rule,
};
pub use transaction::{NullTransactionProvider, TransactionProvider};
pub use workflow::{InteractionRegistry, Workflow, WorkflowBuilder};

/// Macro to define an interaction with minimal boilerplate
///
/// This macro creates an interaction struct with:
/// - `const NAME: &'static str` - compile-time interaction name
/// - `Debug` derive
/// - `Default` implementation
///
/// # Example
///
/// ```rust
/// use interflow::define_interaction;
///
/// define_interaction!(Charge);
/// assert_eq!(Charge::NAME, "Charge");
/// ```
#[macro_export]
macro_rules! define_interaction {
    ($name:ident) => {
        #[derive(Debug)]
        pub struct $name;

        impl $name {
            /// Interaction name as a compile-time constant
            #[allow(dead_code)]
            pub const NAME: &'static str = stringify!($name);
        }

        impl Default for $name {
            fn default() -> Self {
                Self
            }
        }
    };
}
