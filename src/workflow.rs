//! Workflow sequencing and name resolution.

use crate::context::Context;
use crate::error::InteractionError;
use crate::interaction::{Interaction, InteractionName};
use crate::transaction::{transaction_provider, transaction_provider_configured};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

type InteractionFactory = Box<dyn Fn() -> Box<dyn Interaction> + Send + Sync>;

/// The explicit name resolver: maps symbolic interaction names to
/// factories producing fresh instances.
///
/// Workflows hold a shared registry and resolve each listed name through
/// it at run time, combining the workflow's optional prefix and the name
/// into the qualified lookup key (`prefix/name`).
///
/// # Examples
///
/// ```
/// use interflow::prelude::*;
/// use serde_json::json;
///
/// define_interaction!(Charge);
///
/// impl Interaction for Charge {
///     fn execute(&self, ctx: &mut Context) -> Result<(), InteractionError> {
///         ctx.insert("receipt", json!(true));
///         Ok(())
///     }
/// }
///
/// let mut registry = InteractionRegistry::new();
/// registry.register_default::<Charge>("billing/charge");
///
/// let unit = registry.resolve(Some("billing"), &"charge".into())?;
/// assert_eq!(unit.name(), InteractionName::new("Charge"));
/// # Ok::<(), interflow::InteractionError>(())
/// ```
#[derive(Default)]
pub struct InteractionRegistry {
    entries: HashMap<InteractionName, InteractionFactory>,
}

impl fmt::Debug for InteractionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractionRegistry")
            .field("entries", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl InteractionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory under the given qualified name.
    ///
    /// Registering the same name again replaces the previous factory.
    pub fn register<F>(&mut self, name: impl Into<InteractionName>, factory: F)
    where
        F: Fn() -> Box<dyn Interaction> + Send + Sync + 'static,
    {
        self.entries.insert(name.into(), Box::new(factory));
    }

    /// Registers a `Default`-constructible interaction type under the
    /// given qualified name.
    pub fn register_default<I>(&mut self, name: impl Into<InteractionName>)
    where
        I: Interaction + Default + 'static,
    {
        self.register(name, || Box::new(I::default()));
    }

    /// Returns `true` if the qualified name has a registered factory.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns an iterator over all registered qualified names.
    pub fn names(&self) -> impl Iterator<Item = &InteractionName> {
        self.entries.keys()
    }

    /// Returns the number of registered factories.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves an optional prefix and a symbolic name to a fresh
    /// instance, or fails with `NotRegistered` naming the qualified key.
    pub fn resolve(
        &self,
        prefix: Option<&str>,
        name: &InteractionName,
    ) -> Result<Box<dyn Interaction>, InteractionError> {
        let qualified = qualify(prefix, name);
        match self.entries.get(&qualified) {
            Some(factory) => Ok(factory()),
            None => Err(InteractionError::NotRegistered(qualified)),
        }
    }
}

fn qualify(prefix: Option<&str>, name: &InteractionName) -> InteractionName {
    match prefix {
        Some(p) => InteractionName::new(format!("{}/{}", p, name)),
        None => name.clone(),
    }
}

/// An ordered sequence of interactions sharing one context.
///
/// Built with [`Workflow::builder`]; executed with
/// [`perform`](Workflow::perform), which resolves each registered name in
/// declared order, instantiates it with the shared context, and runs it to
/// completion before the next begins. When transactions are enabled the
/// whole traversal runs inside the configured transaction provider's
/// boundary.
///
/// Workflows hold no state beyond their definition: execution is a
/// linear, non-resumable traversal with no partial-success bookkeeping.
/// A failure in interaction N leaves the context holding whatever
/// interactions 1..N-1 (and N before failing) wrote.
pub struct Workflow {
    registry: Arc<InteractionRegistry>,
    interactions: Vec<InteractionName>,
    prefix: Option<String>,
    transactional: bool,
}

impl fmt::Debug for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workflow")
            .field("interactions", &self.interactions)
            .field("prefix", &self.prefix)
            .field("transactional", &self.transactional)
            .finish()
    }
}

impl Workflow {
    /// Creates a new workflow builder over the given registry.
    pub fn builder(registry: Arc<InteractionRegistry>) -> WorkflowBuilder {
        WorkflowBuilder::new(registry)
    }

    /// Returns the registered interaction names in declaration order.
    pub fn interactions(&self) -> &[InteractionName] {
        &self.interactions
    }

    /// Returns the namespace prefix used when resolving names.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Returns `true` if `perform` wraps execution in a transaction.
    pub fn transactional(&self) -> bool {
        self.transactional
    }

    /// Executes all registered interactions in declared order against
    /// `ctx`, inside the transaction boundary when one is enabled.
    ///
    /// On success the caller's context holds the cumulative mutation of
    /// every unit. On failure the first error propagates immediately; no
    /// retries, no partial completion recorded, and rollback (if any) is
    /// the transaction provider's responsibility.
    pub fn perform(&self, ctx: &mut Context) -> Result<(), InteractionError> {
        if self.transactional {
            let provider = transaction_provider();
            let mut work = || self.run_interactions(&mut *ctx);
            provider.transaction(&mut work)
        } else {
            self.run_interactions(ctx)
        }
    }

    fn run_interactions(&self, ctx: &mut Context) -> Result<(), InteractionError> {
        for name in &self.interactions {
            let unit = self.registry.resolve(self.prefix.as_deref(), name)?;
            if let Err(e) = unit.process(ctx) {
                warn!("interaction '{}' failed: {}", name, e);
                return Err(e);
            }
        }
        info!("workflow completed ({} interactions)", self.interactions.len());
        Ok(())
    }
}

/// Builder for constructing [`Workflow`] instances.
///
/// Definition-time failures surface from [`build`](WorkflowBuilder::build):
/// an empty interaction list, or transactions enabled while no transaction
/// provider is configured.
pub struct WorkflowBuilder {
    registry: Arc<InteractionRegistry>,
    interactions: Vec<InteractionName>,
    prefix: Option<String>,
    transactional: bool,
}

impl WorkflowBuilder {
    /// Creates a new builder over the given registry.
    pub fn new(registry: Arc<InteractionRegistry>) -> Self {
        Self {
            registry,
            interactions: Vec::new(),
            prefix: None,
            transactional: false,
        }
    }

    /// Appends symbolic interaction names, preserving declaration order.
    pub fn interactions<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<InteractionName>,
    {
        self.interactions.extend(names.into_iter().map(Into::into));
        self
    }

    /// Sets the namespace prefix used when resolving names.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Toggles wrapping `perform` in a transaction.
    pub fn transactions(mut self, enabled: bool) -> Self {
        self.transactional = enabled;
        self
    }

    /// Builds the workflow.
    pub fn build(self) -> Result<Workflow, InteractionError> {
        if self.interactions.is_empty() {
            return Err(InteractionError::Configuration(
                "at least one interaction must be registered".to_string(),
            ));
        }

        if self.transactional && !transaction_provider_configured() {
            return Err(InteractionError::Configuration(
                "transactions cannot be enabled unless a transaction provider is configured"
                    .to_string(),
            ));
        }

        Ok(Workflow {
            registry: self.registry,
            interactions: self.interactions,
            prefix: self.prefix,
            transactional: self.transactional,
        })
    }
}
