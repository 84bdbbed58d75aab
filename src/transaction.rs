//! Transaction provider abstraction and process-wide configuration.
//!
//! The core has no transaction logic of its own. A workflow that enables
//! transactions hands its whole traversal to the configured
//! [`TransactionProvider`] as a single unit of work; committing on success
//! and rolling back on failure are entirely the provider's concern.
//!
//! The provider is process-wide state with an explicit set operation:
//!
//! ```
//! use interflow::transaction::{set_transaction_provider, NullTransactionProvider};
//! use std::sync::Arc;
//!
//! set_transaction_provider(Arc::new(NullTransactionProvider));
//! ```
//!
//! Until one is set, [`transaction_provider`] falls back to
//! [`NullTransactionProvider`], which simply invokes the work. Enabling
//! transactions on a workflow while no provider has been set is a
//! build-time configuration error.

use crate::error::InteractionError;
use once_cell::sync::Lazy;
use std::sync::{Arc, RwLock};

/// The unit of work handed to a provider.
pub type TransactionWork<'a> = &'a mut dyn FnMut() -> Result<(), InteractionError>;

/// An abstraction over "run this block, commit or roll back as a unit".
///
/// Implementations bridge to a real persistence layer: begin a
/// transaction, invoke `work`, commit when it returns `Ok`, and roll back
/// (propagating the error) when it returns `Err`.
pub trait TransactionProvider: Send + Sync {
    /// Executes `work` inside the provider's transactional boundary.
    fn transaction(&self, work: TransactionWork<'_>) -> Result<(), InteractionError>;
}

/// The pass-through provider: invokes the work directly, no boundary.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTransactionProvider;

impl TransactionProvider for NullTransactionProvider {
    fn transaction(&self, work: TransactionWork<'_>) -> Result<(), InteractionError> {
        work()
    }
}

static PROVIDER: Lazy<RwLock<Option<Arc<dyn TransactionProvider>>>> =
    Lazy::new(|| RwLock::new(None));

/// Sets the process-wide transaction provider.
///
/// May be called again to swap the provider; the newest assignment wins.
pub fn set_transaction_provider(provider: Arc<dyn TransactionProvider>) {
    if let Ok(mut slot) = PROVIDER.write() {
        *slot = Some(provider);
    }
}

/// Clears the process-wide transaction provider.
///
/// Workflows with transactions enabled will fail to build again until a
/// provider is set.
pub fn clear_transaction_provider() {
    if let Ok(mut slot) = PROVIDER.write() {
        *slot = None;
    }
}

/// Returns the configured provider, or the null pass-through when none
/// has been set.
pub fn transaction_provider() -> Arc<dyn TransactionProvider> {
    PROVIDER
        .read()
        .ok()
        .and_then(|slot| slot.clone())
        .unwrap_or_else(|| Arc::new(NullTransactionProvider))
}

/// Returns `true` if a provider has been explicitly configured.
///
/// Drives the build-time check behind `WorkflowBuilder::transactions`.
pub fn transaction_provider_configured() -> bool {
    PROVIDER.read().map(|slot| slot.is_some()).unwrap_or(false)
}
