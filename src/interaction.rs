//! Interaction trait, contracts, and check rules.

use crate::context::{Context, ContextKey};
use crate::error::InteractionError;
use crate::workflow::Workflow;
use serde_json::Value;
use std::fmt;
use tracing::info;

/// Type-safe interaction name wrapper.
///
/// Names identify interactions in a registry and in error reports.
///
/// # Examples
///
/// ```
/// use interflow::InteractionName;
///
/// let name = InteractionName::new("charge");
/// assert_eq!(name.as_str(), "charge");
///
/// // From trait for ergonomic conversion
/// let name: InteractionName = "send_receipt".into();
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InteractionName(String);

impl InteractionName {
    /// Creates a new InteractionName.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates an InteractionName from a type's name (extracts last segment).
    pub fn from_type_name<T: ?Sized>() -> Self {
        let full_name = std::any::type_name::<T>();
        let short_name = full_name.split("::").last().unwrap_or("UnknownInteraction");
        Self::new(short_name)
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InteractionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for InteractionName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for InteractionName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for InteractionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for InteractionName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A check function evaluated against the whole context.
///
/// The counterpart of a named check method: it owns its pass/fail
/// semantics and may fail outright instead of returning `false`.
pub type CheckFn = fn(&Context) -> Result<bool, InteractionError>;

/// A predicate evaluated against the current value of a rule's target key.
pub type PredicateFn = fn(&Value) -> bool;

/// A single verification or confirmation rule.
///
/// Rules come in two kinds and are evaluated with a single dispatch on the
/// variant: a [`Check`](Rule::Check) runs against the context and decides
/// pass/fail itself (it may also error), while a
/// [`Predicate`](Rule::Predicate) receives the target key's current value.
/// Reading the target of a predicate goes through the need accessor, so an
/// absent target fails with `MissingContext`.
#[derive(Debug, Clone, Copy)]
pub enum Rule {
    /// A named check over the context.
    Check(CheckFn),
    /// A predicate over the target's value.
    Predicate(PredicateFn),
}

impl Rule {
    /// Creates a check rule.
    pub fn check(f: CheckFn) -> Self {
        Rule::Check(f)
    }

    /// Creates a predicate rule.
    pub fn predicate(f: PredicateFn) -> Self {
        Rule::Predicate(f)
    }

    fn passes(&self, ctx: &Context, target: &ContextKey) -> Result<bool, InteractionError> {
        match self {
            Rule::Check(f) => f(ctx),
            Rule::Predicate(f) => Ok(f(ctx.require(target.as_str())?)),
        }
    }
}

/// A declared requirement on the context.
#[derive(Debug, Clone)]
struct Need {
    key: ContextKey,
    allow_nil: bool,
}

/// The declarative contract of an interaction type.
///
/// Built once per type with a consuming builder and returned by value from
/// [`Interaction::contract`]. A contract never changes after construction
/// and carries no per-instance state.
///
/// # Examples
///
/// ```
/// use interflow::{Contract, Rule};
///
/// let contract = Contract::new()
///     .needs(["amount", "customer"])
///     .needs_allow_nil(["memo"])
///     .promises(["receipt"])
///     .verifies("amount", Rule::predicate(|v| v.as_i64().is_some()));
///
/// assert_eq!(contract.required_keys().count(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Contract {
    needs: Vec<Need>,
    promises: Vec<ContextKey>,
    verifications: Vec<(ContextKey, Vec<Rule>)>,
    confirmations: Vec<(ContextKey, Vec<Rule>)>,
}

impl Contract {
    /// Creates an empty contract.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares required context keys.
    ///
    /// Each key must be present with a non-null value when a run begins.
    pub fn needs<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<ContextKey>,
    {
        self.needs.extend(keys.into_iter().map(|k| Need {
            key: k.into(),
            allow_nil: false,
        }));
        self
    }

    /// Declares required context keys whose value may be null.
    ///
    /// The key must still exist in the context; only the non-null check is
    /// waived.
    pub fn needs_allow_nil<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<ContextKey>,
    {
        self.needs.extend(keys.into_iter().map(|k| Need {
            key: k.into(),
            allow_nil: true,
        }));
        self
    }

    /// Declares keys that must hold a non-null value after execution.
    ///
    /// Declaration order is preserved; re-declaring a key is a no-op.
    pub fn promises<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<ContextKey>,
    {
        for key in keys {
            let key = key.into();
            if !self.promises.contains(&key) {
                self.promises.push(key);
            }
        }
        self
    }

    /// Registers a pre-execution rule for the given target.
    ///
    /// Call repeatedly to attach more than one rule to a target.
    pub fn verifies(mut self, target: impl Into<ContextKey>, rule: Rule) -> Self {
        push_rule(&mut self.verifications, target.into(), rule);
        self
    }

    /// Registers a post-execution rule for the given target.
    pub fn confirms(mut self, target: impl Into<ContextKey>, rule: Rule) -> Self {
        push_rule(&mut self.confirmations, target.into(), rule);
        self
    }

    /// Returns the declared-required keys in declaration order.
    pub fn required_keys(&self) -> impl Iterator<Item = &ContextKey> {
        self.needs.iter().map(|n| &n.key)
    }

    /// Returns the promised keys in declaration order.
    pub fn promised_keys(&self) -> &[ContextKey] {
        &self.promises
    }

    /// Validates the declared needs against the context.
    ///
    /// A key declared without allow-nil must hold a non-null value; an
    /// absent key reads as null, so either state fails with
    /// `MissingValue`. A key declared with allow-nil must merely exist,
    /// failing with `MissingContext` when it does not.
    pub fn check_required(&self, ctx: &Context) -> Result<(), InteractionError> {
        for need in &self.needs {
            if !need.allow_nil {
                if ctx.is_null(need.key.as_str()) {
                    return Err(InteractionError::MissingValue {
                        key: need.key.clone(),
                    });
                }
            } else if !ctx.contains_key(need.key.as_str()) {
                return Err(InteractionError::MissingContext {
                    key: need.key.clone(),
                });
            }
        }
        Ok(())
    }

    /// Validates the declared promises against the context.
    ///
    /// Fails with `MissingValue` naming the first promised key that is
    /// null or unset.
    pub fn check_promised(&self, ctx: &Context) -> Result<(), InteractionError> {
        for key in &self.promises {
            if ctx.is_null(key.as_str()) {
                return Err(InteractionError::MissingValue { key: key.clone() });
            }
        }
        Ok(())
    }

    /// Evaluates every verification rule.
    ///
    /// Returns `Ok(true)` when no verification is registered. A check rule
    /// that errors propagates its error.
    pub fn verifications_pass(&self, ctx: &Context) -> Result<bool, InteractionError> {
        for (target, rules) in &self.verifications {
            if !rules_pass(ctx, target, rules)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Evaluates every confirmation rule, failing with `FailedCheck`
    /// naming the first target whose rules do not all pass.
    pub fn confirm_state_of_targets(&self, ctx: &Context) -> Result<(), InteractionError> {
        for (target, rules) in &self.confirmations {
            if !rules_pass(ctx, target, rules)? {
                return Err(InteractionError::FailedCheck {
                    target: target.clone(),
                });
            }
        }
        Ok(())
    }
}

fn push_rule(slot: &mut Vec<(ContextKey, Vec<Rule>)>, target: ContextKey, rule: Rule) {
    if let Some((_, rules)) = slot.iter_mut().find(|(t, _)| *t == target) {
        rules.push(rule);
    } else {
        slot.push((target, vec![rule]));
    }
}

fn rules_pass(
    ctx: &Context,
    target: &ContextKey,
    rules: &[Rule],
) -> Result<bool, InteractionError> {
    for rule in rules {
        if !rule.passes(ctx, target)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// A single unit of business logic running against the shared context.
///
/// Implement [`contract`](Interaction::contract) to declare what the unit
/// needs from the context and what it promises to leave behind, and
/// [`execute`](Interaction::execute) for the body. Callers invoke
/// [`process`](Interaction::process), which checks the needs, runs the
/// body, then checks the promises.
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
///     fn contract(&self) -> Contract {
///         Contract::new().needs(["amount"]).promises(["receipt"])
///     }
///
///     fn execute(&self, ctx: &mut Context) -> Result<(), InteractionError> {
///         let amount = ctx.require("amount")?.clone();
///         ctx.insert("receipt", json!({ "amount": amount }));
///         Ok(())
///     }
/// }
///
/// let mut ctx = Context::new();
/// ctx.insert("amount", json!(10));
/// Charge.process(&mut ctx)?;
///
/// assert!(!ctx.is_null("receipt"));
/// # Ok::<(), interflow::InteractionError>(())
/// ```
pub trait Interaction: Send + Sync {
    /// Returns the type's contract.
    ///
    /// The default is the empty contract: nothing required, nothing
    /// promised, no checks.
    fn contract(&self) -> Contract {
        Contract::new()
    }

    /// Returns the interaction name.
    ///
    /// By default, uses the type name. Override to provide a custom name.
    fn name(&self) -> InteractionName {
        InteractionName::from_type_name::<Self>()
    }

    /// Executes the body of the interaction.
    ///
    /// The sole observable effect of a unit is its mutation of `ctx`.
    fn execute(&self, ctx: &mut Context) -> Result<(), InteractionError>;

    /// The generated entry point: validates required keys, runs
    /// [`execute`](Interaction::execute), then validates promised keys.
    ///
    /// # Errors
    ///
    /// - `MissingValue` when a non-allow-nil key is null or absent before
    ///   the run, or a promised key is null after it
    /// - `MissingContext` when an allow-nil key is absent entirely
    /// - whatever `execute` itself returns
    fn process(&self, ctx: &mut Context) -> Result<(), InteractionError> {
        let contract = self.contract();
        contract.check_required(ctx)?;
        self.execute(ctx)?;
        contract.check_promised(ctx)?;
        info!("interaction '{}' completed", self.name());
        Ok(())
    }

    /// Returns `Ok(true)` when no verification rule is registered;
    /// otherwise evaluates every rule for every registered target and
    /// returns `Ok(true)` only if all pass.
    fn verifications_pass(&self, ctx: &Context) -> Result<bool, InteractionError> {
        self.contract().verifications_pass(ctx)
    }

    /// Evaluates the confirmation rules, failing with `FailedCheck`
    /// naming the first failing target.
    fn confirm_state_of_targets(&self, ctx: &Context) -> Result<(), InteractionError> {
        self.contract().confirm_state_of_targets(ctx)
    }
}

/// Runs a nested interaction against the shared context and returns a
/// clone of one resulting key's value.
///
/// Composition helper for invoking one unit from inside another without
/// hand-wiring the lifecycle.
pub fn run_interaction(
    interaction: &dyn Interaction,
    ctx: &mut Context,
    key: Option<&str>,
) -> Result<Option<Value>, InteractionError> {
    interaction.process(ctx)?;
    Ok(key.and_then(|k| ctx.get(k).cloned()))
}

/// Runs a nested workflow against the shared context and returns a clone
/// of one resulting key's value.
pub fn run_workflow(
    workflow: &Workflow,
    ctx: &mut Context,
    key: Option<&str>,
) -> Result<Option<Value>, InteractionError> {
    workflow.perform(ctx)?;
    Ok(key.and_then(|k| ctx.get(k).cloned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::define_interaction;
    use serde_json::json;

    define_interaction!(Charge);

    impl Interaction for Charge {
        fn contract(&self) -> Contract {
            Contract::new().needs(["amount"]).promises(["receipt"])
        }

        fn execute(&self, ctx: &mut Context) -> Result<(), InteractionError> {
            ctx.insert("receipt", json!(true));
            Ok(())
        }
    }

    define_interaction!(ForgetfulCharge);

    impl Interaction for ForgetfulCharge {
        fn contract(&self) -> Contract {
            Contract::new().needs(["amount"]).promises(["receipt"])
        }

        fn execute(&self, _ctx: &mut Context) -> Result<(), InteractionError> {
            Ok(())
        }
    }

    #[test]
    fn test_process_happy_path() {
        let mut ctx = Context::new();
        ctx.insert("amount", json!(10));

        Charge.process(&mut ctx).unwrap();

        assert_eq!(ctx.get("amount"), Some(&json!(10)));
        assert_eq!(ctx.get("receipt"), Some(&json!(true)));
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn test_missing_required_value() {
        // An absent non-allow-nil key reads as null, so the value check
        // fails first.
        let mut ctx = Context::new();

        match Charge.process(&mut ctx) {
            Err(InteractionError::MissingValue { key }) => {
                assert_eq!(key.as_str(), "amount");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_null_required_value() {
        let mut ctx = Context::new();
        ctx.insert("amount", Value::Null);

        match Charge.process(&mut ctx) {
            Err(InteractionError::MissingValue { key }) => {
                assert_eq!(key.as_str(), "amount");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_allow_nil_need() {
        let contract = Contract::new().needs_allow_nil(["memo"]);

        // Present-but-null passes.
        let mut ctx = Context::new();
        ctx.insert("memo", Value::Null);
        assert!(contract.check_required(&ctx).is_ok());

        // Entirely absent still fails, with MissingContext.
        let empty = Context::new();
        match contract.check_required(&empty) {
            Err(InteractionError::MissingContext { key }) => {
                assert_eq!(key.as_str(), "memo");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_unmet_promise() {
        let mut ctx = Context::new();
        ctx.insert("amount", json!(10));

        match ForgetfulCharge.process(&mut ctx) {
            Err(InteractionError::MissingValue { key }) => {
                assert_eq!(key.as_str(), "receipt");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    define_interaction!(NullCharge);

    impl Interaction for NullCharge {
        fn contract(&self) -> Contract {
            Contract::new().promises(["receipt"])
        }

        fn execute(&self, ctx: &mut Context) -> Result<(), InteractionError> {
            ctx.insert("receipt", Value::Null);
            Ok(())
        }
    }

    #[test]
    fn test_promise_set_to_null_is_unmet() {
        let mut ctx = Context::new();
        assert!(matches!(
            NullCharge.process(&mut ctx),
            Err(InteractionError::MissingValue { .. })
        ));
    }

    #[test]
    fn test_first_unmet_promise_is_named() {
        let contract = Contract::new().promises(["first", "second"]);
        let mut ctx = Context::new();
        ctx.insert("second", json!(1));

        match contract.check_promised(&ctx) {
            Err(InteractionError::MissingValue { key }) => {
                assert_eq!(key.as_str(), "first");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_verifications_pass_when_none_registered() {
        let contract = Contract::new();
        let ctx = Context::new();
        assert!(contract.verifications_pass(&ctx).unwrap());
    }

    #[test]
    fn test_predicate_verification() {
        let contract =
            Contract::new().verifies("amount", Rule::predicate(|v| v.as_i64().unwrap_or(0) > 0));

        let mut ctx = Context::new();
        ctx.insert("amount", json!(10));
        assert!(contract.verifications_pass(&ctx).unwrap());

        ctx.insert("amount", json!(-3));
        assert!(!contract.verifications_pass(&ctx).unwrap());
    }

    #[test]
    fn test_predicate_on_absent_target_errors() {
        let contract = Contract::new().verifies("amount", Rule::predicate(|_| true));
        let ctx = Context::new();

        assert!(matches!(
            contract.verifications_pass(&ctx),
            Err(InteractionError::MissingContext { .. })
        ));
    }

    #[test]
    fn test_check_rule_may_raise() {
        let contract = Contract::new().verifies(
            "amount",
            Rule::check(|_| Err(InteractionError::custom("ledger unavailable"))),
        );
        let mut ctx = Context::new();
        ctx.insert("amount", json!(10));

        assert!(matches!(
            contract.verifications_pass(&ctx),
            Err(InteractionError::Custom(_))
        ));
    }

    #[test]
    fn test_multiple_rules_per_target() {
        let contract = Contract::new()
            .verifies("amount", Rule::predicate(|v| v.is_number()))
            .verifies("amount", Rule::predicate(|v| v.as_i64().unwrap_or(0) > 0));

        let mut ctx = Context::new();
        ctx.insert("amount", json!(10));
        assert!(contract.verifications_pass(&ctx).unwrap());

        // The second rule fails while the first still passes.
        ctx.insert("amount", json!(0));
        assert!(!contract.verifications_pass(&ctx).unwrap());
    }

    #[test]
    fn test_confirmations_raise_on_failure() {
        let contract = Contract::new()
            .confirms("receipt", Rule::predicate(|v| !v.is_null()))
            .confirms("balance", Rule::predicate(|v| v.as_i64().unwrap_or(-1) >= 0));

        let mut ctx = Context::new();
        ctx.insert("receipt", json!(true));
        ctx.insert("balance", json!(5));
        assert!(contract.confirm_state_of_targets(&ctx).is_ok());

        ctx.insert("balance", json!(-10));
        match contract.confirm_state_of_targets(&ctx) {
            Err(InteractionError::FailedCheck { target }) => {
                assert_eq!(target.as_str(), "balance");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_promises_deduplicate() {
        let contract = Contract::new().promises(["receipt", "receipt"]);
        assert_eq!(contract.promised_keys().len(), 1);
    }

    #[test]
    fn test_run_interaction_returns_key_value() {
        let mut ctx = Context::new();
        ctx.insert("amount", json!(10));

        let receipt = run_interaction(&Charge, &mut ctx, Some("receipt")).unwrap();
        assert_eq!(receipt, Some(json!(true)));

        // Without a key nothing is extracted, but the context still holds
        // everything the nested unit wrote.
        ctx.remove("receipt");
        let nothing = run_interaction(&Charge, &mut ctx, None).unwrap();
        assert_eq!(nothing, None);
        assert_eq!(ctx.get("receipt"), Some(&json!(true)));
    }

    #[test]
    fn test_default_name_uses_type_name() {
        assert_eq!(Charge.name(), InteractionName::new("Charge"));
        assert_eq!(Charge::NAME, "Charge");
    }
}
