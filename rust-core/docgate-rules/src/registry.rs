// SPDX-License-Identifier: PMPL-1.0-or-later
//! The rule table.
//!
//! A [`RuleRegistry`] is built once, validated, and then shared read-only
//! (typically behind an `Arc`) by every evaluation. There is no global
//! instance: callers construct a registry and pass it in.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::config::RegistryConfig;
use crate::context::Operation;
use crate::error::RegistryError;
use crate::path::{Bindings, Path, PathMatcher, PathTemplate};
use crate::predicate::Predicate;

/// A template plus the predicate for each operation it declares.
///
/// Operations without a predicate are denied with `NoMatchingRule`.
#[derive(Debug, Clone)]
pub struct Rule {
    template: PathTemplate,
    predicates: BTreeMap<Operation, Predicate>,
}

impl Rule {
    pub fn new(template: PathTemplate) -> Self {
        Self {
            template,
            predicates: BTreeMap::new(),
        }
    }

    /// Parse `template` and start an empty rule.
    pub fn parse(template: &str) -> Result<Self, RegistryError> {
        Ok(Self::new(PathTemplate::parse(template)?))
    }

    /// Set the predicate for one operation, replacing any earlier one.
    pub fn with(mut self, operation: Operation, predicate: Predicate) -> Self {
        self.predicates.insert(operation, predicate);
        self
    }

    /// Set the same predicate for `Create` and `Update`.
    pub fn with_writes(self, predicate: Predicate) -> Self {
        self.with(Operation::Create, predicate.clone())
            .with(Operation::Update, predicate)
    }

    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    pub fn predicate(&self, operation: Operation) -> Option<&Predicate> {
        self.predicates.get(&operation)
    }

    pub fn operations(&self) -> impl Iterator<Item = Operation> + '_ {
        self.predicates.keys().copied()
    }

    fn validate(&self, required: &[Operation]) -> Result<(), RegistryError> {
        if let Some(&operation) = required.iter().find(|op| !self.predicates.contains_key(*op)) {
            return Err(RegistryError::MissingPredicate {
                template: self.template.as_str().to_string(),
                operation,
            });
        }
        for predicate in self.predicates.values() {
            if let Predicate::Owner { variable } = predicate {
                if !self.template.binds(variable) {
                    return Err(RegistryError::UnboundVariable {
                        template: self.template.as_str().to_string(),
                        variable: variable.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Immutable, validated set of rules.
#[derive(Debug, Clone)]
pub struct RuleRegistry {
    matcher: PathMatcher,
    rules: Vec<Rule>,
}

impl RuleRegistry {
    /// Validate and freeze `rules`.
    ///
    /// Fails on duplicate or ambiguous templates, on a rule missing any of
    /// `required` operations, and on ownership checks against variables the
    /// template never binds.
    pub fn new(rules: Vec<Rule>, required: &[Operation]) -> Result<Self, RegistryError> {
        let result = Self::build(rules, required);
        match &result {
            Ok(registry) => info!(rules = registry.len(), "Rule registry built"),
            Err(e) => warn!(error = %e, "Rule registry rejected"),
        }
        result
    }

    fn build(rules: Vec<Rule>, required: &[Operation]) -> Result<Self, RegistryError> {
        for rule in &rules {
            rule.validate(required)?;
        }
        let matcher = PathMatcher::new(rules.iter().map(|r| r.template.clone()).collect())?;
        Ok(Self { matcher, rules })
    }

    /// Build from a decoded rule table.
    pub fn from_config(config: &RegistryConfig) -> Result<Self, RegistryError> {
        let rules = config
            .rules
            .iter()
            .map(|spec| spec.to_rule())
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(rules, &config.required_operations)
    }

    /// The built-in table: user profiles, private and settings metadata, and
    /// the admin roster.
    pub fn standard() -> Result<Self, RegistryError> {
        Self::from_config(&RegistryConfig::default())
    }

    /// Resolve the most specific rule for `path`.
    pub fn resolve(&self, path: &Path) -> Option<(&Rule, Bindings)> {
        self.matcher
            .resolve(path)
            .and_then(|(index, bindings)| self.rules.get(index).map(|rule| (rule, bindings)))
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
