// SPDX-License-Identifier: PMPL-1.0-or-later
//! Per-operation predicates attached to rules.
//!
//! The rule set is small and closed, so predicates are a tagged enum rather
//! than an expression language. Each variant is a pure function of the
//! match bindings, the caller, the stored snapshot and the proposed data.

use serde::{Deserialize, Serialize};

use crate::bootstrap::AdminBootstrap;
use crate::context::{AuthContext, DocumentSnapshot, ProposedData};
use crate::evaluator::DenyReason;
use crate::path::Bindings;

/// Everything a predicate may look at.
#[derive(Debug, Clone, Copy)]
pub struct PredicateInput<'a> {
    pub bindings: &'a Bindings,
    pub auth: &'a AuthContext,
    pub before: &'a DocumentSnapshot,
    pub proposed: Option<&'a ProposedData>,
}

/// A check attached to one operation of one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    /// Allowed for every caller, authenticated or not.
    Public,
    /// Allowed only when the caller's uid equals the bound `variable`.
    Owner { variable: String },
    /// Never allowed; denies with `reason`.
    Deny { reason: DenyReason },
    /// The one-time root claim on the admin roster.
    AdminBootstrap(AdminBootstrap),
}

impl Predicate {
    /// Ownership of the `{uid}` segment.
    pub fn owner_of_uid() -> Self {
        Predicate::Owner {
            variable: "uid".to_string(),
        }
    }

    /// Run the predicate. `Err` carries the reason to deny with.
    pub fn check(&self, input: &PredicateInput<'_>) -> Result<(), DenyReason> {
        match self {
            Predicate::Public => Ok(()),
            Predicate::Owner { variable } => {
                if ownership(input.bindings, input.auth, variable) {
                    Ok(())
                } else {
                    Err(DenyReason::NotOwner)
                }
            }
            Predicate::Deny { reason } => Err(*reason),
            Predicate::AdminBootstrap(bootstrap) => {
                bootstrap.check(input.auth, input.before, input.proposed)
            }
        }
    }
}

/// True iff the caller is authenticated and its uid equals `bindings[variable]`.
///
/// An unauthenticated caller never owns anything.
pub fn ownership(bindings: &Bindings, auth: &AuthContext, variable: &str) -> bool {
    match (auth.uid(), bindings.get(variable)) {
        (Some(uid), Some(bound)) => uid == bound,
        _ => false,
    }
}
