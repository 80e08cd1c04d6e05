// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Request evaluation.
//!
//! [`evaluate`] is total and pure: it performs no I/O, holds no state and
//! returns the same [`Decision`] for the same inputs, so it can be called
//! from any number of threads against one shared [`RuleRegistry`].
//!
//! 1. Resolve the most specific rule for the path. None: `NoMatchingRule`.
//! 2. Look up the rule's predicate for the operation. None: `NoMatchingRule`.
//! 3. Run the predicate; a failure becomes `Deny` with its reason.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::audit::{AuditEntry, AuditLog};
use crate::context::{AccessRequest, AuthContext, DocumentSnapshot, Operation, ProposedData};
use crate::path::Path;
use crate::predicate::PredicateInput;
use crate::registry::RuleRegistry;

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// No rule covers this path, or the rule does not declare the operation.
    NoMatchingRule,
    /// The caller does not own the document's subtree.
    NotOwner,
    /// The document can never be deleted.
    DeleteForbidden,
    /// The admin roster exists and the caller does not hold root.
    RootAlreadyClaimed,
    /// The admin roster payload is not a valid claim.
    MalformedAdminPayload,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::NoMatchingRule => write!(f, "no matching rule"),
            DenyReason::NotOwner => write!(f, "not owner"),
            DenyReason::DeleteForbidden => write!(f, "delete forbidden"),
            DenyReason::RootAlreadyClaimed => write!(f, "root already claimed"),
            DenyReason::MalformedAdminPayload => write!(f, "malformed admin payload"),
        }
    }
}

/// Outcome of an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "decision", content = "reason", rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn is_deny(&self) -> bool {
        !self.is_allow()
    }

    /// The denial reason, if any.
    pub fn reason(&self) -> Option<DenyReason> {
        match self {
            Decision::Allow => None,
            Decision::Deny(reason) => Some(*reason),
        }
    }
}

impl From<Result<(), DenyReason>> for Decision {
    fn from(result: Result<(), DenyReason>) -> Self {
        match result {
            Ok(()) => Decision::Allow,
            Err(reason) => Decision::Deny(reason),
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Allow => write!(f, "ALLOW"),
            Decision::Deny(reason) => write!(f, "DENY ({})", reason),
        }
    }
}

/// Decide whether `auth` may perform `operation` on `path`.
///
/// `before` is the document as it stood before the operation; `proposed` is
/// the data being written (absent for reads and deletes).
pub fn evaluate(
    registry: &RuleRegistry,
    path: &Path,
    operation: Operation,
    auth: &AuthContext,
    before: &DocumentSnapshot,
    proposed: Option<&ProposedData>,
) -> Decision {
    let decision = match registry.resolve(path) {
        None => Decision::Deny(DenyReason::NoMatchingRule),
        Some((rule, bindings)) => match rule.predicate(operation) {
            None => Decision::Deny(DenyReason::NoMatchingRule),
            Some(predicate) => predicate
                .check(&PredicateInput {
                    bindings: &bindings,
                    auth,
                    before,
                    proposed,
                })
                .into(),
        },
    };

    debug!(
        path = %path,
        operation = %operation,
        uid = auth.uid().unwrap_or("<anonymous>"),
        decision = %decision,
        "Evaluated access"
    );
    decision
}

/// Shareable handle over a registry.
///
/// Cloning is cheap; all clones evaluate against the same immutable table.
#[derive(Debug, Clone)]
pub struct PolicyEvaluator {
    registry: Arc<RuleRegistry>,
}

impl PolicyEvaluator {
    pub fn new(registry: RuleRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn from_shared(registry: Arc<RuleRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn evaluate(
        &self,
        path: &Path,
        operation: Operation,
        auth: &AuthContext,
        before: &DocumentSnapshot,
        proposed: Option<&ProposedData>,
    ) -> Decision {
        evaluate(&self.registry, path, operation, auth, before, proposed)
    }

    pub fn evaluate_request(&self, request: &AccessRequest) -> Decision {
        self.evaluate(
            &request.path,
            request.operation,
            &request.auth,
            &request.before,
            request.proposed.as_ref(),
        )
    }

    /// Evaluate, then record the outcome in `log`.
    pub fn evaluate_audited(&self, request: &AccessRequest, log: &AuditLog) -> Decision {
        let decision = self.evaluate_request(request);
        log.record(AuditEntry::new(request, decision));
        decision
    }
}
