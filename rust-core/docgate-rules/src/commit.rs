// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Compare-and-set contract between the evaluator and a hosting store.
//!
//! The evaluator decides against a snapshot; it cannot stop the document
//! from changing between that snapshot and the write. A host that uses an
//! `Allow` to authorize a commit must make the commit conditional on the
//! snapshot it evaluated against. [`ConditionalStore`] is the shape of that
//! primitive and [`guarded_write`] is the snapshot, evaluate, commit loop
//! built on it.
//!
//! For the admin roster this is what keeps the bootstrap one-shot: two
//! first writers both evaluate against a missing roster, both get `Allow`,
//! but only one `commit_if(.., Precondition::Absent, ..)` can succeed. The
//! loser re-snapshots, sees the roster, and is denied.

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::CommitConfig;
use crate::context::{AuthContext, DocumentSnapshot, Fields, Operation, ProposedData};
use crate::evaluator::{Decision, DenyReason, PolicyEvaluator};
use crate::path::Path;

/// State the stored document must still be in for a commit to apply.
#[derive(Debug, Clone, PartialEq)]
pub enum Precondition {
    /// The document must not exist.
    Absent,
    /// The document must exist at exactly this revision.
    Version(u64),
    /// The document must exist with exactly these fields. Used when the
    /// store exposes no revision.
    Matches(Fields),
}

impl Precondition {
    /// The precondition matching the state `before` was read in.
    pub fn from_snapshot(before: &DocumentSnapshot) -> Self {
        match (before.exists, before.version) {
            (false, _) => Precondition::Absent,
            (true, Some(version)) => Precondition::Version(version),
            (true, None) => Precondition::Matches(before.fields.clone()),
        }
    }

    /// Whether a document currently in `current` still satisfies this.
    pub fn holds_for(&self, current: &DocumentSnapshot) -> bool {
        match self {
            Precondition::Absent => !current.exists,
            Precondition::Version(v) => current.exists && current.version == Some(*v),
            Precondition::Matches(fields) => current.exists && current.fields == *fields,
        }
    }
}

/// Failures of a guarded commit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitError {
    /// The rules denied the write.
    #[error("write denied: {0}")]
    Denied(DenyReason),

    /// The stored document changed since the snapshot.
    #[error("precondition failed on {path}")]
    PreconditionFailed {
        /// Document path.
        path: String,
    },

    /// Still contended after the configured number of attempts.
    #[error("gave up on {path} after {attempts} attempts")]
    Contended {
        /// Document path.
        path: String,
        /// Attempts made.
        attempts: u32,
    },

    /// The operation does not change the document.
    #[error("{0} is not a write operation")]
    NotAWrite(Operation),

    /// Any other store failure.
    #[error("store error: {0}")]
    Store(String),
}

/// Conditional-write primitive a hosting store provides.
///
/// `snapshot` must read a single consistent state. `commit_if` must check
/// `precondition` and apply the write atomically, failing with
/// [`CommitError::PreconditionFailed`] when it no longer holds.
pub trait ConditionalStore {
    fn snapshot(&self, path: &Path) -> Result<DocumentSnapshot, CommitError>;

    fn commit_if(
        &self,
        path: &Path,
        precondition: Precondition,
        operation: Operation,
        proposed: Option<&ProposedData>,
    ) -> Result<(), CommitError>;
}

/// Authorize and apply a write with compare-and-set semantics.
///
/// Each attempt takes a fresh snapshot, evaluates against it, and commits
/// conditioned on it. A denial ends the loop immediately; a failed
/// precondition retries up to `config.max_attempts` times. Reads are
/// rejected with [`CommitError::NotAWrite`] before touching the store.
pub fn guarded_write<S: ConditionalStore + ?Sized>(
    evaluator: &PolicyEvaluator,
    store: &S,
    config: &CommitConfig,
    path: &Path,
    operation: Operation,
    auth: &AuthContext,
    proposed: Option<&ProposedData>,
) -> Result<(), CommitError> {
    if operation == Operation::Read {
        return Err(CommitError::NotAWrite(operation));
    }

    let attempts = config.max_attempts.max(1);
    for attempt in 1..=attempts {
        let before = store.snapshot(path)?;
        match evaluator.evaluate(path, operation, auth, &before, proposed) {
            Decision::Deny(reason) => return Err(CommitError::Denied(reason)),
            Decision::Allow => {}
        }

        let precondition = Precondition::from_snapshot(&before);
        match store.commit_if(path, precondition, operation, proposed) {
            Ok(()) => return Ok(()),
            Err(CommitError::PreconditionFailed { .. }) => {
                debug!(path = %path, attempt, "Precondition failed, retrying");
            }
            Err(e) => return Err(e),
        }
    }

    warn!(path = %path, attempts, "Write still contended");
    Err(CommitError::Contended {
        path: path.to_string(),
        attempts,
    })
}
