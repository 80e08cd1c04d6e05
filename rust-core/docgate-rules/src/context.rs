// SPDX-License-Identifier: PMPL-1.0-or-later
//! Request-scoped inputs to an evaluation.
//!
//! All of these are supplied by collaborators (the authentication layer, the
//! document store, the write path) and are read-only to the evaluator.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::path::Path;

/// Field mapping of a document, keyed by field name.
pub type Fields = BTreeMap<String, Value>;

/// Data being written: full replacement for `Create`, partial merge for `Update`.
pub type ProposedData = Fields;

/// Document operation being authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
}

impl Operation {
    /// All operations in canonical order.
    pub const ALL: [Operation; 4] = [
        Operation::Read,
        Operation::Create,
        Operation::Update,
        Operation::Delete,
    ];

    /// Whether the operation carries proposed data.
    pub fn is_write(self) -> bool {
        matches!(self, Operation::Create | Operation::Update)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Read => write!(f, "read"),
            Operation::Create => write!(f, "create"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

/// Identity of the caller, as established by the authentication layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user id. `None` means the request is unauthenticated.
    pub uid: Option<String>,
    /// Token claims. Opaque to the built-in predicates.
    #[serde(default)]
    pub claims: BTreeMap<String, Value>,
}

impl AuthContext {
    /// An unauthenticated caller.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A caller authenticated as `uid`, with no claims.
    pub fn user(uid: impl Into<String>) -> Self {
        Self {
            uid: Some(uid.into()),
            claims: BTreeMap::new(),
        }
    }

    /// Attach a claim.
    pub fn with_claim(mut self, key: impl Into<String>, value: Value) -> Self {
        self.claims.insert(key.into(), value);
        self
    }

    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }
}

/// State of the target document before the operation.
///
/// Must be read at a single consistent point. When an `Allow` is used to
/// authorize a commit, the commit has to be conditioned on this same state
/// (see [`Precondition`](crate::Precondition)).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    /// Whether the document existed.
    pub exists: bool,
    /// Stored fields. Empty when the document does not exist.
    #[serde(default)]
    pub fields: Fields,
    /// Store revision, when the host exposes one. Ignored by evaluation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
}

impl DocumentSnapshot {
    /// Snapshot of a document that does not exist.
    pub fn missing() -> Self {
        Self::default()
    }

    /// Snapshot of an existing document.
    pub fn existing(fields: Fields) -> Self {
        Self {
            exists: true,
            fields,
            version: None,
        }
    }

    /// Record the store revision the snapshot was taken at.
    pub fn at_version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }
}

/// A complete request descriptor, as handed to
/// [`PolicyEvaluator::evaluate_request`](crate::PolicyEvaluator::evaluate_request).
#[derive(Debug, Clone, PartialEq)]
pub struct AccessRequest {
    pub path: Path,
    pub operation: Operation,
    pub auth: AuthContext,
    pub before: DocumentSnapshot,
    pub proposed: Option<ProposedData>,
}

impl AccessRequest {
    pub fn new(path: Path, operation: Operation, auth: AuthContext) -> Self {
        Self {
            path,
            operation,
            auth,
            before: DocumentSnapshot::missing(),
            proposed: None,
        }
    }

    pub fn with_before(mut self, before: DocumentSnapshot) -> Self {
        self.before = before;
        self
    }

    pub fn with_proposed(mut self, proposed: ProposedData) -> Self {
        self.proposed = Some(proposed);
        self
    }
}
