// SPDX-License-Identifier: PMPL-1.0-or-later
//! Decision audit trail.
//!
//! Recording happens after evaluation, in
//! [`PolicyEvaluator::evaluate_audited`](crate::PolicyEvaluator::evaluate_audited);
//! [`evaluate`](crate::evaluate) itself never touches a log.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::context::{AccessRequest, Operation};
use crate::evaluator::Decision;

/// A single recorded decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    /// Caller uid, `None` for unauthenticated requests.
    pub uid: Option<String>,
    /// Document path, in `/a/b` form.
    pub path: String,
    pub operation: Operation,
    pub decision: Decision,
}

impl AuditEntry {
    pub fn new(request: &AccessRequest, decision: Decision) -> Self {
        Self {
            timestamp: Utc::now(),
            uid: request.auth.uid.clone(),
            path: request.path.to_string(),
            operation: request.operation,
            decision,
        }
    }
}

/// Thread-safe, bounded log of decisions.
#[derive(Debug, Clone)]
pub struct AuditLog {
    entries: Arc<Mutex<VecDeque<AuditEntry>>>,
    /// Maximum number of entries retained (ring buffer behaviour).
    max_entries: usize,
}

impl AuditLog {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(max_entries.min(4096)))),
            max_entries,
        }
    }

    /// Record a decision, evicting the oldest entry when full.
    pub fn record(&self, entry: AuditEntry) {
        if self.max_entries == 0 {
            return;
        }
        let mut entries = self.entries.lock().expect("audit log lock");
        while entries.len() >= self.max_entries {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Snapshot of all retained entries, oldest first.
    pub fn entries(&self) -> Vec<AuditEntry> {
        let entries = self.entries.lock().expect("audit log lock");
        entries.iter().cloned().collect()
    }

    /// Retained denials only.
    pub fn denials(&self) -> Vec<AuditEntry> {
        let entries = self.entries.lock().expect("audit log lock");
        entries.iter().filter(|e| e.decision.is_deny()).cloned().collect()
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.lock().expect("audit log lock");
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock().expect("audit log lock");
        entries.clear();
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(10_000)
    }
}
