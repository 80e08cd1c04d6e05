// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Write rules for the admin roster (`/settings/admins`).
//!
//! The roster maps user ids to role lists, e.g.
//! `{ "apple": ["root", "customer-chat-support"] }`.
//!
//! - **No roster yet**: the caller may create it naming exactly one entry,
//!   themselves, with a non-empty list of role strings. Whoever writes first
//!   becomes the sole administrator.
//! - **Roster exists**: only an identity already listed with the root role
//!   may write it again.
//!
//! # Atomicity
//!
//! This predicate only states the logic. Two first writers can both observe
//! a missing roster; the host must condition each commit on the snapshot it
//! evaluated against (see [`Precondition::Absent`](crate::Precondition)) so
//! that exactly one of them lands and the other, retried, sees the roster
//! and is denied with [`DenyReason::RootAlreadyClaimed`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::{AuthContext, DocumentSnapshot, Fields, ProposedData};
use crate::evaluator::DenyReason;

/// Role that marks an administrator allowed to edit an established roster.
pub const ROOT_ROLE: &str = "root";

/// Compare-and-set policy for the admin roster document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminBootstrap {
    /// Role an existing entry must hold to edit the roster.
    #[serde(default = "default_root_role")]
    pub root_role: String,
}

fn default_root_role() -> String {
    ROOT_ROLE.to_string()
}

impl Default for AdminBootstrap {
    fn default() -> Self {
        Self {
            root_role: default_root_role(),
        }
    }
}

impl AdminBootstrap {
    /// Decide a write against the roster given its prior state.
    pub fn check(
        &self,
        auth: &AuthContext,
        before: &DocumentSnapshot,
        proposed: Option<&ProposedData>,
    ) -> Result<(), DenyReason> {
        if before.exists {
            self.check_established(auth, &before.fields, proposed)
        } else {
            check_first_claim(auth, proposed)
        }
    }

    fn check_established(
        &self,
        auth: &AuthContext,
        roster: &Fields,
        proposed: Option<&ProposedData>,
    ) -> Result<(), DenyReason> {
        let is_root = auth
            .uid()
            .and_then(|uid| roster.get(uid))
            .and_then(role_list)
            .is_some_and(|roles| roles.contains(&self.root_role.as_str()));
        if !is_root {
            return Err(DenyReason::RootAlreadyClaimed);
        }

        // Root may reshape the roster, but entries must stay role lists.
        let well_formed = proposed
            .map(|data| data.values().all(|v| role_list(v).is_some()))
            .unwrap_or(false);
        if well_formed {
            Ok(())
        } else {
            Err(DenyReason::MalformedAdminPayload)
        }
    }
}

/// First write: exactly one key, equal to the caller, with a non-empty role list.
fn check_first_claim(auth: &AuthContext, proposed: Option<&ProposedData>) -> Result<(), DenyReason> {
    let uid = auth.uid().ok_or(DenyReason::NotOwner)?;
    let data = proposed.ok_or(DenyReason::MalformedAdminPayload)?;

    let mut entries = data.iter();
    match (entries.next(), entries.next()) {
        (Some((key, roles)), None) if key == uid => match role_list(roles) {
            Some(list) if !list.is_empty() => Ok(()),
            _ => Err(DenyReason::MalformedAdminPayload),
        },
        _ => Err(DenyReason::MalformedAdminPayload),
    }
}

/// The roles in a roster entry, or `None` if it is not an array of strings.
fn role_list(value: &Value) -> Option<Vec<&str>> {
    value
        .as_array()?
        .iter()
        .map(Value::as_str)
        .collect::<Option<Vec<_>>>()
}
