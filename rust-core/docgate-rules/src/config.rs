// SPDX-License-Identifier: PMPL-1.0-or-later
//! Rule table and commit configuration.
//!
//! The default table is the DocGate document layout:
//!
//! | Template                          | Read   | Create/Update    | Delete |
//! |-----------------------------------|--------|------------------|--------|
//! | `/users/{uid}`                    | public | owner            | never  |
//! | `/users/{uid}/user_meta/private`  | owner  | owner            | never  |
//! | `/users/{uid}/user_meta/settings` | public | owner            | never  |
//! | `/settings/admins`                | public | admin bootstrap  | never  |
//!
//! A table can also be loaded from JSON, either directly or from the file
//! named by the `DOCGATE_RULES` environment variable.

use std::path::Path as FsPath;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::bootstrap::AdminBootstrap;
use crate::context::Operation;
use crate::error::RegistryError;
use crate::evaluator::DenyReason;
use crate::predicate::Predicate;
use crate::registry::Rule;

/// Environment variable naming a JSON rule table file.
pub const RULES_ENV_VAR: &str = "DOCGATE_RULES";

/// One rule as written in a rule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    /// Path template, e.g. `/users/{uid}`.
    pub template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<Predicate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create: Option<Predicate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<Predicate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<Predicate>,
}

impl RuleSpec {
    /// Parse the template and attach the declared predicates.
    pub fn to_rule(&self) -> Result<Rule, RegistryError> {
        let declared = [
            (Operation::Read, &self.read),
            (Operation::Create, &self.create),
            (Operation::Update, &self.update),
            (Operation::Delete, &self.delete),
        ];
        let rule = declared
            .into_iter()
            .filter_map(|(op, predicate)| predicate.clone().map(|p| (op, p)))
            .fold(Rule::parse(&self.template)?, |rule, (op, p)| rule.with(op, p));
        Ok(rule)
    }

    /// A rule whose documents can never be deleted.
    fn undeletable(template: &str, read: Predicate, write: Predicate) -> Self {
        Self {
            template: template.to_string(),
            read: Some(read),
            create: Some(write.clone()),
            update: Some(write),
            delete: Some(Predicate::Deny {
                reason: DenyReason::DeleteForbidden,
            }),
        }
    }
}

/// A complete rule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Rules in registration order.
    pub rules: Vec<RuleSpec>,
    /// Operations every rule must declare explicitly.
    #[serde(default)]
    pub required_operations: Vec<Operation>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            rules: vec![
                RuleSpec::undeletable("/users/{uid}", Predicate::Public, Predicate::owner_of_uid()),
                RuleSpec::undeletable(
                    "/users/{uid}/user_meta/private",
                    Predicate::owner_of_uid(),
                    Predicate::owner_of_uid(),
                ),
                RuleSpec::undeletable(
                    "/users/{uid}/user_meta/settings",
                    Predicate::Public,
                    Predicate::owner_of_uid(),
                ),
                RuleSpec::undeletable(
                    "/settings/admins",
                    Predicate::Public,
                    Predicate::AdminBootstrap(AdminBootstrap::default()),
                ),
            ],
            required_operations: Operation::ALL.to_vec(),
        }
    }
}

impl RegistryConfig {
    /// Decode a rule table from JSON.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and decode a rule table file.
    pub fn from_file(path: impl AsRef<FsPath>) -> Result<Self, RegistryError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }

    /// Load the table named by `DOCGATE_RULES`, or the default table when unset.
    pub fn from_env() -> Result<Self, RegistryError> {
        match std::env::var(RULES_ENV_VAR) {
            Ok(file) if !file.is_empty() => {
                info!(file = %file, "Loading rule table");
                Self::from_file(file)
            }
            _ => Ok(Self::default()),
        }
    }
}

/// Tuning for [`guarded_write`](crate::guarded_write).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitConfig {
    /// Snapshot-evaluate-commit attempts before giving up on contention.
    pub max_attempts: u32,
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_table_round_trips_through_json() {
        let config = RegistryConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(RegistryConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_from_json_partial_rule() {
        let raw = json!({
            "rules": [
                { "template": "/posts/{pid}", "read": { "kind": "public" } }
            ]
        })
        .to_string();
        let config = RegistryConfig::from_json(&raw).unwrap();
        assert!(config.required_operations.is_empty());

        let rule = config.rules[0].to_rule().unwrap();
        assert_eq!(rule.predicate(Operation::Read), Some(&Predicate::Public));
        assert!(rule.predicate(Operation::Delete).is_none());
    }

    #[test]
    fn test_from_json_rejects_unknown_predicate() {
        let raw = r#"{ "rules": [ { "template": "/a", "read": { "kind": "sometimes" } } ] }"#;
        assert!(matches!(RegistryConfig::from_json(raw), Err(RegistryError::Config(_))));
    }

    #[test]
    fn test_from_file_missing() {
        let missing = std::env::temp_dir().join("docgate-no-such-rules.json");
        assert!(matches!(RegistryConfig::from_file(missing), Err(RegistryError::Io(_))));
    }

    #[test]
    fn test_from_file_reads_table() {
        let file = std::env::temp_dir().join(format!("docgate-rules-{}.json", std::process::id()));
        std::fs::write(&file, serde_json::to_string(&RegistryConfig::default()).unwrap()).unwrap();
        let config = RegistryConfig::from_file(&file).unwrap();
        std::fs::remove_file(&file).ok();
        assert_eq!(config.rules.len(), 4);
    }

    // The only test that touches DOCGATE_RULES, so the steps run in sequence.
    #[test]
    fn test_from_env_selects_rule_table() {
        std::env::remove_var(RULES_ENV_VAR);
        assert_eq!(RegistryConfig::from_env().unwrap(), RegistryConfig::default());

        std::env::set_var(RULES_ENV_VAR, "");
        assert_eq!(RegistryConfig::from_env().unwrap(), RegistryConfig::default());

        let file = std::env::temp_dir().join(format!("docgate-env-rules-{}.json", std::process::id()));
        let table = json!({
            "rules": [
                { "template": "/posts/{pid}", "read": { "kind": "public" } }
            ]
        });
        std::fs::write(&file, table.to_string()).unwrap();
        std::env::set_var(RULES_ENV_VAR, &file);
        let loaded = RegistryConfig::from_env();
        std::fs::remove_file(&file).ok();
        let loaded = loaded.unwrap();
        assert_eq!(loaded.rules.len(), 1);
        assert_eq!(loaded.rules[0].template, "/posts/{pid}");

        std::env::set_var(RULES_ENV_VAR, &file);
        let missing = RegistryConfig::from_env();
        std::env::remove_var(RULES_ENV_VAR);
        assert!(matches!(missing, Err(RegistryError::Io(_))));
    }

    #[test]
    fn test_commit_config_default() {
        assert_eq!(CommitConfig::default().max_attempts, 3);
        let config: CommitConfig = serde_json::from_value(json!({ "max_attempts": 5 })).unwrap();
        assert_eq!(config.max_attempts, 5);
    }
}
