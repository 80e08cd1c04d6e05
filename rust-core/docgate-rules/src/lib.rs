// SPDX-License-Identifier: PMPL-1.0-or-later
//! DocGate Rules
//!
//! Access decisions for a hierarchical document store: given a document
//! path, an operation, the caller and the document's current state, decide
//! `Allow` or `Deny(reason)`.
//!
//! - [`PathMatcher`] classifies concrete paths against `{var}` templates.
//! - [`RuleRegistry`] is the validated, immutable rule table.
//! - [`Predicate`] holds the per-operation checks, including ownership and
//!   the one-time [`AdminBootstrap`] root claim.
//! - [`evaluate`] / [`PolicyEvaluator`] tie them together.
//!
//! ```
//! use docgate_rules::{AuthContext, Decision, DenyReason, DocumentSnapshot, Operation, Path, PolicyEvaluator, RuleRegistry};
//!
//! let evaluator = PolicyEvaluator::new(RuleRegistry::standard().unwrap());
//! let decision = evaluator.evaluate(
//!     &Path::parse("/users/apple/user_meta/private").unwrap(),
//!     Operation::Read,
//!     &AuthContext::user("banana"),
//!     &DocumentSnapshot::existing(Default::default()),
//!     None,
//! );
//! assert_eq!(decision, Decision::Deny(DenyReason::NotOwner));
//! ```

pub mod audit;
pub mod bootstrap;
pub mod commit;
pub mod config;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod path;
pub mod predicate;
pub mod registry;

pub use audit::{AuditEntry, AuditLog};
pub use bootstrap::{AdminBootstrap, ROOT_ROLE};
pub use commit::{guarded_write, CommitError, ConditionalStore, Precondition};
pub use config::{CommitConfig, RegistryConfig, RuleSpec, RULES_ENV_VAR};
pub use context::{AccessRequest, AuthContext, DocumentSnapshot, Fields, Operation, ProposedData};
pub use error::{PathError, RegistryError};
pub use evaluator::{evaluate, Decision, DenyReason, PolicyEvaluator};
pub use path::{Bindings, Path, PathMatcher, PathTemplate, Segment};
pub use predicate::{ownership, Predicate, PredicateInput};
pub use registry::{Rule, RuleRegistry};
