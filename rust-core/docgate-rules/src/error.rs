// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Configuration-time error types for DocGate.
//
// Authorization failures are not errors: they are `Decision::Deny` values.
// Everything here is raised while parsing paths or building a rule registry,
// and a registry error must stop initialization before any request is served.

use thiserror::Error;

use crate::context::Operation;

/// Errors raised while parsing a concrete document path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The path has no segments at all.
    #[error("empty document path")]
    Empty,

    /// The path contains an empty segment (e.g. `users//apple`).
    #[error("empty segment at position {position} in path '{path}'")]
    EmptySegment {
        /// The path as supplied.
        path: String,
        /// Zero-based index of the offending segment.
        position: usize,
    },

    /// A pre-split segment contains the `/` separator.
    #[error("segment '{segment}' at position {position} contains '/'")]
    SeparatorInSegment {
        /// The offending segment.
        segment: String,
        /// Zero-based index of the offending segment.
        position: usize,
    },
}

/// Errors raised while building a [`RuleRegistry`](crate::RuleRegistry).
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A template string could not be parsed.
    #[error("invalid template '{template}': {message}")]
    InvalidTemplate {
        /// The template as written.
        template: String,
        /// What was wrong with it.
        message: String,
    },

    /// Two rules share a structurally identical template.
    #[error("duplicate template '{0}'")]
    DuplicateTemplate(String),

    /// Two templates overlap and neither is more specific than the other.
    #[error("ambiguous templates '{first}' and '{second}' match the same paths with equal specificity")]
    AmbiguousTemplates {
        /// The rule registered first.
        first: String,
        /// The rule registered later.
        second: String,
    },

    /// A rule leaves a required operation without an explicit predicate.
    #[error("template '{template}' has no predicate for required operation {operation}")]
    MissingPredicate {
        /// Template of the incomplete rule.
        template: String,
        /// The operation it does not cover.
        operation: Operation,
    },

    /// An ownership predicate refers to a variable its template never binds.
    #[error("template '{template}' does not bind variable '{variable}'")]
    UnboundVariable {
        /// Template of the offending rule.
        template: String,
        /// The variable named by the predicate.
        variable: String,
    },

    /// The rule table could not be decoded.
    #[error("rule config decode error: {0}")]
    Config(#[from] serde_json::Error),

    /// The rule table file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
