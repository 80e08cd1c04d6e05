// SPDX-License-Identifier: PMPL-1.0-or-later
//! Document paths, path templates and template matching.
//!
//! A [`PathTemplate`] such as `/users/{uid}/user_meta/private` matches a
//! concrete [`Path`] of the same length when every literal segment is equal;
//! variable segments bind unconditionally. When several templates match, the
//! one with more literal segments wins. Ties are rejected when the
//! [`PathMatcher`] is built, never at request time.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PathError, RegistryError};

/// Variable bindings produced by a successful match, keyed by variable name.
pub type Bindings = BTreeMap<String, String>;

/// A concrete document path, e.g. `users/apple/user_meta/private`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    /// Parse a slash-separated path.
    ///
    /// A leading slash is optional and a single trailing slash is ignored.
    /// Empty inner segments are rejected.
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let segments = split_segments(raw).map_err(|position| PathError::EmptySegment {
            path: raw.to_string(),
            position,
        })?;
        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        Ok(Self {
            segments: segments.into_iter().map(str::to_string).collect(),
        })
    }

    /// Build a path from already-split segments.
    ///
    /// Segments must be non-empty and must not contain `/`, so the result
    /// always equals `Path::parse` of its own display form.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        if let Some(position) = segments.iter().position(String::is_empty) {
            return Err(PathError::EmptySegment {
                path: segments.join("/"),
                position,
            });
        }
        if let Some(position) = segments.iter().position(|s| s.contains('/')) {
            return Err(PathError::SeparatorInSegment {
                segment: segments[position].clone(),
                position,
            });
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl TryFrom<String> for Path {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Path::parse(&value)
    }
}

impl From<Path> for String {
    fn from(path: Path) -> Self {
        path.to_string()
    }
}

/// Split on `/`, dropping one leading and one trailing slash.
/// Returns the index of the first empty segment on failure.
fn split_segments(raw: &str) -> Result<Vec<&str>, usize> {
    let trimmed = raw.strip_prefix('/').unwrap_or(raw);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let segments: Vec<&str> = trimmed.split('/').collect();
    match segments.iter().position(|s| s.is_empty()) {
        Some(position) => Err(position),
        None => Ok(segments),
    }
}

/// One segment of a [`PathTemplate`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Must equal the path segment exactly.
    Literal(String),
    /// Binds the path segment under this name.
    Variable(String),
}

impl Segment {
    pub fn is_literal(&self) -> bool {
        matches!(self, Segment::Literal(_))
    }
}

/// A path pattern whose segments are literals or `{name}` variables.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parse a template such as `/users/{uid}/user_meta/settings`.
    pub fn parse(raw: &str) -> Result<Self, RegistryError> {
        let invalid = |message: String| RegistryError::InvalidTemplate {
            template: raw.to_string(),
            message,
        };

        let parts = split_segments(raw)
            .map_err(|position| invalid(format!("empty segment at position {}", position)))?;
        if parts.is_empty() {
            return Err(invalid("template has no segments".to_string()));
        }

        let mut segments = Vec::with_capacity(parts.len());
        let mut seen = Vec::new();
        for part in parts {
            if let Some(name) = part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                    return Err(invalid(format!("bad variable name '{}'", name)));
                }
                if seen.contains(&name) {
                    return Err(invalid(format!("variable '{}' bound twice", name)));
                }
                seen.push(name);
                segments.push(Segment::Variable(name.to_string()));
            } else if part.contains('{') || part.contains('}') {
                return Err(invalid(format!("stray brace in segment '{}'", part)));
            } else {
                segments.push(Segment::Literal(part.to_string()));
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The template as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of literal segments; higher means more specific.
    pub fn literal_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_literal()).count()
    }

    /// Whether the template binds a variable called `name`.
    pub fn binds(&self, name: &str) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Variable(v) if v == name))
    }

    /// Match a concrete path, returning the variable bindings on success.
    pub fn matches(&self, path: &Path) -> Option<Bindings> {
        if self.segments.len() != path.len() {
            return None;
        }
        let mut bindings = Bindings::new();
        for (segment, value) in self.segments.iter().zip(path.segments()) {
            match segment {
                Segment::Literal(lit) if lit != value => return None,
                Segment::Literal(_) => {}
                Segment::Variable(name) => {
                    bindings.insert(name.clone(), value.clone());
                }
            }
        }
        Some(bindings)
    }

    /// Same literals at the same positions, variables at the same positions.
    /// Variable names are ignored: `/users/{uid}` and `/users/{id}` are the same shape.
    pub fn same_shape(&self, other: &PathTemplate) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (Segment::Literal(a), Segment::Literal(b)) => a == b,
                    (Segment::Variable(_), Segment::Variable(_)) => true,
                    _ => false,
                })
    }

    /// Whether some concrete path would match both templates.
    pub fn overlaps(&self, other: &PathTemplate) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (Segment::Literal(a), Segment::Literal(b)) => a == b,
                    _ => true,
                })
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Resolves concrete paths against a fixed, validated set of templates.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    templates: Vec<PathTemplate>,
}

impl PathMatcher {
    /// Build a matcher, rejecting duplicate and ambiguous templates.
    ///
    /// Two templates are ambiguous when they overlap and have the same
    /// number of literal segments.
    pub fn new(templates: Vec<PathTemplate>) -> Result<Self, RegistryError> {
        for (i, first) in templates.iter().enumerate() {
            for second in &templates[i + 1..] {
                if first.same_shape(second) {
                    return Err(RegistryError::DuplicateTemplate(second.as_str().to_string()));
                }
                if first.overlaps(second) && first.literal_count() == second.literal_count() {
                    return Err(RegistryError::AmbiguousTemplates {
                        first: first.as_str().to_string(),
                        second: second.as_str().to_string(),
                    });
                }
            }
        }
        Ok(Self { templates })
    }

    pub fn templates(&self) -> &[PathTemplate] {
        &self.templates
    }

    /// Find the most specific template matching `path`.
    ///
    /// Returns the template's index in registration order plus its bindings,
    /// or `None` when nothing matches.
    pub fn resolve(&self, path: &Path) -> Option<(usize, Bindings)> {
        self.templates
            .iter()
            .enumerate()
            .filter_map(|(index, template)| {
                template
                    .matches(path)
                    .map(|bindings| (index, template.literal_count(), bindings))
            })
            .max_by_key(|(_, literals, _)| *literals)
            .map(|(index, _, bindings)| (index, bindings))
    }
}
