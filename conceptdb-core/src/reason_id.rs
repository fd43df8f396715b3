//! Reason identifiers.
//!
//! Every node of the justification graph is named by a [`ReasonId`]. The
//! textual form is path-like (`/assertion/<id>`, `/data/<dataset>/<suffix>`,
//! …) because that is what gets persisted and written to graph dumps, but
//! code dispatches on the variant, never on string prefixes.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::EntityKind;

/// A namespaced identifier for a reason, assertion, expression, or external node.
///
/// Parsing is total: any string maps to exactly one variant, and
/// `id.to_string().parse::<ReasonId>() == Ok(id)` for every parsed id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReasonId {
    /// `/assertion/<id>`
    Assertion(String),
    /// `/expression/<assertion>/<id>`
    Expression { assertion: String, expression: String },
    /// `/sentence/<id>`
    Sentence(String),
    /// `/data/<dataset>/<suffix>`: contributors, sites, activities, rules.
    External { dataset: String, suffix: String },
    /// `/c/<record-id>`: a reason conjunction materialised as a graph node.
    Conjunction(String),
    /// Anything else, kept verbatim.
    Named(String),
}

impl ReasonId {
    pub fn assertion(id: impl Into<String>) -> Self {
        Self::Assertion(id.into())
    }

    pub fn expression(assertion: impl Into<String>, expression: impl Into<String>) -> Self {
        Self::Expression {
            assertion: assertion.into(),
            expression: expression.into(),
        }
    }

    pub fn sentence(id: impl Into<String>) -> Self {
        Self::Sentence(id.into())
    }

    pub fn external(dataset: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self::External {
            dataset: dataset.into(),
            suffix: suffix.into(),
        }
    }

    pub fn conjunction(record_id: impl Into<String>) -> Self {
        Self::Conjunction(record_id.into())
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Parse the textual form. Never fails; unknown shapes become `Named`.
    pub fn parse(text: &str) -> Self {
        fn non_empty(s: &str) -> Option<&str> {
            (!s.is_empty()).then_some(s)
        }

        if let Some(rest) = text.strip_prefix("/assertion/").and_then(non_empty) {
            return Self::Assertion(rest.to_string());
        }
        if let Some(rest) = text.strip_prefix("/sentence/").and_then(non_empty) {
            return Self::Sentence(rest.to_string());
        }
        if let Some(rest) = text.strip_prefix("/c/").and_then(non_empty) {
            return Self::Conjunction(rest.to_string());
        }
        if let Some((head, tail)) = text.strip_prefix("/expression/").and_then(split_once_nonempty) {
            return Self::Expression {
                assertion: head.to_string(),
                expression: tail.to_string(),
            };
        }
        if let Some((head, tail)) = text.strip_prefix("/data/").and_then(split_once_nonempty) {
            return Self::External {
                dataset: head.to_string(),
                suffix: tail.to_string(),
            };
        }
        Self::Named(text.to_string())
    }

    /// Which resolver is responsible for this id.
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Assertion(_) => EntityKind::Assertion,
            Self::Expression { .. } => EntityKind::Expression,
            Self::Sentence(_) => EntityKind::Sentence,
            Self::External { .. } => EntityKind::ExternalReason,
            Self::Conjunction(_) => EntityKind::ReasonConjunction,
            Self::Named(_) => EntityKind::Named,
        }
    }

    /// The dataset an external reason belongs to, as a `/data/<name>` path.
    pub fn dataset(&self) -> Option<String> {
        match self {
            Self::External { dataset, .. } => Some(format!("/data/{dataset}")),
            _ => None,
        }
    }
}

/// Split `a/b...` into (`a`, `b...`) when both halves are non-empty.
fn split_once_nonempty(s: &str) -> Option<(&str, &str)> {
    let (head, tail) = s.split_once('/')?;
    (!head.is_empty() && !tail.is_empty()).then_some((head, tail))
}

impl fmt::Display for ReasonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assertion(id) => write!(f, "/assertion/{id}"),
            Self::Expression {
                assertion,
                expression,
            } => write!(f, "/expression/{assertion}/{expression}"),
            Self::Sentence(id) => write!(f, "/sentence/{id}"),
            Self::External { dataset, suffix } => write!(f, "/data/{dataset}/{suffix}"),
            Self::Conjunction(id) => write!(f, "/c/{id}"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

impl FromStr for ReasonId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for ReasonId {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<&str> for ReasonId {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<ReasonId> for String {
    fn from(value: ReasonId) -> Self {
        value.to_string()
    }
}
