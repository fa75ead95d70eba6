//! Element queries and typed predicates over the accessibility tree.
//!
//! An [`ElementQuery`] locates zero or one element by kind plus identifier or
//! text. A [`Predicate`] is a field selector, a comparison operator and a
//! literal; it replaces query strings assembled by interpolation, so a
//! literal containing quotes or operators is always compared verbatim.
//!
//! Queries run against a tree snapshot that the caller just fetched; they
//! hold no state between calls.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::element::{flatten_elements, ElementKind, UIElement};

/// Errors from building a query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The field name does not name a queryable element attribute.
    #[error("unknown element field '{0}' (expected identifier, label or value)")]
    UnknownField(String),
}

/// How an [`ElementQuery`] selects among elements of its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Displayed content (label, falling back to value) equals the text.
    Text(String),
    /// Identifier equals the string; if no element matches, label equals it.
    IdentifierOrLabel(String),
    /// Identifier equals the string.
    Identifier(String),
}

/// A (kind, identifier-or-text) lookup in the current UI tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementQuery {
    pub kind: ElementKind,
    pub selector: Selector,
}

impl ElementQuery {
    /// A static text whose displayed content equals `text`.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: ElementKind::StaticText,
            selector: Selector::Text(text.into()),
        }
    }

    /// A button found by accessibility identifier first, then by title.
    pub fn button(identifier_or_label: impl Into<String>) -> Self {
        Self {
            kind: ElementKind::Button,
            selector: Selector::IdentifierOrLabel(identifier_or_label.into()),
        }
    }

    /// An element of `kind` with the given accessibility identifier.
    pub fn identified(kind: ElementKind, identifier: impl Into<String>) -> Self {
        Self {
            kind,
            selector: Selector::Identifier(identifier.into()),
        }
    }

    /// Returns the first matching element, searching depth-first.
    pub fn find(&self, tree: &[UIElement]) -> Option<UIElement> {
        match &self.selector {
            Selector::Text(text) => search(tree, self.kind, &|e| content_equals(e, text)),
            Selector::Identifier(id) => {
                search(tree, self.kind, &|e| e.identifier.as_deref() == Some(id.as_str()))
            }
            Selector::IdentifierOrLabel(s) => {
                let wanted = Some(s.as_str());
                search(tree, self.kind, &|e| e.identifier.as_deref() == wanted)
                    .or_else(|| search(tree, self.kind, &|e| e.label.as_deref() == wanted))
            }
        }
    }
}

impl fmt::Display for ElementQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.selector {
            Selector::Text(text) => write!(f, "{} \"{}\"", self.kind, text),
            Selector::Identifier(id) => write!(f, "{} '{}'", self.kind, id),
            Selector::IdentifierOrLabel(s) => write!(f, "{} '{}'", self.kind, s),
        }
    }
}

fn content_equals(element: &UIElement, text: &str) -> bool {
    element.label.as_deref() == Some(text) || element.value.as_deref() == Some(text)
}

fn search(
    elements: &[UIElement],
    kind: ElementKind,
    accept: &dyn Fn(&UIElement) -> bool,
) -> Option<UIElement> {
    flatten_elements(elements)
        .into_iter()
        .find(|&e| e.is_kind(kind) && accept(e))
        .cloned()
}

/// An element attribute a [`Predicate`] can inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementField {
    Identifier,
    Label,
    Value,
}

impl ElementField {
    fn get<'a>(&self, element: &'a UIElement) -> Option<&'a str> {
        match self {
            ElementField::Identifier => element.identifier.as_deref(),
            ElementField::Label => element.label.as_deref(),
            ElementField::Value => element.value.as_deref(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementField::Identifier => "identifier",
            ElementField::Label => "label",
            ElementField::Value => "value",
        }
    }
}

impl FromStr for ElementField {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "identifier" => Ok(ElementField::Identifier),
            "label" => Ok(ElementField::Label),
            "value" => Ok(ElementField::Value),
            other => Err(QueryError::UnknownField(other.to_string())),
        }
    }
}

/// String comparison applied by a [`Predicate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equals,
    Contains,
    BeginsWith,
}

impl Comparison {
    fn apply(&self, actual: &str, literal: &str) -> bool {
        match self {
            Comparison::Equals => actual == literal,
            Comparison::Contains => actual.contains(literal),
            Comparison::BeginsWith => actual.starts_with(literal),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Comparison::Equals => "==",
            Comparison::Contains => "CONTAINS",
            Comparison::BeginsWith => "BEGINSWITH",
        }
    }
}

/// Field selector + operator + literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub field: ElementField,
    pub op: Comparison,
    pub literal: String,
}

impl Predicate {
    pub fn new(field: ElementField, op: Comparison, literal: impl Into<String>) -> Self {
        Self {
            field,
            op,
            literal: literal.into(),
        }
    }

    /// `field CONTAINS literal`.
    pub fn contains(field: ElementField, literal: impl Into<String>) -> Self {
        Self::new(field, Comparison::Contains, literal)
    }

    /// An element without the field never matches.
    pub fn matches(&self, element: &UIElement) -> bool {
        self.field
            .get(element)
            .is_some_and(|actual| self.op.apply(actual, &self.literal))
    }

    /// The first element of `kind` satisfying the predicate, depth-first.
    pub fn first_match(&self, kind: ElementKind, tree: &[UIElement]) -> Option<UIElement> {
        search(tree, kind, &|e| self.matches(e))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} '{}'", self.field.as_str(), self.op.as_str(), self.literal)
    }
}
