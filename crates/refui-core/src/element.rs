//! UI element types for the accessibility tree of the app under test.
//!
//! The tree is produced by the automation backend (see [`crate::axe`]) and
//! re-fetched on every query; nothing in this module caches it.

use serde::{Deserialize, Serialize};

/// One node of the accessibility hierarchy.
///
/// Elements form a tree via the `children` field. Field names follow the
/// JSON emitted by `axe describe-ui`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UIElement {
    /// The accessibility identifier (AXUniqueId), e.g. `generateButton`.
    #[serde(rename = "AXUniqueId", default)]
    pub identifier: Option<String>,

    /// The accessibility label (AXLabel). For static texts this is the
    /// displayed text.
    #[serde(rename = "AXLabel", default)]
    pub label: Option<String>,

    /// The current value (AXValue).
    #[serde(rename = "AXValue", default)]
    pub value: Option<String>,

    /// The element type as reported by the backend (e.g. "Button", "StaticText").
    #[serde(rename = "type", default)]
    pub element_type: Option<String>,

    /// Position and size in screen points.
    #[serde(default)]
    pub frame: Option<ElementFrame>,

    /// Nested elements.
    #[serde(default)]
    pub children: Vec<UIElement>,

    /// The accessibility role.
    #[serde(default)]
    pub role: Option<String>,

    /// Whether the element can currently receive touches. `None` means the
    /// backend did not report it, which is treated as hittable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hittable: Option<bool>,
}

impl UIElement {
    /// Returns true if this element is of the given kind.
    pub fn is_kind(&self, kind: ElementKind) -> bool {
        kind.matches(self.element_type.as_deref())
    }

    /// Returns false only when the backend explicitly reported the element
    /// as not hittable.
    pub fn is_hittable(&self) -> bool {
        self.hittable != Some(false)
    }

    /// Short human-readable description used in log and failure messages.
    pub fn describe(&self) -> String {
        let kind = self.element_type.as_deref().unwrap_or("Element");
        match (&self.identifier, &self.label) {
            (Some(id), Some(label)) => format!("{kind} '{id}' (\"{label}\")"),
            (Some(id), None) => format!("{kind} '{id}'"),
            (None, Some(label)) => format!("{kind} \"{label}\""),
            (None, None) => kind.to_string(),
        }
    }
}

/// The frame of a UI element. Origin is the top-left corner of the screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementFrame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ElementFrame {
    /// The center point, rounded to whole screen points.
    pub fn center(&self) -> (i32, i32) {
        (
            (self.x + self.width / 2.0).round() as i32,
            (self.y + self.height / 2.0).round() as i32,
        )
    }
}

/// The element kinds the scenarios query for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    StaticText,
    Button,
}

impl ElementKind {
    /// Checks a backend type string against this kind.
    ///
    /// Backends disagree on naming (`StaticText` vs `staticText`), so the
    /// comparison ignores ASCII case.
    pub fn matches(&self, element_type: Option<&str>) -> bool {
        match self {
            ElementKind::StaticText => {
                element_type.is_some_and(|t| t.eq_ignore_ascii_case("StaticText"))
            }
            ElementKind::Button => element_type.is_some_and(|t| t.eq_ignore_ascii_case("Button")),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::StaticText => "static text",
            ElementKind::Button => "button",
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flattens a hierarchy depth-first, parents before children.
pub fn flatten_elements(elements: &[UIElement]) -> Vec<&UIElement> {
    let mut result = Vec::new();
    collect_elements(elements, &mut result);
    result
}

fn collect_elements<'a>(elements: &'a [UIElement], result: &mut Vec<&'a UIElement>) {
    for element in elements {
        result.push(element);
        collect_elements(&element.children, result);
    }
}
