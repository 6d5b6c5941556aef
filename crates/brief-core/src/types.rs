use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Current values of one input panel, keyed by field name. Insertion order
/// is significant: it drives context-file ordering in the serialized prompt.
pub type PanelValues = IndexMap<String, FieldValue>;

// ---------------------------------------------------------------------------
// PanelKey
// ---------------------------------------------------------------------------

/// The two input panels of a flow: "situation" (A) and "target" (B).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PanelKey {
    #[serde(rename = "panelA")]
    A,
    #[serde(rename = "panelB")]
    B,
}

impl PanelKey {
    pub fn as_str(self) -> &'static str {
        match self {
            PanelKey::A => "panelA",
            PanelKey::B => "panelB",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PanelKey::A => "situation",
            PanelKey::B => "target",
        }
    }

    pub fn from_key(key: &str) -> Option<PanelKey> {
        match key {
            "panelA" => Some(PanelKey::A),
            "panelB" => Some(PanelKey::B),
            _ => None,
        }
    }
}

impl fmt::Display for PanelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// FieldValue
// ---------------------------------------------------------------------------

/// A panel field's current value. `List` fields are file attachments;
/// everything else is a scalar answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Text(String),
    Number(f64),
    List(Vec<String>),
}

impl FieldValue {
    /// Whether the value carries content. Numbers always do; lists must be
    /// non-empty; text must have non-whitespace content.
    pub fn is_present(&self) -> bool {
        match self {
            FieldValue::Null => false,
            FieldValue::Text(t) => !t.trim().is_empty(),
            FieldValue::Number(_) => true,
            FieldValue::List(items) => !items.is_empty(),
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Null
    }
}

// ---------------------------------------------------------------------------
// ParamValue
// ---------------------------------------------------------------------------

/// A scalar step parameter carried from the step template into the prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Text(String),
    Number(f64),
    Flag(bool),
}

impl ParamValue {
    /// Empty parameters are skipped by the serializer.
    pub fn is_empty(&self) -> bool {
        match self {
            ParamValue::Text(t) => t.trim().is_empty(),
            ParamValue::Number(_) | ParamValue::Flag(_) => false,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(t) => f.write_str(t),
            ParamValue::Number(n) => write!(f, "{n}"),
            ParamValue::Flag(b) => write!(f, "{b}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
