use crate::error::{BriefError, Result};
use crate::types::{FieldValue, PanelValues, ParamValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// FieldKind / FieldSpec / PanelSpec
// ---------------------------------------------------------------------------

/// Widget family of an input field. Also used by the completeness scorer
/// to pick the fill rule for a weighted field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    FreeText,
    FileSelect,
    Choice,
    LensSelect,
    Notes,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::FreeText => "free_text",
            FieldKind::FileSelect => "file_select",
            FieldKind::Choice => "choice",
            FieldKind::LensSelect => "lens_select",
            FieldKind::Notes => "notes",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<FieldValue>,
    /// Required-group tag: fields sharing a tag are presented together.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

/// One panel of a flow: field name -> field spec, in presentation order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PanelSpec {
    pub fields: IndexMap<String, FieldSpec>,
}

impl PanelSpec {
    /// Initial panel values: each field's declared default, or `Null`.
    pub fn default_values(&self) -> PanelValues {
        self.fields
            .iter()
            .map(|(name, spec)| {
                let value = spec.default.clone().unwrap_or(FieldValue::Null);
                (name.clone(), value)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// StepTemplate
// ---------------------------------------------------------------------------

/// A potentially conditional unit of work defined by a flow. `source`
/// references a panel field (`panelA.files`); the step is generated only
/// while that field is filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepTemplate {
    pub id: String,
    pub operation: String,
    pub object: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub params: IndexMap<String, ParamValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lenses: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output: Vec<String>,
    #[serde(default, rename = "branchName", skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
    #[serde(default, rename = "prName", skip_serializing_if = "Option::is_none")]
    pub pr_name: Option<String>,
    #[serde(default, rename = "fileName", skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

// ---------------------------------------------------------------------------
// FlowTemplate
// ---------------------------------------------------------------------------

/// A named task type: two input panels plus an ordered list of step
/// templates. Read-only once loaded; generated steps never alias into it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowTemplate {
    pub id: String,
    pub title: String,
    #[serde(default, rename = "panelA")]
    pub panel_a: PanelSpec,
    #[serde(default, rename = "panelB")]
    pub panel_b: PanelSpec,
    #[serde(default)]
    pub steps: Vec<StepTemplate>,
}

/// Builtin flow catalog, embedded at compile time. Order here is the
/// presentation order of the flow picker.
const BUILTIN_FLOWS: &[(&str, &str)] = &[
    ("fix-bug", include_str!("../flows/fix-bug.yaml")),
    ("new-feature", include_str!("../flows/new-feature.yaml")),
    ("refactor", include_str!("../flows/refactor.yaml")),
    ("write-tests", include_str!("../flows/write-tests.yaml")),
];

impl FlowTemplate {
    /// Resolve a builtin flow by id.
    pub fn builtin(id: &str) -> Result<FlowTemplate> {
        let Some((_, yaml)) = BUILTIN_FLOWS.iter().find(|(fid, _)| *fid == id) else {
            return Err(BriefError::UnknownFlow(id.to_string()));
        };
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn builtin_ids() -> Vec<&'static str> {
        BUILTIN_FLOWS.iter().map(|(id, _)| *id).collect()
    }

    /// Load an external flow template file. Shape validation beyond what
    /// deserialization enforces is a build-time concern of the flow author.
    pub fn load(path: &Path) -> Result<FlowTemplate> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&data)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
