use crate::fill::is_filled;
use crate::flow::{FlowTemplate, StepTemplate};
use crate::types::{PanelValues, ParamValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// A concrete, user-editable instance of a step template.
///
/// Template-derived fields are refreshed on every regeneration; the
/// user-owned fields (`lenses` once `lenses_overridden` is set,
/// `name_provided`, `output_selected`) survive it via reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub operation: String,
    pub object: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub params: IndexMap<String, ParamValue>,
    /// Effective lens set: the template's copy until the user overrides it.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lenses: Vec<String>,
    /// Set when the user has edited the lens set, including clearing it to
    /// empty. Distinguishes an explicit empty selection from a template
    /// that never defined lenses.
    #[serde(default, rename = "lensesOverridden", skip_serializing_if = "std::ops::Not::not")]
    pub lenses_overridden: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output: Vec<String>,
    #[serde(default, rename = "branchName", skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
    #[serde(default, rename = "prName", skip_serializing_if = "Option::is_none")]
    pub pr_name: Option<String>,
    #[serde(default, rename = "fileName", skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Free text typed by the user (branch name, PR title, file name).
    #[serde(default, rename = "nameProvided", skip_serializing_if = "String::is_empty")]
    pub name_provided: String,
    /// Delivery mode chosen from the template's `output` options.
    #[serde(default, rename = "outputSelected", skip_serializing_if = "Option::is_none")]
    pub output_selected: Option<String>,
}

impl Step {
    /// Build a fresh step from a template. Collections are cloned by value,
    /// so mutating the step can never reach back into the template.
    pub fn from_template(template: &StepTemplate) -> Step {
        Step {
            id: template.id.clone(),
            operation: template.operation.clone(),
            object: template.object.clone(),
            source: template.source.clone(),
            params: template.params.clone(),
            lenses: template.lenses.clone(),
            lenses_overridden: false,
            output: template.output.clone(),
            branch_name: template.branch_name.clone(),
            pr_name: template.pr_name.clone(),
            file_name: template.file_name.clone(),
            name_provided: String::new(),
            output_selected: None,
        }
    }
}

// ---------------------------------------------------------------------------
// generate()
// ---------------------------------------------------------------------------

/// Expand a flow template against current panel values into concrete steps.
///
/// Template order is preserved; it defines execution order in the final
/// prompt. Conditional templates whose source field is not filled are
/// skipped. Pure and deterministic.
pub fn generate(flow: &FlowTemplate, panel_a: &PanelValues, panel_b: &PanelValues) -> Vec<Step> {
    flow.steps
        .iter()
        .filter(|template| is_filled(template.source.as_deref(), panel_a, panel_b))
        .map(Step::from_template)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
