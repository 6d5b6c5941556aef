use crate::generate::Step;
use crate::types::PanelValues;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Canonical sections
// ---------------------------------------------------------------------------

/// Target repository and credential. `owner` and `access_token` are the two
/// persistence-eligible fields; everything else lives only for the session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub owner: String,
    #[serde(default, rename = "repoName")]
    pub repo_name: String,
    #[serde(default)]
    pub branch: String,
    #[serde(default, rename = "accessToken")]
    pub access_token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskSelection {
    #[serde(default, rename = "flowId")]
    pub flow_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepsState {
    #[serde(default, rename = "enabledSteps")]
    pub enabled_steps: Vec<Step>,
    /// Ids the user deleted. Cleared only by an explicit flow switch.
    #[serde(default, rename = "removedStepIds")]
    pub removed_step_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notes {
    #[serde(default, rename = "userText")]
    pub user_text: String,
}

// ---------------------------------------------------------------------------
// CanonicalState
// ---------------------------------------------------------------------------

/// The single canonical input model. Mutated only through the store's write
/// entry points; read through frozen snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalState {
    #[serde(default)]
    pub configuration: Configuration,
    #[serde(default, rename = "panelA")]
    pub panel_a: PanelValues,
    #[serde(default, rename = "panelB")]
    pub panel_b: PanelValues,
    #[serde(default)]
    pub task: TaskSelection,
    #[serde(default)]
    pub steps: StepsState,
    #[serde(default)]
    pub notes: Notes,
}

// ---------------------------------------------------------------------------
// StatePatch
// ---------------------------------------------------------------------------

/// Explicit partial update: `Some` fields are applied, `None` fields leave
/// the state untouched. Panel patches merge per key; scalar and array
/// fields replace wholesale.
#[derive(Debug, Clone, Default)]
pub struct StatePatch {
    pub configuration: ConfigurationPatch,
    pub panel_a: Option<PanelValues>,
    pub panel_b: Option<PanelValues>,
    pub flow_id: Option<String>,
    pub enabled_steps: Option<Vec<Step>>,
    pub removed_step_ids: Option<Vec<String>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigurationPatch {
    pub owner: Option<String>,
    pub repo_name: Option<String>,
    pub branch: Option<String>,
    pub access_token: Option<String>,
}

impl StatePatch {
    /// Whether applying this patch touches a persistence-eligible field.
    pub fn touches_session(&self) -> bool {
        self.configuration.owner.is_some() || self.configuration.access_token.is_some()
    }

    pub fn apply(self, state: &mut CanonicalState) {
        let c = self.configuration;
        if let Some(v) = c.owner {
            state.configuration.owner = v;
        }
        if let Some(v) = c.repo_name {
            state.configuration.repo_name = v;
        }
        if let Some(v) = c.branch {
            state.configuration.branch = v;
        }
        if let Some(v) = c.access_token {
            state.configuration.access_token = v;
        }
        if let Some(map) = self.panel_a {
            merge_panel(&mut state.panel_a, map);
        }
        if let Some(map) = self.panel_b {
            merge_panel(&mut state.panel_b, map);
        }
        if let Some(v) = self.flow_id {
            state.task.flow_id = v;
        }
        if let Some(v) = self.enabled_steps {
            state.steps.enabled_steps = v;
        }
        if let Some(v) = self.removed_step_ids {
            state.steps.removed_step_ids = v;
        }
        if let Some(v) = self.notes {
            state.notes.user_text = v;
        }
    }
}

fn merge_panel(target: &mut PanelValues, patch: PanelValues) {
    for (name, value) in patch {
        target.insert(name, value);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
