use crate::flow::FieldKind;
use crate::state::CanonicalState;
use crate::types::{FieldValue, PanelKey};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Band
// ---------------------------------------------------------------------------

/// Severity band for a completeness score. Bands are ordered, with fixed,
/// non-overlapping lower bounds; every score falls into exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Poor,
    Minimal,
    Basic,
    Good,
    Strong,
    Excellent,
}

impl Band {
    pub fn all() -> &'static [Band] {
        &[
            Band::Poor,
            Band::Minimal,
            Band::Basic,
            Band::Good,
            Band::Strong,
            Band::Excellent,
        ]
    }

    pub fn lower_bound(self) -> u8 {
        match self {
            Band::Poor => 0,
            Band::Minimal => 51,
            Band::Basic => 61,
            Band::Good => 71,
            Band::Strong => 81,
            Band::Excellent => 91,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Band::Poor => "Poor",
            Band::Minimal => "Minimal",
            Band::Basic => "Basic",
            Band::Good => "Good",
            Band::Strong => "Strong",
            Band::Excellent => "Excellent",
        }
    }

    /// Map a score to its band, evaluated from the highest bound downward.
    pub fn for_score(score: u8) -> Band {
        for band in Band::all().iter().rev() {
            if score >= band.lower_bound() {
                return *band;
            }
        }
        Band::Poor
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Weight tables
// ---------------------------------------------------------------------------

/// What a weighted field points at inside the canonical state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreTarget {
    /// A named panel field.
    Panel(PanelKey, &'static str),
    /// The free-text notes section.
    Notes,
    /// The lens selection across enabled steps: filled once any step
    /// carries a non-empty effective lens set.
    Lenses,
}

impl fmt::Display for ScoreTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreTarget::Panel(key, name) => write!(f, "{key}.{name}"),
            ScoreTarget::Notes => f.write_str("notes.userText"),
            ScoreTarget::Lenses => f.write_str("steps.lenses"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WeightedField {
    pub target: ScoreTarget,
    pub kind: FieldKind,
    pub weight: u32,
}

const fn field(target: ScoreTarget, kind: FieldKind, weight: u32) -> WeightedField {
    WeightedField {
        target,
        kind,
        weight,
    }
}

const FIX_BUG: &[WeightedField] = &[
    field(ScoreTarget::Panel(PanelKey::A, "description"), FieldKind::FreeText, 25),
    field(ScoreTarget::Panel(PanelKey::A, "reproduction"), FieldKind::FreeText, 10),
    field(ScoreTarget::Panel(PanelKey::A, "files"), FieldKind::FileSelect, 15),
    field(ScoreTarget::Panel(PanelKey::B, "outcome"), FieldKind::FreeText, 20),
    field(ScoreTarget::Panel(PanelKey::B, "urgency"), FieldKind::Choice, 5),
    field(ScoreTarget::Lenses, FieldKind::LensSelect, 10),
    field(ScoreTarget::Notes, FieldKind::Notes, 15),
];

const NEW_FEATURE: &[WeightedField] = &[
    field(ScoreTarget::Panel(PanelKey::A, "description"), FieldKind::FreeText, 30),
    field(ScoreTarget::Panel(PanelKey::A, "files"), FieldKind::FileSelect, 10),
    field(ScoreTarget::Panel(PanelKey::A, "constraints"), FieldKind::FreeText, 10),
    field(ScoreTarget::Panel(PanelKey::B, "acceptance"), FieldKind::FreeText, 25),
    field(ScoreTarget::Panel(PanelKey::B, "priority"), FieldKind::Choice, 5),
    field(ScoreTarget::Lenses, FieldKind::LensSelect, 10),
    field(ScoreTarget::Notes, FieldKind::Notes, 10),
];

const REFACTOR: &[WeightedField] = &[
    field(ScoreTarget::Panel(PanelKey::A, "description"), FieldKind::FreeText, 25),
    field(ScoreTarget::Panel(PanelKey::A, "files"), FieldKind::FileSelect, 20),
    field(ScoreTarget::Panel(PanelKey::A, "pain_points"), FieldKind::FreeText, 10),
    field(ScoreTarget::Panel(PanelKey::B, "goal"), FieldKind::FreeText, 20),
    field(ScoreTarget::Panel(PanelKey::B, "risk_tolerance"), FieldKind::Choice, 5),
    field(ScoreTarget::Lenses, FieldKind::LensSelect, 10),
    field(ScoreTarget::Notes, FieldKind::Notes, 10),
];

const WRITE_TESTS: &[WeightedField] = &[
    field(ScoreTarget::Panel(PanelKey::A, "files"), FieldKind::FileSelect, 30),
    field(ScoreTarget::Panel(PanelKey::A, "behavior"), FieldKind::FreeText, 30),
    field(ScoreTarget::Panel(PanelKey::B, "framework"), FieldKind::Choice, 10),
    field(ScoreTarget::Panel(PanelKey::B, "coverage_focus"), FieldKind::Choice, 10),
    field(ScoreTarget::Lenses, FieldKind::LensSelect, 10),
    field(ScoreTarget::Notes, FieldKind::Notes, 10),
];

/// The weighted fields for a flow type, or `None` when the flow is
/// unrecognized (which scores 0).
pub fn weights_for(flow_id: &str) -> Option<&'static [WeightedField]> {
    match flow_id {
        "fix-bug" => Some(FIX_BUG),
        "new-feature" => Some(NEW_FEATURE),
        "refactor" => Some(REFACTOR),
        "write-tests" => Some(WRITE_TESTS),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// score()
// ---------------------------------------------------------------------------

/// Weighted completeness of the canonical state for its active flow,
/// rounded to an integer in [0, 100]. Monotonic: filling a field never
/// lowers the score.
pub fn score(state: &CanonicalState) -> u8 {
    let Some(weights) = weights_for(&state.task.flow_id) else {
        return 0;
    };
    let total: u32 = weights.iter().map(|w| w.weight).sum();
    if total == 0 {
        return 0;
    }
    let filled: u32 = weights
        .iter()
        .filter(|w| target_filled(state, w.target))
        .map(|w| w.weight)
        .sum();
    (100.0 * f64::from(filled) / f64::from(total)).round() as u8
}

fn target_filled(state: &CanonicalState, target: ScoreTarget) -> bool {
    match target {
        ScoreTarget::Panel(key, name) => {
            let panel = match key {
                PanelKey::A => &state.panel_a,
                PanelKey::B => &state.panel_b,
            };
            match panel.get(name) {
                None | Some(FieldValue::Null) => false,
                Some(FieldValue::List(items)) => !items.is_empty(),
                // Identifier picks: zero means "nothing chosen yet".
                Some(FieldValue::Number(n)) => *n != 0.0,
                Some(FieldValue::Text(t)) => !t.trim().is_empty(),
            }
        }
        ScoreTarget::Notes => !state.notes.user_text.trim().is_empty(),
        ScoreTarget::Lenses => state
            .steps
            .enabled_steps
            .iter()
            .any(|s| !s.lenses.is_empty()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
