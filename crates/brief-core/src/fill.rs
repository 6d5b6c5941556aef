use crate::types::{FieldValue, PanelValues};
use regex::Regex;
use std::sync::OnceLock;

static SOURCE_RE: OnceLock<Regex> = OnceLock::new();

fn source_re() -> &'static Regex {
    SOURCE_RE.get_or_init(|| Regex::new(r"^(panelA|panelB)\.([A-Za-z][A-Za-z0-9_]*)$").unwrap())
}

/// Decide whether the field referenced by a step template's `source` counts
/// as filled. Gates conditional step generation.
///
/// An absent source means the step is unconditional. A malformed source, a
/// missing field, or a null value all degrade to "not filled"; this never
/// errors.
pub fn is_filled(source: Option<&str>, panel_a: &PanelValues, panel_b: &PanelValues) -> bool {
    let Some(source) = source else {
        return true;
    };
    let Some(caps) = source_re().captures(source) else {
        return false;
    };
    let panel = match &caps[1] {
        "panelA" => panel_a,
        _ => panel_b,
    };
    match panel.get(&caps[2]) {
        None | Some(FieldValue::Null) => false,
        Some(value) => value.is_present(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
