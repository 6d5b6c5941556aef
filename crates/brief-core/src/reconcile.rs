use crate::generate::Step;
use std::collections::HashMap;

/// Merge a freshly generated step list with the previous, possibly edited
/// list and the set of user-deleted step ids.
///
/// Template-derived fields always come from the fresh generation; user-owned
/// fields are overlaid from the matching prior step. Deleted ids stay
/// excluded until explicitly cleared by a flow switch. Output order mirrors
/// the generation order, so a conditional step that reappears lands at its
/// template-defined position.
pub fn reconcile(generated: Vec<Step>, current: &[Step], removed_ids: &[String]) -> Vec<Step> {
    let by_id: HashMap<&str, &Step> = current.iter().map(|s| (s.id.as_str(), s)).collect();

    generated
        .into_iter()
        .filter(|step| !removed_ids.iter().any(|id| id == &step.id))
        .map(|mut fresh| {
            if let Some(prev) = by_id.get(fresh.id.as_str()) {
                if prev.lenses_overridden {
                    fresh.lenses = prev.lenses.clone();
                    fresh.lenses_overridden = true;
                }
                fresh.name_provided = prev.name_provided.clone();
                fresh.output_selected = prev.output_selected.clone();
            }
            fresh
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
