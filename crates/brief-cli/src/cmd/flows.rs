use crate::output::{print_json, print_table};
use brief_core::flow::FlowTemplate;
use brief_core::score::weights_for;

pub fn run(json: bool) -> anyhow::Result<()> {
    let mut flows = Vec::new();
    for id in FlowTemplate::builtin_ids() {
        flows.push(FlowTemplate::builtin(id)?);
    }

    if json {
        let payload: Vec<serde_json::Value> = flows
            .iter()
            .map(|flow| {
                let weights: Vec<serde_json::Value> = weights_for(&flow.id)
                    .unwrap_or_default()
                    .iter()
                    .map(|w| {
                        serde_json::json!({
                            "field": w.target.to_string(),
                            "kind": w.kind.as_str(),
                            "weight": w.weight,
                        })
                    })
                    .collect();
                serde_json::json!({
                    "id": flow.id,
                    "title": flow.title,
                    "steps": flow.steps.len(),
                    "weights": weights,
                })
            })
            .collect();
        print_json(&payload)?;
        return Ok(());
    }

    let rows: Vec<Vec<String>> = flows
        .iter()
        .map(|flow| {
            let weighted = weights_for(&flow.id).map(|w| w.len()).unwrap_or(0);
            vec![
                flow.id.clone(),
                flow.title.clone(),
                flow.steps.len().to_string(),
                weighted.to_string(),
            ]
        })
        .collect();
    print_table(&["ID", "TITLE", "STEPS", "WEIGHTED FIELDS"], &rows);
    Ok(())
}
