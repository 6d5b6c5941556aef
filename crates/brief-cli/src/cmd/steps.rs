use crate::cmd::{load_flow, prepare_store};
use crate::output::{print_json, print_table};
use brief_core::prompt::render_step;
use std::path::Path;

pub fn run(
    session_path: &Path,
    flow_ref: &str,
    answers: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let flow = load_flow(flow_ref)?;
    let store = prepare_store(session_path, &flow, answers)?;
    let snapshot = store.snapshot();
    let steps = &snapshot.state.steps.enabled_steps;

    if json {
        let payload = serde_json::json!({
            "flow": flow.id,
            "steps": steps,
            "removed": snapshot.state.steps.removed_step_ids,
        });
        print_json(&payload)?;
        return Ok(());
    }

    if steps.is_empty() {
        println!("No steps generated for flow '{}'.", flow.id);
        return Ok(());
    }

    let rows: Vec<Vec<String>> = steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            vec![
                (i + 1).to_string(),
                step.id.clone(),
                render_step(step),
                step.source.clone().unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    print_table(&["#", "ID", "STEP", "SOURCE"], &rows);
    Ok(())
}
