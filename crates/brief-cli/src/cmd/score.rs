use crate::cmd::{load_flow, prepare_store};
use crate::output::print_json;
use brief_core::score::{score, weights_for, Band};
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

    let value = score(&snapshot.state);
    let band = Band::for_score(value);

    if json {
        let payload = serde_json::json!({
            "flow": flow.id,
            "score": value,
            "band": band.label(),
        });
        print_json(&payload)?;
        return Ok(());
    }

    println!("{value}/100 ({band})");
    if weights_for(&flow.id).is_none() {
        println!("Note: flow '{}' has no weight table; score is always 0.", flow.id);
    }
    Ok(())
}
