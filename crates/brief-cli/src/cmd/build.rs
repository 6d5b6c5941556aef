use crate::cmd::{load_flow, prepare_store};
use crate::output::print_json;
use brief_core::score::{score, Band};
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

    if json {
        let value = score(&snapshot.state);
        let payload = serde_json::json!({
            "flow": flow.id,
            "prompt": snapshot.prompt,
            "score": value,
            "band": Band::for_score(value).label(),
        });
        print_json(&payload)?;
        return Ok(());
    }

    if snapshot.prompt.is_empty() {
        anyhow::bail!(
            "prompt is empty: no target repository. Set configuration.owner and \
             configuration.repo in the answers file, or run 'taskbrief session set'"
        );
    }
    println!("{}", snapshot.prompt);
    Ok(())
}
