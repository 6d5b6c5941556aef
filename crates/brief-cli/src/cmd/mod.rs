pub mod build;
pub mod flows;
pub mod score;
pub mod session;
pub mod steps;

use anyhow::Context;
use brief_core::flow::FlowTemplate;
use brief_core::session::SessionRecord;
use brief_core::store::Store;
use brief_core::types::FieldValue;
use brief_core::BriefError;
use std::path::Path;
use tracing::{debug, warn};

/// Resolve a flow reference: a builtin id first, then a template file path.
pub fn load_flow(flow_ref: &str) -> anyhow::Result<FlowTemplate> {
    match FlowTemplate::builtin(flow_ref) {
        Ok(flow) => Ok(flow),
        Err(BriefError::UnknownFlow(_)) => {
            let path = Path::new(flow_ref);
            if path.exists() {
                FlowTemplate::load(path)
                    .with_context(|| format!("failed to load flow template {}", path.display()))
            } else {
                Err(BriefError::UnknownFlow(flow_ref.to_string()).into())
            }
        }
        Err(e) => Err(e.into()),
    }
}

/// Build the store for one invocation: hydrate the persisted session,
/// switch to the flow, apply the answers file.
pub fn prepare_store(
    session_path: &Path,
    flow: &FlowTemplate,
    answers: Option<&Path>,
) -> anyhow::Result<Store> {
    let session = SessionRecord::load(session_path);
    if session.is_none() && session_path.exists() {
        warn!(
            "ignoring unreadable session file at {}",
            session_path.display()
        );
    }
    let mut store = Store::new(session);
    store.switch_flow(flow);
    if let Some(path) = answers {
        apply_answers(&mut store, path)?;
    }
    Ok(store)
}

/// Apply an answers file: a YAML mapping of dotted field paths to values,
/// written through the store in file order.
fn apply_answers(store: &mut Store, path: &Path) -> anyhow::Result<()> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answers file {}", path.display()))?;
    let mapping: serde_yaml::Mapping = serde_yaml::from_str(&data)
        .with_context(|| format!("answers file {} is not a mapping", path.display()))?;

    for (key, value) in mapping {
        let serde_yaml::Value::String(field_path) = key else {
            anyhow::bail!("answers file keys must be dotted field paths");
        };
        let field_value = to_field_value(&value)
            .with_context(|| format!("unsupported value for '{field_path}'"))?;
        store
            .write_path(&field_path, field_value)
            .with_context(|| format!("failed to apply answer '{field_path}'"))?;
        debug!("applied answer {field_path}");
    }
    Ok(())
}

fn to_field_value(value: &serde_yaml::Value) -> anyhow::Result<FieldValue> {
    match value {
        serde_yaml::Value::Null => Ok(FieldValue::Null),
        serde_yaml::Value::String(s) => Ok(FieldValue::Text(s.clone())),
        serde_yaml::Value::Number(n) => Ok(FieldValue::Number(n.as_f64().unwrap_or(0.0))),
        serde_yaml::Value::Sequence(items) => {
            let mut list = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    serde_yaml::Value::String(s) => list.push(s.clone()),
                    other => anyhow::bail!("list entries must be strings, got {other:?}"),
                }
            }
            Ok(FieldValue::List(list))
        }
        other => anyhow::bail!("expected text, number, list, or null, got {other:?}"),
    }
}
