use crate::error::{BriefError, Result};
use crate::flow::FlowTemplate;
use crate::generate::{generate, Step};
use crate::prompt;
use crate::reconcile::reconcile;
use crate::session::SessionRecord;
use crate::state::{CanonicalState, StatePatch};
use crate::types::{FieldValue, PanelKey};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Frozen view handed to readers and observers: the canonical fields plus
/// the derived prompt. Owned by the caller; mutating it never reaches the
/// store.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub state: CanonicalState,
    pub prompt: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

// ---------------------------------------------------------------------------
// WriteOp
// ---------------------------------------------------------------------------

/// A typed single-leaf mutation. Each variant addresses exactly one
/// canonical field, replacing the stringly-typed path scheme of a generic
/// key-value store; `Store::write_path` parses the documented dotted paths
/// into these for external consumers.
#[derive(Debug, Clone)]
pub enum WriteOp {
    Owner(String),
    RepoName(String),
    Branch(String),
    AccessToken(String),
    PanelField(PanelKey, String, FieldValue),
    FlowId(String),
    Notes(String),
    EnabledSteps(Vec<Step>),
    RemovedStepIds(Vec<String>),
    /// Replace a step's lens selection. Marks the step as lens-overridden,
    /// so an empty selection survives regeneration.
    StepLenses(String, Vec<String>),
    StepName(String, String),
    StepOutput(String, Option<String>),
    RemoveStep(String),
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

type Observer = Box<dyn FnMut(&Snapshot)>;
type PersistHook = Box<dyn FnMut(&SessionRecord)>;

/// The single canonical input model and its derived prompt.
///
/// An explicit owned handle: construct it at process start, pass it to
/// consumers, drop it at teardown. Fully synchronous; every write runs
/// mutate, step regeneration, prompt recompute, and observer notification
/// to completion before returning. In a multi-threaded host, confine the
/// store to one thread or wrap it in a single mutex.
pub struct Store {
    state: CanonicalState,
    flow: Option<FlowTemplate>,
    prompt: String,
    observers: Vec<(SubscriberId, Observer)>,
    next_subscriber: u64,
    persist_hook: Option<PersistHook>,
}

impl Store {
    /// Create a store from defaults, merging a previously persisted session
    /// record (owner and access token) when one hydrates cleanly.
    pub fn new(session: Option<SessionRecord>) -> Store {
        let mut state = CanonicalState::default();
        if let Some(record) = session {
            state.configuration.owner = record.owner;
            state.configuration.access_token = record.access_token;
        }
        let prompt = prompt::serialize(&state);
        Store {
            state,
            flow: None,
            prompt,
            observers: Vec::new(),
            next_subscriber: 0,
            persist_hook: None,
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state.clone(),
            prompt: self.prompt.clone(),
        }
    }

    /// The two persistence-eligible fields, packaged for the external
    /// persistence collaborator.
    pub fn session_record(&self) -> SessionRecord {
        SessionRecord {
            owner: self.state.configuration.owner.clone(),
            access_token: self.state.configuration.access_token.clone(),
            saved_at: None,
        }
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Apply one typed mutation, then recompute and notify.
    pub fn write(&mut self, op: WriteOp) {
        let touched_session = apply_op(&mut self.state, op);
        self.commit(touched_session);
    }

    /// Path-addressed write for consumers driving the store through the
    /// documented dotted scheme (`configuration.repo`, `panelA.description`,
    /// `notes.userText`). Scalar and array leaves only.
    pub fn write_path(&mut self, path: &str, value: FieldValue) -> Result<()> {
        let op = parse_path(path, value)?;
        self.write(op);
        Ok(())
    }

    /// Updater-function write: the closure inspects the current state and
    /// returns a partial patch, which is merged before the usual
    /// recompute-and-notify cycle.
    pub fn update(&mut self, updater: impl FnOnce(&CanonicalState) -> StatePatch) {
        let patch = updater(&self.state);
        let touched_session = patch.touches_session();
        patch.apply(&mut self.state);
        self.commit(touched_session);
    }

    /// Switch to a different flow. The one place `removed_step_ids` is
    /// cleared; panels are reseeded from the template's declared defaults
    /// and the step list is regenerated from scratch.
    pub fn switch_flow(&mut self, flow: &FlowTemplate) {
        self.state.task.flow_id = flow.id.clone();
        self.state.panel_a = flow.panel_a.default_values();
        self.state.panel_b = flow.panel_b.default_values();
        self.state.steps.enabled_steps.clear();
        self.state.steps.removed_step_ids.clear();
        self.flow = Some(flow.clone());
        self.commit(false);
    }

    /// Restore defaults, preserving exactly the owner identity and access
    /// token, then run the usual recompute-and-notify cycle.
    pub fn reset_session(&mut self) {
        let owner = std::mem::take(&mut self.state.configuration.owner);
        let token = std::mem::take(&mut self.state.configuration.access_token);
        self.state = CanonicalState::default();
        self.state.configuration.owner = owner;
        self.state.configuration.access_token = token;
        self.flow = None;
        self.commit(false);
    }

    // -----------------------------------------------------------------------
    // Observers
    // -----------------------------------------------------------------------

    /// Register an observer. Observers fire on every write, unconditionally,
    /// in registration order; deduplicating unchanged data is their job.
    pub fn subscribe(&mut self, observer: impl FnMut(&Snapshot) + 'static) -> SubscriberId {
        let id = SubscriberId(self.next_subscriber);
        self.next_subscriber += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) {
        self.observers.retain(|(oid, _)| *oid != id);
    }

    /// Install the "persist now" delegate, invoked after any write that
    /// touched a persistence-eligible field. The store itself does no I/O.
    pub fn on_persist(&mut self, hook: impl FnMut(&SessionRecord) + 'static) {
        self.persist_hook = Some(Box::new(hook));
    }

    // -----------------------------------------------------------------------
    // Commit cycle
    // -----------------------------------------------------------------------

    /// Regenerate canonical steps, recompute the derived prompt from
    /// scratch, then notify. The prompt is never patched incrementally; it
    /// is a pure function of the canonical fields, recomputed on every
    /// write so no observer can see it stale.
    fn commit(&mut self, touched_session: bool) {
        self.refresh_steps();
        self.prompt = prompt::serialize(&self.state);
        if touched_session {
            let record = self.session_record();
            if let Some(hook) = &mut self.persist_hook {
                hook(&record);
            }
        }
        let snapshot = self.snapshot();
        for (_, observer) in &mut self.observers {
            observer(&snapshot);
        }
    }

    fn refresh_steps(&mut self) {
        match &self.flow {
            Some(flow) => {
                let generated = generate(flow, &self.state.panel_a, &self.state.panel_b);
                let merged = reconcile(
                    generated,
                    &self.state.steps.enabled_steps,
                    &self.state.steps.removed_step_ids,
                );
                self.state.steps.enabled_steps = merged;
            }
            // Without a template there is nothing to regenerate, but the
            // removed-id invariant still holds for directly written steps.
            None => {
                let removed = std::mem::take(&mut self.state.steps.removed_step_ids);
                self.state
                    .steps
                    .enabled_steps
                    .retain(|s| !removed.contains(&s.id));
                self.state.steps.removed_step_ids = removed;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Mutation application
// ---------------------------------------------------------------------------

/// Apply one op. Returns whether a persistence-eligible field was touched.
fn apply_op(state: &mut CanonicalState, op: WriteOp) -> bool {
    match op {
        WriteOp::Owner(v) => {
            state.configuration.owner = v;
            return true;
        }
        WriteOp::AccessToken(v) => {
            state.configuration.access_token = v;
            return true;
        }
        WriteOp::RepoName(v) => state.configuration.repo_name = v,
        WriteOp::Branch(v) => state.configuration.branch = v,
        WriteOp::PanelField(key, name, value) => {
            let panel = match key {
                PanelKey::A => &mut state.panel_a,
                PanelKey::B => &mut state.panel_b,
            };
            panel.insert(name, value);
        }
        WriteOp::FlowId(v) => state.task.flow_id = v,
        WriteOp::Notes(v) => state.notes.user_text = v,
        WriteOp::EnabledSteps(steps) => state.steps.enabled_steps = steps,
        WriteOp::RemovedStepIds(ids) => state.steps.removed_step_ids = ids,
        WriteOp::StepLenses(id, lenses) => {
            if let Some(step) = find_step(state, &id) {
                step.lenses = lenses;
                step.lenses_overridden = true;
            }
        }
        WriteOp::StepName(id, name) => {
            if let Some(step) = find_step(state, &id) {
                step.name_provided = name;
            }
        }
        WriteOp::StepOutput(id, mode) => {
            if let Some(step) = find_step(state, &id) {
                step.output_selected = mode;
            }
        }
        WriteOp::RemoveStep(id) => {
            if !state.steps.removed_step_ids.contains(&id) {
                state.steps.removed_step_ids.push(id);
            }
        }
    }
    false
}

fn find_step<'a>(state: &'a mut CanonicalState, id: &str) -> Option<&'a mut Step> {
    state.steps.enabled_steps.iter_mut().find(|s| s.id == id)
}

// ---------------------------------------------------------------------------
// Path parsing
// ---------------------------------------------------------------------------

/// Parse a dotted field path plus a scalar/array value into a typed op.
fn parse_path(path: &str, value: FieldValue) -> Result<WriteOp> {
    let Some((head, rest)) = path.split_once('.') else {
        return match path {
            "notes" => Ok(WriteOp::Notes(expect_text(path, value)?)),
            _ => Err(BriefError::UnknownPath(path.to_string())),
        };
    };
    match head {
        "configuration" => match rest {
            "owner" => Ok(WriteOp::Owner(expect_text(path, value)?)),
            "repo" | "repoName" => Ok(WriteOp::RepoName(expect_text(path, value)?)),
            "branch" => Ok(WriteOp::Branch(expect_text(path, value)?)),
            "accessToken" | "token" => Ok(WriteOp::AccessToken(expect_text(path, value)?)),
            _ => Err(BriefError::UnknownPath(path.to_string())),
        },
        "panelA" | "panelB" => {
            if rest.is_empty() || rest.contains('.') {
                return Err(BriefError::UnknownPath(path.to_string()));
            }
            let key = match head {
                "panelA" => PanelKey::A,
                _ => PanelKey::B,
            };
            Ok(WriteOp::PanelField(key, rest.to_string(), value))
        }
        "task" => match rest {
            "flowId" => Ok(WriteOp::FlowId(expect_text(path, value)?)),
            _ => Err(BriefError::UnknownPath(path.to_string())),
        },
        "notes" => match rest {
            "userText" => Ok(WriteOp::Notes(expect_text(path, value)?)),
            _ => Err(BriefError::UnknownPath(path.to_string())),
        },
        "steps" => match rest {
            "removedStepIds" => Ok(WriteOp::RemovedStepIds(expect_list(path, value)?)),
            _ => Err(BriefError::UnknownPath(path.to_string())),
        },
        _ => Err(BriefError::UnknownPath(path.to_string())),
    }
}

fn expect_text(path: &str, value: FieldValue) -> Result<String> {
    match value {
        FieldValue::Text(t) => Ok(t),
        _ => Err(BriefError::PathValue {
            path: path.to_string(),
            expected: "text",
        }),
    }
}

fn expect_list(path: &str, value: FieldValue) -> Result<Vec<String>> {
    match value {
        FieldValue::List(items) => Ok(items),
        _ => Err(BriefError::PathValue {
            path: path.to_string(),
            expected: "list",
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ConfigurationPatch;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn configured_store() -> Store {
        let mut store = Store::new(None);
        store.write(WriteOp::Owner("alice".to_string()));
        store.write(WriteOp::RepoName("wonderland".to_string()));
        store
    }

    #[test]
    fn snapshot_is_isolated_from_the_store() {
        let store = configured_store();
        let mut snap = store.snapshot();
        snap.state.configuration.owner = "mallory".to_string();
        snap.prompt.clear();

        let fresh = store.snapshot();
        assert_eq!(fresh.state.configuration.owner, "alice");
        assert!(!fresh.prompt.is_empty());
    }

    #[test]
    fn hydration_seeds_only_the_eligible_fields() {
        let record = SessionRecord {
            owner: "alice".to_string(),
            access_token: "ghp_abc".to_string(),
            saved_at: None,
        };
        let store = Store::new(Some(record));
        let snap = store.snapshot();
        assert_eq!(snap.state.configuration.owner, "alice");
        assert_eq!(snap.state.configuration.access_token, "ghp_abc");
        assert!(snap.state.configuration.repo_name.is_empty());
        // No repository yet, so no prompt yet.
        assert!(snap.prompt.is_empty());
    }

    #[test]
    fn prompt_is_never_stale_when_observers_run() {
        let mut store = Store::new(None);
        let seen = Rc::new(RefCell::new(0u32));
        let seen2 = Rc::clone(&seen);
        store.subscribe(move |snap| {
            assert_eq!(snap.prompt, crate::prompt::serialize(&snap.state));
            *seen2.borrow_mut() += 1;
        });
        store.write(WriteOp::Owner("alice".to_string()));
        store.write(WriteOp::RepoName("wonderland".to_string()));
        store.write(WriteOp::Notes("check ci".to_string()));
        assert_eq!(*seen.borrow(), 3);
    }

    #[test]
    fn observers_fire_on_every_write_in_registration_order() {
        let mut store = Store::new(None);
        let log = Rc::new(RefCell::new(Vec::new()));
        let first = Rc::clone(&log);
        let second = Rc::clone(&log);
        store.subscribe(move |_| first.borrow_mut().push("first"));
        store.subscribe(move |_| second.borrow_mut().push("second"));

        // A write carrying the value already in place still notifies.
        store.write(WriteOp::Branch(String::new()));
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut store = Store::new(None);
        let count = Rc::new(RefCell::new(0u32));
        let counter = Rc::clone(&count);
        let id = store.subscribe(move |_| *counter.borrow_mut() += 1);
        store.write(WriteOp::Owner("alice".to_string()));
        store.unsubscribe(id);
        store.write(WriteOp::Owner("bob".to_string()));
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn reset_preserves_owner_and_token_only() {
        let mut store = configured_store();
        store.write(WriteOp::AccessToken("ghp_abc".to_string()));
        store.write(WriteOp::Branch("develop".to_string()));
        store.write(WriteOp::Notes("scratch".to_string()));

        store.reset_session();
        let snap = store.snapshot();
        assert_eq!(snap.state.configuration.owner, "alice");
        assert_eq!(snap.state.configuration.access_token, "ghp_abc");
        assert!(snap.state.configuration.repo_name.is_empty());
        assert!(snap.state.configuration.branch.is_empty());
        assert!(snap.state.notes.user_text.is_empty());
        assert!(snap.state.steps.enabled_steps.is_empty());
    }

    #[test]
    fn panel_writes_regenerate_steps_through_the_flow() {
        let flow = FlowTemplate::builtin("fix-bug").unwrap();
        let mut store = configured_store();
        store.switch_flow(&flow);

        let ids: Vec<String> = store
            .snapshot()
            .state
            .steps
            .enabled_steps
            .iter()
            .map(|s| s.id.clone())
            .collect();
        // Unconditional steps only while every panel field is empty.
        assert_eq!(ids, vec!["read-claude", "create-branch", "open-pr"]);

        store.write(WriteOp::PanelField(
            PanelKey::A,
            "files".to_string(),
            FieldValue::List(vec!["src/lib.rs".to_string()]),
        ));
        let ids: Vec<String> = store
            .snapshot()
            .state
            .steps
            .enabled_steps
            .iter()
            .map(|s| s.id.clone())
            .collect();
        assert!(ids.contains(&"inspect-files".to_string()));
    }

    #[test]
    fn step_edits_survive_panel_writes() {
        let flow = FlowTemplate::builtin("fix-bug").unwrap();
        let mut store = configured_store();
        store.switch_flow(&flow);
        store.write(WriteOp::PanelField(
            PanelKey::A,
            "description".to_string(),
            FieldValue::Text("login crash".to_string()),
        ));

        store.write(WriteOp::StepLenses(
            "analyze".to_string(),
            vec!["security".to_string()],
        ));
        store.write(WriteOp::StepName(
            "create-branch".to_string(),
            "fix/login-crash".to_string(),
        ));
        store.write(WriteOp::StepOutput(
            "open-pr".to_string(),
            Some("patch".to_string()),
        ));

        // Another panel write forces regeneration; edits must survive it.
        store.write(WriteOp::PanelField(
            PanelKey::B,
            "outcome".to_string(),
            FieldValue::Text("login works".to_string()),
        ));

        let snap = store.snapshot();
        let analyze = snap
            .state
            .steps
            .enabled_steps
            .iter()
            .find(|s| s.id == "analyze")
            .unwrap();
        assert_eq!(analyze.lenses, vec!["security"]);
        assert!(analyze.lenses_overridden);
        let branch = snap
            .state
            .steps
            .enabled_steps
            .iter()
            .find(|s| s.id == "create-branch")
            .unwrap();
        assert_eq!(branch.name_provided, "fix/login-crash");
        let pr = snap
            .state
            .steps
            .enabled_steps
            .iter()
            .find(|s| s.id == "open-pr")
            .unwrap();
        assert_eq!(pr.output_selected.as_deref(), Some("patch"));
    }

    #[test]
    fn removed_steps_stay_removed_until_flow_switch() {
        let flow = FlowTemplate::builtin("fix-bug").unwrap();
        let mut store = configured_store();
        store.switch_flow(&flow);

        store.write(WriteOp::RemoveStep("create-branch".to_string()));
        let snap = store.snapshot();
        assert!(snap
            .state
            .steps
            .enabled_steps
            .iter()
            .all(|s| s.id != "create-branch"));

        // Unrelated writes keep the deletion in force.
        store.write(WriteOp::Notes("still deleted".to_string()));
        assert!(store
            .snapshot()
            .state
            .steps
            .enabled_steps
            .iter()
            .all(|s| s.id != "create-branch"));

        // Only an explicit flow switch clears deletions.
        store.switch_flow(&flow);
        let snap = store.snapshot();
        assert!(snap.state.steps.removed_step_ids.is_empty());
        assert!(snap
            .state
            .steps
            .enabled_steps
            .iter()
            .any(|s| s.id == "create-branch"));
    }

    #[test]
    fn removed_invariant_holds_for_direct_step_writes() {
        let mut store = Store::new(None);
        store.write(WriteOp::RemovedStepIds(vec!["gone".to_string()]));
        let steps = vec![
            Step {
                id: "gone".to_string(),
                operation: "do".to_string(),
                object: "x".to_string(),
                source: None,
                params: Default::default(),
                lenses: vec![],
                lenses_overridden: false,
                output: vec![],
                branch_name: None,
                pr_name: None,
                file_name: None,
                name_provided: String::new(),
                output_selected: None,
            },
            Step {
                id: "kept".to_string(),
                operation: "do".to_string(),
                object: "y".to_string(),
                source: None,
                params: Default::default(),
                lenses: vec![],
                lenses_overridden: false,
                output: vec![],
                branch_name: None,
                pr_name: None,
                file_name: None,
                name_provided: String::new(),
                output_selected: None,
            },
        ];
        store.write(WriteOp::EnabledSteps(steps));
        let ids: Vec<String> = store
            .snapshot()
            .state
            .steps
            .enabled_steps
            .iter()
            .map(|s| s.id.clone())
            .collect();
        assert_eq!(ids, vec!["kept"]);
    }

    #[test]
    fn updater_form_merges_a_partial_patch() {
        let mut store = configured_store();
        store.update(|state| {
            assert_eq!(state.configuration.owner, "alice");
            StatePatch {
                configuration: ConfigurationPatch {
                    branch: Some("develop".to_string()),
                    ..Default::default()
                },
                notes: Some("from updater".to_string()),
                ..Default::default()
            }
        });
        let snap = store.snapshot();
        assert_eq!(snap.state.configuration.branch, "develop");
        assert_eq!(snap.state.configuration.owner, "alice");
        assert_eq!(snap.state.notes.user_text, "from updater");
        assert!(snap.prompt.contains("Branch: develop"));
    }

    #[test]
    fn persist_hook_fires_only_for_eligible_fields() {
        let mut store = Store::new(None);
        let persisted = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&persisted);
        store.on_persist(move |record| sink.borrow_mut().push(record.clone()));

        store.write(WriteOp::Branch("develop".to_string()));
        store.write(WriteOp::Notes("n".to_string()));
        assert!(persisted.borrow().is_empty());

        store.write(WriteOp::Owner("alice".to_string()));
        store.write(WriteOp::AccessToken("ghp_abc".to_string()));
        let records = persisted.borrow();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].owner, "alice");
        assert_eq!(records[1].access_token, "ghp_abc");
    }

    #[test]
    fn write_path_addresses_documented_leaves() {
        let mut store = Store::new(None);
        store
            .write_path("configuration.owner", FieldValue::Text("alice".to_string()))
            .unwrap();
        store
            .write_path("configuration.repo", FieldValue::Text("wonderland".to_string()))
            .unwrap();
        store
            .write_path(
                "panelA.description",
                FieldValue::Text("login crash".to_string()),
            )
            .unwrap();
        store
            .write_path("notes.userText", FieldValue::Text("check ci".to_string()))
            .unwrap();
        store
            .write_path(
                "steps.removedStepIds",
                FieldValue::List(vec!["open-pr".to_string()]),
            )
            .unwrap();

        let snap = store.snapshot();
        assert_eq!(snap.state.configuration.owner, "alice");
        assert_eq!(snap.state.configuration.repo_name, "wonderland");
        assert_eq!(
            snap.state.panel_a.get("description"),
            Some(&FieldValue::Text("login crash".to_string()))
        );
        assert_eq!(snap.state.notes.user_text, "check ci");
        assert_eq!(snap.state.steps.removed_step_ids, vec!["open-pr"]);
    }

    #[test]
    fn write_path_rejects_unknown_paths_and_bad_values() {
        let mut store = Store::new(None);
        assert!(matches!(
            store.write_path("configuration.color", FieldValue::Text("x".to_string())),
            Err(BriefError::UnknownPath(_))
        ));
        assert!(matches!(
            store.write_path("panelA.a.b", FieldValue::Text("x".to_string())),
            Err(BriefError::UnknownPath(_))
        ));
        assert!(matches!(
            store.write_path("mystery", FieldValue::Text("x".to_string())),
            Err(BriefError::UnknownPath(_))
        ));
        assert!(matches!(
            store.write_path("configuration.owner", FieldValue::Number(1.0)),
            Err(BriefError::PathValue { .. })
        ));
        assert!(matches!(
            store.write_path("steps.removedStepIds", FieldValue::Text("x".to_string())),
            Err(BriefError::PathValue { .. })
        ));
    }

    #[test]
    fn switch_flow_seeds_panel_defaults() {
        let flow: FlowTemplate = serde_yaml::from_str(
            r#"
id: seeded
title: Seeded
panelA:
  description: { kind: free_text, default: "prefilled" }
panelB: {}
steps:
  - id: only
    operation: do
    object: thing
"#,
        )
        .unwrap();
        let mut store = configured_store();
        store.switch_flow(&flow);
        let snap = store.snapshot();
        assert_eq!(
            snap.state.panel_a.get("description"),
            Some(&FieldValue::Text("prefilled".to_string()))
        );
        assert_eq!(snap.state.task.flow_id, "seeded");
    }
}
