use crate::generate::Step;
use crate::state::CanonicalState;
use crate::types::FieldValue;

/// Reference file every prompt starts by reading.
pub const REFERENCE_FILE: &str = "claude.md";

/// Step templates with this id duplicate the fixed first to-do item and are
/// skipped during step rendering.
pub const REFERENCE_STEP_ID: &str = "read-claude";

// ---------------------------------------------------------------------------
// serialize()
// ---------------------------------------------------------------------------

/// Render the canonical state into the final prompt text.
///
/// Pure function of the state: identical input yields byte-identical output.
/// Returns the empty string until a target repository (owner and repo name)
/// is identified.
pub fn serialize(state: &CanonicalState) -> String {
    let owner = state.configuration.owner.trim();
    let repo = state.configuration.repo_name.trim();
    if owner.is_empty() || repo.is_empty() {
        return String::new();
    }

    let mut lines: Vec<String> = Vec::new();

    lines.push("<context>".to_string());
    lines.push(format!("Repository: {}/{}", escape(owner), escape(repo)));
    let branch = state.configuration.branch.trim();
    let branch = if branch.is_empty() { "main" } else { branch };
    lines.push(format!("Branch: {}", escape(branch)));
    lines.push("</context>".to_string());

    let token = state.configuration.access_token.trim();
    if !token.is_empty() {
        lines.push(format!(
            "Authenticate using personal access token {}.",
            escape(token)
        ));
    }

    lines.push("<todo>".to_string());
    let mut item = 1;
    lines.push(format!("Step {item}: Read: @{REFERENCE_FILE}"));

    let files = context_files(state);
    if !files.is_empty() {
        item += 1;
        let joined = files
            .iter()
            .map(|f| format!("@{}", escape(f)))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("Step {item}: Review context files {joined}"));
    }

    for step in &state.steps.enabled_steps {
        if step.id == REFERENCE_STEP_ID {
            continue;
        }
        item += 1;
        lines.push(format!("Step {item}: {}", render_step(step)));
    }
    lines.push("</todo>".to_string());

    let notes = state.notes.user_text.trim();
    if !notes.is_empty() {
        lines.push("<notes>".to_string());
        lines.push(escape(notes));
        lines.push("</notes>".to_string());
    }

    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Step rendering
// ---------------------------------------------------------------------------

/// Render one step as a to-do line, without the `Step N:` prefix.
///
/// `<Capitalized operation> <object>`, except that the generic object
/// `file` collapses into a colon and lets the `file` param carry the
/// target. Non-empty params follow comma-joined, the `file` param
/// `@`-prefixed, then the user-provided name, the chosen delivery mode,
/// and the lens focus suffix.
pub fn render_step(step: &Step) -> String {
    let mut out = capitalize(&escape(step.operation.trim()));

    let object = step.object.trim();
    if object == "file" {
        out.push(':');
    } else if !object.is_empty() {
        out.push(' ');
        out.push_str(&escape(object));
    }

    let params: Vec<String> = step
        .params
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| {
            let rendered = escape(&value.to_string());
            if key == "file" {
                format!("@{rendered}")
            } else {
                rendered
            }
        })
        .collect();
    if !params.is_empty() {
        out.push(' ');
        out.push_str(&params.join(", "));
    }

    let name = step.name_provided.trim();
    if !name.is_empty() {
        out.push_str(" named ");
        out.push_str(&escape(name));
    }

    if let Some(mode) = step.output_selected.as_deref() {
        let mode = mode.trim();
        if !mode.is_empty() {
            out.push_str(" via ");
            out.push_str(&escape(mode));
        }
    }

    if !step.lenses.is_empty() {
        let joined = step
            .lenses
            .iter()
            .map(|l| escape(l))
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!(" — focus on [{joined}]"));
    }

    out
}

/// Context files attached outside of steps: every list-typed panel value,
/// panel A before panel B, in field insertion order.
fn context_files(state: &CanonicalState) -> Vec<String> {
    let mut files = Vec::new();
    for value in state.panel_a.values().chain(state.panel_b.values()) {
        if let FieldValue::List(items) = value {
            files.extend(items.iter().cloned());
        }
    }
    files
}

/// Escape the three XML-significant characters in user-supplied text.
/// Structural tags are emitted around, never through, this function.
pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParamValue;

    fn base_state() -> CanonicalState {
        let mut state = CanonicalState::default();
        state.configuration.owner = "alice".to_string();
        state.configuration.repo_name = "wonderland".to_string();
        state.configuration.branch = "main".to_string();
        state
    }

    fn step(id: &str, operation: &str, object: &str) -> Step {
        Step {
            id: id.to_string(),
            operation: operation.to_string(),
            object: object.to_string(),
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
        }
    }

    #[test]
    fn empty_without_a_target_repository() {
        let mut state = CanonicalState::default();
        assert_eq!(serialize(&state), "");
        state.configuration.owner = "alice".to_string();
        assert_eq!(serialize(&state), "");
        state.configuration.owner = String::new();
        state.configuration.repo_name = "wonderland".to_string();
        assert_eq!(serialize(&state), "");
    }

    #[test]
    fn end_to_end_todo_block() {
        let mut state = base_state();
        let mut read = step("read-claude", "read", "file");
        read.params
            .insert("file".to_string(), ParamValue::Text("claude.md".to_string()));
        state.steps.enabled_steps = vec![read, step("create-branch", "create", "branch")];

        let expected = "<context>\n\
                        Repository: alice/wonderland\n\
                        Branch: main\n\
                        </context>\n\
                        <todo>\n\
                        Step 1: Read: @claude.md\n\
                        Step 2: Create branch\n\
                        </todo>";
        assert_eq!(serialize(&state), expected);
    }

    #[test]
    fn branch_defaults_to_main() {
        let mut state = base_state();
        state.configuration.branch = "  ".to_string();
        assert!(serialize(&state).contains("Branch: main"));
    }

    #[test]
    fn token_line_appears_only_with_a_token() {
        let mut state = base_state();
        assert!(!serialize(&state).contains("personal access token"));
        state.configuration.access_token = "ghp_abc".to_string();
        assert!(serialize(&state)
            .contains("Authenticate using personal access token ghp_abc."));
    }

    #[test]
    fn notes_block_requires_content() {
        let mut state = base_state();
        state.notes.user_text = "   \n ".to_string();
        assert!(!serialize(&state).contains("<notes>"));
        state.notes.user_text = "Watch the migration order.".to_string();
        let prompt = serialize(&state);
        assert!(prompt.ends_with("<notes>\nWatch the migration order.\n</notes>"));
    }

    #[test]
    fn context_files_listed_after_reference_read() {
        let mut state = base_state();
        state.panel_a.insert(
            "files".to_string(),
            FieldValue::List(vec!["src/lib.rs".to_string(), "src/api.rs".to_string()]),
        );
        state
            .panel_b
            .insert("extra".to_string(), FieldValue::List(vec!["docs/arch.md".to_string()]));

        let prompt = serialize(&state);
        assert!(prompt.contains(
            "Step 2: Review context files @src/lib.rs, @src/api.rs, @docs/arch.md"
        ));
    }

    #[test]
    fn steps_number_after_context_files() {
        let mut state = base_state();
        state
            .panel_a
            .insert("files".to_string(), FieldValue::List(vec!["a.rs".to_string()]));
        state.steps.enabled_steps = vec![step("create-branch", "create", "branch")];
        assert!(serialize(&state).contains("Step 3: Create branch"));
    }

    #[test]
    fn step_rendering_covers_params_name_mode_and_lenses() {
        let mut s = step("implement-fix", "implement", "fix");
        s.params
            .insert("file".to_string(), ParamValue::Text("src/auth.rs".to_string()));
        s.params
            .insert("attempts".to_string(), ParamValue::Number(2.0));
        s.params
            .insert("blank".to_string(), ParamValue::Text("  ".to_string()));
        s.name_provided = "fix/login".to_string();
        s.output_selected = Some("pr".to_string());
        s.lenses = vec!["security".to_string(), "performance".to_string()];

        assert_eq!(
            render_step(&s),
            "Implement fix @src/auth.rs, 2 named fix/login via pr — focus on [security, performance]"
        );
    }

    #[test]
    fn escaping_covers_all_user_text() {
        let mut state = base_state();
        state.configuration.owner = "user<script>".to_string();
        state.configuration.access_token = "a&b".to_string();
        state.notes.user_text = "1 < 2 > 0".to_string();

        let prompt = serialize(&state);
        assert!(prompt.contains("user&lt;script&gt;/wonderland"));
        assert!(!prompt.contains("<script>"));
        assert!(prompt.contains("a&amp;b"));
        assert!(prompt.contains("1 &lt; 2 &gt; 0"));
        // Structural tags survive untouched.
        assert!(prompt.contains("<context>"));
        assert!(prompt.contains("</todo>"));
    }

    #[test]
    fn serialize_is_deterministic() {
        let mut state = base_state();
        state.notes.user_text = "note".to_string();
        state.steps.enabled_steps = vec![step("create-branch", "create", "branch")];
        let first = serialize(&state);
        let second = serialize(&state);
        let third = serialize(&state);
        assert_eq!(first, second);
        assert_eq!(second, third);
    }
}
