//! AppleScript snippet builders for the Things 3 object model.
//!
//! View builders render a collection of to dos, projects, or areas as a JSON
//! array text that the server parses back into structured data. Mutation
//! builders select candidates by case-sensitive substring match on name and
//! either operate on them or return a literal not-found string — reaching the
//! not-found branch is a normal outcome, not an error.
//!
//! Every user-supplied value is passed through [`escape`] before
//! interpolation, and every value read back out of Things 3 is routed through
//! an `esc` handler embedded in the generated script, so both directions apply
//! the same backslash/double-quote discipline.

use clap::ValueEnum;

/// Escape a value for interpolation inside an AppleScript quoted string.
///
/// Backslashes first, then double quotes; everything else passes through.
pub fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// How a title substring match is disambiguated when it selects more than one
/// item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum MatchPolicy {
    /// Operate on the first match (iteration order of Things 3).
    #[default]
    First,
    /// Refuse to mutate anything and report the ambiguity.
    ErrorOnAmbiguous,
    /// Operate on every match.
    All,
}

impl std::fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            MatchPolicy::First => "first",
            MatchPolicy::ErrorOnAmbiguous => "error-on-ambiguous",
            MatchPolicy::All => "all",
        })
    }
}

/// Literal returned by mutation scripts when `error-on-ambiguous` trips.
pub const AMBIGUOUS_MESSAGE: &str = "Multiple matching items found";

/// JSON keys and the Things 3 properties they are read from.
const TODO_FIELDS: &[(&str, &str)] = &[("title", "name"), ("notes", "notes"), ("status", "status")];
const AREA_FIELDS: &[(&str, &str)] = &[("title", "name")];

/// Handlers appended to every view script: `esc` applies the same
/// backslash/quote escaping as [`escape`] to values read from Things 3,
/// `joinText` is the delimiter-join trick for list-to-string conversion.
const RENDER_HANDLERS: &str = r#"on esc(t)
  set t to my rep(t, "\\", "\\\\")
  set t to my rep(t, "\"", "\\\"")
  return t
end esc

on rep(t, needle, replacement)
  set AppleScript's text item delimiters to needle
  set parts to text items of t
  set AppleScript's text item delimiters to replacement
  set t to parts as string
  set AppleScript's text item delimiters to ""
  return t
end rep

on joinText(lst, delim)
  set AppleScript's text item delimiters to delim
  set joined to lst as string
  set AppleScript's text item delimiters to ""
  return joined
end joinText"#;

/// Script that renders the to dos of a named built-in list as a JSON array.
pub fn list_todos(list_name: &str) -> String {
    json_array_script(
        &format!("to dos of list \"{}\"", escape(list_name)),
        TODO_FIELDS,
    )
}

/// Script that renders every project as a JSON array.
pub fn all_projects() -> String {
    json_array_script("projects", TODO_FIELDS)
}

/// Script that renders every area as a JSON array. Areas carry a title only.
pub fn all_areas() -> String {
    json_array_script("areas", AREA_FIELDS)
}

/// Script that renders to dos whose name or notes contain `query`.
pub fn search_todos(query: &str) -> String {
    let q = escape(query);
    json_array_script(
        &format!("to dos whose name contains \"{q}\" or notes contains \"{q}\""),
        TODO_FIELDS,
    )
}

fn json_array_script(selector: &str, fields: &[(&str, &str)]) -> String {
    let body = fields
        .iter()
        .map(|(key, prop)| format!(r#"\"{key}\": \"" & my esc(({prop} of el) as text) & "\""#))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "tell application \"Things3\"\n\
         \x20 set matched to {selector}\n\
         \x20 set rendered to {{}}\n\
         \x20 repeat with el in matched\n\
         \x20   set end of rendered to \"{{{body}}}\"\n\
         \x20 end repeat\n\
         \x20 return \"[\" & my joinText(rendered, \",\") & \"]\"\n\
         end tell\n\
         \n\
         {RENDER_HANDLERS}"
    )
}

/// Mark the first/all matching to dos completed.
pub fn complete_todo(title: &str, policy: MatchPolicy) -> String {
    guarded_mutation(
        &Mutation {
            selector: todos_matching(title),
            destination: None,
            actions: vec!["set status of theTarget to completed".into()],
            ok: "Task completed successfully",
            missing: "Task not found",
        },
        policy,
    )
}

/// Move matching to dos back to the Inbox list.
pub fn move_todo_to_inbox(title: &str, policy: MatchPolicy) -> String {
    guarded_mutation(
        &Mutation {
            selector: todos_matching(title),
            destination: None,
            actions: vec!["move theTarget to list \"Inbox\"".into()],
            ok: "Task moved to Inbox successfully",
            missing: "Task not found",
        },
        policy,
    )
}

/// Surface matching to dos in Today by scheduling them for the current date.
pub fn move_todo_to_today(title: &str, policy: MatchPolicy) -> String {
    guarded_mutation(
        &Mutation {
            selector: todos_matching(title),
            destination: None,
            actions: vec!["set scheduled date of theTarget to (current date)".into()],
            ok: "Task moved to Today successfully",
            missing: "Task not found",
        },
        policy,
    )
}

/// Move matching to dos into the first project whose name contains `project`.
pub fn move_todo_to_project(title: &str, project: &str, policy: MatchPolicy) -> String {
    guarded_mutation(
        &Mutation {
            selector: todos_matching(title),
            destination: Some(format!(
                "projects whose name contains \"{}\"",
                escape(project)
            )),
            actions: vec!["move theTarget to first item of destinations".into()],
            ok: "Task moved to project successfully",
            missing: "Task or project not found",
        },
        policy,
    )
}

/// Move matching to dos into the first area whose name contains `area`.
pub fn move_todo_to_area(title: &str, area: &str, policy: MatchPolicy) -> String {
    guarded_mutation(
        &Mutation {
            selector: todos_matching(title),
            destination: Some(format!("areas whose name contains \"{}\"", escape(area))),
            actions: vec!["move theTarget to first item of destinations".into()],
            ok: "Task moved to area successfully",
            missing: "Task or area not found",
        },
        policy,
    )
}

/// Field edits for a to do. Absent fields contribute no mutation statement.
#[derive(Debug, Clone, Default)]
pub struct TodoEdit {
    pub new_title: Option<String>,
    pub notes: Option<String>,
    pub when: Option<String>,
    pub deadline: Option<String>,
    pub tags: Option<String>,
}

impl TodoEdit {
    fn mutation_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        push_set(&mut lines, "name", &self.new_title);
        push_set(&mut lines, "notes", &self.notes);
        push_set_date(&mut lines, "scheduled date", &self.when);
        push_set_date(&mut lines, "due date", &self.deadline);
        push_set(&mut lines, "tag names", &self.tags);
        lines
    }
}

/// Field edits for a project. Absent fields contribute no mutation statement.
#[derive(Debug, Clone, Default)]
pub struct ProjectEdit {
    pub new_title: Option<String>,
    pub notes: Option<String>,
    pub area: Option<String>,
    pub when: Option<String>,
    pub deadline: Option<String>,
    pub tags: Option<String>,
}

impl ProjectEdit {
    fn mutation_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        push_set(&mut lines, "name", &self.new_title);
        push_set(&mut lines, "notes", &self.notes);
        if let Some(v) = &self.area {
            lines.push(format!("set area of theTarget to area \"{}\"", escape(v)));
        }
        push_set_date(&mut lines, "scheduled date", &self.when);
        push_set_date(&mut lines, "due date", &self.deadline);
        push_set(&mut lines, "tag names", &self.tags);
        lines
    }
}

fn push_set(lines: &mut Vec<String>, property: &str, value: &Option<String>) {
    if let Some(v) = value {
        lines.push(format!(
            "set {property} of theTarget to \"{}\"",
            escape(v)
        ));
    }
}

fn push_set_date(lines: &mut Vec<String>, property: &str, value: &Option<String>) {
    if let Some(v) = value {
        lines.push(format!(
            "set {property} of theTarget to date \"{}\"",
            escape(v)
        ));
    }
}

/// Apply `edits` to the to dos matching `current_title`.
pub fn edit_todo(current_title: &str, edits: &TodoEdit, policy: MatchPolicy) -> String {
    guarded_mutation(
        &Mutation {
            selector: todos_matching(current_title),
            destination: None,
            actions: edits.mutation_lines(),
            ok: "Task updated successfully",
            missing: "Task not found",
        },
        policy,
    )
}

/// Apply `edits` to the projects matching `current_title`.
pub fn edit_project(current_title: &str, edits: &ProjectEdit, policy: MatchPolicy) -> String {
    guarded_mutation(
        &Mutation {
            selector: format!(
                "projects whose name contains \"{}\"",
                escape(current_title)
            ),
            destination: None,
            actions: edits.mutation_lines(),
            ok: "Project updated successfully",
            missing: "Project not found",
        },
        policy,
    )
}

fn todos_matching(title: &str) -> String {
    format!("to dos whose name contains \"{}\"", escape(title))
}

struct Mutation<'a> {
    /// Selector expression bound to `matched`.
    selector: String,
    /// Optional selector for a destination container, bound to `destinations`.
    /// Destinations are always resolved first-match; the policy governs the
    /// to dos being operated on.
    destination: Option<String>,
    /// Statements applied to each bound `theTarget`.
    actions: Vec<String>,
    ok: &'a str,
    missing: &'a str,
}

fn guarded_mutation(m: &Mutation<'_>, policy: MatchPolicy) -> String {
    let mut setup = format!("  set matched to {}\n", m.selector);
    let mut ok_guard = String::from("(count of matched) > 0");
    let mut missing_guard = String::from("(count of matched) is 0");
    if let Some(dest) = &m.destination {
        setup.push_str(&format!("  set destinations to {dest}\n"));
        ok_guard.push_str(" and (count of destinations) > 0");
        missing_guard.push_str(" or (count of destinations) is 0");
    }

    let actions =
        |indent: &str| -> String { m.actions.iter().map(|l| format!("{indent}{l}\n")).collect() };

    let body = match policy {
        MatchPolicy::First => format!(
            "  if {ok_guard} then\n\
             \x20   set theTarget to first item of matched\n\
             {}\
             \x20   return \"{}\"\n\
             \x20 else\n\
             \x20   return \"{}\"\n\
             \x20 end if\n",
            actions("    "),
            m.ok,
            m.missing
        ),
        MatchPolicy::ErrorOnAmbiguous => format!(
            "  if {missing_guard} then\n\
             \x20   return \"{}\"\n\
             \x20 else if (count of matched) > 1 then\n\
             \x20   return \"{AMBIGUOUS_MESSAGE}\"\n\
             \x20 else\n\
             \x20   set theTarget to first item of matched\n\
             {}\
             \x20   return \"{}\"\n\
             \x20 end if\n",
            m.missing,
            actions("    "),
            m.ok
        ),
        MatchPolicy::All => format!(
            "  if {ok_guard} then\n\
             \x20   repeat with theTarget in matched\n\
             {}\
             \x20   end repeat\n\
             \x20   return \"{}\"\n\
             \x20 else\n\
             \x20   return \"{}\"\n\
             \x20 end if\n",
            actions("      "),
            m.ok,
            m.missing
        ),
    };

    format!("tell application \"Things3\"\n{setup}{body}end tell")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_backslash_then_quote() {
        assert_eq!(escape(r#"a"b"#), r#"a\"b"#);
        assert_eq!(escape(r"a\b"), r"a\\b");
        // A pre-escaped quote stays escaped rather than collapsing.
        assert_eq!(escape(r#"a\"b"#), r#"a\\\"b"#);
    }

    #[test]
    fn test_list_todos_targets_named_list() {
        let script = list_todos("Inbox");
        assert!(script.contains("to dos of list \"Inbox\""));
        assert!(script.contains("tell application \"Things3\""));
        // Values read back out are escaped symmetrically.
        assert!(script.contains("my esc((name of el) as text)"));
        assert!(script.contains("my esc((status of el) as text)"));
        assert!(script.contains("on esc(t)"));
    }

    #[test]
    fn test_areas_render_title_only() {
        let script = all_areas();
        assert!(script.contains("set matched to areas"));
        assert!(script.contains("name of el"));
        assert!(!script.contains("notes of el"));
        assert!(!script.contains("status of el"));
    }

    #[test]
    fn test_search_escapes_query() {
        let script = search_todos(r#"a"b"#);
        assert!(script.contains(r#"name contains "a\"b" or notes contains "a\"b""#));
    }

    #[test]
    fn test_complete_first_policy_shape() {
        let script = complete_todo("Buy milk", MatchPolicy::First);
        assert!(script.contains("to dos whose name contains \"Buy milk\""));
        assert!(script.contains("set theTarget to first item of matched"));
        assert!(script.contains("set status of theTarget to completed"));
        assert!(script.contains("return \"Task completed successfully\""));
        assert!(script.contains("return \"Task not found\""));
    }

    #[test]
    fn test_error_on_ambiguous_adds_branch() {
        let script = complete_todo("Buy milk", MatchPolicy::ErrorOnAmbiguous);
        assert!(script.contains("(count of matched) > 1"));
        assert!(script.contains(AMBIGUOUS_MESSAGE));
    }

    #[test]
    fn test_all_policy_loops_over_matches() {
        let script = complete_todo("Buy milk", MatchPolicy::All);
        assert!(script.contains("repeat with theTarget in matched"));
        assert!(!script.contains("first item of matched"));
    }

    #[test]
    fn test_move_to_project_guards_both_selectors() {
        let script = move_todo_to_project("Buy milk", "Groceries", MatchPolicy::First);
        assert!(script.contains("projects whose name contains \"Groceries\""));
        assert!(script.contains("and (count of destinations) > 0"));
        assert!(script.contains("move theTarget to first item of destinations"));
        assert!(script.contains("return \"Task or project not found\""));
    }

    #[test]
    fn test_edit_splices_only_present_fields() {
        let edits = TodoEdit {
            notes: Some("updated".into()),
            ..TodoEdit::default()
        };
        let script = edit_todo("Buy milk", &edits, MatchPolicy::First);
        assert!(script.contains("set notes of theTarget to \"updated\""));
        assert!(!script.contains("set name of theTarget"));
        assert!(!script.contains("scheduled date"));
        assert!(!script.contains("due date"));
        assert!(!script.contains("tag names"));
    }

    #[test]
    fn test_edit_field_order_is_deterministic() {
        let edits = TodoEdit {
            new_title: Some("New".into()),
            notes: Some("n".into()),
            when: Some("tomorrow".into()),
            deadline: Some("2026-09-01".into()),
            tags: Some("home,errand".into()),
        };
        let script = edit_todo("Old", &edits, MatchPolicy::First);
        let name_at = script.find("set name of theTarget").unwrap();
        let notes_at = script.find("set notes of theTarget").unwrap();
        let when_at = script.find("set scheduled date of theTarget").unwrap();
        let deadline_at = script.find("set due date of theTarget").unwrap();
        let tags_at = script.find("set tag names of theTarget").unwrap();
        assert!(name_at < notes_at && notes_at < when_at);
        assert!(when_at < deadline_at && deadline_at < tags_at);
    }

    #[test]
    fn test_edit_dates_use_date_literal() {
        let edits = TodoEdit {
            when: Some("June 1, 2026".into()),
            ..TodoEdit::default()
        };
        let script = edit_todo("x", &edits, MatchPolicy::First);
        assert!(script.contains("set scheduled date of theTarget to date \"June 1, 2026\""));
    }

    #[test]
    fn test_edit_project_targets_projects() {
        let edits = ProjectEdit {
            area: Some("Work".into()),
            ..ProjectEdit::default()
        };
        let script = edit_project("Website", &edits, MatchPolicy::First);
        assert!(script.contains("projects whose name contains \"Website\""));
        assert!(script.contains("set area of theTarget to area \"Work\""));
        assert!(script.contains("return \"Project updated successfully\""));
        assert!(script.contains("return \"Project not found\""));
    }

    #[test]
    fn test_mutation_gated_behind_count_check() {
        // The mutating statement must appear after the guard so a zero-match
        // run never reaches it.
        let script = complete_todo("x", MatchPolicy::First);
        let guard_at = script.find("if (count of matched) > 0").unwrap();
        let action_at = script.find("set status of theTarget").unwrap();
        assert!(guard_at < action_at);
    }
}
