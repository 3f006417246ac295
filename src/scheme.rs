//! `things:///` URL construction for the create operations.
//!
//! Creation goes through the Things URL scheme instead of the scripting
//! bridge: each present optional field becomes exactly one percent-encoded
//! query parameter, appended in declaration order; absent fields contribute
//! nothing. The URL is then dispatched with a System Events `open location`
//! call through the same script runner as everything else.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything except alphanumerics and `- _ . ! ~ * ' ( )` is percent-encoded,
/// so a space becomes `%20` and a double quote `%22`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

fn component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Fields for a new to do. Only `title` is required.
#[derive(Debug, Clone, Default)]
pub struct NewTodo {
    pub title: String,
    pub notes: Option<String>,
    pub when: Option<String>,
    pub deadline: Option<String>,
    pub tags: Option<String>,
    pub list: Option<String>,
    pub checklist: Option<String>,
}

/// Fields for a new project. Only `title` is required.
#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub title: String,
    pub notes: Option<String>,
    pub area: Option<String>,
    pub when: Option<String>,
    pub deadline: Option<String>,
    pub tags: Option<String>,
}

/// Fields for a new area. Only `title` is required.
#[derive(Debug, Clone, Default)]
pub struct NewArea {
    pub title: String,
    pub tags: Option<String>,
}

/// `things:///add` URL for a new to do. The checklist field maps to the
/// scheme's `checklist-items` parameter.
pub fn add_todo_url(todo: &NewTodo) -> String {
    let mut url = format!("things:///add?title={}", component(&todo.title));
    push_param(&mut url, "notes", &todo.notes);
    push_param(&mut url, "when", &todo.when);
    push_param(&mut url, "deadline", &todo.deadline);
    push_param(&mut url, "tags", &todo.tags);
    push_param(&mut url, "list", &todo.list);
    push_param(&mut url, "checklist-items", &todo.checklist);
    url
}

/// `things:///add-project` URL for a new project.
pub fn add_project_url(project: &NewProject) -> String {
    let mut url = format!("things:///add-project?title={}", component(&project.title));
    push_param(&mut url, "notes", &project.notes);
    push_param(&mut url, "area", &project.area);
    push_param(&mut url, "when", &project.when);
    push_param(&mut url, "deadline", &project.deadline);
    push_param(&mut url, "tags", &project.tags);
    url
}

/// `things:///add-area` URL for a new area.
pub fn add_area_url(area: &NewArea) -> String {
    let mut url = format!("things:///add-area?title={}", component(&area.title));
    push_param(&mut url, "tags", &area.tags);
    url
}

fn push_param(url: &mut String, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        url.push('&');
        url.push_str(key);
        url.push('=');
        url.push_str(&component(value));
    }
}

/// Script that asks System Events to route `url` to its scheme handler.
/// The URL is already percent-encoded, so it interpolates without escaping.
pub fn open_location(url: &str) -> String {
    format!("tell application \"System Events\" to open location \"{url}\"")
}
