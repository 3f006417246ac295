//! Parameter and response structs for all MCP tools.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::scheme::{NewArea, NewProject, NewTodo};
use crate::script::{ProjectEdit, TodoEdit};

// ── create_task ──

/// Parameters for the `create_task` tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateTaskParams {
    /// Task title.
    #[schemars(description = "Task title")]
    pub title: String,
    /// Task notes.
    #[schemars(description = "Task notes")]
    pub notes: Option<String>,
    /// Schedule keyword or date understood by Things 3.
    #[schemars(description = "When to schedule the task (e.g. 'today', 'tomorrow', a date)")]
    pub when: Option<String>,
    /// Deadline date.
    #[schemars(description = "Deadline date for the task")]
    pub deadline: Option<String>,
    /// Comma-separated tag names.
    #[schemars(description = "Comma-separated tag names to apply")]
    pub tags: Option<String>,
    /// Destination list, project, or area.
    #[schemars(description = "Name of the list, project, or area to add the task to")]
    pub list: Option<String>,
    /// Checklist items, newline-separated.
    #[schemars(description = "Checklist items for the task, newline-separated")]
    pub checklist: Option<String>,
}

impl From<CreateTaskParams> for NewTodo {
    fn from(p: CreateTaskParams) -> Self {
        NewTodo {
            title: p.title,
            notes: p.notes,
            when: p.when,
            deadline: p.deadline,
            tags: p.tags,
            list: p.list,
            checklist: p.checklist,
        }
    }
}

// ── create_project ──

/// Parameters for the `create_project` tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateProjectParams {
    /// Project title.
    #[schemars(description = "Project title")]
    pub title: String,
    /// Project notes.
    #[schemars(description = "Project notes")]
    pub notes: Option<String>,
    /// Area to file the project under.
    #[schemars(description = "Name of the area to file the project under")]
    pub area: Option<String>,
    /// Schedule keyword or date understood by Things 3.
    #[schemars(description = "When to schedule the project (e.g. 'today', 'tomorrow', a date)")]
    pub when: Option<String>,
    /// Deadline date.
    #[schemars(description = "Deadline date for the project")]
    pub deadline: Option<String>,
    /// Comma-separated tag names.
    #[schemars(description = "Comma-separated tag names to apply")]
    pub tags: Option<String>,
}

impl From<CreateProjectParams> for NewProject {
    fn from(p: CreateProjectParams) -> Self {
        NewProject {
            title: p.title,
            notes: p.notes,
            area: p.area,
            when: p.when,
            deadline: p.deadline,
            tags: p.tags,
        }
    }
}

// ── create_area ──

/// Parameters for the `create_area` tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateAreaParams {
    /// Area title.
    #[schemars(description = "Area title")]
    pub title: String,
    /// Comma-separated tag names.
    #[schemars(description = "Comma-separated tag names to apply")]
    pub tags: Option<String>,
}

impl From<CreateAreaParams> for NewArea {
    fn from(p: CreateAreaParams) -> Self {
        NewArea {
            title: p.title,
            tags: p.tags,
        }
    }
}

// ── complete_task / move_task_to_inbox / move_task_to_today ──

/// Parameters for tools addressing a single task by title.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct TaskTitleParams {
    /// Title (or substring) of the task to operate on.
    #[schemars(description = "Title (or substring) of the task to operate on")]
    pub title: String,
}

// ── search_tasks ──

/// Parameters for the `search_tasks` tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchTasksParams {
    /// Substring matched against task titles and notes (case-sensitive).
    #[schemars(description = "Substring matched against task titles and notes (case-sensitive)")]
    pub query: String,
}

// ── move_task_to_project ──

/// Parameters for the `move_task_to_project` tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct MoveTaskToProjectParams {
    /// Title (or substring) of the task to move.
    #[schemars(description = "Title (or substring) of the task to move")]
    pub title: String,
    /// Name (or substring) of the destination project.
    #[schemars(description = "Name (or substring) of the destination project")]
    pub project: String,
}

// ── move_task_to_area ──

/// Parameters for the `move_task_to_area` tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct MoveTaskToAreaParams {
    /// Title (or substring) of the task to move.
    #[schemars(description = "Title (or substring) of the task to move")]
    pub title: String,
    /// Name (or substring) of the destination area.
    #[schemars(description = "Name (or substring) of the destination area")]
    pub area: String,
}

// ── edit_task ──

/// Parameters for the `edit_task` tool. Only fields that are present are
/// changed; absent fields are left untouched.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct EditTaskParams {
    /// Title (or substring) of the task to edit.
    #[schemars(description = "Title (or substring) of the task to edit")]
    pub current_title: String,
    /// Replacement title.
    #[schemars(description = "Replacement title")]
    pub new_title: Option<String>,
    /// Replacement notes.
    #[schemars(description = "Replacement notes")]
    pub notes: Option<String>,
    /// Replacement schedule date.
    #[schemars(description = "Replacement schedule date")]
    pub when: Option<String>,
    /// Replacement deadline date.
    #[schemars(description = "Replacement deadline date")]
    pub deadline: Option<String>,
    /// Replacement comma-separated tag names.
    #[schemars(description = "Replacement comma-separated tag names")]
    pub tags: Option<String>,
}

impl From<EditTaskParams> for TodoEdit {
    fn from(p: EditTaskParams) -> Self {
        TodoEdit {
            new_title: p.new_title,
            notes: p.notes,
            when: p.when,
            deadline: p.deadline,
            tags: p.tags,
        }
    }
}

// ── edit_project ──

/// Parameters for the `edit_project` tool. Only fields that are present are
/// changed; absent fields are left untouched.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct EditProjectParams {
    /// Title (or substring) of the project to edit.
    #[schemars(description = "Title (or substring) of the project to edit")]
    pub current_title: String,
    /// Replacement title.
    #[schemars(description = "Replacement title")]
    pub new_title: Option<String>,
    /// Replacement notes.
    #[schemars(description = "Replacement notes")]
    pub notes: Option<String>,
    /// Area to refile the project under.
    #[schemars(description = "Name of the area to refile the project under")]
    pub area: Option<String>,
    /// Replacement schedule date.
    #[schemars(description = "Replacement schedule date")]
    pub when: Option<String>,
    /// Replacement deadline date.
    #[schemars(description = "Replacement deadline date")]
    pub deadline: Option<String>,
    /// Replacement comma-separated tag names.
    #[schemars(description = "Replacement comma-separated tag names")]
    pub tags: Option<String>,
}

impl From<EditProjectParams> for ProjectEdit {
    fn from(p: EditProjectParams) -> Self {
        ProjectEdit {
            new_title: p.new_title,
            notes: p.notes,
            area: p.area,
            when: p.when,
            deadline: p.deadline,
            tags: p.tags,
        }
    }
}

// ── backup_things3 ──

/// Parameters for the `backup_things3` tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct BackupParams {
    /// Destination file path (a timestamped desktop path if omitted).
    #[schemars(description = "Destination file path (defaults to a timestamped file on the desktop)")]
    pub backup_path: Option<String>,
}

// ── restore_things3 ──

/// Parameters for the `restore_things3` tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RestoreParams {
    /// Path of the backup file to load.
    #[schemars(description = "Path of the backup file to load")]
    pub backup_path: String,
}

// ── responses ──

/// Uniform outcome for creation and mutation tools. `success: true` with a
/// not-found message means the operation ran but matched nothing.
#[derive(Debug, Serialize)]
pub struct CommandOutcome {
    pub success: bool,
    pub message: String,
}

/// Response for the `backup_things3` tool.
#[derive(Debug, Serialize)]
pub struct BackupReceipt {
    pub success: bool,
    pub message: String,
    pub backup_path: String,
}

/// Response for the `restore_things3` tool.
#[derive(Debug, Serialize)]
pub struct RestoreReport {
    pub success: bool,
    pub message: String,
    pub backup_info: BackupInfo,
}

/// Snapshot metadata reported by restore.
#[derive(Debug, Serialize)]
pub struct BackupInfo {
    pub timestamp: String,
    pub version: String,
    pub items_count: ItemsCount,
}

/// Per-category item counts in a snapshot.
#[derive(Debug, Serialize)]
pub struct ItemsCount {
    pub inbox: usize,
    pub today: usize,
    pub projects: usize,
    pub areas: usize,
}
