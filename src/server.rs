//! MCP ServerHandler implementation for Things 3.
//!
//! Exposes the fixed tool catalog:
//!
//! **Viewing**
//! - `view_inbox` — tasks in the Inbox list
//! - `view_today` — tasks scheduled for today
//! - `view_projects` — all projects
//! - `view_areas` — all areas
//! - `search_tasks` — tasks whose title or notes contain a query
//!
//! **Creation** (via the `things:///` URL scheme)
//! - `create_task`, `create_project`, `create_area`
//!
//! **Management** (via generated AppleScript)
//! - `complete_task`
//! - `move_task_to_inbox`, `move_task_to_today`,
//!   `move_task_to_project`, `move_task_to_area`
//! - `edit_task`, `edit_project`
//!
//! **Backup**
//! - `backup_things3` — snapshot the four views to a JSON file
//! - `restore_things3` — load a snapshot and report its metadata
//!   (metadata-only; never mutates Things 3 state)

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ServerHandler};

use crate::backup::{self, AreaView, BackupError, ItemView, Snapshot, SnapshotData};
use crate::runner::{AutomationError, OsascriptRunner, ScriptRunner, DEFAULT_SCRIPT_TIMEOUT};
use crate::scheme::{self, NewArea, NewProject, NewTodo};
use crate::script::{self, MatchPolicy, ProjectEdit, TodoEdit};
use crate::tools::*;

/// Runtime knobs shared by every tool invocation.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Disambiguation policy when a title substring matches several items.
    pub match_policy: MatchPolicy,
    /// Wall-clock budget for a single AppleScript call.
    pub script_timeout: Duration,
    /// Directory for backup files when no explicit path is given.
    pub backup_dir: Option<PathBuf>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            match_policy: MatchPolicy::First,
            script_timeout: DEFAULT_SCRIPT_TIMEOUT,
            backup_dir: None,
        }
    }
}

/// Things 3 MCP server handler.
#[derive(Debug, Clone)]
pub struct Things3McpServer {
    tool_router: ToolRouter<Self>,
    runner: Arc<dyn ScriptRunner>,
    settings: ServerSettings,
}

impl Default for Things3McpServer {
    fn default() -> Self {
        Self::new(ServerSettings::default())
    }
}

impl Things3McpServer {
    /// Create a server that talks to Things 3 through `osascript`.
    pub fn new(settings: ServerSettings) -> Self {
        let runner = Arc::new(OsascriptRunner::new(settings.script_timeout));
        Self::with_runner(runner, settings)
    }

    /// Create a server with an injected runner (used by tests).
    pub fn with_runner(runner: Arc<dyn ScriptRunner>, settings: ServerSettings) -> Self {
        Self {
            tool_router: Self::tool_router(),
            runner,
            settings,
        }
    }

    /// Run a script and surface any automation failure as error JSON.
    async fn run_command(&self, script: &str) -> Result<String, String> {
        self.runner.run(script).await.map_err(automation_error_json)
    }

    /// Run a view script and parse its output as a JSON value. An empty
    /// result is an empty array.
    async fn run_view(&self, script: &str) -> Result<serde_json::Value, String> {
        let raw = self.run_command(script).await?;
        let text = if raw.is_empty() { "[]" } else { raw.as_str() };
        serde_json::from_str(text).map_err(|e| {
            error_json(
                "malformed_result",
                &format!("Things 3 returned unparseable data: {e}"),
            )
        })
    }

    /// Run a view script and deserialize its array into typed projections.
    async fn fetch<T: serde::de::DeserializeOwned>(&self, script: &str) -> Result<Vec<T>, String> {
        let value = self.run_view(script).await?;
        serde_json::from_value(value).map_err(|e| {
            error_json(
                "malformed_result",
                &format!("Things 3 returned unexpected fields: {e}"),
            )
        })
    }

    async fn view(&self, script: &str) -> String {
        match self.run_view(script).await {
            Ok(items) => serde_json::to_string_pretty(&items)
                .unwrap_or_else(|e| error_json("serialization_error", &e.to_string())),
            Err(e) => e,
        }
    }

    /// Dispatch a scheme URL through System Events.
    async fn open_url(&self, url: &str) -> Result<(), String> {
        self.run_command(&scheme::open_location(url)).await.map(|_| ())
    }

    /// Run a mutation script; the script's return text is the message.
    async fn mutate(&self, script: &str) -> String {
        match self.run_command(script).await {
            Ok(message) => outcome(message),
            Err(e) => e,
        }
    }

    async fn collect_snapshot_data(&self) -> Result<SnapshotData, String> {
        let inbox = self.fetch::<ItemView>(&script::list_todos("Inbox")).await?;
        let today = self.fetch::<ItemView>(&script::list_todos("Today")).await?;
        let projects = self.fetch::<ItemView>(&script::all_projects()).await?;
        let areas = self.fetch::<AreaView>(&script::all_areas()).await?;
        Ok(SnapshotData {
            inbox,
            today,
            projects,
            areas,
        })
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for Things3McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "things3-mcp".to_string(),
                title: Some("Things 3 MCP Server".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: Some(
                    "MCP server exposing Things 3 task management: viewing, creation, \
                     search, completion, moving, editing, and snapshot backups"
                        .to_string(),
                ),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Things 3 is a macOS task manager. Viewing tools (view_inbox, view_today, \
                 view_projects, view_areas, search_tasks) return JSON arrays of \
                 {title, notes, status} objects. Creation tools (create_task, \
                 create_project, create_area) need only a title; scheduling, deadlines, \
                 tags, and target lists are optional. Management tools (complete_task, \
                 move_task_to_*, edit_task, edit_project) find their target by \
                 case-sensitive substring match on the title — a 'not found' message \
                 means nothing matched, not that the call failed. backup_things3 writes \
                 a JSON snapshot of all views; restore_things3 reads one back and \
                 reports its metadata without modifying any Things 3 state."
                    .to_string(),
            ),
        }
    }
}

#[tool_router(router = tool_router)]
impl Things3McpServer {
    // ── Viewing tools ──

    /// View all tasks in the Things 3 inbox.
    #[tool(
        name = "view_inbox",
        description = "View all tasks in the Things 3 inbox. Returns a JSON array of {title, notes, status} objects."
    )]
    pub async fn view_inbox(&self) -> String {
        self.view(&script::list_todos("Inbox")).await
    }

    /// View all tasks scheduled for today.
    #[tool(
        name = "view_today",
        description = "View all tasks scheduled for today. Returns a JSON array of {title, notes, status} objects."
    )]
    pub async fn view_today(&self) -> String {
        self.view(&script::list_todos("Today")).await
    }

    /// View all projects.
    #[tool(
        name = "view_projects",
        description = "View all projects in Things 3. Returns a JSON array of {title, notes, status} objects."
    )]
    pub async fn view_projects(&self) -> String {
        self.view(&script::all_projects()).await
    }

    /// View all areas.
    #[tool(
        name = "view_areas",
        description = "View all areas in Things 3. Returns a JSON array of {title} objects."
    )]
    pub async fn view_areas(&self) -> String {
        self.view(&script::all_areas()).await
    }

    /// Search for tasks by title or notes content.
    #[tool(
        name = "search_tasks",
        description = "Search for tasks whose title or notes contain the query (case-sensitive substring). Returns a JSON array of {title, notes, status} objects."
    )]
    pub async fn search_tasks(&self, Parameters(params): Parameters<SearchTasksParams>) -> String {
        self.view(&script::search_todos(&params.query)).await
    }

    // ── Creation tools ──

    /// Create a new task via the things:/// URL scheme.
    #[tool(
        name = "create_task",
        description = "Create a new task in Things 3. Only the title is required; notes, scheduling, deadline, tags, destination list, and checklist items are optional."
    )]
    pub async fn create_task(&self, Parameters(params): Parameters<CreateTaskParams>) -> String {
        let todo = NewTodo::from(params);
        let title = todo.title.clone();
        match self.open_url(&scheme::add_todo_url(&todo)).await {
            Ok(()) => outcome(format!("Task \"{title}\" created successfully")),
            Err(e) => e,
        }
    }

    /// Create a new project via the things:/// URL scheme.
    #[tool(
        name = "create_project",
        description = "Create a new project in Things 3. Only the title is required; notes, area, scheduling, deadline, and tags are optional."
    )]
    pub async fn create_project(
        &self,
        Parameters(params): Parameters<CreateProjectParams>,
    ) -> String {
        let project = NewProject::from(params);
        let title = project.title.clone();
        match self.open_url(&scheme::add_project_url(&project)).await {
            Ok(()) => outcome(format!("Project \"{title}\" created successfully")),
            Err(e) => e,
        }
    }

    /// Create a new area via the things:/// URL scheme.
    #[tool(
        name = "create_area",
        description = "Create a new area in Things 3. Only the title is required; tags are optional."
    )]
    pub async fn create_area(&self, Parameters(params): Parameters<CreateAreaParams>) -> String {
        let area = NewArea::from(params);
        let title = area.title.clone();
        match self.open_url(&scheme::add_area_url(&area)).await {
            Ok(()) => outcome(format!("Area \"{title}\" created successfully")),
            Err(e) => e,
        }
    }

    // ── Management tools ──

    /// Mark a task as completed.
    #[tool(
        name = "complete_task",
        description = "Mark a task as completed. The task is found by case-sensitive substring match on its title; a 'Task not found' message means nothing matched."
    )]
    pub async fn complete_task(&self, Parameters(params): Parameters<TaskTitleParams>) -> String {
        self.mutate(&script::complete_todo(&params.title, self.settings.match_policy))
            .await
    }

    /// Move a task back to the inbox.
    #[tool(
        name = "move_task_to_inbox",
        description = "Move a task from today or another list back to the inbox. The task is found by case-sensitive substring match on its title."
    )]
    pub async fn move_task_to_inbox(
        &self,
        Parameters(params): Parameters<TaskTitleParams>,
    ) -> String {
        self.mutate(&script::move_todo_to_inbox(
            &params.title,
            self.settings.match_policy,
        ))
        .await
    }

    /// Move a task to today by scheduling it for the current date.
    #[tool(
        name = "move_task_to_today",
        description = "Move a task to the Today list by scheduling it for the current date. The task is found by case-sensitive substring match on its title."
    )]
    pub async fn move_task_to_today(
        &self,
        Parameters(params): Parameters<TaskTitleParams>,
    ) -> String {
        self.mutate(&script::move_todo_to_today(
            &params.title,
            self.settings.match_policy,
        ))
        .await
    }

    /// Move a task into a project.
    #[tool(
        name = "move_task_to_project",
        description = "Move a task into a specific project. Both the task and the project are found by case-sensitive substring match on their names."
    )]
    pub async fn move_task_to_project(
        &self,
        Parameters(params): Parameters<MoveTaskToProjectParams>,
    ) -> String {
        self.mutate(&script::move_todo_to_project(
            &params.title,
            &params.project,
            self.settings.match_policy,
        ))
        .await
    }

    /// Move a task into an area.
    #[tool(
        name = "move_task_to_area",
        description = "Move a task into a specific area. Both the task and the area are found by case-sensitive substring match on their names."
    )]
    pub async fn move_task_to_area(
        &self,
        Parameters(params): Parameters<MoveTaskToAreaParams>,
    ) -> String {
        self.mutate(&script::move_todo_to_area(
            &params.title,
            &params.area,
            self.settings.match_policy,
        ))
        .await
    }

    /// Edit fields of an existing task.
    #[tool(
        name = "edit_task",
        description = "Edit an existing task. Only the fields provided are changed (title, notes, schedule, deadline, tags); the task is found by case-sensitive substring match on current_title."
    )]
    pub async fn edit_task(&self, Parameters(params): Parameters<EditTaskParams>) -> String {
        let current_title = params.current_title.clone();
        let edits = TodoEdit::from(params);
        self.mutate(&script::edit_todo(
            &current_title,
            &edits,
            self.settings.match_policy,
        ))
        .await
    }

    /// Edit fields of an existing project.
    #[tool(
        name = "edit_project",
        description = "Edit an existing project. Only the fields provided are changed (title, notes, area, schedule, deadline, tags); the project is found by case-sensitive substring match on current_title."
    )]
    pub async fn edit_project(&self, Parameters(params): Parameters<EditProjectParams>) -> String {
        let current_title = params.current_title.clone();
        let edits = ProjectEdit::from(params);
        self.mutate(&script::edit_project(
            &current_title,
            &edits,
            self.settings.match_policy,
        ))
        .await
    }

    // ── Backup tools ──

    /// Snapshot all Things 3 data to a JSON file.
    #[tool(
        name = "backup_things3",
        description = "Create a JSON backup of all Things 3 data (inbox, today, projects, areas). Writes to backup_path, or a timestamped file on the desktop if omitted."
    )]
    pub async fn backup_things3(&self, Parameters(params): Parameters<BackupParams>) -> String {
        let path = params
            .backup_path
            .map(PathBuf::from)
            .unwrap_or_else(|| backup::default_backup_path(self.settings.backup_dir.as_deref()));

        let data = match self.collect_snapshot_data().await {
            Ok(data) => data,
            Err(e) => return e,
        };
        let snapshot = Snapshot::now(data);

        match backup::write_snapshot(&path, &snapshot).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), "backup written");
                serde_json::to_string_pretty(&BackupReceipt {
                    success: true,
                    message: format!("Backup created successfully at {}", path.display()),
                    backup_path: path.display().to_string(),
                })
                .unwrap_or_else(|e| error_json("serialization_error", &e.to_string()))
            }
            Err(e) => error_json("backup_io", &e.to_string()),
        }
    }

    /// Load a backup snapshot and report its metadata.
    #[tool(
        name = "restore_things3",
        description = "Load a Things 3 backup file and report its metadata (timestamp, version, item counts). Metadata-only: no Things 3 state is modified."
    )]
    pub async fn restore_things3(&self, Parameters(params): Parameters<RestoreParams>) -> String {
        let path = PathBuf::from(&params.backup_path);
        let snapshot = match backup::read_snapshot(&path).await {
            Ok(snapshot) => snapshot,
            Err(e @ BackupError::NotFound(_)) => {
                return error_json("backup_not_found", &e.to_string())
            }
            Err(e @ BackupError::Io(_)) => return error_json("backup_io", &e.to_string()),
            Err(e @ BackupError::Parse(_)) => return error_json("backup_parse", &e.to_string()),
        };

        // Metadata-only by design; recreating every task, project, and area
        // would need a reconciliation pass against live state.
        serde_json::to_string_pretty(&RestoreReport {
            success: true,
            message: format!(
                "Backup data loaded from {}. Restore is metadata-only; no Things 3 state was modified.",
                path.display()
            ),
            backup_info: BackupInfo {
                timestamp: snapshot.timestamp,
                version: snapshot.version,
                items_count: ItemsCount {
                    inbox: snapshot.data.inbox.len(),
                    today: snapshot.data.today.len(),
                    projects: snapshot.data.projects.len(),
                    areas: snapshot.data.areas.len(),
                },
            },
        })
        .unwrap_or_else(|e| error_json("serialization_error", &e.to_string()))
    }
}

/// Build a structured error JSON string that LLMs can parse.
fn error_json(error_code: &str, message: &str) -> String {
    serde_json::json!({
        "error": error_code,
        "message": message,
        "valid": false
    })
    .to_string()
}

fn automation_error_json(err: AutomationError) -> String {
    let code = match &err {
        AutomationError::Spawn(_) => "osascript_spawn",
        AutomationError::ScriptFailed { .. } => "script_failed",
        AutomationError::Timeout(_) => "script_timeout",
    };
    error_json(code, &err.to_string())
}

fn outcome(message: String) -> String {
    serde_json::to_string_pretty(&CommandOutcome {
        success: true,
        message,
    })
    .unwrap_or_else(|e| error_json("serialization_error", &e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Records every script it is asked to run and replays canned responses.
    #[derive(Debug, Default)]
    struct FakeRunner {
        responses: Mutex<VecDeque<Result<String, AutomationError>>>,
        executed: Mutex<Vec<String>>,
    }

    impl FakeRunner {
        fn replying(responses: Vec<Result<String, AutomationError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                executed: Mutex::new(Vec::new()),
            })
        }

        fn scripts(&self) -> Vec<String> {
            self.executed.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl ScriptRunner for FakeRunner {
        async fn run(&self, script: &str) -> Result<String, AutomationError> {
            self.executed.lock().unwrap().push(script.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(String::new()))
        }
    }

    fn server_with(runner: Arc<FakeRunner>) -> Things3McpServer {
        Things3McpServer::with_runner(runner, ServerSettings::default())
    }

    #[test]
    fn test_server_info() {
        let server = Things3McpServer::with_runner(
            FakeRunner::replying(vec![]),
            ServerSettings::default(),
        );
        let info = server.get_info();

        assert_eq!(info.server_info.name, "things3-mcp");
        assert_eq!(info.server_info.version, env!("CARGO_PKG_VERSION"));
        let instructions = info.instructions.unwrap();
        assert!(instructions.contains("view_inbox"));
        assert!(instructions.contains("backup_things3"));
    }

    #[tokio::test]
    async fn test_view_inbox_parses_script_output() {
        let runner = FakeRunner::replying(vec![Ok(
            r#"[{"title": "Buy milk", "notes": "", "status": "open"}]"#.to_string(),
        )]);
        let server = server_with(runner.clone());

        let result = server.view_inbox().await;
        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed[0]["title"], "Buy milk");
        assert_eq!(parsed[0]["status"], "open");

        let scripts = runner.scripts();
        assert_eq!(scripts.len(), 1);
        assert!(scripts[0].contains("to dos of list \"Inbox\""));
    }

    #[tokio::test]
    async fn test_view_with_empty_output_is_empty_array() {
        let runner = FakeRunner::replying(vec![Ok(String::new())]);
        let server = server_with(runner);

        let result = server.view_today().await;
        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_view_with_corrupt_output_is_malformed_result() {
        let runner = FakeRunner::replying(vec![Ok("[{not json".to_string())]);
        let server = server_with(runner);

        let result = server.view_projects().await;
        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed["error"], "malformed_result");
    }

    #[tokio::test]
    async fn test_search_tasks_escapes_query() {
        let runner = FakeRunner::replying(vec![Ok("[]".to_string())]);
        let server = server_with(runner.clone());

        server
            .search_tasks(Parameters(SearchTasksParams {
                query: "a\"b".to_string(),
            }))
            .await;

        let scripts = runner.scripts();
        assert!(scripts[0].contains(r#"name contains "a\"b""#));
    }

    #[tokio::test]
    async fn test_create_task_title_only_url() {
        let runner = FakeRunner::replying(vec![Ok(String::new())]);
        let server = server_with(runner.clone());

        let result = server
            .create_task(Parameters(CreateTaskParams {
                title: "Buy milk".to_string(),
                notes: None,
                when: None,
                deadline: None,
                tags: None,
                list: None,
                checklist: None,
            }))
            .await;

        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed["success"], true);
        assert_eq!(parsed["message"], "Task \"Buy milk\" created successfully");

        let scripts = runner.scripts();
        assert_eq!(
            scripts[0],
            r#"tell application "System Events" to open location "things:///add?title=Buy%20milk""#
        );
    }

    #[tokio::test]
    async fn test_create_project_appends_present_fields() {
        let runner = FakeRunner::replying(vec![Ok(String::new())]);
        let server = server_with(runner.clone());

        server
            .create_project(Parameters(CreateProjectParams {
                title: "Website".to_string(),
                notes: None,
                area: Some("Work".to_string()),
                when: None,
                deadline: Some("2026-09-01".to_string()),
                tags: None,
            }))
            .await;

        let scripts = runner.scripts();
        assert!(scripts[0]
            .contains("things:///add-project?title=Website&area=Work&deadline=2026-09-01"));
        assert!(!scripts[0].contains("notes="));
        assert!(!scripts[0].contains("tags="));
    }

    #[tokio::test]
    async fn test_complete_task_not_found_is_success() {
        let runner = FakeRunner::replying(vec![Ok("Task not found".to_string())]);
        let server = server_with(runner.clone());

        let result = server
            .complete_task(Parameters(TaskTitleParams {
                title: "Nothing here".to_string(),
            }))
            .await;

        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed["success"], true);
        assert_eq!(parsed["message"], "Task not found");
        assert_eq!(runner.scripts().len(), 1);
    }

    #[tokio::test]
    async fn test_complete_task_success_message_passthrough() {
        let runner = FakeRunner::replying(vec![Ok("Task completed successfully".to_string())]);
        let server = server_with(runner);

        let result = server
            .complete_task(Parameters(TaskTitleParams {
                title: "Buy milk".to_string(),
            }))
            .await;

        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed["message"], "Task completed successfully");
    }

    #[tokio::test]
    async fn test_script_failure_surfaces_error_json() {
        let runner = FakeRunner::replying(vec![Err(AutomationError::ScriptFailed {
            stderr: "Things3 got an error: Application isn't running".to_string(),
        })]);
        let server = server_with(runner);

        let result = server
            .complete_task(Parameters(TaskTitleParams {
                title: "Buy milk".to_string(),
            }))
            .await;

        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed["error"], "script_failed");
        assert!(parsed["message"]
            .as_str()
            .unwrap()
            .contains("Application isn't running"));
    }

    #[tokio::test]
    async fn test_timeout_surfaces_error_json() {
        let runner = FakeRunner::replying(vec![Err(AutomationError::Timeout(
            Duration::from_secs(10),
        ))]);
        let server = server_with(runner);

        let result = server.view_inbox().await;
        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed["error"], "script_timeout");
    }

    #[tokio::test]
    async fn test_move_task_to_project_selects_both() {
        let runner = FakeRunner::replying(vec![Ok(
            "Task moved to project successfully".to_string()
        )]);
        let server = server_with(runner.clone());

        server
            .move_task_to_project(Parameters(MoveTaskToProjectParams {
                title: "Buy milk".to_string(),
                project: "Groceries".to_string(),
            }))
            .await;

        let scripts = runner.scripts();
        assert!(scripts[0].contains("to dos whose name contains \"Buy milk\""));
        assert!(scripts[0].contains("projects whose name contains \"Groceries\""));
    }

    #[tokio::test]
    async fn test_edit_task_splices_only_present_fields() {
        let runner = FakeRunner::replying(vec![Ok("Task updated successfully".to_string())]);
        let server = server_with(runner.clone());

        server
            .edit_task(Parameters(EditTaskParams {
                current_title: "Buy milk".to_string(),
                new_title: None,
                notes: Some("2%".to_string()),
                when: None,
                deadline: None,
                tags: None,
            }))
            .await;

        let scripts = runner.scripts();
        assert!(scripts[0].contains("set notes of theTarget to \"2%\""));
        assert!(!scripts[0].contains("set name of theTarget"));
        assert!(!scripts[0].contains("tag names"));
    }

    #[tokio::test]
    async fn test_match_policy_flows_into_scripts() {
        let runner = FakeRunner::replying(vec![Ok("Task completed successfully".to_string())]);
        let server = Things3McpServer::with_runner(
            runner.clone(),
            ServerSettings {
                match_policy: MatchPolicy::ErrorOnAmbiguous,
                ..ServerSettings::default()
            },
        );

        server
            .complete_task(Parameters(TaskTitleParams {
                title: "Buy".to_string(),
            }))
            .await;

        assert!(runner.scripts()[0].contains(script::AMBIGUOUS_MESSAGE));
    }

    #[tokio::test]
    async fn test_backup_then_restore_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");

        let runner = FakeRunner::replying(vec![
            Ok(r#"[{"title": "Buy milk", "notes": "", "status": "open"}]"#.to_string()),
            Ok(r#"[{"title": "Standup", "notes": "", "status": "open"}, {"title": "Review", "notes": "", "status": "open"}]"#.to_string()),
            Ok(r#"[{"title": "Website", "notes": "", "status": "open"}]"#.to_string()),
            Ok(r#"[{"title": "Work"}]"#.to_string()),
        ]);
        let server = server_with(runner.clone());

        let result = server
            .backup_things3(Parameters(BackupParams {
                backup_path: Some(path.to_string_lossy().into_owned()),
            }))
            .await;
        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed["success"], true);
        assert_eq!(runner.scripts().len(), 4);

        let restored = server
            .restore_things3(Parameters(RestoreParams {
                backup_path: path.to_string_lossy().into_owned(),
            }))
            .await;
        let report: serde_json::Value = serde_json::from_str(&restored).unwrap();
        assert_eq!(report["success"], true);
        assert_eq!(report["backup_info"]["version"], "1.0.0");
        assert_eq!(report["backup_info"]["items_count"]["inbox"], 1);
        assert_eq!(report["backup_info"]["items_count"]["today"], 2);
        assert_eq!(report["backup_info"]["items_count"]["projects"], 1);
        assert_eq!(report["backup_info"]["items_count"]["areas"], 1);

        // Restore is metadata-only: no script ran beyond the four view calls.
        assert_eq!(runner.scripts().len(), 4);
    }

    #[tokio::test]
    async fn test_backup_aborts_when_a_view_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");

        let runner = FakeRunner::replying(vec![Err(AutomationError::ScriptFailed {
            stderr: "boom".to_string(),
        })]);
        let server = server_with(runner);

        let result = server
            .backup_things3(Parameters(BackupParams {
                backup_path: Some(path.to_string_lossy().into_owned()),
            }))
            .await;
        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed["error"], "script_failed");
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_restore_missing_file() {
        let server = server_with(FakeRunner::replying(vec![]));

        let result = server
            .restore_things3(Parameters(RestoreParams {
                backup_path: "/nonexistent/things3_backup.json".to_string(),
            }))
            .await;
        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed["error"], "backup_not_found");
        assert!(parsed["message"]
            .as_str()
            .unwrap()
            .contains("Backup file not found"));
    }
}
