use std::path::PathBuf;

/// One line typed at the bridge prompt, resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCommand {
    ListAgents { project_id: Option<String> },
    ListProjects,
    ListTasks { project_id: String },
    GetProject { project_id: String },
    /// Interactive: prompts for the task fields
    CreateTask,
    /// Subscribe to push events for a project
    Watch { project_id: String },
    Unwatch,
    Health,
    /// Generate IDE integration files for an agent
    SetupAgent { agent_id: String, dir: Option<PathBuf> },
    Help,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("{what} required. Usage: {usage}")]
    MissingArgument {
        what: &'static str,
        usage: &'static str,
    },
}

type Builder = fn(&[&str]) -> Result<BridgeCommand, CommandError>;

/// Row of the command table. `resource` is `None` for single-word commands.
pub struct CommandSpec {
    pub action: &'static str,
    pub resource: Option<&'static str>,
    pub usage: &'static str,
    pub summary: &'static str,
    pub group: CommandGroup,
    build: Builder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandGroup {
    Query,
    Action,
    System,
}

impl CommandGroup {
    pub fn title(&self) -> &'static str {
        match self {
            CommandGroup::Query => "Query Commands:",
            CommandGroup::Action => "Action Commands:",
            CommandGroup::System => "System Commands:",
        }
    }
}

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        action: "list",
        resource: Some("agents"),
        usage: "list agents [project:ID]",
        summary: "List all agents or filter by project",
        group: CommandGroup::Query,
        build: |args| {
            Ok(BridgeCommand::ListAgents {
                project_id: tagged(args, "project"),
            })
        },
    },
    CommandSpec {
        action: "list",
        resource: Some("projects"),
        usage: "list projects",
        summary: "List all projects",
        group: CommandGroup::Query,
        build: |_| Ok(BridgeCommand::ListProjects),
    },
    CommandSpec {
        action: "list",
        resource: Some("tasks"),
        usage: "list tasks project:ID",
        summary: "List tasks for a project",
        group: CommandGroup::Query,
        build: |args| {
            let project_id = tagged(args, "project").ok_or(CommandError::MissingArgument {
                what: "project_id",
                usage: "list tasks project:PROJECT_ID",
            })?;
            Ok(BridgeCommand::ListTasks { project_id })
        },
    },
    CommandSpec {
        action: "get",
        resource: Some("project"),
        usage: "get project PROJECT_ID",
        summary: "Get details of a specific project",
        group: CommandGroup::Query,
        build: |args| {
            let project_id = args.first().ok_or(CommandError::MissingArgument {
                what: "project_id",
                usage: "get project PROJECT_ID",
            })?;
            Ok(BridgeCommand::GetProject {
                project_id: project_id.to_string(),
            })
        },
    },
    CommandSpec {
        action: "create",
        resource: Some("task"),
        usage: "create task",
        summary: "Create a new task (interactive)",
        group: CommandGroup::Action,
        build: |_| Ok(BridgeCommand::CreateTask),
    },
    CommandSpec {
        action: "setup",
        resource: Some("agent"),
        usage: "setup agent AGENT_ID [DIR]",
        summary: "Generate IDE setup files (printed, or written to DIR)",
        group: CommandGroup::Action,
        build: |args| {
            let agent_id = args.first().ok_or(CommandError::MissingArgument {
                what: "agent_id",
                usage: "setup agent AGENT_ID [DIR]",
            })?;
            Ok(BridgeCommand::SetupAgent {
                agent_id: agent_id.to_string(),
                dir: args.get(1).map(PathBuf::from),
            })
        },
    },
    CommandSpec {
        action: "watch",
        resource: None,
        usage: "watch project:ID",
        summary: "Print live updates for a project",
        group: CommandGroup::Action,
        build: |args| {
            let project_id = tagged(args, "project").ok_or(CommandError::MissingArgument {
                what: "project_id",
                usage: "watch project:PROJECT_ID",
            })?;
            Ok(BridgeCommand::Watch { project_id })
        },
    },
    CommandSpec {
        action: "unwatch",
        resource: None,
        usage: "unwatch",
        summary: "Stop printing live updates",
        group: CommandGroup::Action,
        build: |_| Ok(BridgeCommand::Unwatch),
    },
    CommandSpec {
        action: "health",
        resource: None,
        usage: "health",
        summary: "Check that the server is reachable",
        group: CommandGroup::System,
        build: |_| Ok(BridgeCommand::Health),
    },
    CommandSpec {
        action: "help",
        resource: None,
        usage: "help",
        summary: "Show this help message",
        group: CommandGroup::System,
        build: |_| Ok(BridgeCommand::Help),
    },
    CommandSpec {
        action: "exit",
        resource: None,
        usage: "exit",
        summary: "Exit the bridge",
        group: CommandGroup::System,
        build: |_| Ok(BridgeCommand::Exit),
    },
];

/// Value of the first `key:value` token, e.g. `project:abc` -> `abc`.
fn tagged(args: &[&str], key: &str) -> Option<String> {
    args.iter()
        .filter_map(|arg| arg.split_once(':'))
        .find(|(k, v)| *k == key && !v.is_empty())
        .map(|(_, v)| v.to_string())
}

impl BridgeCommand {
    /// Resolves a line against [`COMMANDS`]: first by `(action, resource)`,
    /// then by action alone. A blank line is `Help`.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((action, rest)) = parts.split_first() else {
            return Ok(BridgeCommand::Help);
        };

        let two_word = rest.first().and_then(|resource| {
            COMMANDS
                .iter()
                .find(|spec| spec.action == *action && spec.resource == Some(*resource))
        });
        if let Some(spec) = two_word {
            return (spec.build)(&rest[1..]);
        }

        COMMANDS
            .iter()
            .find(|spec| spec.action == *action && spec.resource.is_none())
            .map(|spec| (spec.build)(rest))
            .unwrap_or_else(|| Err(CommandError::Unknown(line.trim().to_string())))
    }
}
