//! Interactive bridge between a terminal and the Agent Shaker API.
//!
//! Reads one command per line, runs it through the stores of a
//! [`ShakerRuntime`] and prints human-readable results. API failures are
//! printed, never propagated: the only errors `run` returns are I/O errors on
//! the terminal itself.

use std::io::Write;

use anyhow::Result;
use shaker_core::api::ApiError;
use shaker_core::models::{Agent, NewTask, Project, Task, TaskPriority};
use shaker_core::{ListFilter, ListenerId, PushEvent, PushEventKind, ShakerRuntime};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::sync::mpsc;

use super::commands::{BridgeCommand, CommandGroup, COMMANDS};
use super::setup;

pub const PROMPT: &str = "agent-shaker> ";

const RESET: &str = "\x1b[0m";
const BRIGHT: &str = "\x1b[1m";
const GREEN: &str = "\x1b[32m";
const BLUE: &str = "\x1b[34m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";

/// ANSI styling, disabled when output is not a terminal.
#[derive(Debug, Clone, Copy)]
pub struct Style {
    color: bool,
}

impl Style {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("{}{}{}", code, text, RESET)
        } else {
            text.to_string()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

pub struct Bridge<W: Write> {
    runtime: ShakerRuntime,
    out: W,
    style: Style,
    pretty: bool,
    watched: Vec<(PushEventKind, ListenerId)>,
    events_tx: mpsc::UnboundedSender<PushEvent>,
    events_rx: mpsc::UnboundedReceiver<PushEvent>,
}

impl<W: Write> Bridge<W> {
    pub fn new(runtime: ShakerRuntime, out: W, style: Style, pretty: bool) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            runtime,
            out,
            style,
            pretty,
            watched: Vec::new(),
            events_tx,
            events_rx,
        }
    }

    pub fn runtime(&self) -> &ShakerRuntime {
        &self.runtime
    }

    pub fn into_output(self) -> W {
        self.out
    }

    fn log(&mut self, color: &str, message: &str) -> Result<()> {
        let line = self.style.paint(color, message);
        writeln!(self.out, "{}", line)?;
        Ok(())
    }

    pub fn banner(&mut self) -> Result<()> {
        let title = self.style.paint(
            &format!("{}{}", BRIGHT, GREEN),
            "Agent Shaker bridge",
        );
        writeln!(self.out, "{}", title)?;
        writeln!(self.out, "API Base: {}", self.runtime.api().base_url())?;
        writeln!(
            self.out,
            "Type {} for available commands\n",
            self.style.paint(YELLOW, "help")
        )?;
        Ok(())
    }

    /// REPL: prompt, read, execute until `exit` or end of input. Push events
    /// for a watched project are printed as they arrive.
    pub async fn run<R>(&mut self, input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        self.prompt()?;

        loop {
            let line = tokio::select! {
                line = lines.next_line() => line?,
                Some(event) = self.events_rx.recv() => {
                    writeln!(self.out)?;
                    self.print_event(&event)?;
                    self.prompt()?;
                    continue;
                }
            };

            let Some(line) = line else {
                writeln!(self.out)?;
                self.log(GREEN, "Goodbye!")?;
                break;
            };

            if self.handle_line(&line, &mut lines).await? == Flow::Exit {
                break;
            }
            writeln!(self.out)?;
            self.prompt()?;
        }

        self.stop_watching();
        Ok(())
    }

    /// Runs `commands` in order without a prompt. `input` still feeds the
    /// interactive `create task` prompts.
    pub async fn run_once<R>(&mut self, commands: &[String], input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        for command in commands {
            let flow = self.handle_line(command, &mut lines).await?;
            self.drain_events()?;
            if flow == Flow::Exit {
                break;
            }
        }
        self.stop_watching();
        Ok(())
    }

    fn prompt(&mut self) -> Result<()> {
        write!(self.out, "{}", PROMPT)?;
        self.out.flush()?;
        Ok(())
    }

    /// Prints every push event received so far.
    pub fn drain_events(&mut self) -> Result<()> {
        while let Ok(event) = self.events_rx.try_recv() {
            self.print_event(&event)?;
        }
        Ok(())
    }

    async fn handle_line<R>(&mut self, line: &str, lines: &mut Lines<R>) -> Result<Flow>
    where
        R: AsyncBufRead + Unpin,
    {
        match BridgeCommand::parse(line) {
            Ok(BridgeCommand::Exit) => {
                self.log(GREEN, "Goodbye!")?;
                Ok(Flow::Exit)
            }
            Ok(command) => {
                tracing::debug!("Executing {:?}", command);
                self.execute(command, lines).await?;
                Ok(Flow::Continue)
            }
            Err(e) => {
                self.log(RED, &format!("Error: {}", e))?;
                self.log(YELLOW, "Type \"help\" for available commands")?;
                Ok(Flow::Continue)
            }
        }
    }

    async fn execute<R>(&mut self, command: BridgeCommand, lines: &mut Lines<R>) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        match command {
            BridgeCommand::ListAgents { project_id } => {
                let filter = match project_id.as_deref() {
                    Some(id) => ListFilter::new().project(id),
                    None => ListFilter::new(),
                };
                match self.runtime.stores().agents.fetch_all(&filter).await {
                    Ok(agents) => {
                        self.log(GREEN, &format!("\nFound {} agents:", agents.len()))?;
                        for agent in &agents {
                            let text = format_agent(&self.style, agent);
                            writeln!(self.out, "{}", text)?;
                        }
                    }
                    Err(e) => self.report(&e)?,
                }
            }
            BridgeCommand::ListProjects => {
                match self.runtime.stores().projects.fetch_all(&ListFilter::new()).await {
                    Ok(projects) => {
                        self.log(GREEN, &format!("\nFound {} projects:", projects.len()))?;
                        for project in &projects {
                            let text = format_project(&self.style, project);
                            writeln!(self.out, "{}", text)?;
                        }
                    }
                    Err(e) => self.report(&e)?,
                }
            }
            BridgeCommand::ListTasks { project_id } => {
                match self.runtime.stores().tasks.fetch_project_tasks(&project_id).await {
                    Ok(tasks) => {
                        self.log(GREEN, &format!("\nFound {} tasks:", tasks.len()))?;
                        for task in &tasks {
                            let text = format_task(&self.style, task);
                            writeln!(self.out, "{}", text)?;
                        }
                    }
                    Err(e) => self.report(&e)?,
                }
            }
            BridgeCommand::GetProject { project_id } => {
                match self.runtime.stores().projects.fetch_one(&project_id).await {
                    Ok(project) => {
                        self.log(GREEN, "\nProject details:")?;
                        self.print_json(&project)?;
                    }
                    Err(e) => self.report(&e)?,
                }
            }
            BridgeCommand::CreateTask => self.create_task(lines).await?,
            BridgeCommand::Watch { project_id } => self.watch(&project_id)?,
            BridgeCommand::Unwatch => match self.runtime.active_project() {
                Some(project_id) => {
                    self.stop_watching();
                    self.log(GREEN, &format!("Stopped watching project {}", project_id))?;
                }
                None => self.log(YELLOW, "Not watching any project")?,
            },
            BridgeCommand::Health => {
                let url = self.runtime.config().health_url();
                if self.runtime.check_health().await {
                    self.log(GREEN, &format!("Server is healthy ({})", url))?;
                } else {
                    self.log(RED, &format!("Server is unreachable ({})", url))?;
                }
            }
            BridgeCommand::SetupAgent { agent_id, dir } => {
                self.setup_agent(&agent_id, dir.as_deref()).await?
            }
            BridgeCommand::Help => self.show_help()?,
            BridgeCommand::Exit => {}
        }
        Ok(())
    }

    async fn ask<R>(&mut self, question: &str, lines: &mut Lines<R>) -> Result<Option<String>>
    where
        R: AsyncBufRead + Unpin,
    {
        write!(self.out, "{}", question)?;
        self.out.flush()?;
        Ok(lines.next_line().await?.map(|answer| answer.trim().to_string()))
    }

    async fn create_task<R>(&mut self, lines: &mut Lines<R>) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        self.log(BLUE, "Enter task details:")?;

        let mut answers = Vec::with_capacity(4);
        for question in [
            "Title: ",
            "Description: ",
            "Project ID: ",
            "Priority (low/medium/high): ",
        ] {
            match self.ask(question, lines).await? {
                Some(answer) => answers.push(answer),
                None => {
                    writeln!(self.out)?;
                    return self.log(YELLOW, "Task creation cancelled");
                }
            }
        }
        let [title, description, project_id, priority] = <[String; 4]>::try_from(answers)
            .map_err(|_| anyhow::anyhow!("Incomplete task details"))?;

        let priority = if priority.is_empty() {
            TaskPriority::default()
        } else {
            match priority.parse::<TaskPriority>() {
                Ok(priority) => priority,
                Err(e) => return self.log(RED, &format!("Error: {}", e)),
            }
        };

        let mut task = NewTask::new(project_id, title);
        task.description = description;
        task.priority = priority;

        match self.runtime.stores().tasks.create(&task).await {
            Ok(created) => {
                self.log(GREEN, "Task created successfully!")?;
                self.print_json(&created)?;
            }
            Err(e) => self.report(&e)?,
        }
        Ok(())
    }

    fn watch(&mut self, project_id: &str) -> Result<()> {
        if self.watched.is_empty() {
            let connection = self.runtime.connection().clone();
            for kind in PushEventKind::ALL {
                let tx = self.events_tx.clone();
                let id = connection.on(kind, move |event| {
                    let _ = tx.send(event.clone());
                });
                self.watched.push((kind, id));
            }
        }

        self.runtime.select_project(project_id);
        self.log(
            GREEN,
            &format!("Watching project {} (updates print as they arrive)", project_id),
        )
    }

    fn stop_watching(&mut self) {
        let connection = self.runtime.connection().clone();
        for (kind, id) in self.watched.drain(..) {
            connection.off(kind, id);
        }
        self.runtime.deselect_project();
    }

    fn print_event(&mut self, event: &PushEvent) -> Result<()> {
        let text = format_event(&self.style, event);
        writeln!(self.out, "{}", text)?;
        Ok(())
    }

    async fn setup_agent(&mut self, agent_id: &str, dir: Option<&std::path::Path>) -> Result<()> {
        let stores = self.runtime.stores().clone();
        let agent = match stores.agents.fetch_one(agent_id).await {
            Ok(agent) => agent,
            Err(e) => return self.report(&e),
        };
        let project = match stores.projects.fetch_one(&agent.project_id).await {
            Ok(project) => project,
            Err(e) => return self.report(&e),
        };

        let files = setup::render(&agent, &project, self.runtime.config())?;
        match dir {
            Some(dir) => match setup::write_all(dir, &files) {
                Ok(written) => {
                    self.log(GREEN, &format!("Wrote {} files for {}:", written.len(), agent.name))?;
                    for path in written {
                        writeln!(self.out, "  {}", path.display())?;
                    }
                }
                Err(e) => self.log(RED, &format!("Error: {:#}", e))?,
            },
            None => {
                for file in &files {
                    let heading = format!("\n== {} ==", file.path.display());
                    self.log(BLUE, &heading)?;
                    writeln!(self.out, "{}", file.contents.trim_end())?;
                }
            }
        }
        Ok(())
    }

    fn show_help(&mut self) -> Result<()> {
        let title = self.style.paint(BRIGHT, "Agent Shaker bridge - Available Commands:");
        writeln!(self.out, "\n{}", title)?;

        for group in [CommandGroup::Query, CommandGroup::Action, CommandGroup::System] {
            let heading = self.style.paint(BLUE, group.title());
            writeln!(self.out, "\n{}", heading)?;
            for spec in COMMANDS.iter().filter(|spec| spec.group == group) {
                writeln!(self.out, "  {:<28} - {}", spec.usage, spec.summary)?;
            }
        }

        let examples = self.style.paint(BLUE, "Examples:");
        writeln!(self.out, "\n{}", examples)?;
        for example in [
            "list agents",
            "list agents project:550e8400-e29b-41d4-a716-446655440001",
            "list projects",
            "create task",
        ] {
            let example = self.style.paint(YELLOW, example);
            writeln!(self.out, "  {}", example)?;
        }
        Ok(())
    }

    fn print_json<T: serde::Serialize>(&mut self, value: &T) -> Result<()> {
        let text = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        writeln!(self.out, "{}", text)?;
        Ok(())
    }

    /// `API Error: <code> - <reason>` plus the body for HTTP failures,
    /// `Error: <message>` for everything else.
    fn report(&mut self, error: &ApiError) -> Result<()> {
        match error {
            ApiError::Status { status, body, .. } => {
                let reason = status.canonical_reason().unwrap_or("Unknown");
                self.log(RED, &format!("API Error: {} - {}", status.as_u16(), reason))?;
                if !body.is_empty() {
                    writeln!(self.out, "{}", body)?;
                }
            }
            other => {
                let message = other.user_message().unwrap_or_else(|| other.to_string());
                self.log(RED, &format!("Error: {}", message))?;
            }
        }
        Ok(())
    }
}

pub fn format_agent(style: &Style, agent: &Agent) -> String {
    let status_color = if agent.is_active() { GREEN } else { RED };
    let last_seen = agent
        .last_seen
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "never".to_string());
    format!(
        "{} ({}) - {}\n  Team: {}\n  Last seen: {}",
        style.paint(BRIGHT, &agent.name),
        style.paint(BLUE, &agent.role),
        style.paint(status_color, &agent.status),
        agent.team,
        last_seen
    )
}

pub fn format_project(style: &Style, project: &Project) -> String {
    format!(
        "{}\n  {}\n  Status: {}",
        style.paint(BRIGHT, &project.name),
        project.description,
        project.status
    )
}

pub fn format_task(style: &Style, task: &Task) -> String {
    let priority_color = match task.priority {
        TaskPriority::High => RED,
        TaskPriority::Medium => YELLOW,
        TaskPriority::Low => RESET,
    };
    let description = if task.description.is_empty() {
        "No description"
    } else {
        task.description.as_str()
    };
    format!(
        "{}\n  Priority: {} | Status: {}\n  {}",
        style.paint(BRIGHT, &task.title),
        style.paint(priority_color, task.priority.as_str()),
        task.status,
        description
    )
}

pub fn format_event(style: &Style, event: &PushEvent) -> String {
    let label = match event {
        PushEvent::Unknown { event_type, .. } => event_type
            .clone()
            .unwrap_or_else(|| "unknown".to_string()),
        other => other
            .kind()
            .wire_name()
            .unwrap_or("unknown")
            .to_string(),
    };

    let detail = match event {
        PushEvent::TaskUpdate(change) => describe(&change.id, change.status.as_deref()),
        PushEvent::AgentUpdate(change) => describe(&change.id, change.status.as_deref()),
        PushEvent::ContextAdded(change)
        | PushEvent::ContextUpdated(change)
        | PushEvent::ContextDeleted(change) => describe(&change.id, None),
        PushEvent::StandupUpdate(change) => describe(&change.id, None),
        PushEvent::Unknown { .. } => String::new(),
    };

    format!("{} {}", style.paint(YELLOW, &format!("[{}]", label)), detail)
        .trim_end()
        .to_string()
}

fn describe(id: &Option<String>, status: Option<&str>) -> String {
    match (id.as_deref(), status) {
        (Some(id), Some(status)) => format!("{} -> {}", id, status),
        (Some(id), None) => id.to_string(),
        (None, Some(status)) => format!("-> {}", status),
        (None, None) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plain() -> Style {
        Style::new(false)
    }

    #[test]
    fn test_format_agent() {
        let agent: Agent = serde_json::from_value(json!({
            "id": "a1",
            "name": "Backend Bot",
            "role": "backend",
            "team": "core",
            "status": "active",
            "last_seen": "2024-05-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(
            format_agent(&plain(), &agent),
            "Backend Bot (backend) - active\n  Team: core\n  Last seen: 2024-05-01T10:00:00+00:00"
        );
    }

    #[test]
    fn test_format_task_without_description() {
        let task: Task = serde_json::from_value(json!({
            "id": "t1",
            "title": "Write docs",
            "priority": "high",
            "status": "pending"
        }))
        .unwrap();

        assert_eq!(
            format_task(&plain(), &task),
            "Write docs\n  Priority: high | Status: pending\n  No description"
        );
    }

    #[test]
    fn test_colored_output_wraps_and_resets() {
        let project: Project = serde_json::from_value(json!({"id": "p1", "name": "Shaker"})).unwrap();
        let text = format_project(&Style::new(true), &project);
        assert!(text.starts_with("\x1b[1mShaker\x1b[0m"));
    }

    #[test]
    fn test_format_events() {
        let event = PushEvent::parse(r#"{"type":"task_update","payload":{"id":"t1","status":"done"}}"#).unwrap();
        assert_eq!(format_event(&plain(), &event), "[task_update] t1 -> done");

        let event = PushEvent::parse(r#"{"type":"context_deleted","payload":{"id":"c1"}}"#).unwrap();
        assert_eq!(format_event(&plain(), &event), "[context_deleted] c1");

        let event = PushEvent::parse(r#"{"type":"mystery"}"#).unwrap();
        assert_eq!(format_event(&plain(), &event), "[mystery]");
    }
}
