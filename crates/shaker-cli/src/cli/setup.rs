//! IDE integration files for one agent: VS Code settings and MCP server
//! entry, Copilot instructions, and a bash helper script.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::json;
use shaker_core::models::{Agent, Project};
use shaker_core::CoreConfig;

pub struct SetupFile {
    /// Relative to the target directory
    pub path: PathBuf,
    pub contents: String,
}

/// Renders every setup file. Pure; nothing touches the filesystem.
pub fn render(agent: &Agent, project: &Project, config: &CoreConfig) -> Result<Vec<SetupFile>> {
    let api_url = config.api_base_url();

    Ok(vec![
        SetupFile {
            path: PathBuf::from(".vscode/settings.json"),
            contents: settings_json(agent, project, &api_url)?,
        },
        SetupFile {
            path: PathBuf::from(".vscode/mcp.json"),
            contents: mcp_json(agent, project, config)?,
        },
        SetupFile {
            path: PathBuf::from(".github/copilot-instructions.md"),
            contents: copilot_instructions(agent, project, &api_url),
        },
        SetupFile {
            path: PathBuf::from("scripts/mcp-agent.sh"),
            contents: bash_script(agent, project, &api_url),
        },
    ])
}

/// Writes the files under `dir`, creating parent directories.
pub fn write_all(dir: &Path, files: &[SetupFile]) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let target = dir.join(&file.path);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&target, &file.contents)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        written.push(target);
    }
    Ok(written)
}

fn settings_json(agent: &Agent, project: &Project, api_url: &str) -> Result<String> {
    let env = json!({
        "MCP_AGENT_NAME": agent.name,
        "MCP_AGENT_ID": agent.id,
        "MCP_PROJECT_ID": project.id,
        "MCP_PROJECT_NAME": project.name,
        "MCP_API_URL": api_url,
    });
    let settings = json!({
        "terminal.integrated.env.windows": env,
        "terminal.integrated.env.linux": env,
        "terminal.integrated.env.osx": env,
    });
    serde_json::to_string_pretty(&settings).context("Failed to render settings.json")
}

fn mcp_json(agent: &Agent, project: &Project, config: &CoreConfig) -> Result<String> {
    let mcp = json!({
        "servers": {
            "agent-shaker": {
                "type": "http",
                "url": config.mcp_url(&project.id, &agent.id),
            }
        }
    });
    serde_json::to_string_pretty(&mcp).context("Failed to render mcp.json")
}

fn copilot_instructions(agent: &Agent, project: &Project, api_url: &str) -> String {
    let team = if agent.team.is_empty() {
        "Not specified"
    } else {
        agent.team.as_str()
    };
    let responsibilities = if agent.role == "frontend" {
        "- Focus on UI/UX implementation\n\
         - Implement responsive designs and accessibility\n\
         - Handle client-side state management\n"
    } else {
        "- Focus on API development and backend logic\n\
         - Work with databases and data models\n\
         - Implement business logic and validations\n\
         - Handle server-side security and authentication\n"
    };

    format!(
        "# Agent Identity and MCP Integration\n\
         \n\
         ## Your Identity\n\
         - **Agent Name**: {name}\n\
         - **Agent ID**: {id}\n\
         - **Role**: {role}\n\
         - **Team**: {team}\n\
         - **Project**: {project_name}\n\
         - **Project ID**: {project_id}\n\
         \n\
         ## MCP API Configuration\n\
         - **API URL**: {api_url}\n\
         \n\
         ## Your Responsibilities\n\
         As the **{role}** agent, you should:\n\
         {responsibilities}\
         \n\
         ## Collaboration Guidelines\n\
         1. Always check for existing tasks before starting new work\n\
         2. Update task status when you begin and complete work\n\
         3. Document important decisions and implementation details\n\
         4. Check other agents' contexts to avoid conflicts\n",
        name = agent.name,
        id = agent.id,
        role = agent.role,
        team = team,
        project_name = project.name,
        project_id = project.id,
        api_url = api_url,
        responsibilities = responsibilities,
    )
}

fn bash_script(agent: &Agent, project: &Project, api_url: &str) -> String {
    let header = format!(
        "#!/bin/bash\n\
         # MCP Agent Helper Script for Bash\n\
         # Agent: {}\n\
         # Project: {}\n\
         \n\
         export MCP_AGENT_NAME=\"{}\"\n\
         export MCP_AGENT_ID=\"{}\"\n\
         export MCP_PROJECT_ID=\"{}\"\n\
         export MCP_PROJECT_NAME=\"{}\"\n\
         export MCP_API_URL=\"{}\"\n",
        agent.name, project.name, agent.name, agent.id, project.id, project.name, api_url
    );

    let functions = r#"
# Tasks assigned to this agent
get_my_tasks() {
    curl -s "$MCP_API_URL/tasks?agent_id=$MCP_AGENT_ID" | jq .
}

# Usage: update_task_status <task_id> <status>
# Status: pending, in_progress, done, blocked
update_task_status() {
    local task_id=$1
    local status=$2
    curl -s -X PUT "$MCP_API_URL/tasks/$task_id/status" \
        -H "Content-Type: application/json" \
        -d "{\"status\": \"$status\"}" | jq .
}

# Usage: add_context "Title" "Content" "tag1,tag2"
add_context() {
    local title=$1
    local content=$2
    local tags=$3
    curl -s -X POST "$MCP_API_URL/contexts" \
        -H "Content-Type: application/json" \
        -d "{
            \"project_id\": \"$MCP_PROJECT_ID\",
            \"agent_id\": \"$MCP_AGENT_ID\",
            \"title\": \"$title\",
            \"content\": \"$content\",
            \"tags\": [\"$tags\"]
        }" | jq .
}

get_project_contexts() {
    curl -s "$MCP_API_URL/contexts?project_id=$MCP_PROJECT_ID" | jq .
}
"#;

    format!("{}{}", header, functions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixtures() -> (Agent, Project) {
        let agent: Agent = serde_json::from_value(json!({
            "id": "a1",
            "project_id": "p1",
            "name": "Backend Bot",
            "role": "backend",
            "team": "",
            "status": "active"
        }))
        .unwrap();
        let project: Project =
            serde_json::from_value(json!({ "id": "p1", "name": "Shaker" })).unwrap();
        (agent, project)
    }

    fn find<'a>(files: &'a [SetupFile], path: &str) -> &'a str {
        &files
            .iter()
            .find(|f| f.path == Path::new(path))
            .unwrap()
            .contents
    }

    #[test]
    fn test_settings_env_for_every_platform() {
        let (agent, project) = fixtures();
        let files = render(&agent, &project, &CoreConfig::new("http://localhost:8080")).unwrap();

        let settings: serde_json::Value =
            serde_json::from_str(find(&files, ".vscode/settings.json")).unwrap();
        for platform in ["windows", "linux", "osx"] {
            let env = &settings[format!("terminal.integrated.env.{}", platform)];
            assert_eq!(env["MCP_AGENT_ID"], "a1");
            assert_eq!(env["MCP_PROJECT_NAME"], "Shaker");
            assert_eq!(env["MCP_API_URL"], "http://localhost:8080/api");
        }
    }

    #[test]
    fn test_mcp_url_carries_identity() {
        let (agent, project) = fixtures();
        let files = render(&agent, &project, &CoreConfig::new("http://localhost:8080/api")).unwrap();

        let mcp: serde_json::Value = serde_json::from_str(find(&files, ".vscode/mcp.json")).unwrap();
        let server = &mcp["servers"]["agent-shaker"];
        assert_eq!(server["type"], "http");
        let url = server["url"].as_str().unwrap();
        assert!(url.starts_with("http://localhost:8080"));
        assert!(!url.contains("/api"));
        assert!(url.contains("project_id=p1"));
        assert!(url.contains("agent_id=a1"));
    }

    #[test]
    fn test_instructions_and_script() {
        let (agent, project) = fixtures();
        let files = render(&agent, &project, &CoreConfig::default()).unwrap();

        let instructions = find(&files, ".github/copilot-instructions.md");
        assert!(instructions.contains("- **Team**: Not specified"));
        assert!(instructions.contains("API development"));

        let script = find(&files, "scripts/mcp-agent.sh");
        assert!(script.starts_with("#!/bin/bash"));
        assert!(script.contains("export MCP_AGENT_NAME=\"Backend Bot\""));
        assert!(script.contains("export MCP_PROJECT_ID=\"p1\""));
    }

    #[test]
    fn test_write_all_creates_directories() {
        let (agent, project) = fixtures();
        let files = render(&agent, &project, &CoreConfig::default()).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let written = write_all(dir.path(), &files).unwrap();

        assert_eq!(written.len(), 4);
        assert!(dir.path().join(".vscode/mcp.json").is_file());
        assert!(dir.path().join("scripts/mcp-agent.sh").is_file());
    }
}
