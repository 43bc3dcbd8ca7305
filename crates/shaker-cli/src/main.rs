use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use shaker_cli::cli::bridge::{Bridge, Style};
use shaker_cli::cli::CliConfig;
use shaker_core::constants::SERVER_URL_ENV;
use shaker_core::tracing_setup::init_tracing_with_service;
use shaker_core::ShakerRuntime;
use tokio::io::BufReader;

#[derive(Parser)]
#[command(name = "shaker-cli")]
#[command(about = "Command-line bridge to the Agent Shaker API")]
struct Cli {
    /// Server URL (root or `/api` base)
    #[arg(long, env = SERVER_URL_ENV)]
    url: Option<String>,

    /// Path to JSON config file (serverUrl, reconnectDelayMs, pretty)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Pretty-print JSON output even if the config turns it off
    #[arg(long, short)]
    pretty: bool,

    /// Run a command and exit instead of starting the prompt (repeatable)
    #[arg(long = "exec", short = 'e', value_name = "COMMAND")]
    exec: Vec<String>,
}

#[tokio::main]
async fn main() {
    init_tracing_with_service("shaker-cli", "warn");
    let cli = Cli::parse();

    // The bridge reports failures inline and always exits cleanly
    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = CliConfig::load_or_default(cli.config.as_deref())?;
    let core_config = config.core_config(cli.url.as_deref());
    let runtime = ShakerRuntime::new(core_config).context("Failed to initialise API client")?;

    let stdout = std::io::stdout();
    let color = stdout.is_terminal() && std::env::var_os("NO_COLOR").is_none();
    let pretty = cli.pretty || config.pretty();
    let mut bridge = Bridge::new(runtime, stdout.lock(), Style::new(color), pretty);
    let input = BufReader::new(tokio::io::stdin());

    if cli.exec.is_empty() {
        bridge.banner()?;
        bridge.run(input).await
    } else {
        bridge.run_once(&cli.exec, input).await
    }
}
