//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for command results
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, colored text
    #[default]
    Text,
    /// JSON output
    Json,
}

/// CLI arguments for toolgate
#[derive(Parser, Debug)]
#[command(name = "toolgate")]
#[command(author, version, about = "Tool orchestration with health-aware fallback")]
#[command(long_about = r#"
toolgate routes calls to external tools through a live backend or a degraded
substitute, tracks backend health, keeps rolling metrics and alerts, and runs
multi-step workflows under a deadline.

Configuration files are loaded from (in priority order):
1. TOOLGATE_* environment variables (e.g. TOOLGATE_ORCHESTRATOR__TOOL_MODE=degraded)
2. --config <path>                  Explicit config file
3. ./toolgate.toml                  Project-level config
4. ~/.config/toolgate/config.toml   Global config

Example:
  toolgate invoke weather --params '{"city": "Oslo"}'
  toolgate run workflows/trip.toml -o json
  toolgate status --probe
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Force every tool into this mode (live, degraded, auto)
    #[arg(long, global = true, value_name = "MODE")]
    pub mode: Option<String>,

    /// Also write logs to daily-rotated files in this directory
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Invoke a single tool
    Invoke {
        /// Registered tool name
        tool: String,

        /// Call parameters as a JSON object
        #[arg(short, long, default_value = "{}")]
        params: String,

        /// Per-call timeout override in milliseconds
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,
    },

    /// Run a workflow definition file (TOML or JSON)
    Run {
        /// Workflow file
        workflow: PathBuf,

        /// Only validate the definition against the registered tools
        #[arg(long)]
        check: bool,
    },

    /// Show registered tools, health, metrics and alerts
    Status {
        /// Ping every probed tool before reporting
        #[arg(long)]
        probe: bool,
    },

    /// Keep probing in the background and print status periodically until Ctrl-C
    Watch {
        /// Seconds between status reports
        #[arg(long, default_value_t = 30)]
        every_secs: u64,
    },

    /// Show configuration sources and validation issues
    Config,
}
