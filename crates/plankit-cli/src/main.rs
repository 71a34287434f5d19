mod config;
mod plan_cmds;
mod report_cmd;
mod serve_cmd;
#[cfg(test)]
mod test_util;
mod tool_cmd;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use plankit_core::plan::{PlanCache, PlanContext, PlanRef};
use plankit_core::report::open_sink;
use plankit_core::tools::ToolContext;
use plankit_store::{PlanStatus, Priority, StoreConfig};

use config::PlankitConfig;

#[derive(Parser)]
#[command(name = "plankit", about = "Plan files and agent-facing plan tools")]
struct Cli {
    /// Plans directory (overrides PLANKIT_PLANS_DIR and the config file)
    #[arg(long, global = true, value_name = "DIR")]
    plans_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a plankit config file and create the plans directory
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Plan management
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Inspect and call tools
    Tool {
        #[command(subcommand)]
        command: ToolCommands,
    },
    /// Emit a failure report to the configured sink
    ReportFailure {
        /// What could not be done
        summary: String,
        #[arg(long)]
        requirements: Option<String>,
        #[arg(long)]
        problems: Option<String>,
        #[arg(long)]
        solutions: Option<String>,
        /// Name of the reporting agent
        #[arg(long)]
        source_agent: Option<String>,
    },
    /// Serve the tool catalog over HTTP
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
    /// Print shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Which plan a command acts on: an id/slug, or `--file`.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct PlanTarget {
    /// Plan id or file slug
    pub id: Option<String>,
    /// Path to a plan file
    #[arg(long, value_name = "PATH")]
    pub file: Option<String>,
}

impl PlanTarget {
    pub fn into_ref(self) -> Result<PlanRef> {
        match (self.id, self.file) {
            (_, Some(file)) => Ok(PlanRef::Path(file)),
            (Some(id), None) => Ok(PlanRef::Id(id)),
            (None, None) => anyhow::bail!("either a plan id or --file is required"),
        }
    }
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Show a plan with its tasks
    Show {
        #[command(flatten)]
        target: PlanTarget,
    },
    /// List plans
    List {
        /// Only plans with this status
        #[arg(long)]
        status: Option<PlanStatus>,
        /// Include done and cancelled plans
        #[arg(long)]
        all: bool,
    },
    /// Create a new plan
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        goal: Option<String>,
        #[arg(long)]
        details: Option<String>,
        /// low, medium, high, urgent or maybe
        #[arg(long)]
        priority: Option<Priority>,
        /// Parent plan id
        #[arg(long)]
        parent: Option<u64>,
        /// Id of a plan this one depends on (repeatable)
        #[arg(long = "depends-on", value_name = "ID")]
        depends_on: Vec<u64>,
        /// Task title (repeatable)
        #[arg(long = "task", value_name = "TITLE")]
        tasks: Vec<String>,
    },
    /// Append a task to a plan
    AddTask {
        #[command(flatten)]
        target: PlanTarget,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// File the task touches (repeatable)
        #[arg(long = "files", value_name = "FILE")]
        files: Vec<String>,
    },
    /// Mark a task as done
    Done {
        #[command(flatten)]
        target: PlanTarget,
        /// 1-based task number
        #[arg(long, value_name = "N")]
        task: usize,
    },
    /// Check every plan file and the dependency graph
    Validate,
}

#[derive(Subcommand)]
pub enum ToolCommands {
    /// List the tool catalog
    List {
        /// Print descriptors with parameter schemas as JSON
        #[arg(long)]
        json: bool,
    },
    /// Call a tool and print its result envelope as JSON
    Call {
        /// Tool name
        name: String,
        /// Arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },
}

/// Execute the `plankit init` command: write config file.
fn cmd_init(plans_dir: Option<&Path>, force: bool) -> Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let plans_dir = plans_dir.unwrap_or(Path::new(StoreConfig::DEFAULT_DIR));
    let cfg = config::ConfigFile {
        store: config::StoreSection {
            plans_dir: Some(plans_dir.display().to_string()),
        },
        report: config::ReportSection {
            sink: Some(plankit_core::report::SinkConfig::DEFAULT.to_owned()),
        },
    };
    config::save_config(&cfg)?;

    std::fs::create_dir_all(plans_dir)
        .with_context(|| format!("failed to create plans directory {}", plans_dir.display()))?;

    println!("Config written to {}", path.display());
    println!("  store.plans_dir = {}", plans_dir.display());
    println!("  report.sink = {}", plankit_core::report::SinkConfig::DEFAULT);
    println!();
    println!("Next: run `plankit plan create --title <TITLE>` to add a plan.");

    Ok(())
}

/// Resolve configuration and build the context every command runs against.
fn open_context(cli_plans_dir: Option<&Path>) -> Result<ToolContext> {
    let config = PlankitConfig::resolve(cli_plans_dir)?;
    let cwd = std::env::current_dir().context("failed to get current directory")?;

    // Absolute so store paths and canonicalized user paths compare equal.
    let store = StoreConfig::new(cwd.join(&config.store.plans_dir)).open();
    let sink = open_sink(&config.sink)
        .with_context(|| format!("failed to open report sink {}", config.sink))?;
    tracing::debug!(plans_dir = %store.root().display(), sink = %config.sink, "opened plan store");

    let plans = PlanContext::new(Arc::new(store), Arc::new(PlanCache::new()), cwd);
    Ok(ToolContext::new(plans, sink))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let plans_dir = cli.plans_dir.as_deref();

    match cli.command {
        Commands::Init { force } => {
            cmd_init(plans_dir, force)?;
        }
        Commands::Plan { command } => {
            let ctx = open_context(plans_dir)?;
            plan_cmds::run_plan_command(command, &ctx).await?;
        }
        Commands::Tool { command } => {
            let ctx = open_context(plans_dir)?;
            tool_cmd::run_tool_command(command, &ctx).await?;
        }
        Commands::ReportFailure {
            summary,
            requirements,
            problems,
            solutions,
            source_agent,
        } => {
            let ctx = open_context(plans_dir)?;
            let details = plankit_core::report::FailureDetails {
                requirements,
                problems,
                solutions,
                source_agent,
            };
            report_cmd::run_report_failure(&ctx, &summary, details)?;
        }
        Commands::Serve { bind, port } => {
            let ctx = open_context(plans_dir)?;
            serve_cmd::run_serve(ctx, &bind, port).await?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "plankit", &mut std::io::stdout());
        }
    }

    Ok(())
}
