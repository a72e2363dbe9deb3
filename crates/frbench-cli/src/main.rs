mod commands;

use clap::{Parser, Subcommand};
use frbench_bench::{PromptMode, DEFAULT_CONFIG_FILE};
use frbench_core::ScoreMode;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "frbench", about = "Functional-requirement benchmark for code-generating models", version)]
struct Cli {
    /// Benchmark configuration file (TOML)
    #[arg(long, global = true, env = "FRBENCH_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the benchmark for the selected models and projects
    Run(RunArgs),

    /// Evaluate a finished run and write score, cost and time tables
    Eval {
        /// Run directory holding stats.json
        run_dir: PathBuf,

        /// Score mode (score-k, weighted-score-k); all modes when omitted
        #[arg(long)]
        mode: Option<ScoreMode>,
    },

    /// List project templates
    List {
        /// Templates directory (overrides the config file)
        #[arg(long)]
        templates: Option<PathBuf>,
    },

    /// Scaffold a new project template
    Init {
        /// Directory name of the new template
        name: String,

        /// Create a checkpoints project instead of a single one
        #[arg(long)]
        checkpoints: bool,

        /// Templates directory (overrides the config file)
        #[arg(long)]
        templates: Option<PathBuf>,
    },

    /// Manage the response cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(clap::Args)]
pub struct RunArgs {
    /// Model to benchmark (repeatable)
    #[arg(short, long = "model")]
    pub models: Vec<String>,

    /// Project template directory name (repeatable); all when omitted
    #[arg(short, long = "project")]
    pub projects: Vec<String>,

    /// Attempts per requirement
    #[arg(short)]
    pub k: Option<u32>,

    #[arg(long)]
    pub temperature: Option<f64>,

    /// Always call the provider, ignoring cached responses
    #[arg(long)]
    pub no_cache: bool,

    /// Send the conversation history with every prompt
    #[arg(long)]
    pub history: bool,

    /// Answer format requested from the model (write, patch)
    #[arg(long)]
    pub mode: Option<PromptMode>,

    #[arg(long, env = "FRBENCH_TEMPLATES")]
    pub templates: Option<PathBuf>,

    #[arg(long)]
    pub workspace: Option<PathBuf>,

    #[arg(long, env = "FRBENCH_CACHE")]
    pub cache: Option<PathBuf>,

    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Wait for ENTER after every failed attempt
    #[arg(long)]
    pub interactive: bool,

    /// Keep a copy of the workspace after every project
    #[arg(long)]
    pub snapshots: bool,

    /// Dump request bodies into this directory
    #[arg(long)]
    pub trace_dir: Option<PathBuf>,

    #[arg(long, env = "ANTHROPIC_BASE_URL", hide = true)]
    pub anthropic_url: Option<String>,

    #[arg(long, env = "OPENAI_BASE_URL", hide = true)]
    pub openai_url: Option<String>,

    #[arg(long, env = "GOOGLE_BASE_URL", hide = true)]
    pub google_url: Option<String>,
}

#[derive(Subcommand)]
enum CacheAction {
    /// Delete cached responses
    Clear {
        /// Only this model's responses
        #[arg(long)]
        model: Option<String>,

        /// Cache directory (overrides the config file)
        #[arg(long, env = "FRBENCH_CACHE")]
        cache: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "frbench=debug" } else { "frbench=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Run(args) => commands::run::run(&cli.config, args).await,
        Commands::Eval { run_dir, mode } => commands::eval::run(&run_dir, mode),
        Commands::List { templates } => commands::list::run(&cli.config, templates),
        Commands::Init {
            name,
            checkpoints,
            templates,
        } => commands::init::run(&cli.config, &name, checkpoints, templates),
        Commands::Cache { action } => match action {
            CacheAction::Clear { model, cache } => {
                commands::cache::clear(&cli.config, model, cache)
            }
        },
    };

    if let Err(e) = result {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
