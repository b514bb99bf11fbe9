/// RFP/RFI pipeline CLI.
///
/// Entry point for the `rfp` binary. Parses CLI arguments, initializes
/// logging, and dispatches to subcommand handlers.
mod commands;

use clap::Parser;
use rfp_core::config::Config;
use tracing_subscriber::EnvFilter;

/// RFP/RFI response pipeline
#[derive(Parser)]
#[command(name = "rfp")]
#[command(version)]
#[command(about = "RFP/RFI response pipeline")]
#[command(after_help = "\
Quick start:
  1. rfp init                                — interactive setup wizard
  2. rfp test                                 — validate configuration and connectivity
  3. rfp project create --name \"Acme Corp\"    — register a project
  4. rfp document upload <project-id> <path>  — attach source documents
  5. rfp run <project-id>                     — process the project")]
struct Cli {
    /// Path to config.toml
    #[arg(short = 'c', long, global = true, default_value = "~/.rfp-pipeline/config.toml")]
    config: String,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Set up configuration (interactive wizard)
    Init(commands::InitArgs),
    /// Process a project's documents into answered artifacts
    Run(commands::RunArgs),
    /// Validate configuration and connectivity
    Test(commands::TestArgs),
    /// Show a project's processing status
    Status(commands::StatusArgs),
    /// Create or list projects
    Project(commands::ProjectArgs),
    /// Upload a source document to a project
    Document(commands::DocumentArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose/--quiet flags > default (warn).
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("rfp=debug,rfp_core=debug,info")
    } else if cli.quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::new("rfp=info,rfp_core=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(cli.verbose)
        .compact()
        .init();

    // `init` manages its own config lifecycle; it may be creating the file
    // this run loads on every other path.
    if let Commands::Init(args) = cli.command {
        return commands::init::execute(args.force, &cli.config).await;
    }

    let config = Config::load(Some(&cli.config)).map_err(|e| {
        anyhow::anyhow!("Failed to load configuration: {e}\nHint: Run 'rfp init' to create a default configuration file.")
    })?;

    match cli.command {
        Commands::Init(_) => unreachable!(),
        Commands::Run(args) => commands::run::execute(&args.project_id, &config).await,
        Commands::Test(_) => commands::test::execute(&config).await,
        Commands::Status(args) => commands::status::execute(&args.project_id, &config).await,
        Commands::Project(args) => commands::project::execute(args.command, &config).await,
        Commands::Document(args) => commands::document::execute(args.command, &config).await,
    }
}
