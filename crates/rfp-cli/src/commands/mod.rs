//! CLI subcommand argument definitions and implementations.
//!
//! Each subcommand struct defines its flags and arguments; the matching
//! module implements `execute`.
pub mod document;
pub mod init;
pub mod project;
pub mod run;
pub mod status;

use clap::{Args, Subcommand};

/// Arguments for the `init` subcommand.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `run` subcommand.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Project id to process
    pub project_id: String,
}

/// Arguments for the `test` subcommand.
#[derive(Debug, Args)]
pub struct TestArgs;

/// Arguments for the `status` subcommand.
#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Project id to report on
    pub project_id: String,
}

/// `project create`/`project list` subcommands.
#[derive(Debug, Subcommand)]
pub enum ProjectCommand {
    /// Create a new project
    Create {
        /// Project name, shown on generated artifacts
        #[arg(long)]
        name: String,
        /// Free-text upload context (sheet/tab hints, client name)
        #[arg(long)]
        upload_context: Option<String>,
    },
    /// List every project
    List,
}

/// Arguments for the `project` subcommand.
#[derive(Debug, Args)]
pub struct ProjectArgs {
    #[command(subcommand)]
    pub command: ProjectCommand,
}

/// Arguments for the `document upload` subcommand.
#[derive(Debug, Args)]
pub struct DocumentArgs {
    #[command(subcommand)]
    pub command: DocumentCommand,
}

#[derive(Debug, Subcommand)]
pub enum DocumentCommand {
    /// Upload a source document to a project
    Upload {
        /// Project id to attach the document to
        project_id: String,
        /// Path to the local file to upload
        path: String,
    },
}
