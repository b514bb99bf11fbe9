//! Implementation of the `rfp project` subcommands.
use chrono::Utc;
use rfp_core::config::Config;
use rfp_core::models::{Project, ProjectStatus};
use rfp_core::storage;
use uuid::Uuid;

use super::ProjectCommand;

pub async fn execute(command: ProjectCommand, config: &Config) -> anyhow::Result<()> {
    let pool = storage::init_db(&config.storage.db_path).await?;

    match command {
        ProjectCommand::Create { name, upload_context } => {
            let now = Utc::now();
            let project = Project {
                id: Uuid::new_v4(),
                name,
                owner_id: Uuid::new_v4(),
                status: ProjectStatus::Draft,
                upload_context,
                processing_status: None,
                processing_message: None,
                processing_started_at: None,
                created_at: now,
                updated_at: now,
            };
            storage::projects::insert_project(&pool, &project).await?;
            println!("Created project {} ({})", project.id, project.name);
        }
        ProjectCommand::List => {
            let projects = storage::projects::list_projects(&pool).await?;
            if projects.is_empty() {
                println!("No projects yet. Create one with `rfp project create --name ...`.");
                return Ok(());
            }
            for project in projects {
                let status = project.processing_status.map(|s| s.as_str()).unwrap_or("not started");
                println!("{}  {:<30} {}", project.id, project.name, status);
            }
        }
    }

    Ok(())
}
