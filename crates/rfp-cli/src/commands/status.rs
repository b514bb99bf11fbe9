//! Implementation of the `rfp status` command.
use anyhow::Context;
use rfp_core::config::Config;
use rfp_core::storage;
use uuid::Uuid;

pub async fn execute(project_id: &str, config: &Config) -> anyhow::Result<()> {
    let project_id = Uuid::parse_str(project_id).context("invalid project id")?;
    let pool = storage::init_db(&config.storage.db_path).await?;

    let project = storage::projects::get_project(&pool, project_id)
        .await?
        .with_context(|| format!("no project found with id {project_id}"))?;

    println!("{}  {}", project.id, project.name);
    match project.processing_status {
        Some(status) => {
            println!("status:  {}", status.as_str());
            if let Some(started) = project.processing_started_at {
                println!("started: {started}");
            }
            if let Some(message) = &project.processing_message {
                println!("message: {message}");
            }
        }
        None => println!("status:  not started"),
    }

    Ok(())
}
