//! Implementation of the `rfp run` command.
use anyhow::{bail, Context};
use rfp_core::blob::minio::MinioStore;
use rfp_core::config::Config;
use rfp_core::embedding::voyage::VoyageProvider;
use rfp_core::llm::anthropic::AnthropicProvider;
use rfp_core::pipeline::{self, PipelineDeps};
use rfp_core::storage;
use uuid::Uuid;

pub async fn execute(project_id: &str, config: &Config) -> anyhow::Result<()> {
    let project_id = Uuid::parse_str(project_id).context("invalid project id")?;

    let Some(llm_key) = config.llm.api_key.clone() else {
        bail!("no LLM API key configured; run `rfp init`");
    };
    let Some(embedding_key) = config.embedding.api_key.clone() else {
        bail!("no embedding API key configured; run `rfp init`");
    };
    let (Some(access_key), Some(secret_key)) = (config.blob.access_key.clone(), config.blob.secret_key.clone()) else {
        bail!("no blob store credentials configured; run `rfp init`");
    };

    let pool = storage::init_db(&config.storage.db_path).await?;
    let llm = AnthropicProvider::new(llm_key, config.llm.model.clone());
    let embedder = VoyageProvider::new(embedding_key, config.embedding.model.clone(), config.embedding.dimension);
    let blob = MinioStore::new(config.blob.endpoint.clone(), access_key, secret_key, config.blob.bucket.clone(), config.blob.secure);

    let deps = PipelineDeps {
        pool: &pool,
        llm: &llm,
        embedder: &embedder,
        blob: &blob,
        config,
    };

    println!("Running pipeline for project {project_id}...");
    match pipeline::run_pipeline(&deps, project_id).await {
        Ok(report) => {
            println!("Completed: {} artifact(s) published.", report.artifacts_published);
            Ok(())
        }
        Err(e) => bail!("pipeline run failed: {e}"),
    }
}
