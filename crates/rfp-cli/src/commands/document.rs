//! Implementation of the `rfp document upload` subcommand.
use std::path::Path;

use anyhow::Context;
use rfp_core::blob::minio::MinioStore;
use rfp_core::blob::BlobStore;
use rfp_core::config::Config;
use rfp_core::models::{Document, DocumentStatus, FileType};
use rfp_core::storage;
use uuid::Uuid;

use super::DocumentCommand;

pub async fn execute(command: DocumentCommand, config: &Config) -> anyhow::Result<()> {
    let DocumentCommand::Upload { project_id, path } = command;
    let project_id = Uuid::parse_str(&project_id).context("invalid project id")?;

    let pool = storage::init_db(&config.storage.db_path).await?;
    if storage::projects::get_project(&pool, project_id).await?.is_none() {
        anyhow::bail!("no project found with id {project_id}");
    }

    let (access_key, secret_key) = match (&config.blob.access_key, &config.blob.secret_key) {
        (Some(a), Some(s)) => (a.clone(), s.clone()),
        _ => anyhow::bail!("blob store access/secret key not configured; run `rfp init`"),
    };
    let blob = MinioStore::new(config.blob.endpoint.clone(), access_key, secret_key, config.blob.bucket.clone(), config.blob.secure);

    let source = Path::new(&path);
    let filename = source
        .file_name()
        .and_then(|n| n.to_str())
        .context("path has no filename")?
        .to_string();
    let file_type = FileType::from_extension(&filename).with_context(|| format!("unsupported file type for {filename}"))?;

    let bytes = std::fs::read(source).with_context(|| format!("reading {}", source.display()))?;
    let size_bytes = bytes.len() as i64;
    let storage_key = format!("projects/{project_id}/source/{}/{filename}", Uuid::new_v4());

    blob.put(&storage_key, bytes, content_type_for(file_type)).await?;

    let document = Document {
        id: Uuid::new_v4(),
        project_id,
        filename: filename.clone(),
        storage_key,
        file_type,
        size_bytes,
        doc_category: None,
        parsed_text: None,
        page_count: None,
        status: DocumentStatus::Uploaded,
        error_message: None,
        uploaded_by: None,
    };
    storage::documents::insert_document(&pool, &document).await?;

    println!("Uploaded {filename} ({size_bytes} bytes) to project {project_id} as document {}", document.id);
    Ok(())
}

fn content_type_for(file_type: FileType) -> &'static str {
    match file_type {
        FileType::Pdf => "application/pdf",
        FileType::Docx => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        FileType::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        FileType::Csv => "text/csv",
        FileType::Pptx => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        FileType::Gsheet => "application/vnd.google-apps.spreadsheet",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_matches_pdf() {
        assert_eq!(content_type_for(FileType::Pdf), "application/pdf");
    }

    #[test]
    fn content_type_matches_xlsx() {
        assert_eq!(
            content_type_for(FileType::Xlsx),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
    }
}
