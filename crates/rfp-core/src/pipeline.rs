//! Pipeline orchestrator (L15): the end-to-end run from "documents have
//! been uploaded" to "artifacts are published", driven by
//! [`run_pipeline`].
//!
//! The orchestrator itself never retries and never partially commits
//! publication: every subsystem it calls already degrades gracefully on
//! its own failures (classification, dedup, generation, spreadsheet
//! answering), so by the time control reaches here a failure is either a
//! single skipped document/sheet (logged, not fatal) or something that
//! should abort the run outright (no documents, storage failure,
//! publication failure).

use std::path::{Path, PathBuf};

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::artifacts::{build_rfi_pdf, build_win_plan_docx, RfiDocument};
use crate::blob::BlobStore;
use crate::chunking::chunk_text;
use crate::classifier::classify_document;
use crate::config::Config;
use crate::dedupe::dedupe_requirements;
use crate::embedding::EmbeddingProvider;
use crate::error::PipelineError;
use crate::extraction::pricing::extract_pricing_structure;
use crate::extraction::requirements::{extract_requirements, renumber_requirements};
use crate::extraction::schedule::extract_schedule_events;
use crate::generator::generate_responses_batch;
use crate::llm::LlmProvider;
use crate::models::{DocCategory, Document, DocumentStatus, FileType, ProcessingStatus};
use crate::parsers::parse_document;
use crate::plan::build_win_plan;
use crate::spreadsheet::{scan_workbook, write_answers, AnswerWrite};
use crate::storage::DbPool;

/// Everything a pipeline run needs, bundled so call sites don't have to
/// thread five parameters through every helper.
pub struct PipelineDeps<'a> {
    pub pool: &'a DbPool,
    pub llm: &'a dyn LlmProvider,
    pub embedder: &'a dyn EmbeddingProvider,
    pub blob: &'a dyn BlobStore,
    pub config: &'a Config,
}

/// Summary of a completed run, used to build the final status message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub artifacts_published: usize,
}

/// Regex for `upload_context` sheet/tab hints: `sheet: Pricing` or
/// `tab - Technical Questions`, capped at 60 characters, high-confidence
/// only (explicit separator required).
static SHEET_HINT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:sheet|tab)\s*[:\-]\s*([\w &/]{1,60})").expect("valid regex"));

static CLIENT_HINT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)client\s*[:\-]\s*([\w &.,/]{1,60})").expect("valid regex"));

/// High-confidence hints parsed out of a project's free-text `upload_context`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct UploadHints {
    sheet_names: Vec<String>,
    client_name: Option<String>,
}

fn parse_upload_hints(upload_context: Option<&str>) -> UploadHints {
    let Some(text) = upload_context else {
        return UploadHints::default();
    };

    UploadHints {
        sheet_names: SHEET_HINT_PATTERN.captures_iter(text).map(|c| c[1].trim().to_string()).collect(),
        client_name: CLIENT_HINT_PATTERN.captures_iter(text).next().map(|c| c[1].trim().to_string()),
    }
}

/// Run the full pipeline for `project_id`.
///
/// Rejects with [`PipelineError::Conflict`] if the project is already
/// `processing`. On any uncaught failure, transitions the project to
/// `failed` with a truncated message and still removes the temp
/// workspace before returning the error.
pub async fn run_pipeline(deps: &PipelineDeps<'_>, project_id: Uuid) -> Result<PipelineReport, PipelineError> {
    let project = crate::storage::projects::get_project(deps.pool, project_id)
        .await?
        .ok_or(PipelineError::Conflict {
            project_id: project_id.to_string(),
        })?;

    if project.processing_status == Some(ProcessingStatus::Processing) {
        return Err(PipelineError::Conflict {
            project_id: project_id.to_string(),
        });
    }

    let documents = crate::storage::documents::list_source_documents(deps.pool, project_id).await?;
    if documents.is_empty() {
        return Err(PipelineError::NoDocuments);
    }

    crate::storage::projects::mark_processing(deps.pool, project_id, Utc::now()).await?;

    match run_stages(deps, project_id, &project.upload_context, &documents).await {
        Ok(report) => {
            let message = format!("published {} artifact(s)", report.artifacts_published);
            crate::storage::projects::mark_terminal(deps.pool, project_id, ProcessingStatus::Completed, Some(&message), Utc::now())
                .await?;
            Ok(report)
        }
        Err(e) => {
            let message = e.truncated_message();
            // Best-effort: a failure to record the failure should not mask the original error.
            let _ = crate::storage::projects::mark_terminal(deps.pool, project_id, ProcessingStatus::Failed, Some(&message), Utc::now()).await;
            Err(e)
        }
    }
}

async fn run_stages(
    deps: &PipelineDeps<'_>,
    project_id: Uuid,
    upload_context: &Option<String>,
    documents: &[Document],
) -> Result<PipelineReport, PipelineError> {
    let hints = parse_upload_hints(upload_context.as_deref());
    let client_name = hints.client_name.clone().unwrap_or_else(|| "the client".to_string());

    let workspace = tempfile::tempdir().map_err(crate::error::ArtifactError::Io)?;
    let output_dir = workspace.path().join("output");
    std::fs::create_dir_all(&output_dir).map_err(crate::error::ArtifactError::Io)?;

    let result = process_documents(deps, project_id, &client_name, &hints, documents, &output_dir).await;

    // The workspace (and everything under it, including output/) is
    // removed on every exit path once `workspace` drops here.
    result
}

struct Fetched {
    document: Document,
    bytes: Vec<u8>,
}

async fn process_documents(
    deps: &PipelineDeps<'_>,
    project_id: Uuid,
    client_name: &str,
    hints: &UploadHints,
    documents: &[Document],
    output_dir: &Path,
) -> Result<PipelineReport, PipelineError> {
    let mut pdf_docx: Vec<Fetched> = Vec::new();
    let mut xlsx: Vec<Fetched> = Vec::new();

    for document in documents {
        let bytes = match deps.blob.get(&document.storage_key).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(document_id = %document.id, error = %e, "skipping document that could not be fetched");
                continue;
            }
        };

        let parsed = match parse_document(&document.filename, &bytes) {
            Ok(parsed) => parsed,
            Err(e) => {
                let _ = crate::storage::documents::mark_document_failed(deps.pool, document.id, &e.to_string()).await;
                tracing::warn!(document_id = %document.id, error = %e, "skipping document that failed to parse");
                continue;
            }
        };

        crate::storage::documents::record_parsed_text(deps.pool, document.id, &parsed.text, Some(parsed.page_count as i32)).await?;

        let category = classify_document(deps.llm, &document.filename, &parsed.text, !parsed.tables.is_empty()).await;
        crate::storage::documents::set_doc_category(deps.pool, document.id, category).await?;

        let mut document = document.clone();
        document.parsed_text = Some(parsed.text);
        document.doc_category = Some(category);

        match document.file_type {
            FileType::Pdf | FileType::Docx => pdf_docx.push(Fetched { document, bytes }),
            FileType::Xlsx => xlsx.push(Fetched { document, bytes }),
            FileType::Csv | FileType::Pptx | FileType::Gsheet => {}
        }
    }

    let schedule_events = schedule_and_win_plan(deps, project_id, client_name, &pdf_docx, output_dir).await?;
    spreadsheet_branch(deps, hints, &xlsx, output_dir).await?;
    pdf_branch(deps, project_id, client_name, &pdf_docx, &schedule_events, output_dir).await?;

    publish(deps, project_id, output_dir).await
}

async fn schedule_and_win_plan(
    deps: &PipelineDeps<'_>,
    project_id: Uuid,
    client_name: &str,
    pdf_docx: &[Fetched],
    output_dir: &Path,
) -> Result<Vec<crate::models::ScheduleEvent>, PipelineError> {
    let Some(first) = pdf_docx.first() else {
        return Ok(Vec::new());
    };
    let Some(content) = &first.document.parsed_text else {
        return Ok(Vec::new());
    };

    let events = extract_schedule_events(deps.llm, project_id, content).await;
    if events.is_empty() {
        return Ok(events);
    }

    for event in &events {
        crate::storage::schedule_events::insert_schedule_event(deps.pool, event).await?;
    }

    let project = crate::storage::projects::get_project(deps.pool, project_id)
        .await?
        .ok_or(PipelineError::NoDocuments)?;
    let mut win_plan_project = project;
    win_plan_project.name = client_name.to_string();

    let plan = build_win_plan(&win_plan_project, events.clone(), &deps.config.org);
    let docx = build_win_plan_docx(&plan)?;
    std::fs::write(output_dir.join("Win_Plan.docx"), docx).map_err(crate::error::ArtifactError::Io)?;

    Ok(events)
}

async fn spreadsheet_branch(
    deps: &PipelineDeps<'_>,
    hints: &UploadHints,
    xlsx: &[Fetched],
    output_dir: &Path,
) -> Result<(), PipelineError> {
    for fetched in xlsx {
        let sheets = match scan_workbook(&fetched.bytes) {
            Ok(sheets) => sheets,
            Err(e) => {
                tracing::warn!(document_id = %fetched.document.id, error = %e, "skipping workbook that could not be scanned");
                continue;
            }
        };

        let answerable: Vec<_> = sheets.into_iter().filter(|s| !s.questions.is_empty()).collect();
        if answerable.is_empty() {
            continue;
        }

        let selected = select_sheets(&answerable, &hints.sheet_names);
        let mut answers_by_sheet: std::collections::HashMap<String, Vec<AnswerWrite>> = std::collections::HashMap::new();

        for sheet in selected {
            let batch_size = deps.config.processing.answer_batch_size.max(1);
            for batch in sheet.questions.chunks(batch_size) {
                match answer_question_batch(deps.llm, &sheet.sheet_name, batch).await {
                    Ok(answers) => answers_by_sheet.entry(sheet.sheet_name.clone()).or_default().extend(answers),
                    Err(e) => {
                        tracing::warn!(sheet = %sheet.sheet_name, error = %e, "dropping malformed answer batch");
                    }
                }
            }
        }

        let mut current_bytes = fetched.bytes.clone();
        for (sheet_name, answers) in &answers_by_sheet {
            match write_answers(&current_bytes, sheet_name, answers) {
                Ok((bytes, report)) => {
                    tracing::info!(sheet = %sheet_name, written = report.written, unmerged = report.unmerged, skipped_formula = report.skipped_formula, "wrote answers");
                    current_bytes = bytes;
                }
                Err(e) => {
                    tracing::warn!(sheet = %sheet_name, error = %e, "failed to write answers back to sheet");
                }
            }
        }

        if !answers_by_sheet.is_empty() {
            let out_name = format!("Answered_{}", fetched.document.filename);
            std::fs::write(output_dir.join(out_name), current_bytes).map_err(crate::error::ArtifactError::Io)?;
        }
    }

    Ok(())
}

/// Intersect auto-detected answerable sheets with the user's hints
/// (case-insensitive substring match); fall back to every auto-detected
/// sheet if no hint matches any of them.
fn select_sheets<'a>(answerable: &'a [crate::spreadsheet::AnswerableSheet], hints: &[String]) -> Vec<&'a crate::spreadsheet::AnswerableSheet> {
    if hints.is_empty() {
        return answerable.iter().collect();
    }

    let matched: Vec<_> = answerable
        .iter()
        .filter(|sheet| {
            hints
                .iter()
                .any(|hint| sheet.sheet_name.to_lowercase().contains(&hint.to_lowercase()))
        })
        .collect();

    if matched.is_empty() {
        answerable.iter().collect()
    } else {
        matched
    }
}

const SPREADSHEET_SYSTEM_PROMPT: &str = "You answer RFP/RFI questionnaire questions on behalf of a vendor, \
    drawing on the vendor's general product and company knowledge. Respond with a JSON array only, no \
    markdown code fence, no commentary. Each array element must be an object with exactly the keys \
    \"row\", \"sheet_name\", \"response_col_letter\", and \"answer\".";

async fn answer_question_batch(
    llm: &dyn LlmProvider,
    sheet_name: &str,
    batch: &[crate::spreadsheet::QuestionRow],
) -> Result<Vec<AnswerWrite>, crate::error::LlmError> {
    let mut user_message = format!("Sheet: {sheet_name}\nQuestions:\n");
    for q in batch {
        user_message.push_str(&format!(
            "- row {} [{:?}] {}: {}\n",
            q.row,
            q.question_type,
            q.category.as_deref().unwrap_or(""),
            q.question
        ));
    }

    let params = crate::llm::GenerationParams {
        max_tokens: 2048,
        temperature: 0.3,
        system_prompt: None,
    };
    let response = llm.complete(SPREADSHEET_SYSTEM_PROMPT, &user_message, &params).await?;
    let json_text = strip_code_fence(&response.text);

    let records: Vec<AnswerRecord> = serde_json::from_str(&json_text).unwrap_or_default();
    let by_row: std::collections::HashMap<u32, &crate::spreadsheet::QuestionRow> = batch.iter().map(|q| (q.row, q)).collect();

    Ok(records
        .into_iter()
        .filter_map(|record| {
            let question = by_row.get(&record.row)?;
            if question.score_is_formula {
                return Some(AnswerWrite {
                    row: record.row,
                    response_col_letter: record.response_col_letter,
                    answer: record.answer,
                    score: None,
                    score_col_letter: None,
                });
            }
            Some(AnswerWrite {
                row: record.row,
                response_col_letter: record.response_col_letter,
                answer: record.answer,
                score: None,
                score_col_letter: question.score_col_letter.clone(),
            })
        })
        .collect())
}

#[derive(Debug, serde::Deserialize)]
struct AnswerRecord {
    row: u32,
    #[allow(dead_code)]
    sheet_name: String,
    response_col_letter: String,
    answer: String,
}

fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();
    let trimmed = trimmed.strip_prefix("```json").or_else(|| trimmed.strip_prefix("```")).unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim().to_string()
}

async fn pdf_branch(
    deps: &PipelineDeps<'_>,
    project_id: Uuid,
    client_name: &str,
    pdf_docx: &[Fetched],
    schedule_events: &[crate::models::ScheduleEvent],
    output_dir: &Path,
) -> Result<(), PipelineError> {
    if pdf_docx.is_empty() && schedule_events.is_empty() {
        return Ok(());
    }

    let mut all_requirements = Vec::new();
    for fetched in pdf_docx {
        let Some(content) = &fetched.document.parsed_text else {
            continue;
        };
        let chunks = chunk_text(content, deps.config.processing.max_chunk_tokens, deps.config.processing.chunk_overlap_tokens);
        let extracted = extract_requirements(deps.llm, project_id, Some(fetched.document.id), &chunks).await;
        all_requirements.extend(extracted);

        let pricing = extract_pricing_structure(deps.llm, project_id, content).await;
        for item in pricing.line_items {
            crate::storage::pricing_items::insert_pricing_item(deps.pool, &item).await?;
        }
    }

    let deduped = dedupe_requirements(deps.embedder, all_requirements, deps.config.processing.dedup_similarity_threshold).await;
    let numbered = renumber_requirements(deps.pool, project_id, deduped).await?;

    for requirement in &numbered {
        crate::storage::requirements::insert_requirement(deps.pool, requirement).await?;
    }

    let responses = generate_responses_batch(
        deps.pool,
        deps.llm,
        deps.embedder,
        &numbered,
        deps.config.processing.retrieval_similarity_cutoff,
        deps.config.processing.retrieval_top_k,
    )
    .await;

    for response in &responses {
        crate::storage::responses::upsert_response(deps.pool, response).await?;
    }

    let title = format!("RFI Response — {client_name}");
    let document = RfiDocument::from_responses(&title, &numbered, &responses);
    let pdf = build_rfi_pdf(&document)?;
    std::fs::write(output_dir.join("RFI_Response.pdf"), pdf).map_err(crate::error::ArtifactError::Io)?;

    Ok(())
}

/// Publish every generated artifact under `output_dir`.
///
/// Each artifact is uploaded to blob storage (not transactional -- it's an
/// external store) as soon as its turn comes up, but every `documents` row
/// is inserted against a single open [`sqlx::Transaction`] that only
/// commits once every artifact has uploaded and inserted successfully. A
/// failure partway through drops the transaction, rolling back every
/// `generated_output` row from this run -- the publication step is the
/// pipeline's sole transactional boundary.
async fn publish(deps: &PipelineDeps<'_>, project_id: Uuid, output_dir: &Path) -> Result<PipelineReport, PipelineError> {
    let entries = std::fs::read_dir(output_dir).map_err(crate::error::ArtifactError::Io)?;
    let mut to_publish: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(crate::error::ArtifactError::Io)?;
        if entry.path().is_file() {
            to_publish.push(entry.path());
        }
    }

    let mut tx = deps
        .pool
        .begin()
        .await
        .map_err(|e| crate::error::StorageError::Query { source: e })?;

    let mut published = 0usize;
    for path in &to_publish {
        if let Err(e) = publish_one(deps, &mut tx, project_id, path).await {
            return Err(PipelineError::PublicationFailed(format!("{}: {e}", path.display())));
        }
        published += 1;
    }

    tx.commit().await.map_err(|e| crate::error::StorageError::Query { source: e })?;

    Ok(PipelineReport {
        artifacts_published: published,
    })
}

async fn publish_one(
    deps: &PipelineDeps<'_>,
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    project_id: Uuid,
    path: &Path,
) -> Result<(), PipelineError> {
    let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("artifact").to_string();
    let bytes = std::fs::read(path).map_err(crate::error::ArtifactError::Io)?;
    let file_type = FileType::from_extension(&filename).unwrap_or(FileType::Docx);
    let key = format!("projects/{project_id}/generated/{}/{filename}", Uuid::new_v4());

    deps.blob.put(&key, bytes.clone(), content_type_for(file_type)).await?;

    let document = Document {
        id: Uuid::new_v4(),
        project_id,
        filename,
        storage_key: key,
        file_type,
        size_bytes: bytes.len() as i64,
        doc_category: Some(DocCategory::GeneratedOutput),
        parsed_text: None,
        page_count: None,
        status: DocumentStatus::Completed,
        error_message: None,
        uploaded_by: None,
    };
    crate::storage::documents::insert_document(&mut *tx, &document).await?;

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
