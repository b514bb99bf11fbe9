//! Error types for the RFP/RFI pipeline core library.
//!
//! Each module has its own error enum to provide clear error boundaries.
//! The library uses `thiserror` for structured, typed errors. [`PipelineError`]
//! aggregates the others and exposes [`PipelineError::kind`] so orchestration
//! code can branch on error kind without downcasting.

/// Errors related to configuration loading, parsing, and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required configuration field is absent.
    #[error("missing required config field: {field}")]
    MissingField {
        /// The name of the missing field.
        field: String,
    },

    /// A configuration field has an unacceptable value.
    #[error("invalid value for config field '{field}': {message}")]
    InvalidValue {
        /// The name of the invalid field.
        field: String,
        /// A description of why the value is invalid.
        message: String,
    },

    /// The configuration file does not exist at the specified path.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// The path that was searched.
        path: String,
    },

    /// TOML deserialization failed.
    #[error("failed to parse config file: {message}")]
    ParseError {
        /// The underlying TOML parse error, rendered to a string.
        message: String,
    },
}

/// Errors from interacting with the LLM provider.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// HTTP request to the LLM endpoint failed.
    #[error("LLM HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// LLM API returned an error response.
    #[error("LLM API error (status {status}): {message}")]
    Api {
        /// The HTTP status code.
        status: u16,
        /// The error message from the API.
        message: String,
    },

    /// LLM provider rate limit hit.
    #[error("LLM rate limited, retry after {retry_after_secs} seconds")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// LLM response could not be parsed, or did not contain the mandatory
    /// tool-use payload for a structured call.
    #[error("failed to parse LLM response: {0}")]
    Parse(String),

    /// No LLM provider configured.
    #[error("no LLM provider configured")]
    NotConfigured,

    /// Generation failed after exhausting retries.
    #[error("LLM generation failed: {0}")]
    GenerationFailed(String),
}

/// Errors from interacting with the embedding provider.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    /// HTTP request to the embedding endpoint failed.
    #[error("embedding HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Embedding API returned an error response.
    #[error("embedding API error (status {status}): {message}")]
    Api {
        /// The HTTP status code.
        status: u16,
        /// The error message from the API.
        message: String,
    },

    /// Embedding provider rate limit hit.
    #[error("embedding provider rate limited, retry after {retry_after_secs} seconds")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// The provider returned a vector whose dimension does not match the
    /// configured embedding dimension.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The configured dimension.
        expected: usize,
        /// The dimension actually returned.
        actual: usize,
    },

    /// No embedding provider configured.
    #[error("no embedding provider configured")]
    NotConfigured,
}

/// Errors from interacting with the blob store.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// HTTP request to the blob store failed.
    #[error("blob store HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Requested object does not exist.
    #[error("blob not found: {key}")]
    NotFound {
        /// The object key that was requested.
        key: String,
    },

    /// Blob store returned an error response.
    #[error("blob store error (status {status}): {message}")]
    Api {
        /// The HTTP status code.
        status: u16,
        /// The error message from the API.
        message: String,
    },

    /// Local filesystem error while staging a blob for processing.
    #[error("blob I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from document parsing (L4/L5).
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The filename extension has no matching parser.
    #[error("unsupported document format '{extension}', supported: {supported}")]
    UnsupportedFormat {
        /// The extension that was rejected.
        extension: String,
        /// Comma-separated list of supported extensions.
        supported: String,
    },

    /// The document bytes could not be decoded in the expected container
    /// format (e.g. not a valid zip/OOXML package, not a valid PDF).
    #[error("malformed {format} document: {message}")]
    Malformed {
        /// The format being parsed, e.g. "xlsx".
        format: String,
        /// Details about the failure.
        message: String,
    },

    /// OCR fallback failed after native text extraction also failed.
    #[error("OCR fallback failed: {0}")]
    OcrFailed(String),

    /// Underlying I/O failure while reading document bytes.
    #[error("document I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the spreadsheet questionnaire engine (L10).
#[derive(Debug, thiserror::Error)]
pub enum SpreadsheetError {
    /// The worksheet has no recognizable question/response column layout.
    #[error("sheet '{sheet}' has no answerable question/response structure")]
    NoAnswerableStructure {
        /// The worksheet name.
        sheet: String,
    },

    /// The requested sheet name does not exist in the workbook.
    #[error("sheet '{sheet}' not found in workbook")]
    SheetNotFound {
        /// The sheet name that was requested.
        sheet: String,
    },

    /// A cell reference could not be resolved (out of range or malformed).
    #[error("invalid cell reference '{reference}': {message}")]
    InvalidReference {
        /// The raw cell or range reference.
        reference: String,
        /// Details about why it is invalid.
        message: String,
    },

    /// Underlying OOXML (zip/XML) parsing or writing failure.
    #[error("workbook package error: {0}")]
    Package(String),
}

/// Errors from the requirement/schedule/pricing extractors (L7) and deduper (L8).
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// The LLM declined or failed to produce the mandatory structured tool call.
    #[error("structured extraction failed: {0}")]
    ToolCallMissing(String),

    /// An extracted record failed shape validation (e.g. required field empty).
    #[error("invalid extracted record: {0}")]
    InvalidRecord(String),
}

/// Errors from SQLite storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Failed to connect to SQLite database.
    #[error("database connection error: {source}")]
    Connection {
        /// The underlying SQLx error.
        #[source]
        source: sqlx::Error,
    },

    /// Database migration failed.
    #[error("database migration error: {source}")]
    Migration {
        /// The underlying migration error.
        #[source]
        source: sqlx::migrate::MigrateError,
    },

    /// A database query failed.
    #[error("database query error: {source}")]
    Query {
        /// The underlying SQLx error.
        #[source]
        source: sqlx::Error,
    },

    /// The requested row does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The entity kind, e.g. "project".
        entity: String,
        /// The id that was looked up.
        id: String,
    },

    /// A stored row's column value could not be decoded into its domain type
    /// (e.g. an unrecognized enum string written by a prior schema version).
    #[error("failed to decode {entity}: {message}")]
    Decode {
        /// The entity/column being decoded, e.g. "project.status".
        entity: String,
        /// Details about the decode failure.
        message: String,
    },
}

/// Errors from the compliance scorer (L13).
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    /// Response data is missing or malformed for scoring.
    #[error("invalid response data for scoring: {message}")]
    InvalidResponseData {
        /// Details about what is missing or malformed.
        message: String,
    },
}

/// Errors from the Win-Plan, RFI PDF, and Word proposal builders (L14).
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// No usable font was found on any platform or bundled search path.
    #[error("no usable font found on platform or bundled search paths")]
    FontUnavailable,

    /// PDF page rendering failed.
    #[error("pdf rendering error: {0}")]
    Pdf(String),

    /// DOCX package assembly failed.
    #[error("docx assembly error: {0}")]
    Docx(String),

    /// Underlying I/O failure while writing the artifact.
    #[error("artifact I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A coarse error kind, matching the taxonomy used by the pipeline
/// orchestrator to decide whether to retry, skip, or abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller-supplied input was invalid; do not retry.
    InvalidInput,
    /// A referenced entity does not exist.
    NotFound,
    /// The operation conflicts with current state (e.g. pipeline already running).
    Conflict,
    /// A transient failure that the caller's retry policy already exhausted.
    Transient,
    /// One unit of work (chunk, batch, subprocess) failed in isolation.
    StagePartial,
    /// Unrecoverable; the pipeline must abort and roll back.
    Fatal,
}

/// Aggregate pipeline error, composing every subsystem error via `#[from]`.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// No non-generated documents exist for the project.
    #[error("No documents to process for this project")]
    NoDocuments,

    /// A pipeline run is already in progress for this project.
    #[error("pipeline already in progress for project {project_id}")]
    Conflict {
        /// The project id.
        project_id: String,
    },

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// LLM client error.
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// Embedding client error.
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    /// Blob store error.
    #[error(transparent)]
    Blob(#[from] BlobError),

    /// Document parser error.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Spreadsheet engine error.
    #[error(transparent)]
    Spreadsheet(#[from] SpreadsheetError),

    /// Extraction error.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// Storage error.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Artifact builder error.
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// Artifact publication transaction failed; the caller must roll back
    /// and transition the project to `failed`.
    #[error("artifact publication failed: {0}")]
    PublicationFailed(String),
}

impl PipelineError {
    /// Map this error to the coarse kind used by orchestration control flow.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoDocuments => ErrorKind::InvalidInput,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Config(_) => ErrorKind::InvalidInput,
            Self::Llm(LlmError::RateLimited { .. }) | Self::Llm(LlmError::Request(_)) => {
                ErrorKind::Transient
            }
            Self::Embedding(EmbeddingError::RateLimited { .. })
            | Self::Embedding(EmbeddingError::Request(_)) => ErrorKind::Transient,
            Self::Llm(_) | Self::Embedding(_) => ErrorKind::StagePartial,
            Self::Blob(BlobError::NotFound { .. }) => ErrorKind::NotFound,
            Self::Blob(_) => ErrorKind::Transient,
            Self::Parse(_) | Self::Spreadsheet(_) | Self::Extraction(_) => ErrorKind::StagePartial,
            Self::Storage(StorageError::NotFound { .. }) => ErrorKind::NotFound,
            Self::Storage(_) => ErrorKind::Fatal,
            Self::Artifact(_) => ErrorKind::Fatal,
            Self::PublicationFailed(_) => ErrorKind::Fatal,
        }
    }

    /// Truncate the displayed message to the pipeline's 500-character
    /// status-message budget.
    pub fn truncated_message(&self) -> String {
        let message = self.to_string();
        if message.len() <= 500 {
            message
        } else {
            let mut truncated: String = message.chars().take(497).collect();
            truncated.push_str("...");
            truncated
        }
    }
}
