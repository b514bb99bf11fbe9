//! Domain entities shared by the extraction, generation, scoring, and
//! persistence layers.
//!
//! These are plain data types; the storage module owns the mapping to and
//! from SQLite rows.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Draft,
    InProgress,
    Review,
    Completed,
    Archived,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::InProgress => "in_progress",
            Self::Review => "review",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }
}

impl std::str::FromStr for ProjectStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "in_progress" => Ok(Self::InProgress),
            "review" => Ok(Self::Review),
            "completed" => Ok(Self::Completed),
            "archived" => Ok(Self::Archived),
            other => Err(format!("unknown project status '{other}'")),
        }
    }
}

/// Public pipeline state machine, see §5 (Ordering guarantees).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::str::FromStr for ProcessingStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown processing status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub status: ProjectStatus,
    pub upload_context: Option<String>,
    pub processing_status: Option<ProcessingStatus>,
    pub processing_message: Option<String>,
    pub processing_started_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Source file format. Drives parser dispatch (L5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    Pdf,
    Docx,
    Xlsx,
    Csv,
    Pptx,
    Gsheet,
}

impl FileType {
    /// Resolve a `FileType` from a filename's extension.
    pub fn from_extension(filename: &str) -> Option<Self> {
        let ext = filename.rsplit('.').next()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "xlsx" | "xlsm" => Some(Self::Xlsx),
            "csv" => Some(Self::Csv),
            "pptx" => Some(Self::Pptx),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
            Self::Pptx => "pptx",
            Self::Gsheet => "gsheet",
        }
    }
}

impl std::str::FromStr for FileType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            "xlsx" => Ok(Self::Xlsx),
            "csv" => Ok(Self::Csv),
            "pptx" => Ok(Self::Pptx),
            "gsheet" => Ok(Self::Gsheet),
            other => Err(format!("unknown file type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocCategory {
    RfpDocument,
    CommercialTerms,
    TechRequirements,
    PricingSheet,
    LegalAppendix,
    EvaluationCriteria,
    GeneratedOutput,
}

impl DocCategory {
    /// The closed set considered by the classifier (L9), in the order the
    /// primary LLM prompt presents them.
    pub const ALL: &'static [Self] = &[
        Self::RfpDocument,
        Self::CommercialTerms,
        Self::TechRequirements,
        Self::PricingSheet,
        Self::LegalAppendix,
        Self::EvaluationCriteria,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::RfpDocument => "rfp_document",
            Self::CommercialTerms => "commercial_terms",
            Self::TechRequirements => "tech_requirements",
            Self::PricingSheet => "pricing_sheet",
            Self::LegalAppendix => "legal_appendix",
            Self::EvaluationCriteria => "evaluation_criteria",
            Self::GeneratedOutput => "generated_output",
        }
    }
}

impl std::str::FromStr for DocCategory {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rfp_document" => Ok(Self::RfpDocument),
            "commercial_terms" => Ok(Self::CommercialTerms),
            "tech_requirements" => Ok(Self::TechRequirements),
            "pricing_sheet" => Ok(Self::PricingSheet),
            "legal_appendix" => Ok(Self::LegalAppendix),
            "evaluation_criteria" => Ok(Self::EvaluationCriteria),
            "generated_output" => Ok(Self::GeneratedOutput),
            other => Err(format!("unknown document category '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Uploaded,
    Parsing,
    Parsed,
    Extracted,
    Completed,
    Failed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::Parsing => "parsing",
            Self::Parsed => "parsed",
            Self::Extracted => "extracted",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::str::FromStr for DocumentStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uploaded" => Ok(Self::Uploaded),
            "parsing" => Ok(Self::Parsing),
            "parsed" => Ok(Self::Parsed),
            "extracted" => Ok(Self::Extracted),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown document status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub project_id: Uuid,
    pub filename: String,
    pub storage_key: String,
    pub file_type: FileType,
    pub size_bytes: i64,
    pub doc_category: Option<DocCategory>,
    pub parsed_text: Option<String>,
    pub page_count: Option<i32>,
    pub status: DocumentStatus,
    pub error_message: Option<String>,
    pub uploaded_by: Option<Uuid>,
}

/// The five requirement types; each owns its own `req_number` sequence
/// (FR/NFR/CR/LR/TR) per project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementType {
    Functional,
    NonFunctional,
    Commercial,
    Legal,
    Technical,
}

impl RequirementType {
    /// The stable prefix used in `req_number` (e.g. `FR-001`).
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Functional => "FR",
            Self::NonFunctional => "NFR",
            Self::Commercial => "CR",
            Self::Legal => "LR",
            Self::Technical => "TR",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Functional => "functional",
            Self::NonFunctional => "non_functional",
            Self::Commercial => "commercial",
            Self::Legal => "legal",
            Self::Technical => "technical",
        }
    }
}

impl std::str::FromStr for RequirementType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "functional" => Ok(Self::Functional),
            "non_functional" => Ok(Self::NonFunctional),
            "commercial" => Ok(Self::Commercial),
            "legal" => Ok(Self::Legal),
            "technical" => Ok(Self::Technical),
            other => Err(format!("unknown requirement type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(format!("unknown priority '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requirement {
    pub id: Uuid,
    pub project_id: Uuid,
    pub document_id: Option<Uuid>,
    pub req_number: String,
    pub title: String,
    pub description: String,
    pub req_type: RequirementType,
    pub category: Option<String>,
    pub is_mandatory: bool,
    pub priority: Priority,
    pub response_required: bool,
    pub reference_section: Option<String>,
    /// Fixed-dimension embedding of `title + " " + description`, used for
    /// cross-chunk deduplication (L8). `None` until computed.
    pub embedding: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    FullyCompliant,
    PartiallyCompliant,
    Configurable,
    CustomDev,
    NotApplicable,
}

impl ComplianceStatus {
    /// Scoring weight per §4.8. `not_applicable` is excluded from scoring
    /// entirely rather than weighted at zero.
    pub fn weight(&self) -> Option<f64> {
        match self {
            Self::FullyCompliant => Some(1.0),
            Self::Configurable => Some(0.8),
            Self::PartiallyCompliant => Some(0.5),
            Self::CustomDev => Some(0.3),
            Self::NotApplicable => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::FullyCompliant => "fully_compliant",
            Self::PartiallyCompliant => "partially_compliant",
            Self::Configurable => "configurable",
            Self::CustomDev => "custom_dev",
            Self::NotApplicable => "not_applicable",
        }
    }
}

impl std::str::FromStr for ComplianceStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fully_compliant" => Ok(Self::FullyCompliant),
            "partially_compliant" => Ok(Self::PartiallyCompliant),
            "configurable" => Ok(Self::Configurable),
            "custom_dev" => Ok(Self::CustomDev),
            "not_applicable" => Ok(Self::NotApplicable),
            other => Err(format!("unknown compliance status '{other}'")),
        }
    }
}

/// A knowledge-base hit used to ground a generated response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRef {
    pub kb_entry_id: Uuid,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub id: Uuid,
    pub requirement_id: Uuid,
    pub project_id: Uuid,
    pub compliance_status: ComplianceStatus,
    pub response_text: String,
    pub confidence_score: f32,
    pub source_refs: Vec<SourceRef>,
    pub is_ai_generated: bool,
    pub is_reviewed: bool,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl Response {
    /// Mark a response as human-reviewed. Per the §3 invariant, this clears
    /// `is_ai_generated` and stamps the reviewer.
    pub fn mark_reviewed(&mut self, reviewer: Uuid, now: DateTime<Utc>) {
        self.is_reviewed = true;
        self.is_ai_generated = false;
        self.reviewed_by = Some(reviewer);
        self.reviewed_at = Some(now);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleEventType {
    RfpRelease,
    ClarificationWindow,
    QaDeadline,
    SubmissionDeadline,
    DemoDate,
    AwardNotification,
    ContractStart,
    Other,
}

impl ScheduleEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RfpRelease => "rfp_release",
            Self::ClarificationWindow => "clarification_window",
            Self::QaDeadline => "qa_deadline",
            Self::SubmissionDeadline => "submission_deadline",
            Self::DemoDate => "demo_date",
            Self::AwardNotification => "award_notification",
            Self::ContractStart => "contract_start",
            Self::Other => "other",
        }
    }
}

impl std::str::FromStr for ScheduleEventType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rfp_release" => Ok(Self::RfpRelease),
            "clarification_window" => Ok(Self::ClarificationWindow),
            "qa_deadline" => Ok(Self::QaDeadline),
            "submission_deadline" => Ok(Self::SubmissionDeadline),
            "demo_date" => Ok(Self::DemoDate),
            "award_notification" => Ok(Self::AwardNotification),
            "contract_start" => Ok(Self::ContractStart),
            "other" => Ok(Self::Other),
            other => Err(format!("unknown schedule event type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEvent {
    pub id: Uuid,
    pub project_id: Uuid,
    pub event_type: ScheduleEventType,
    pub event_name: String,
    pub event_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingCategory {
    License,
    Implementation,
    Support,
    AddOn,
    Training,
    Hosting,
    Other,
}

impl PricingCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::License => "license",
            Self::Implementation => "implementation",
            Self::Support => "support",
            Self::AddOn => "add_on",
            Self::Training => "training",
            Self::Hosting => "hosting",
            Self::Other => "other",
        }
    }
}

impl std::str::FromStr for PricingCategory {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "license" => Ok(Self::License),
            "implementation" => Ok(Self::Implementation),
            "support" => Ok(Self::Support),
            "add_on" => Ok(Self::AddOn),
            "training" => Ok(Self::Training),
            "hosting" => Ok(Self::Hosting),
            "other" => Ok(Self::Other),
            other => Err(format!("unknown pricing category '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingItem {
    pub id: Uuid,
    pub project_id: Uuid,
    pub category: PricingCategory,
    pub line_item: String,
    pub description: Option<String>,
    pub unit_cost: Option<f64>,
    pub quantity: Option<i32>,
    pub total: Option<f64>,
    pub currency: String,
    pub year: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponsePlan {
    pub id: Uuid,
    pub project_id: Uuid,
    pub workstreams: serde_json::Value,
    pub escalation_matrix: serde_json::Value,
    pub version: i32,
    pub notes: Option<String>,
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBaseEntry {
    pub id: Uuid,
    pub org_id: Option<String>,
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub embedding: Option<Vec<f32>>,
    pub source_project_id: Option<Uuid>,
}

/// A ledger row recording one LLM or embedding call's token accounting and
/// estimated cost, for the cost-observability supplement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmUsageRecord {
    pub id: Uuid,
    pub project_id: Option<Uuid>,
    pub provider: String,
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub estimated_cost_usd: f64,
    pub occurred_at: DateTime<Utc>,
}
