//! Schedule-event extractor (L7): a single tool-forced call over the
//! document's opening text, mapped into [`ScheduleEvent`] records.

use std::str::FromStr;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::extraction::call_extraction_tool;
use crate::llm::{LlmProvider, ToolSpec};
use crate::models::{ScheduleEvent, ScheduleEventType};

const MAX_CHARS: usize = 8000;
const TOOL_NAME: &str = "extract_schedule_events";

const SYSTEM_PROMPT: &str = "You extract procurement timeline events from RFP/RFI document text: \
    release dates, clarification windows, Q&A deadlines, submission deadlines, demo dates, and \
    award notifications. Only report dates explicitly stated in the text.";

fn tool_spec() -> ToolSpec {
    ToolSpec {
        name: TOOL_NAME.to_string(),
        description: "Record every schedule event found in the excerpt.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "events": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "event_type": {
                                "type": "string",
                                "enum": [
                                    "rfp_release", "clarification_window", "qa_deadline",
                                    "submission_deadline", "demo_date", "award_notification"
                                ]
                            },
                            "event_name": {"type": "string"},
                            "date": {"type": ["string", "null"], "description": "ISO-8601 date, or null if unstated"},
                            "notes": {"type": ["string", "null"]}
                        },
                        "required": ["event_type", "event_name"]
                    }
                }
            },
            "required": ["events"]
        }),
    }
}

#[derive(Debug, Deserialize)]
struct ExtractedEvents {
    events: Vec<ExtractedEvent>,
}

#[derive(Debug, Deserialize)]
struct ExtractedEvent {
    event_type: String,
    event_name: String,
    date: Option<String>,
    notes: Option<String>,
}

/// Extract schedule events from the first [`MAX_CHARS`] characters of a
/// document's parsed text. Returns an empty vec on any tool-call or parse
/// failure rather than failing the pipeline.
pub async fn extract_schedule_events(
    llm: &dyn LlmProvider,
    project_id: Uuid,
    content: &str,
) -> Vec<ScheduleEvent> {
    let truncated: String = content.chars().take(MAX_CHARS).collect();
    let user_message = format!("Document excerpt:\n{truncated}");
    let tool = tool_spec();

    let value = match call_extraction_tool(llm, SYSTEM_PROMPT, &user_message, &tool).await {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "schedule extraction call failed");
            return Vec::new();
        }
    };

    let parsed: ExtractedEvents = match serde_json::from_value(value) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "failed to parse schedule tool response");
            return Vec::new();
        }
    };

    parsed
        .events
        .into_iter()
        .filter_map(|e| to_schedule_event(e, project_id))
        .collect()
}

fn to_schedule_event(extracted: ExtractedEvent, project_id: Uuid) -> Option<ScheduleEvent> {
    let event_type = ScheduleEventType::from_str(&extracted.event_type).ok()?;
    let event_date = extracted
        .date
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());

    Some(ScheduleEvent {
        id: Uuid::new_v4(),
        project_id,
        event_type,
        event_name: extracted.event_name,
        event_date,
        notes: extracted.notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::{GenerationParams, LlmResponse, TokenUsage, ToolResponse};
    use serde_json::Value;

    struct FixedTool {
        value: Value,
    }

    #[async_trait::async_trait]
    impl LlmProvider for FixedTool {
        fn name(&self) -> &str {
            "fixed"
        }
        async fn complete(
            &self,
            _system: &str,
            _user_message: &str,
            _params: &GenerationParams,
        ) -> Result<LlmResponse, LlmError> {
            unimplemented!()
        }
        async fn complete_tool(
            &self,
            _system: &str,
            _user_message: &str,
            _tool: &ToolSpec,
            _params: &GenerationParams,
        ) -> Result<ToolResponse, LlmError> {
            Ok(ToolResponse {
                input: self.value.clone(),
                usage: TokenUsage::default(),
            })
        }
        async fn health_check(&self) -> Result<(), LlmError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn extracts_event_with_valid_date() {
        let llm = FixedTool {
            value: json!({
                "events": [{
                    "event_type": "submission_deadline",
                    "event_name": "Proposal due",
                    "date": "2026-09-01",
                    "notes": "5pm ET"
                }]
            }),
        };

        let events = extract_schedule_events(&llm, Uuid::new_v4(), "body").await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, ScheduleEventType::SubmissionDeadline);
        assert_eq!(events[0].event_date, NaiveDate::from_ymd_opt(2026, 9, 1));
    }

    #[tokio::test]
    async fn unstated_date_maps_to_none() {
        let llm = FixedTool {
            value: json!({
                "events": [{
                    "event_type": "demo_date",
                    "event_name": "Finalist demo",
                    "date": null,
                    "notes": null
                }]
            }),
        };

        let events = extract_schedule_events(&llm, Uuid::new_v4(), "body").await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_date, None);
    }

    #[tokio::test]
    async fn unknown_event_type_is_dropped() {
        let llm = FixedTool {
            value: json!({
                "events": [{"event_type": "not_real", "event_name": "x", "date": null, "notes": null}]
            }),
        };
        let events = extract_schedule_events(&llm, Uuid::new_v4(), "body").await;
        assert!(events.is_empty());
    }
}
