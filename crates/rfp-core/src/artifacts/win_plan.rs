//! Win-Plan DOCX builder (L14): a short narrative plus the project
//! schedule, rendered deterministically from a [`crate::plan::WinPlan`].

use crate::error::ArtifactError;
use crate::plan::WinPlan;

use super::docx_writer::{assemble, heading, paragraph, table};

/// Render a [`WinPlan`] into a standalone `.docx` document.
pub fn build_win_plan_docx(plan: &WinPlan) -> Result<Vec<u8>, ArtifactError> {
    let mut body = String::new();
    body.push_str(&heading(1, &format!("Win Plan — {}", plan.client_name)));
    body.push_str(&paragraph(&format!("Prepared by {}", plan.company_name)));
    body.push_str(&heading(2, "Solution Overview"));
    body.push_str(&paragraph(&plan.solution_overview));

    body.push_str(&heading(2, "Key Dates"));
    if plan.events.is_empty() {
        body.push_str(&paragraph("No schedule events were extracted from the source documents."));
    } else {
        let mut rows = vec![vec!["Event".to_string(), "Type".to_string(), "Date".to_string(), "Notes".to_string()]];
        for event in &plan.events {
            rows.push(vec![
                event.event_name.clone(),
                event.event_type.as_str().to_string(),
                event.event_date.map(|d| d.to_string()).unwrap_or_else(|| "TBD".to_string()),
                event.notes.clone().unwrap_or_default(),
            ]);
        }
        body.push_str(&table(&rows));
    }

    assemble(&body)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use crate::models::{ScheduleEvent, ScheduleEventType};

    use super::*;

    fn sample_event(name: &str, date: Option<NaiveDate>) -> ScheduleEvent {
        ScheduleEvent {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            event_type: ScheduleEventType::SubmissionDeadline,
            event_name: name.to_string(),
            event_date: date,
            notes: None,
        }
    }

    #[test]
    fn builds_a_valid_docx_with_schedule_table() {
        let plan = WinPlan {
            client_name: "Acme Corp".to_string(),
            company_name: "Our Company".to_string(),
            solution_overview: "A platform.".to_string(),
            events: vec![sample_event("Proposal Due", NaiveDate::from_ymd_opt(2026, 9, 1))],
        };
        let bytes = build_win_plan_docx(&plan).unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        let mut document = String::new();
        std::io::Read::read_to_string(&mut archive.by_name("word/document.xml").unwrap(), &mut document).unwrap();
        assert!(document.contains("Acme Corp"));
        assert!(document.contains("Proposal Due"));
    }

    #[test]
    fn empty_schedule_renders_placeholder_text() {
        let plan = WinPlan {
            client_name: "Acme Corp".to_string(),
            company_name: "Our Company".to_string(),
            solution_overview: "A platform.".to_string(),
            events: vec![],
        };
        let bytes = build_win_plan_docx(&plan).unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        let mut document = String::new();
        std::io::Read::read_to_string(&mut archive.by_name("word/document.xml").unwrap(), &mut document).unwrap();
        assert!(document.contains("No schedule events"));
    }
}
