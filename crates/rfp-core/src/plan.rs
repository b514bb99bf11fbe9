//! Win-Plan data object builder (L14 input).
//!
//! Produces the pure data object the Win-Plan document builder renders —
//! schedule events plus a fixed organizational context block. Assembly
//! never touches the network or the database; callers fetch `ScheduleEvent`
//! rows and pass them in.

use crate::config::OrgConfig;
use crate::models::{Project, ScheduleEvent};

/// Pure data object consumed by the Win-Plan `.docx` builder.
#[derive(Debug, Clone, PartialEq)]
pub struct WinPlan {
    pub client_name: String,
    pub company_name: String,
    pub solution_overview: String,
    pub events: Vec<ScheduleEvent>,
}

/// Assemble a [`WinPlan`] from a project and its extracted schedule events.
///
/// Events are sorted by date, with undated events (date unstated in the
/// source document) sorted last in their original discovery order.
pub fn build_win_plan(project: &Project, mut events: Vec<ScheduleEvent>, org: &OrgConfig) -> WinPlan {
    events.sort_by_key(|e| e.event_date.is_none());

    WinPlan {
        client_name: project.name.clone(),
        company_name: org.company_name.clone(),
        solution_overview: org.solution_overview.clone(),
        events,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProcessingStatus, ProjectStatus, ScheduleEventType};
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn project() -> Project {
        Project {
            id: Uuid::new_v4(),
            name: "Acme Corp RFP".to_string(),
            owner_id: Uuid::new_v4(),
            status: ProjectStatus::InProgress,
            upload_context: None,
            processing_status: Some(ProcessingStatus::Processing),
            processing_message: None,
            processing_started_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn event(event_type: ScheduleEventType, date: Option<NaiveDate>) -> ScheduleEvent {
        ScheduleEvent {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            event_type,
            event_name: "test event".to_string(),
            event_date: date,
            notes: None,
        }
    }

    #[test]
    fn undated_events_sort_last() {
        let org = OrgConfig::default();
        let events = vec![
            event(ScheduleEventType::DemoDate, None),
            event(ScheduleEventType::SubmissionDeadline, NaiveDate::from_ymd_opt(2026, 9, 1)),
        ];

        let plan = build_win_plan(&project(), events, &org);
        assert!(plan.events[0].event_date.is_some());
        assert!(plan.events[1].event_date.is_none());
    }

    #[test]
    fn carries_client_name_and_org_context() {
        let org = OrgConfig {
            company_name: "Vendor Inc".to_string(),
            solution_overview: "We do things.".to_string(),
        };
        let plan = build_win_plan(&project(), Vec::new(), &org);
        assert_eq!(plan.client_name, "Acme Corp RFP");
        assert_eq!(plan.company_name, "Vendor Inc");
        assert_eq!(plan.solution_overview, "We do things.");
    }
}
