//! Win Strategy Proposal composer (L14, supplemental): a general-purpose
//! narrative proposal rendering a [`ResponsePlan`] and the project's scored
//! [`Response`] set into a standalone `.docx`.
//!
//! Mirrors an export surface present in the originating system that the
//! distilled requirements list omitted; reuses the Win-Plan builder's data
//! contract and package-assembly idiom.

use std::collections::HashMap;

use crate::error::ArtifactError;
use crate::models::{PricingItem, Project, Requirement, RequirementType, Response, ResponsePlan};
use crate::scoring::score_responses;

use super::docx_writer::{assemble, heading, paragraph, table};

/// Render the full proposal narrative.
pub fn build_word_proposal(
    project: &Project,
    plan: &ResponsePlan,
    requirements: &[Requirement],
    responses: &[Response],
    pricing_items: &[PricingItem],
) -> Result<Vec<u8>, ArtifactError> {
    let mut body = String::new();

    body.push_str(&cover_section(project, plan));
    body.push_str(&compliance_summary_section(requirements, responses));
    body.push_str(&response_sections(requirements, responses));
    if !pricing_items.is_empty() {
        body.push_str(&pricing_summary_section(pricing_items));
    }

    assemble(&body)
}

fn cover_section(project: &Project, plan: &ResponsePlan) -> String {
    let mut xml = String::new();
    xml.push_str(&heading(1, &format!("Proposal — {}", project.name)));
    if let Some(notes) = &plan.notes {
        xml.push_str(&paragraph(notes));
    }
    xml
}

fn compliance_summary_section(requirements: &[Requirement], responses: &[Response]) -> String {
    let req_types: HashMap<_, _> = requirements.iter().map(|r| (r.id, r.req_type)).collect();
    let paired: Vec<(RequirementType, &Response)> = responses
        .iter()
        .filter_map(|r| req_types.get(&r.requirement_id).map(|t| (*t, r)))
        .collect();
    let score = score_responses(&paired);

    let mut xml = String::new();
    xml.push_str(&heading(2, "Compliance Summary"));
    xml.push_str(&paragraph(&format!("Overall compliance score: {:.1}%", score.overall_score)));

    let mut rows = vec![vec!["Requirement Type".to_string(), "Score".to_string(), "Responses".to_string()]];
    for type_score in &score.by_type {
        rows.push(vec![
            type_score.req_type.as_str().to_string(),
            format!("{:.1}%", type_score.score),
            type_score.responded_count.to_string(),
        ]);
    }
    if rows.len() > 1 {
        xml.push_str(&table(&rows));
    }
    xml
}

fn response_sections(requirements: &[Requirement], responses: &[Response]) -> String {
    let responses_by_req: HashMap<_, _> = responses.iter().map(|r| (r.requirement_id, r)).collect();

    let mut by_type: HashMap<RequirementType, Vec<&Requirement>> = HashMap::new();
    for req in requirements {
        by_type.entry(req.req_type).or_default().push(req);
    }

    let ordered_types = [
        RequirementType::Functional,
        RequirementType::NonFunctional,
        RequirementType::Technical,
        RequirementType::Commercial,
        RequirementType::Legal,
    ];

    let mut xml = String::new();
    xml.push_str(&heading(2, "Detailed Responses"));

    for req_type in ordered_types {
        let Some(reqs) = by_type.get(&req_type) else {
            continue;
        };
        if reqs.is_empty() {
            continue;
        }
        xml.push_str(&heading(3, req_type.as_str()));
        for req in reqs {
            xml.push_str(&heading(4, &format!("{} — {}", req.req_number, req.title)));
            xml.push_str(&paragraph(&req.description));
            match responses_by_req.get(&req.id) {
                Some(response) => {
                    xml.push_str(&paragraph(&format!("Status: {}", response.compliance_status.label())));
                    xml.push_str(&paragraph(&response.response_text));
                }
                None => xml.push_str(&paragraph("No response has been drafted for this requirement.")),
            }
        }
    }
    xml
}

fn pricing_summary_section(pricing_items: &[PricingItem]) -> String {
    let mut xml = String::new();
    xml.push_str(&heading(2, "Pricing Summary"));

    let mut rows = vec![vec!["Line Item".to_string(), "Category".to_string(), "Total".to_string(), "Currency".to_string()]];
    for item in pricing_items {
        rows.push(vec![
            item.line_item.clone(),
            item.category.as_str().to_string(),
            item.total.map(|t| format!("{t:.2}")).unwrap_or_else(|| "TBD".to_string()),
            item.currency.clone(),
        ]);
    }
    xml.push_str(&table(&rows));
    xml
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use crate::models::{ComplianceStatus, PricingCategory, Priority, ProcessingStatus, ProjectStatus, SourceRef};

    use super::*;

    fn sample_project() -> Project {
        Project {
            id: Uuid::new_v4(),
            name: "Northwind RFP".to_string(),
            owner_id: Uuid::new_v4(),
            status: ProjectStatus::InProgress,
            upload_context: None,
            processing_status: Some(ProcessingStatus::Completed),
            processing_message: None,
            processing_started_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sample_requirement(req_type: RequirementType) -> Requirement {
        Requirement {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            document_id: None,
            req_number: "FR-001".to_string(),
            title: "Single sign-on".to_string(),
            description: "The platform must support SAML SSO.".to_string(),
            req_type,
            category: None,
            is_mandatory: true,
            priority: Priority::High,
            response_required: true,
            reference_section: None,
            embedding: None,
        }
    }

    fn sample_response(requirement_id: Uuid) -> Response {
        Response {
            id: Uuid::new_v4(),
            requirement_id,
            project_id: Uuid::new_v4(),
            compliance_status: ComplianceStatus::FullyCompliant,
            response_text: "Supported out of the box via SAML 2.0.".to_string(),
            confidence_score: 0.9,
            source_refs: vec![SourceRef {
                kb_entry_id: Uuid::new_v4(),
                title: "SSO whitepaper".to_string(),
            }],
            is_ai_generated: true,
            is_reviewed: false,
            reviewed_by: None,
            reviewed_at: None,
            notes: None,
        }
    }

    fn sample_plan() -> ResponsePlan {
        ResponsePlan {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            workstreams: serde_json::json!([]),
            escalation_matrix: serde_json::json!([]),
            version: 1,
            notes: Some("Led by the solutions engineering team.".to_string()),
            owner_id: None,
        }
    }

    #[test]
    fn builds_proposal_with_compliance_and_response_sections() {
        let requirement = sample_requirement(RequirementType::Functional);
        let response = sample_response(requirement.id);
        let bytes = build_word_proposal(&sample_project(), &sample_plan(), &[requirement], &[response], &[]).unwrap();

        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        let mut document = String::new();
        std::io::Read::read_to_string(&mut archive.by_name("word/document.xml").unwrap(), &mut document).unwrap();
        assert!(document.contains("Compliance Summary"));
        assert!(document.contains("Single sign-on"));
        assert!(document.contains("fully_compliant"));
    }

    #[test]
    fn pricing_section_is_omitted_when_no_line_items() {
        let bytes = build_word_proposal(&sample_project(), &sample_plan(), &[], &[], &[]).unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        let mut document = String::new();
        std::io::Read::read_to_string(&mut archive.by_name("word/document.xml").unwrap(), &mut document).unwrap();
        assert!(!document.contains("Pricing Summary"));
    }

    #[test]
    fn pricing_section_renders_when_items_exist() {
        let item = PricingItem {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            category: PricingCategory::License,
            line_item: "Platform license".to_string(),
            description: None,
            unit_cost: Some(1000.0),
            quantity: Some(1),
            total: Some(1000.0),
            currency: "USD".to_string(),
            year: Some(1),
            notes: None,
        };
        let bytes = build_word_proposal(&sample_project(), &sample_plan(), &[], &[], &[item]).unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        let mut document = String::new();
        std::io::Read::read_to_string(&mut archive.by_name("word/document.xml").unwrap(), &mut document).unwrap();
        assert!(document.contains("Platform license"));
    }
}
