//! Compliance scoring engine (L13).
//!
//! Turns a project's generated responses into a per-requirement-type and
//! overall compliance score, purely from the `compliance_status` weights
//! already defined on [`ComplianceStatus`] — no LLM calls.

use std::collections::HashMap;

use crate::models::{ComplianceStatus, RequirementType, Response};

/// Score breakdown for a single requirement type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeScore {
    pub req_type: RequirementType,
    pub score: f64,
    pub responded_count: usize,
}

/// Full compliance scoring result for a project.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComplianceScore {
    pub overall_score: f64,
    pub by_type: Vec<TypeScore>,
    pub status_breakdown: HashMap<ComplianceStatus, usize>,
}

/// Score a project's responses against the requirements they answer.
///
/// `responses` must be paired with the requirement type they respond to;
/// callers join `Response` to `Requirement.req_type` before calling this.
/// `not_applicable` responses are excluded from every average but still
/// counted in `status_breakdown`.
pub fn score_responses(responses: &[(RequirementType, &Response)]) -> ComplianceScore {
    let mut status_breakdown: HashMap<ComplianceStatus, usize> = HashMap::new();
    for (_, response) in responses {
        *status_breakdown.entry(response.compliance_status).or_insert(0) += 1;
    }

    if responses.is_empty() {
        return ComplianceScore {
            overall_score: 0.0,
            by_type: Vec::new(),
            status_breakdown,
        };
    }

    let mut by_type_weights: HashMap<RequirementType, Vec<f64>> = HashMap::new();
    let mut all_weights: Vec<f64> = Vec::new();

    for (req_type, response) in responses {
        if let Some(weight) = response.compliance_status.weight() {
            by_type_weights.entry(*req_type).or_default().push(weight);
            all_weights.push(weight);
        }
    }

    let mut by_type: Vec<TypeScore> = by_type_weights
        .into_iter()
        .map(|(req_type, weights)| TypeScore {
            req_type,
            score: mean(&weights) * 100.0,
            responded_count: weights.len(),
        })
        .collect();
    by_type.sort_by_key(|t| t.req_type.as_str());

    let overall_score = if all_weights.is_empty() { 0.0 } else { mean(&all_weights) * 100.0 };

    ComplianceScore {
        overall_score,
        by_type,
        status_breakdown,
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
