//! Lead records captured after a completed run.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::brief::{BudgetTier, CreativeBrief, ProjectType};
use crate::budget::BudgetEstimate;
use crate::language::OutputLanguage;
use crate::storyboard::GeneratedStoryboard;

/// Contact details plus a summary of the generated storyboard.
///
/// Write-once: produced by the orchestrator and handed to a lead sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub project_type: ProjectType,
    pub brand_name: String,
    pub industry: String,
    pub budget_tier: BudgetTier,
    pub output_language: OutputLanguage,
    pub frame_count: u32,
    pub total_duration_seconds: f64,
    pub estimated_budget: BudgetEstimate,
    pub created_at: DateTime<Utc>,
}

impl LeadRecord {
    /// Build a lead from a brief and its storyboard.
    ///
    /// Returns `None` when the brief carries no contact info.
    pub fn from_run(brief: &CreativeBrief, storyboard: &GeneratedStoryboard) -> Option<Self> {
        let contact = brief.contact_info.as_ref()?;
        Some(Self {
            id: Uuid::new_v4().to_string(),
            name: contact.name.clone(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
            company: contact.company.clone(),
            project_type: brief.project_type,
            brand_name: brief.brand_name.clone(),
            industry: brief.industry.clone(),
            budget_tier: brief.budget_tier,
            output_language: brief.output_language,
            frame_count: storyboard.frames.len() as u32,
            total_duration_seconds: storyboard.total_duration_seconds,
            estimated_budget: storyboard.estimated_budget.clone(),
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BriefPayload, BudgetEstimator, StoryboardFrame};

    fn brief(with_contact: bool) -> CreativeBrief {
        let mut value = serde_json::json!({
            "projectType": "brand",
            "industry": "food",
            "targetAudience": "families",
            "brandName": "Nom",
            "productDescription": "snacks",
            "keyMessage": "share the crunch",
            "tone": "playful",
            "duration": "15s",
            "budget": "low"
        });
        if with_contact {
            value["contactInfo"] = serde_json::json!({"name": "B", "email": "b@c.io", "company": "Nom Ltd"});
        }
        let payload: BriefPayload = serde_json::from_value(value).unwrap();
        payload.validate(OutputLanguage::En).unwrap()
    }

    fn storyboard() -> GeneratedStoryboard {
        GeneratedStoryboard::assemble(
            vec![
                StoryboardFrame::new(1, "a", "a", 7.0, "c", "a"),
                StoryboardFrame::new(2, "b", "b", 8.0, "c", "a"),
            ],
            "summary",
            BudgetEstimator::estimate(BudgetTier::Low, 15.0, ProjectType::Brand),
        )
    }

    #[test]
    fn test_lead_from_run() {
        let lead = LeadRecord::from_run(&brief(true), &storyboard()).unwrap();
        assert_eq!(lead.name, "B");
        assert_eq!(lead.company.as_deref(), Some("Nom Ltd"));
        assert_eq!(lead.frame_count, 2);
        assert_eq!(lead.total_duration_seconds, 15.0);
        assert_eq!(lead.estimated_budget, storyboard().estimated_budget);
    }

    #[test]
    fn test_no_lead_without_contact() {
        assert!(LeadRecord::from_run(&brief(false), &storyboard()).is_none());
    }
}
