//! Storyboard summary text.

use sbgen_models::{BudgetEstimate, CreativeBrief, OutputLanguage};

/// Build the summary for a finished storyboard.
pub fn build_summary(
    brief: &CreativeBrief,
    frame_count: usize,
    total_seconds: f64,
    budget: &BudgetEstimate,
) -> String {
    let label = brief.project_type.label(brief.output_language);
    let seconds = format_seconds(total_seconds);
    let audience = brief.target_audience.describe();

    match brief.output_language {
        OutputLanguage::En => format!(
            "A {tone} {label} storyboard for {brand}, aimed at {audience} in the {industry} industry. \
{frames} scenes, {seconds} seconds in total, built around the message \"{message}\". \
Estimated budget: {budget}.",
            tone = brief.tone,
            label = label,
            brand = brief.brand_name,
            audience = audience,
            industry = brief.industry,
            frames = frame_count,
            seconds = seconds,
            message = brief.key_message,
            budget = budget.format_range(),
        ),
        OutputLanguage::Zh => format!(
            "为{brand}打造的{tone}风格{label}分镜，面向{industry}行业的{audience}。\
共{frames}个场景，总时长{seconds}秒，核心信息：“{message}”。预估预算：{budget}。",
            tone = brief.tone,
            label = label,
            brand = brief.brand_name,
            audience = audience,
            industry = brief.industry,
            frames = frame_count,
            seconds = seconds,
            message = brief.key_message,
            budget = budget.format_range(),
        ),
    }
}

/// `30.0` -> `"30"`, `27.5` -> `"27.5"`.
fn format_seconds(seconds: f64) -> String {
    if seconds.fract() == 0.0 {
        format!("{}", seconds as i64)
    } else {
        format!("{:.1}", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sbgen_models::{BriefPayload, BudgetEstimator, TargetAudience};

    fn brief(language: &str) -> CreativeBrief {
        BriefPayload {
            project_type: Some("kol".into()),
            industry: Some("beauty".into()),
            target_audience: Some(TargetAudience::Text("college students".into())),
            brand_name: Some("Glow".into()),
            product_description: Some("serum".into()),
            key_message: Some("glow every day".into()),
            tone: Some("warm".into()),
            duration: Some("30s".into()),
            budget: Some("high".into()),
            output_language: Some(language.into()),
            ..Default::default()
        }
        .validate(OutputLanguage::En)
        .unwrap()
    }

    #[test]
    fn test_summary_mentions_brief_and_stats() {
        let b = brief("en");
        let budget = BudgetEstimator::estimate(b.budget_tier, 27.5, b.project_type);
        let summary = build_summary(&b, 5, 27.5, &budget);
        assert!(summary.contains("Glow"));
        assert!(summary.contains("influencer video"));
        assert!(summary.contains("5 scenes"));
        assert!(summary.contains("27.5 seconds"));
        assert!(summary.contains("glow every day"));
        assert!(summary.contains(&budget.format_range()));
    }

    #[test]
    fn test_summary_in_chinese() {
        let b = brief("zh");
        let budget = BudgetEstimator::estimate(b.budget_tier, 30.0, b.project_type);
        let summary = build_summary(&b, 4, 30.0, &budget);
        assert!(summary.contains("共4个场景"));
        assert!(summary.contains("总时长30秒"));
    }
}
