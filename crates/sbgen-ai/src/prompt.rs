//! Storyboard prompt templates.
//!
//! Two templates exist: a commercial template used for every project type
//! except influencer videos, and an influencer template for `kol` briefs.
//! Placeholders use `{{name}}` syntax and are replaced literally.

use sbgen_models::{CreativeBrief, OutputLanguage, ProjectType, StoryboardFrame};

/// System prompt for storyboard generation.
pub const STORYBOARD_SYSTEM_PROMPT: &str = "You are a senior creative director at an advertising \
agency. You write production-ready storyboards and always answer with a JSON array of scenes \
and nothing else.";

/// System prompt for the visual enhancement pass.
pub const VISUAL_ENHANCEMENT_SYSTEM_PROMPT: &str = "You write prompts for a text-to-image model. \
Answer with a single English paragraph describing one still frame: subject, setting, lighting, \
composition, lens and mood. No lists, no quotes, no commentary.";

const COMMERCIAL_TEMPLATE: &str = r#"Create a storyboard for a commercial with the following brief.

Industry: {{industry}}
Target audience: {{targetAudience}}
Budget level: {{budget}}
Brand: {{brandName}}
Product or service: {{productDescription}}
Key message: {{keyMessage}}
Tone: {{tone}}
Total duration: {{duration}}

Write 4 to 6 scenes that build from an attention-grabbing opening to a clear brand payoff.
Scale production complexity to the budget level.

Return a JSON array. Each element must have exactly these fields:
- "id": scene number starting at 1
- "description": one sentence summarising the scene
- "visual": a detailed description of what is on screen, suitable as an image-generation prompt
- "duration": scene length in seconds (number)
- "camera": shot size and camera movement
- "audio": music, sound effects and voice-over

The scene durations must add up to roughly the total duration.

{{languageRequirement}}"#;

const INFLUENCER_TEMPLATE: &str = r#"Create a storyboard for an influencer (KOL) video with the following brief.

Industry: {{industry}}
Target audience: {{targetAudience}}
Budget level: {{budget}}
Brand: {{brandName}}
Product or service: {{productDescription}}
Key message: {{keyMessage}}
Tone: {{tone}}
Total duration: {{duration}}

The creator speaks directly to camera in a natural, personal voice. Open with a hook in the
first three seconds, show the product in real use, and close with an authentic recommendation
and call to action. Write 4 to 6 scenes.

Return a JSON array. Each element must have exactly these fields:
- "id": scene number starting at 1
- "description": one sentence summarising the scene
- "visual": a detailed description of what is on screen, suitable as an image-generation prompt
- "duration": scene length in seconds (number)
- "camera": framing and camera movement (handheld, selfie, close-up ...)
- "audio": what the creator says plus music and sound effects

The scene durations must add up to roughly the total duration.

{{languageRequirement}}"#;

/// Which template a brief renders with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Commercial,
    Influencer,
}

impl TemplateKind {
    pub fn for_project(project_type: ProjectType) -> Self {
        match project_type {
            ProjectType::Kol => TemplateKind::Influencer,
            _ => TemplateKind::Commercial,
        }
    }

    fn source(self) -> &'static str {
        match self {
            TemplateKind::Commercial => COMMERCIAL_TEMPLATE,
            TemplateKind::Influencer => INFLUENCER_TEMPLATE,
        }
    }
}

/// Directive telling the model which language to write in.
pub fn language_directive(language: OutputLanguage) -> String {
    match language {
        OutputLanguage::En => {
            "Language requirement: write every text field in English.".to_string()
        }
        OutputLanguage::Zh => "Language requirement: write every text field in Simplified \
Chinese (简体中文). Keep the JSON field names in English."
            .to_string(),
    }
}

/// Render the storyboard prompt for `brief`.
pub fn render(brief: &CreativeBrief, language_requirement: &str) -> String {
    let values = [
        ("industry", brief.industry.clone()),
        ("targetAudience", brief.target_audience.describe()),
        ("budget", brief.budget_tier.as_str().to_string()),
        ("brandName", brief.brand_name.clone()),
        ("productDescription", brief.product_description.clone()),
        ("keyMessage", brief.key_message.clone()),
        ("tone", brief.tone.clone()),
        ("duration", brief.duration_label.clone()),
        ("languageRequirement", language_requirement.to_string()),
    ];

    fill(TemplateKind::for_project(brief.project_type).source(), &values)
}

/// Prompt asking the text model to turn a frame into a richer image prompt.
pub fn render_visual_enhancement(frame: &StoryboardFrame, brief: &CreativeBrief) -> String {
    fill(
        "Brand: {{brandName}}\nTone: {{tone}}\nScene: {{description}}\nVisual: {{visual}}\nCamera: {{camera}}\n\n\
Rewrite this scene as a detailed image-generation prompt in English.",
        &[
            ("brandName", brief.brand_name.clone()),
            ("tone", brief.tone.clone()),
            ("description", frame.description.clone()),
            ("visual", frame.visual.clone()),
            ("camera", frame.camera.clone()),
        ],
    )
}

fn fill(template: &str, values: &[(&str, String)]) -> String {
    values.iter().fold(template.to_string(), |acc, (name, value)| {
        acc.replace(&format!("{{{{{}}}}}", name), value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sbgen_models::{BriefPayload, TargetAudience};

    fn brief(project_type: &str) -> CreativeBrief {
        BriefPayload {
            project_type: Some(project_type.to_string()),
            industry: Some("technology".to_string()),
            target_audience: Some(TargetAudience::Text("young adults".to_string())),
            brand_name: Some("Acme".to_string()),
            product_description: Some("smart speaker".to_string()),
            key_message: Some("sound that moves you".to_string()),
            tone: Some("energetic".to_string()),
            duration: Some("30s".to_string()),
            budget: Some("medium".to_string()),
            ..Default::default()
        }
        .validate(OutputLanguage::En)
        .unwrap()
    }

    #[test]
    fn test_template_selection() {
        assert_eq!(TemplateKind::for_project(ProjectType::Kol), TemplateKind::Influencer);
        for project in [ProjectType::Tvc, ProjectType::Brand, ProjectType::Social, ProjectType::Corporate] {
            assert_eq!(TemplateKind::for_project(project), TemplateKind::Commercial);
        }
    }

    #[test]
    fn test_render_fills_every_placeholder() {
        for project in ["tvc", "kol"] {
            let prompt = render(&brief(project), &language_directive(OutputLanguage::Zh));
            assert!(!prompt.contains("{{"), "unresolved placeholder in {}", project);
            assert!(prompt.contains("Acme"));
            assert!(prompt.contains("sound that moves you"));
            assert!(prompt.contains("young adults"));
            assert!(prompt.contains("Simplified Chinese"));
        }
        assert!(render(&brief("kol"), "").contains("influencer"));
    }

    #[test]
    fn test_visual_enhancement_prompt() {
        let frame = StoryboardFrame::new(1, "Opening", "A speaker on a desk", 5.0, "close-up", "beat");
        let prompt = render_visual_enhancement(&frame, &brief("tvc"));
        assert!(prompt.contains("A speaker on a desk"));
        assert!(!prompt.contains("{{"));
    }
}
