//! Deterministic storyboard used when the text model cannot deliver.
//!
//! Four scenes built purely from brief fields: opening, need, product,
//! closing. Scene lengths split the nominal duration 20/30/30/20.

use sbgen_models::{CreativeBrief, OutputLanguage, StoryboardFrame};

const SHARES: [f64; 4] = [0.2, 0.3, 0.3, 0.2];

/// Build the fallback frames for `brief`.
pub fn fallback_frames(brief: &CreativeBrief) -> Vec<StoryboardFrame> {
    let total = brief.nominal_duration_seconds() as f64;
    let brand = brief.brand_name.as_str();
    let product = brief.product_description.as_str();
    let message = brief.key_message.as_str();
    let tone = brief.tone.as_str();
    let industry = brief.industry.as_str();
    let audience = brief.target_audience.describe();

    let scenes: [[String; 4]; 4] = match brief.output_language {
        OutputLanguage::En => [
            [
                format!("Opening: introduce {}", brand),
                format!(
                    "Establishing shot with a {} mood that places {} in the world of {}, speaking to {}.",
                    tone, brand, industry, audience
                ),
                "Wide establishing shot, slow push-in".to_string(),
                format!("Music sets a {} mood", tone),
            ],
            [
                "The moment of need".to_string(),
                format!("{} in an everyday situation where {} makes a difference.", audience, product),
                "Medium shot, handheld".to_string(),
                "Natural ambience with a light voice-over".to_string(),
            ],
            [
                "Product in action".to_string(),
                format!("Close-up of {} by {} in use, showing its key benefit.", product, brand),
                "Close-up with smooth tracking".to_string(),
                format!("Voice-over introduces {}", product),
            ],
            [
                format!("Closing: {}", message),
                format!("{} logo with the line \"{}\" on screen.", brand, message),
                "Static centered frame".to_string(),
                format!("Voice-over: \"{}\"", message),
            ],
        ],
        OutputLanguage::Zh => [
            [
                format!("开场：引出{}", brand),
                format!("{}风格的开场全景，将{}置于{}行业场景中，面向{}。", tone, brand, industry, audience),
                "远景建立镜头，缓慢推进".to_string(),
                format!("{}基调的背景音乐", tone),
            ],
            [
                "需求时刻".to_string(),
                format!("{}在日常生活中遇到需要{}的时刻。", audience, product),
                "中景，手持拍摄".to_string(),
                "环境音与轻旁白".to_string(),
            ],
            [
                "产品展示".to_string(),
                format!("{}的{}使用特写，突出核心卖点。", brand, product),
                "特写，平稳跟拍".to_string(),
                format!("旁白介绍{}", product),
            ],
            [
                format!("收尾：{}", message),
                format!("{}标志与标语“{}”出现在画面中。", brand, message),
                "固定居中构图".to_string(),
                format!("旁白：“{}”", message),
            ],
        ],
    };

    scenes
        .into_iter()
        .zip(SHARES)
        .enumerate()
        .map(|(index, ([description, visual, camera, audio], share))| {
            StoryboardFrame::new(
                index as u32 + 1,
                description,
                visual,
                round_tenth(total * share),
                camera,
                audio,
            )
        })
        .collect()
}

fn round_tenth(seconds: f64) -> f64 {
    (seconds * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use sbgen_models::{BriefPayload, GeneratedStoryboard, TargetAudience};

    fn brief(language: &str, duration: &str) -> CreativeBrief {
        BriefPayload {
            project_type: Some("tvc".into()),
            industry: Some("technology".into()),
            target_audience: Some(TargetAudience::Text("young adults".into())),
            brand_name: Some("Acme".into()),
            product_description: Some("smart speaker".into()),
            key_message: Some("sound that moves you".into()),
            tone: Some("energetic".into()),
            duration: Some(duration.into()),
            budget: Some("medium".into()),
            output_language: Some(language.into()),
            ..Default::default()
        }
        .validate(OutputLanguage::En)
        .unwrap()
    }

    #[test]
    fn test_fallback_is_deterministic() {
        let b = brief("en", "30s");
        let first = fallback_frames(&b);
        assert_eq!(first, fallback_frames(&b));
        assert_eq!(first.len(), 4);

        let ids: Vec<u32> = first.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert!(first.iter().all(|f| f.image_url.is_none()));
        assert!(first.iter().all(|f| !f.description.is_empty() && !f.visual.is_empty()));
    }

    #[test]
    fn test_fallback_durations_cover_nominal_length() {
        let frames = fallback_frames(&brief("en", "30s"));
        let durations: Vec<f64> = frames.iter().map(|f| f.duration_seconds).collect();
        assert_eq!(durations, vec![6.0, 9.0, 9.0, 6.0]);
        assert_eq!(GeneratedStoryboard::total_of(&frames), 30.0);
    }

    #[test]
    fn test_fallback_uses_brief_language() {
        let frames = fallback_frames(&brief("zh", "15s"));
        assert!(frames[0].description.starts_with("开场"));
        assert!(frames[3].audio.contains("sound that moves you"));
        assert!(frames.iter().all(|f| f.duration_seconds > 0.0));
    }
}
