//! Creative brief models.
//!
//! `BriefPayload` is the raw request body: every field is optional so that a
//! missing field becomes a validation error instead of a JSON rejection.
//! `BriefPayload::validate` turns it into a `CreativeBrief` whose required
//! fields are guaranteed non-empty.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::language::OutputLanguage;

/// Maximum characters accepted for any single brief text field.
pub const MAX_FIELD_CHARS: usize = 2000;

/// Default nominal duration when the duration label carries no number.
const DEFAULT_DURATION_SECONDS: u32 = 30;

/// Longest nominal duration a label can resolve to.
const MAX_DURATION_SECONDS: u32 = 3600;

/// Kind of production the storyboard is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Tvc,
    Kol,
    Brand,
    Social,
    Corporate,
}

impl ProjectType {
    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "tvc" => Some(ProjectType::Tvc),
            "kol" => Some(ProjectType::Kol),
            "brand" => Some(ProjectType::Brand),
            "social" => Some(ProjectType::Social),
            "corporate" => Some(ProjectType::Corporate),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::Tvc => "tvc",
            ProjectType::Kol => "kol",
            ProjectType::Brand => "brand",
            ProjectType::Social => "social",
            ProjectType::Corporate => "corporate",
        }
    }

    /// Human readable name in the given language.
    pub fn label(&self, language: OutputLanguage) -> &'static str {
        match (self, language) {
            (ProjectType::Tvc, OutputLanguage::En) => "TV commercial",
            (ProjectType::Kol, OutputLanguage::En) => "influencer video",
            (ProjectType::Brand, OutputLanguage::En) => "brand film",
            (ProjectType::Social, OutputLanguage::En) => "social media video",
            (ProjectType::Corporate, OutputLanguage::En) => "corporate video",
            (ProjectType::Tvc, OutputLanguage::Zh) => "电视广告",
            (ProjectType::Kol, OutputLanguage::Zh) => "达人种草视频",
            (ProjectType::Brand, OutputLanguage::Zh) => "品牌宣传片",
            (ProjectType::Social, OutputLanguage::Zh) => "社交媒体短视频",
            (ProjectType::Corporate, OutputLanguage::Zh) => "企业宣传片",
        }
    }
}

impl std::fmt::Display for ProjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coarse budget bucket chosen by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum BudgetTier {
    Low,
    #[default]
    Medium,
    High,
    Premium,
}

impl BudgetTier {
    /// Parse from string (case-insensitive). Unknown tiers map to `Medium`.
    pub fn parse_or_medium(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "low" => BudgetTier::Low,
            "high" => BudgetTier::High,
            "premium" => BudgetTier::Premium,
            _ => BudgetTier::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetTier::Low => "low",
            BudgetTier::Medium => "medium",
            BudgetTier::High => "high",
            BudgetTier::Premium => "premium",
        }
    }
}

impl std::fmt::Display for BudgetTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Target audience: either free text or a structured segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum TargetAudience {
    Text(String),
    #[serde(rename_all = "camelCase")]
    Segment {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        age_range: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        gender: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        interests: Option<String>,
    },
}

impl TargetAudience {
    /// Flatten the audience into a single prompt-friendly phrase.
    pub fn describe(&self) -> String {
        match self {
            TargetAudience::Text(text) => text.trim().to_string(),
            TargetAudience::Segment {
                age_range,
                gender,
                interests,
            } => [age_range, gender, interests]
                .into_iter()
                .flatten()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.describe().is_empty()
    }
}

impl std::fmt::Display for TargetAudience {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// Contact details captured with the brief.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

/// Raw brief as posted by the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BriefPayload {
    #[serde(default, deserialize_with = "lenient_string")]
    #[schemars(with = "Option<String>")]
    pub project_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    #[schemars(with = "Option<String>")]
    pub industry: Option<String>,
    #[serde(default)]
    pub target_audience: Option<TargetAudience>,
    #[serde(default, deserialize_with = "lenient_string")]
    #[schemars(with = "Option<String>")]
    pub brand_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    #[schemars(with = "Option<String>")]
    pub product_description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    #[schemars(with = "Option<String>")]
    pub key_message: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    #[schemars(with = "Option<String>")]
    pub tone: Option<String>,
    #[serde(default, alias = "durationLabel", deserialize_with = "lenient_string")]
    #[schemars(with = "Option<String>")]
    pub duration: Option<String>,
    #[serde(default, alias = "budgetTier", deserialize_with = "lenient_string")]
    #[schemars(with = "Option<String>")]
    pub budget: Option<String>,
    #[serde(default, alias = "locale", deserialize_with = "lenient_string")]
    #[schemars(with = "Option<String>")]
    pub output_language: Option<String>,
    #[serde(default)]
    pub contact_info: Option<ContactInfo>,
}

/// Accept strings and numbers (`"30s"` or `30`), treat anything else as absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Strip control characters (keeping newlines and tabs) and trim.
pub fn sanitize_field(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect::<String>()
        .trim()
        .to_string()
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(sanitize_field)
        .filter(|s| !s.is_empty())
}

impl BriefPayload {
    /// Validate required fields and build a `CreativeBrief`.
    ///
    /// `fallback_language` is used when the payload carries no language of its
    /// own (typically resolved from request headers).
    pub fn validate(&self, fallback_language: OutputLanguage) -> ModelResult<CreativeBrief> {
        let project_type = non_blank(&self.project_type);
        let industry = non_blank(&self.industry);
        let target_audience = self
            .target_audience
            .as_ref()
            .filter(|audience| !audience.is_blank());
        let brand_name = non_blank(&self.brand_name);
        let product_description = non_blank(&self.product_description);
        let key_message = non_blank(&self.key_message);
        let tone = non_blank(&self.tone);
        let duration = non_blank(&self.duration);
        let budget = non_blank(&self.budget);

        let mut missing = Vec::new();
        let checks: [(&str, bool); 9] = [
            ("projectType", project_type.is_some()),
            ("industry", industry.is_some()),
            ("targetAudience", target_audience.is_some()),
            ("brandName", brand_name.is_some()),
            ("productDescription", product_description.is_some()),
            ("keyMessage", key_message.is_some()),
            ("tone", tone.is_some()),
            ("duration", duration.is_some()),
            ("budget", budget.is_some()),
        ];
        for (name, present) in checks {
            if !present {
                missing.push(name.to_string());
            }
        }

        let contact_info = match &self.contact_info {
            Some(contact) => {
                let name = sanitize_field(&contact.name);
                let email = sanitize_field(&contact.email);
                if name.is_empty() {
                    missing.push("contactInfo.name".to_string());
                }
                if email.is_empty() {
                    missing.push("contactInfo.email".to_string());
                }
                Some(ContactInfo {
                    name,
                    email,
                    phone: non_blank(&contact.phone),
                    company: non_blank(&contact.company),
                })
            }
            None => None,
        };

        if !missing.is_empty() {
            return Err(ModelError::missing(missing));
        }

        // Presence was checked above; the unwrap_or_default calls never fire.
        let project_type_raw = project_type.unwrap_or_default();
        let project_type = ProjectType::parse(&project_type_raw).ok_or_else(|| {
            ModelError::invalid(
                "projectType",
                format!(
                    "'{}' is not one of tvc, kol, brand, social, corporate",
                    project_type_raw
                ),
            )
        })?;

        let target_audience = match target_audience {
            Some(TargetAudience::Text(text)) => TargetAudience::Text(sanitize_field(text)),
            Some(segment) => segment.clone(),
            None => TargetAudience::Text(String::new()),
        };

        let brief = CreativeBrief {
            project_type,
            industry: industry.unwrap_or_default(),
            target_audience,
            brand_name: brand_name.unwrap_or_default(),
            product_description: product_description.unwrap_or_default(),
            key_message: key_message.unwrap_or_default(),
            tone: tone.unwrap_or_default(),
            duration_label: duration.unwrap_or_default(),
            budget_tier: BudgetTier::parse_or_medium(&budget.unwrap_or_default()),
            output_language: self
                .output_language
                .as_deref()
                .and_then(OutputLanguage::from_locale)
                .unwrap_or(fallback_language),
            contact_info,
        };

        brief.check_lengths()?;
        Ok(brief)
    }
}

/// A validated creative brief.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreativeBrief {
    pub project_type: ProjectType,
    pub industry: String,
    pub target_audience: TargetAudience,
    pub brand_name: String,
    pub product_description: String,
    pub key_message: String,
    pub tone: String,
    pub duration_label: String,
    pub budget_tier: BudgetTier,
    pub output_language: OutputLanguage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<ContactInfo>,
}

impl CreativeBrief {
    /// Nominal length of the production in seconds, parsed from the duration
    /// label (`"30s"`, `"60"`, `"1min"`, `"2 minutes"`).
    pub fn nominal_duration_seconds(&self) -> u32 {
        parse_duration_label(&self.duration_label).unwrap_or(DEFAULT_DURATION_SECONDS)
    }

    fn check_lengths(&self) -> ModelResult<()> {
        let audience = self.target_audience.describe();
        let fields: [(&str, &str); 8] = [
            ("industry", &self.industry),
            ("targetAudience", &audience),
            ("brandName", &self.brand_name),
            ("productDescription", &self.product_description),
            ("keyMessage", &self.key_message),
            ("tone", &self.tone),
            ("duration", &self.duration_label),
            ("budget", self.budget_tier.as_str()),
        ];
        for (name, value) in fields {
            if value.chars().count() > MAX_FIELD_CHARS {
                return Err(ModelError::invalid(
                    name,
                    format!("longer than {} characters", MAX_FIELD_CHARS),
                ));
            }
        }
        Ok(())
    }
}

/// Parse the leading number of a duration label, scaling minute units.
///
/// Results are capped at [`MAX_DURATION_SECONDS`]; a minute count that
/// overflows yields `None`.
fn parse_duration_label(label: &str) -> Option<u32> {
    let label = label.trim().to_lowercase();
    let digits: String = label
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    let value: u32 = digits.parse().ok()?;
    if value == 0 {
        return None;
    }
    let rest = label
        .split_once(digits.as_str())
        .map(|(_, rest)| rest.trim_start())
        .unwrap_or("");
    let seconds = if rest.starts_with('m') || rest.starts_with("分") {
        value.checked_mul(60)?
    } else {
        value
    };
    Some(seconds.min(MAX_DURATION_SECONDS))
}
