//! Output language selection.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Language of all user-facing text produced by a run.
///
/// Fixed for the whole run; image prompts are translated separately when the
/// image provider needs English.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputLanguage {
    #[default]
    En,
    Zh,
}

impl OutputLanguage {
    /// Resolve a locale tag such as `zh-CN`, `zh`, `en-US`.
    ///
    /// Any non-empty tag starting with `zh` selects Chinese, every other
    /// non-empty tag selects English. Returns `None` for a blank tag so the
    /// caller can fall through to the next locale source.
    pub fn from_locale(tag: &str) -> Option<Self> {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() {
            return None;
        }
        if tag.starts_with("zh") {
            Some(OutputLanguage::Zh)
        } else {
            Some(OutputLanguage::En)
        }
    }

    /// Resolve the first entry of an `Accept-Language` header value.
    pub fn from_accept_language(header: &str) -> Option<Self> {
        header
            .split(',')
            .next()
            .map(|entry| entry.split(';').next().unwrap_or(""))
            .and_then(Self::from_locale)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputLanguage::En => "en",
            OutputLanguage::Zh => "zh",
        }
    }

    /// English name of the language, used inside prompts.
    pub fn display_name(&self) -> &'static str {
        match self {
            OutputLanguage::En => "English",
            OutputLanguage::Zh => "Simplified Chinese",
        }
    }

    pub fn is_english(&self) -> bool {
        matches!(self, OutputLanguage::En)
    }
}

impl std::fmt::Display for OutputLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_locale() {
        assert_eq!(OutputLanguage::from_locale("zh-CN"), Some(OutputLanguage::Zh));
        assert_eq!(OutputLanguage::from_locale(" ZH "), Some(OutputLanguage::Zh));
        assert_eq!(OutputLanguage::from_locale("en-US"), Some(OutputLanguage::En));
        assert_eq!(OutputLanguage::from_locale("fr"), Some(OutputLanguage::En));
        assert_eq!(OutputLanguage::from_locale("  "), None);
    }

    #[test]
    fn test_from_accept_language() {
        assert_eq!(
            OutputLanguage::from_accept_language("zh-TW,zh;q=0.9,en;q=0.8"),
            Some(OutputLanguage::Zh)
        );
        assert_eq!(
            OutputLanguage::from_accept_language("en-GB;q=0.9"),
            Some(OutputLanguage::En)
        );
        assert_eq!(OutputLanguage::from_accept_language(""), None);
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&OutputLanguage::Zh).unwrap();
        assert_eq!(json, "\"zh\"");
    }
}
