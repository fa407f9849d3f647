//! Frame extraction from raw model output.
//!
//! Models wrap JSON in prose, code fences, or an outer object. Candidates are
//! balanced `[...]` / `{...}` regions that start outside any other region, so
//! an array nested in an object is never taken on its own. Strategies run in
//! order and the first candidate that decodes into frames wins; when none
//! does, the first decoding error is reported.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use sbgen_models::{StoryboardFrame, DEFAULT_FRAME_SECONDS};

use crate::error::{AiError, AiResult};

/// How a JSON candidate was located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// Top-level balanced `[...]`
    BareArray,
    /// Top-level balanced `{...}`
    BareObject,
    /// Balanced `[...]` inside a fenced code block
    FencedBlock,
}

static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").unwrap());

/// Balanced regions opened at depth zero, in order of appearance.
///
/// Quotes are only tracked inside a region, so apostrophes in surrounding
/// prose do not matter. A mismatched closer abandons the current region.
fn top_level_regions(raw: &str) -> Vec<&str> {
    let mut regions = Vec::new();
    let mut closers: Vec<char> = Vec::new();
    let mut start = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in raw.char_indices() {
        if closers.is_empty() {
            match c {
                '[' => closers.push(']'),
                '{' => closers.push('}'),
                _ => continue,
            }
            start = i;
            continue;
        }

        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '[' => closers.push(']'),
            '{' => closers.push('}'),
            ']' | '}' => {
                if closers.pop() != Some(c) {
                    closers.clear();
                } else if closers.is_empty() {
                    regions.push(&raw[start..=i]);
                }
            }
            _ => {}
        }
    }
    regions
}

/// Every JSON candidate in `raw`, in strategy order.
pub fn locate_candidates(raw: &str) -> Vec<(ExtractionStrategy, &str)> {
    let regions = top_level_regions(raw);
    let arrays = regions
        .iter()
        .filter(|r| r.starts_with('['))
        .map(|r| (ExtractionStrategy::BareArray, *r));
    let objects = regions
        .iter()
        .filter(|r| r.starts_with('{'))
        .map(|r| (ExtractionStrategy::BareObject, *r));
    let fenced = FENCED_BLOCK
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1))
        .flat_map(|body| top_level_regions(body.as_str()))
        .filter(|r| r.starts_with('['))
        .map(|r| (ExtractionStrategy::FencedBlock, r));

    arrays.chain(objects).chain(fenced).collect()
}

/// Decode one candidate into its frame objects.
fn decode_items(candidate: &str) -> Result<Vec<Value>, String> {
    let value: Value = serde_json::from_str(candidate).map_err(|e| format!("invalid JSON: {}", e))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("frames") {
            Some(Value::Array(items)) => items,
            _ => return Err("JSON object has no frames array".to_string()),
        },
        _ => return Err("JSON is neither an array nor an object".to_string()),
    };

    if items.iter().any(Value::is_object) {
        Ok(items)
    } else {
        Err("no frame objects".to_string())
    }
}

/// Extract and normalize storyboard frames from raw model output.
pub fn extract_frames(raw: &str) -> AiResult<Vec<StoryboardFrame>> {
    let candidates = locate_candidates(raw);
    if candidates.is_empty() {
        return Err(AiError::malformed("no JSON array or object found in model output"));
    }

    let mut first_error = None;
    for (strategy, candidate) in candidates {
        match decode_items(candidate) {
            Ok(items) => {
                debug!(?strategy, "Decoded JSON candidate ({} bytes)", candidate.len());
                return Ok(items
                    .iter()
                    .enumerate()
                    .filter_map(|(index, item)| item.as_object().map(|map| normalize_frame(index, map)))
                    .collect());
            }
            Err(reason) => {
                debug!(?strategy, "Skipping JSON candidate: {}", reason);
                if first_error.is_none() {
                    first_error = Some(format!("{:?}: {}", strategy, reason));
                }
            }
        }
    }

    Err(AiError::malformed(first_error.unwrap_or_default()))
}

fn normalize_frame(index: usize, map: &Map<String, Value>) -> StoryboardFrame {
    let position = index as u32 + 1;
    let id = map.get("id").and_then(positive_id).unwrap_or(position);

    StoryboardFrame::new(
        id,
        text_field(map, &["description", "scene"]),
        text_field(map, &["visual", "visualDescription", "visual_description"]),
        duration_field(map),
        text_field(map, &["camera", "cameraMovement", "shot"]),
        text_field(map, &["audio", "sound", "voiceover"]),
    )
}

fn positive_id(value: &Value) -> Option<u32> {
    let id = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (id.is_finite() && id >= 1.0 && id <= u32::MAX as f64).then_some(id as u32)
}

fn text_field(map: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| match map.get(*key)? {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
        .unwrap_or_default()
}

fn duration_field(map: &Map<String, Value>) -> f64 {
    ["durationSeconds", "duration"]
        .iter()
        .find_map(|key| match map.get(*key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => leading_number(s),
            _ => None,
        })
        .unwrap_or(DEFAULT_FRAME_SECONDS)
}

/// Parse the leading decimal number of strings like `"5s"` or `"3.5 秒"`.
fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim();
    let end = s
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prose_wrapped_fenced_array() {
        let raw = "Here is the result:\n```json\n[{\"id\":1,\"description\":\"Open\",\"visual\":\"Sunrise\",\"duration\":5,\"camera\":\"wide\",\"audio\":\"music\"}]\n```\nThanks";
        let frames = extract_frames(raw).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].id, 1);
        assert_eq!(frames[0].description, "Open");
        assert_eq!(frames[0].duration_seconds, 5.0);
    }

    #[test]
    fn test_bare_array_strategy_wins() {
        let raw = "[{\"description\":\"a\"},{\"description\":\"b\"}]";
        let candidates = locate_candidates(raw);
        assert_eq!(candidates[0], (ExtractionStrategy::BareArray, raw));
    }

    #[test]
    fn test_nested_arrays_are_not_top_level() {
        let raw = r#"{"frames":[{"id":1,"description":"a"},{"id":2,"description":"b"}],"tags":["fun"]}"#;
        let candidates = locate_candidates(raw);
        assert_eq!(candidates, vec![(ExtractionStrategy::BareObject, raw)]);

        let frames = extract_frames(raw).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].description, "b");
    }

    #[test]
    fn test_bracketed_prose_before_fenced_array() {
        let raw = "Here is the result [draft 2]:\n```json\n[{\"id\":1,\"description\":\"Open\",\"duration\":4}]\n```";
        let frames = extract_frames(raw).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].description, "Open");
        assert_eq!(frames[0].duration_seconds, 4.0);
    }

    #[test]
    fn test_brackets_inside_strings_are_ignored() {
        let raw = r#"Scenes: [{"id":1,"description":"close ] and { open","audio":"\"hi\""}] done"#;
        let frames = extract_frames(raw).unwrap();
        assert_eq!(frames[0].description, "close ] and { open");
        assert_eq!(frames[0].audio, "\"hi\"");
    }

    #[test]
    fn test_fenced_block_after_unclosed_brace() {
        // The stray brace swallows everything after it at the top level.
        let raw = "Use {brand voice.\n```\n[{\"id\":1,\"description\":\"x\"}]\n```";
        let candidates = locate_candidates(raw);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].0, ExtractionStrategy::FencedBlock);
        assert_eq!(extract_frames(raw).unwrap()[0].description, "x");
    }

    #[test]
    fn test_object_with_frames() {
        let raw = "Result: {\"frames\": [{\"id\": 2, \"description\": \"x\"}], \"note\": \"ok\"}";
        let frames = extract_frames(raw).unwrap();
        assert_eq!(frames[0].id, 2);

        let object_only = "{\"frames\": {\"id\": 1}}";
        assert!(extract_frames(object_only).is_err());
    }

    #[test]
    fn test_garbage_is_malformed() {
        let err = extract_frames("hello world").unwrap_err();
        assert!(matches!(err, AiError::MalformedModelOutput(_)));
    }

    #[test]
    fn test_unparsable_candidate_is_malformed() {
        let err = extract_frames("Scenes: [not json at all]").unwrap_err();
        assert!(matches!(err, AiError::MalformedModelOutput(_)));
    }

    #[test]
    fn test_empty_array_is_malformed() {
        assert!(extract_frames("[]").is_err());
        assert!(extract_frames("[1, \"two\", null]").is_err());
    }

    #[test]
    fn test_normalizes_missing_fields() {
        let raw = r#"[{"id": 0}, {"id": "7", "duration": "4s"}, "skip me", {"duration": -2}]"#;
        let frames = extract_frames(raw).unwrap();
        assert_eq!(frames.len(), 3);

        assert_eq!(frames[0].id, 1);
        assert_eq!(frames[0].description, "");
        assert_eq!(frames[0].visual, "");
        assert_eq!(frames[0].duration_seconds, DEFAULT_FRAME_SECONDS);

        assert_eq!(frames[1].id, 7);
        assert_eq!(frames[1].duration_seconds, 4.0);

        // Position counts skipped elements
        assert_eq!(frames[2].id, 4);
        assert_eq!(frames[2].duration_seconds, DEFAULT_FRAME_SECONDS);
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("5s"), Some(5.0));
        assert_eq!(leading_number(" 3.5 秒"), Some(3.5));
        assert_eq!(leading_number("five"), None);
    }
}
