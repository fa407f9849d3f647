//! Script heuristics used to decide whether text needs translation.
//!
//! These are deliberately cheap character-class checks:
//! - [`is_probably_english`] is ASCII-only. English containing curly quotes or
//!   accented names is reported as non-English (an unnecessary translation
//!   call). Romanized non-English text such as pinyin is reported as English.
//! - [`contains_cjk`] looks for any Han, kana or Hangul character. Mixed text
//!   with a single CJK character counts as CJK.

use sbgen_models::OutputLanguage;

/// `true` when every character is ASCII.
pub fn is_probably_english(text: &str) -> bool {
    text.is_ascii()
}

fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{30FF}'   // hiragana, katakana
        | '\u{3400}'..='\u{4DBF}' // CJK extension A
        | '\u{4E00}'..='\u{9FFF}' // CJK unified ideographs
        | '\u{AC00}'..='\u{D7AF}' // hangul syllables
        | '\u{F900}'..='\u{FAFF}' // compatibility ideographs
        | '\u{20000}'..='\u{2A6DF}')
}

pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(is_cjk)
}

/// `true` when the text has an alphabetic character outside the Latin blocks.
pub fn contains_non_latin(text: &str) -> bool {
    text.chars().any(|c| c.is_alphabetic() && c > '\u{024F}')
}

/// Whether `text` already appears to be written in `target`.
pub fn is_in_language(text: &str, target: OutputLanguage) -> bool {
    match target {
        OutputLanguage::En => is_probably_english(text),
        OutputLanguage::Zh => contains_cjk(text),
    }
}

/// Image prompts must be English: translate when the run language is not
/// English or the prompt carries non-Latin script.
pub fn needs_translation_for_image(prompt: &str, language: OutputLanguage) -> bool {
    !language.is_english() || contains_non_latin(prompt)
}
