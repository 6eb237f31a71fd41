//! Lenient structured-output decoder for generator responses.
//!
//! The generator asks the model for a bare JSON object with the keys
//! `language`, `description`, and `code`, but real completions wrap the
//! object in prose, or emit the code value as a raw triple-quoted literal
//! that is not valid JSON. Fallback rules, applied in order:
//!
//! 1. Normalize `"""..."""` literals into escaped JSON string content.
//! 2. Locate the outermost `{`...`}` slice, tolerating surrounding text.
//! 3. Try strict JSON parsing of that slice.
//! 4. Fall back to ordered field extraction by regex; an unquoted code
//!    value is taken as a raw literal, a quoted one is JSON-decoded.
//!
//! Anything still unparseable decodes to `None`. The rules are heuristic
//! and are tested against the literal malformed shapes they were built
//! for; they are not expected to generalize further.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use super::generator::GeneratedSnippet;

fn triple_quote_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?s)"""\s*(.*?)\s*""""#).expect("static pattern"))
}

fn field_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?s)"language":\s*"(?P<language>.*?)".*?"description":\s*"(?P<description>.*?)".*?"code":\s*(?P<code>.+)\s*\}\s*$"#,
        )
        .expect("static pattern")
    })
}

/// Replace triple-quoted literals with properly escaped string content.
fn fix_triple_quotes(text: &str) -> String {
    triple_quote_re()
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let dumped =
                serde_json::to_string(&caps[1]).unwrap_or_else(|_| "\"\"".to_string());
            // Keep the escaped body, drop the surrounding quotes the dump added.
            dumped[1..dumped.len() - 1].to_string()
        })
        .into_owned()
}

/// The slice between the first `{` and the last `}`, if both exist.
fn outer_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

fn from_strict_json(slice: &str) -> Option<GeneratedSnippet> {
    let value: Value = serde_json::from_str(slice).ok()?;
    let object = value.as_object()?;
    Some(GeneratedSnippet {
        language: object.get("language")?.as_str()?.to_string(),
        description: object.get("description")?.as_str()?.to_string(),
        code: object.get("code")?.as_str()?.to_string(),
    })
}

fn from_field_extraction(slice: &str) -> Option<GeneratedSnippet> {
    let caps = field_re().captures(slice)?;
    let language = caps["language"].trim().to_string();
    let description = caps["description"].trim().to_string();
    let code_raw = caps["code"].trim();

    let code = if code_raw.starts_with('"') && code_raw.ends_with('"') {
        serde_json::from_str::<String>(code_raw).ok()?
    } else {
        code_raw.to_string()
    };

    Some(GeneratedSnippet {
        language,
        description,
        code,
    })
}

/// Decode a raw generator completion into a snippet, or `None` when no
/// fallback rule applies.
pub fn decode_snippet(raw: &str) -> Option<GeneratedSnippet> {
    let fixed = fix_triple_quotes(raw);
    let slice = outer_object(&fixed)?;

    if let Some(snippet) = from_strict_json(slice) {
        return Some(snippet);
    }
    from_field_extraction(slice)
}
