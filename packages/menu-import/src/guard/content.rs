//! Output content filter, run on every user-visible string the model returned.
//!
//! Each whitespace-delimited token is checked against an obscenity/slur list
//! compiled into patterns that tolerate leetspeak substitutions and repeated
//! letters. Hits are replaced in place so names stay linkable.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

use super::injection::compile_patterns;
use crate::types::menu::ExtractedMenuData;

/// Replaces every blocked token.
pub const REDACTION_MARKER: &str = "[redacted]";

const LEET_SYMBOLS: &str = "@$!|+";

/// Blocked stems that also match common inflections ("-ing", "-ed", "-s").
const BLOCKED_WORDS: &[&str] = &[
    "fuck", "motherfuck", "shit", "shitty", "bullshit", "cunt", "bitch", "asshole", "bastard",
    "pussy", "twat", "wanker", "whore", "slut", "nigger", "nigga", "retard", "kike", "tranny",
];

/// Blocked only as the whole word. Their inflections are food words
/// ("Spiced", "Faggots"), and "dick" and "cock" are left out for
/// "Spotted Dick" and "Cock-a-leekie".
const BLOCKED_EXACT_WORDS: &[&str] = &["spic", "fag", "faggot", "chink"];

lazy_static! {
    static ref TOKEN: Option<Regex> = Regex::new(r"\S+")
        .map_err(|e| warn!(error = %e, "Token pattern failed to compile"))
        .ok();
    static ref BLOCKED: Option<Vec<Regex>> = {
        let patterns: Vec<String> = BLOCKED_WORDS
            .iter()
            .map(|w| leet_pattern(w, true))
            .chain(BLOCKED_EXACT_WORDS.iter().map(|w| leet_pattern(w, false)))
            .collect();
        let refs: Vec<&str> = patterns.iter().map(String::as_str).collect();
        compile_patterns(&refs)
    };
}

/// Build an anchored pattern where each letter may be a leet substitute and
/// may repeat, optionally allowing common inflection suffixes.
fn leet_pattern(word: &str, inflected: bool) -> String {
    let body: String = word
        .chars()
        .map(|c| {
            let class = match c {
                'a' => "[a4@]",
                'b' => "[b8]",
                'e' => "[e3]",
                'g' => "[g9]",
                'i' => "[i1!|]",
                'l' => "[l1|]",
                'o' => "[o0]",
                's' => "[s5$]",
                't' => "[t7+]",
                'z' => "[z2]",
                _ => return format!("{}+", regex::escape(&c.to_string())),
            };
            format!("{}+", class)
        })
        .collect();
    let suffix = if inflected {
        r"(?:[e3]?[s5$]|[i1!]ng|[e3][dr][s5$]?|[i1!][e3][s5$])?"
    } else {
        ""
    };
    format!(r"(?i)^{}{}$", body, suffix)
}

/// Byte span of `tok` left after trimming chars matching `trim` from both ends.
fn trim_span(tok: &str, trim: impl Fn(char) -> bool) -> (usize, usize) {
    let start = tok.len() - tok.trim_start_matches(&trim).len();
    let end = tok.trim_end_matches(&trim).len().max(start);
    (start, end)
}

fn is_blocked(candidate: &str, patterns: &[Regex]) -> bool {
    !candidate.is_empty() && patterns.iter().any(|p| p.is_match(candidate))
}

/// Redact blocked words in one string. Returns `None` when nothing changed.
pub fn filter_text(text: &str) -> Option<String> {
    let (Some(token), Some(blocked)) = (TOKEN.as_ref(), BLOCKED.as_ref()) else {
        warn!("Content patterns unavailable; passing output through unfiltered");
        return None;
    };

    let mut result = String::with_capacity(text.len());
    let mut last = 0usize;
    let mut changed = false;

    for m in token.find_iter(text) {
        let tok = m.as_str();
        // Leet symbols count as letters; other punctuation is trimmed
        let hit = [
            trim_span(tok, |c| !c.is_alphanumeric() && !LEET_SYMBOLS.contains(c)),
            trim_span(tok, |c| !c.is_alphanumeric()),
        ]
        .into_iter()
        .find(|(start, end)| is_blocked(&tok[*start..*end], blocked));

        if let Some((start, end)) = hit {
            result.push_str(&text[last..m.start() + start]);
            result.push_str(REDACTION_MARKER);
            last = m.start() + end;
            changed = true;
        }
    }

    if !changed {
        return None;
    }
    result.push_str(&text[last..]);
    Some(result)
}

fn filter_field(value: &mut String, redacted: &mut usize) {
    if let Some(clean) = filter_text(value) {
        *value = clean;
        *redacted += 1;
    }
}

fn filter_optional(value: &mut Option<String>, redacted: &mut usize) {
    if let Some(v) = value.as_mut() {
        filter_field(v, redacted);
    }
}

/// Redact blocked words in every user-visible field of an extraction.
///
/// Structural links (`category_name`, `applies_to`) are filtered the same
/// way as the names they point at, so matching keeps working. Returns the
/// number of fields changed.
pub fn filter_extraction(data: &mut ExtractedMenuData) -> usize {
    let mut redacted = 0usize;

    for category in &mut data.categories {
        filter_field(&mut category.name, &mut redacted);
        filter_optional(&mut category.description, &mut redacted);
        for item in &mut category.items {
            filter_field(&mut item.name, &mut redacted);
            filter_optional(&mut item.description, &mut redacted);
            filter_field(&mut item.category_name, &mut redacted);
        }
    }

    for group in &mut data.option_groups {
        filter_field(&mut group.name, &mut redacted);
        filter_optional(&mut group.description, &mut redacted);
        for choice in &mut group.choices {
            filter_field(&mut choice.name, &mut redacted);
        }
        for target in &mut group.applies_to {
            filter_field(target, &mut redacted);
        }
    }

    if redacted > 0 {
        warn!(fields = redacted, "Blocked content redacted from model output");
    }
    redacted
}
