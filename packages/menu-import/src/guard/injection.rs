//! Prompt-injection sanitizer, run on document text before it reaches the model.
//!
//! Matches are replaced with a neutral placeholder and the text is flagged
//! suspicious. Extraction always proceeds on the sanitized text.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

/// Replaces every matched injection span.
pub const INJECTION_PLACEHOLDER: &str = "[filtered]";

const INJECTION_PATTERNS: &[&str] = &[
    // Instruction overrides
    r"(?i)\b(?:ignore|disregard|forget|override)\s+(?:all\s+|any\s+)?(?:of\s+)?(?:the\s+|your\s+|my\s+)?(?:previous|prior|above|earlier|preceding|system)\s+(?:instructions?|prompts?|rules|directions|messages?)",
    r"(?i)\b(?:ignore|disregard|forget)\s+(?:all\s+|your\s+)instructions?",
    r"(?i)\bnew\s+instructions?\s*:",
    r"(?i)\byou\s+are\s+now\s+(?:a|an|in|the)\b",
    r"(?i)\bact\s+as\s+(?:if\s+you\s+are\s+)?(?:a|an|the)\s+(?:different|new|unrestricted)\b",
    r"(?i)\b(?:reveal|print|repeat)\s+(?:your\s+|the\s+)?system\s+prompt",
    // Role-switch markers at line start
    r"(?im)^\s*(?:system|assistant|developer)\s*:",
    r"(?i)\[/?(?:inst|system|assistant)\]",
    r"(?i)<<\s*/?\s*sys\s*>>",
    r"(?i)#{2,}\s*(?:system|instruction|instructions)\b",
    // Chat-turn delimiters
    r"(?i)<\|\s*(?:im_start|im_end|system|user|assistant|endoftext)\s*\|>",
    // Tags that would close or spoof the prompt's own delimiters
    r"(?i)</?\s*(?:system|instructions?|menu_document|existing_menu|vat_groups)\s*>",
];

lazy_static! {
    static ref PATTERNS: Option<Vec<Regex>> = compile_patterns(INJECTION_PATTERNS);
}

pub(crate) fn compile_patterns(patterns: &[&str]) -> Option<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| Regex::new(p))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| warn!(error = %e, "Guard pattern failed to compile; guard disabled"))
        .ok()
}

/// Result of sanitizing document text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedText {
    pub text: String,
    /// True when any injection pattern matched
    pub suspicious: bool,
    /// Number of spans replaced
    pub matches: usize,
}

/// Strip invisible characters and neutralize instruction-override patterns.
///
/// Never fails. If the pattern set is unavailable the text is returned with
/// only invisible characters removed, and a warning is logged.
pub fn sanitize_input(text: &str) -> SanitizedText {
    let cleaned = remove_invisible_chars(text);

    let Some(patterns) = PATTERNS.as_ref() else {
        warn!("Injection patterns unavailable; passing text through unsanitized");
        return SanitizedText {
            text: cleaned,
            suspicious: false,
            matches: 0,
        };
    };

    let mut result = cleaned;
    let mut matches = 0usize;
    for pattern in patterns {
        let found = pattern.find_iter(&result).count();
        if found > 0 {
            matches += found;
            result = pattern
                .replace_all(&result, INJECTION_PLACEHOLDER)
                .into_owned();
        }
    }

    if matches > 0 {
        // Never log the content itself
        warn!(
            matches,
            "Injection patterns detected and neutralized in document input"
        );
    }

    SanitizedText {
        text: result,
        suspicious: matches > 0,
        matches,
    }
}

/// Remove zero-width and bidi-control characters that can split trigger
/// phrases or hide text. Standard whitespace is preserved.
fn remove_invisible_chars(text: &str) -> String {
    text.chars()
        .filter(|c| {
            if matches!(*c, ' ' | '\n' | '\t' | '\r') {
                return true;
            }
            if matches!(
                *c,
                '\u{200B}'..='\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2060}'..='\u{2064}' | '\u{FEFF}'
            ) {
                return false;
            }
            !c.is_control()
        })
        .collect()
}
