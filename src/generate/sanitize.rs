//! Cleanup and validity checks for free-text model output.

use regex::Regex;
use std::sync::OnceLock;

/// Phrases that mark a line as restating the question rather than answering it
const BOILERPLATE_PHRASES: [&str; 5] = [
    "can also be defined as",
    "is also known as",
    "is referred to as",
    "also known as",
    "please paraphrase",
];

fn enumeration_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\d\.\-]+\s*").expect("Invalid regex pattern"))
}

fn line_break() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\n+").expect("Invalid regex pattern"))
}

fn hash_separator() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#\s*").expect("Invalid regex pattern"))
}

/// Strip leading numbering/bullets (`1.`, `-`, `2.-`) and surrounding whitespace
pub fn sanitize_input(text: &str) -> String {
    enumeration_prefix().replace(text, "").trim().to_string()
}

/// Split a response into lines, collapsing blank lines
pub fn split_lines(text: &str) -> Vec<&str> {
    line_break().split(text.trim()).collect()
}

/// Split a `#`-separated list
pub fn split_hash_list(text: &str) -> Vec<&str> {
    hash_separator().split(text).collect()
}

/// Drop a `tag:` prefix, keeping the segment between the first and second colon
pub fn strip_tag(line: &str) -> &str {
    match line.split(':').nth(1) {
        Some(segment) => segment.trim(),
        None => line,
    }
}

/// At least two words, or a single alphabetic token longer than one character
pub fn is_valid_subject_paraphrase(paraphrase: &str) -> bool {
    paraphrase.split_whitespace().count() > 1
        || (paraphrase.chars().count() > 1 && paraphrase.chars().all(char::is_alphabetic))
}

/// Rejects echoes of the instructions, boilerplate, empty lines and error text
pub fn is_valid_relation_paraphrase(paraphrase: &str, instructions: &[String]) -> bool {
    let lower = paraphrase.to_lowercase();
    for instruction in instructions {
        let instruction = instruction.to_lowercase();
        if instruction.contains(&lower) || lower.contains(&instruction) {
            return false;
        }
    }
    if BOILERPLATE_PHRASES.iter().any(|p| lower.contains(p)) {
        return false;
    }
    !paraphrase.is_empty() && !lower.starts_with("error")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_numbering() {
        assert_eq!(sanitize_input("1. Barack Obama"), "Barack Obama");
        assert_eq!(sanitize_input("- William Clinton"), "William Clinton");
        assert_eq!(sanitize_input("12.- UK "), "UK");
        assert_eq!(sanitize_input("  Britain"), "Britain");
    }

    #[test]
    fn test_sanitize_keeps_inner_digits() {
        assert_eq!(sanitize_input("The 42nd president"), "The 42nd president");
        assert_eq!(sanitize_input("1585"), "");
    }

    #[test]
    fn test_split_lines_collapses_blank_lines() {
        let lines = split_lines("- a  \n\n\n- b\n- c\n");
        assert_eq!(lines, vec!["- a", "- b", "- c"]);
    }

    #[test]
    fn test_split_hash_list() {
        assert_eq!(
            split_hash_list("spouse # country #occupation"),
            vec!["spouse ", "country ", "occupation"]
        );
    }

    #[test]
    fn test_strip_tag() {
        assert_eq!(strip_tag("Alias: Barry"), "Barry");
        assert_eq!(strip_tag("a: b: c"), "b");
        assert_eq!(strip_tag("Barack Obama"), "Barack Obama");
    }

    #[test]
    fn test_subject_paraphrase_validity() {
        assert!(is_valid_subject_paraphrase("William Clinton"));
        assert!(is_valid_subject_paraphrase("UK"));
        assert!(is_valid_subject_paraphrase("Ελλάδα"));
        assert!(!is_valid_subject_paraphrase("X"));
        assert!(!is_valid_subject_paraphrase("R2D2"));
        assert!(!is_valid_subject_paraphrase(""));
    }

    #[test]
    fn test_relation_paraphrase_validity() {
        let instructions = vec![
            "'spouse' may be described as:".to_string(),
            "'spouse' refers to:".to_string(),
            "please describe 'spouse' in a few words:".to_string(),
        ];
        assert!(is_valid_relation_paraphrase("- Marriage partner", &instructions));
        assert!(!is_valid_relation_paraphrase("'Spouse' refers to: a partner", &instructions));
        assert!(!is_valid_relation_paraphrase("refers to", &instructions));
        assert!(!is_valid_relation_paraphrase("Spouse is also known as wife", &instructions));
        assert!(!is_valid_relation_paraphrase("Error: rate limited", &instructions));
        assert!(!is_valid_relation_paraphrase("", &instructions));
    }
}
