//! Prompt templates for pairwise judgements.
//!
//! A template is plain text with `$criterion`, `$option1`, `$option2` and
//! `$length` placeholders. The judge is expected to finish with a
//! "Verdict:" line followed by one of the letters A-E.

use std::path::Path;

use crate::bail;

/// Placeholders every template must contain.
pub const REQUIRED_VARIABLES: [&str; 4] = ["$criterion", "$option1", "$option2", "$length"];

/// How much analysis the judge writes before its verdict.
pub const DEFAULT_ANALYSIS_LENGTH: &str = "2 paragraphs";

pub const DEFAULT_TEMPLATE: &str = "\
$criterion

Option 1:
$option1

Option 2:
$option2

Instructions:
Conduct an analysis. Write roughly $length. Then write \"Verdict:\" on its own line, followed by exactly one of these letters and its label:

A: Option 1 clearly wins
B: Option 1 narrowly wins
C: Draw
D: Option 2 narrowly wins
E: Option 2 clearly wins
";

/// Placeholders missing from `template`, in declaration order.
pub fn missing_variables(template: &str) -> Vec<&'static str> {
    REQUIRED_VARIABLES
        .into_iter()
        .filter(|var| !template.contains(*var))
        .collect()
}

/// Read a template file, exiting if it lacks a required placeholder.
pub fn load_template(path: &Path) -> String {
    let template = std::fs::read_to_string(path)
        .unwrap_or_else(|e| bail(format!("Failed to read prompt template {}: {e}", path.display())));
    let missing = missing_variables(&template);
    if !missing.is_empty() {
        bail(format!(
            "Prompt template {} is missing: {}",
            path.display(),
            missing.join(", ")
        ));
    }
    template
}

/// Fill a template for one ordered pair.
///
/// Options are substituted last so item text containing `$criterion` or
/// `$length` is left alone.
pub fn build_prompt(template: &str, criterion: &str, option1: &str, option2: &str, length: &str) -> String {
    let mut out = String::with_capacity(template.len() + option1.len() + option2.len() + criterion.len());
    let mut rest = template;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let replacement = [
            ("$criterion", criterion),
            ("$option1", option1),
            ("$option2", option2),
            ("$length", length),
        ]
        .into_iter()
        .find(|(var, _)| tail.starts_with(*var));
        match replacement {
            Some((var, value)) => {
                out.push_str(value);
                rest = &tail[var.len()..];
            }
            None => {
                out.push('$');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_has_all_variables() {
        assert!(missing_variables(DEFAULT_TEMPLATE).is_empty());
    }

    #[test]
    fn test_missing_variables() {
        assert_eq!(
            missing_variables("$criterion vs $option1"),
            vec!["$option2", "$length"]
        );
    }

    #[test]
    fn test_build_prompt_contains_all_parts() {
        let prompt = build_prompt(DEFAULT_TEMPLATE, "Which is tastier?", "Pizza", "Sushi", "2 paragraphs");
        assert!(prompt.starts_with("Which is tastier?"));
        assert!(prompt.contains("Option 1:\nPizza"));
        assert!(prompt.contains("Option 2:\nSushi"));
        assert!(prompt.contains("Write roughly 2 paragraphs."));
        assert!(prompt.contains("Verdict:"));
        assert!(prompt.contains("A: Option 1 clearly wins"));
        assert!(prompt.contains("E: Option 2 clearly wins"));
        assert!(!prompt.contains('$'));
    }

    #[test]
    fn test_build_prompt_leaves_item_text_alone() {
        let prompt = build_prompt("$option1 | $option2 | $length", "c", "costs $5", "$criterion", "short");
        assert_eq!(prompt, "costs $5 | $criterion | short");
    }
}
