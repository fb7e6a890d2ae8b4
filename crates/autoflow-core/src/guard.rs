//! Safety gate: a keyword/length pre-check on the prompt and a structural
//! post-check on the produced workflow.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{Catalog, ValidationError, ValidationErrors, Workflow, validate_document};

pub const MAX_PROMPT_CHARS: usize = 1000;

pub const FORBIDDEN_TERMS: [&str; 5] = ["delete", "shutdown", "format", "rm -rf", "destroy"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputRejected {
    #[error("Prompt must be text")]
    NotText,

    #[error("Prompt is {len} characters long (limit {max})")]
    TooLong { len: usize, max: usize },

    #[error("Prompt contains forbidden term '{0}'")]
    ForbiddenTerm(String),

    #[error("Prompt was flagged by content moderation")]
    Flagged,
}

#[derive(Debug, Clone)]
pub struct SafetyGate {
    max_chars: usize,
    /// Stored lower-cased.
    forbidden: Vec<String>,
}

impl Default for SafetyGate {
    fn default() -> Self {
        Self::new(MAX_PROMPT_CHARS, FORBIDDEN_TERMS)
    }
}

impl SafetyGate {
    pub fn new<I, S>(max_chars: usize, forbidden: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            max_chars,
            forbidden: forbidden
                .into_iter()
                .map(|t| t.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Length is counted in characters, not bytes.
    pub fn check_input(&self, text: &str) -> Result<(), InputRejected> {
        let len = text.chars().count();
        if len > self.max_chars {
            warn!("Prompt rejected: {} chars exceeds {}", len, self.max_chars);
            return Err(InputRejected::TooLong {
                len,
                max: self.max_chars,
            });
        }

        let folded = text.to_lowercase();
        if let Some(term) = self.forbidden.iter().find(|t| folded.contains(t.as_str())) {
            warn!("Prompt rejected: contains forbidden term '{}'", term);
            return Err(InputRejected::ForbiddenTerm(term.clone()));
        }

        debug!("Prompt passed safety pre-check ({} chars)", len);
        Ok(())
    }

    /// Pre-check for input of unknown type (e.g. read from a JSON request).
    pub fn check_input_value(&self, input: &Value) -> Result<(), InputRejected> {
        match input {
            Value::String(text) => self.check_input(text),
            _ => Err(InputRejected::NotText),
        }
    }

    pub fn accepts(&self, text: &str) -> bool {
        self.check_input(text).is_ok()
    }

    /// Post-check: structural validation of the serialized workflow only. Does
    /// not re-run keyword or moderation checks.
    pub fn check_plan(&self, workflow: &Workflow, catalog: &Catalog) -> Result<(), ValidationErrors> {
        let doc = serde_json::to_value(workflow)
            .map_err(|e| ValidationErrors::single(ValidationError::Malformed(e.to_string())))?;
        validate_document(&doc, catalog).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize_named;
    use serde_json::json;

    #[test]
    fn test_accepts_normal_prompt() {
        let gate = SafetyGate::default();
        assert!(gate.accepts("Send me a summary of Gmail messages every Monday."));
    }

    #[test]
    fn test_length_bound() {
        let gate = SafetyGate::default();
        assert!(gate.accepts(&"A".repeat(1000)));
        assert_eq!(
            gate.check_input(&"A".repeat(1001)),
            Err(InputRejected::TooLong { len: 1001, max: 1000 })
        );
    }

    #[test]
    fn test_length_counts_chars_not_bytes() {
        let gate = SafetyGate::default();
        assert!(gate.accepts(&"é".repeat(1000)));
    }

    #[test]
    fn test_blacklist_is_case_insensitive() {
        let gate = SafetyGate::default();
        assert_eq!(
            gate.check_input("DELETE everything"),
            Err(InputRejected::ForbiddenTerm("delete".into()))
        );
        assert!(!gate.accepts("Delete all system files!"));
        assert!(!gate.accepts("please RM -RF the tmp dir"));
    }

    #[test]
    fn test_non_string_input_rejected() {
        let gate = SafetyGate::default();
        assert_eq!(gate.check_input_value(&json!(42)), Err(InputRejected::NotText));
        assert_eq!(gate.check_input_value(&Value::Null), Err(InputRejected::NotText));
        assert!(gate.check_input_value(&json!("hello")).is_ok());
    }

    #[test]
    fn test_custom_terms_are_folded() {
        let gate = SafetyGate::new(10, ["DROP"]);
        assert!(!gate.accepts("drop it"));
        assert!(!gate.accepts("0123456789x"));
    }

    #[test]
    fn test_check_plan_runs_structural_validation() {
        let gate = SafetyGate::default();
        let catalog = Catalog::builtin();
        let normalized = normalize_named(&json!({}), &catalog, "Fallback");
        assert!(gate.check_plan(&normalized.workflow, &catalog).is_ok());

        let empty = Workflow::new("Empty");
        let err = gate.check_plan(&empty, &catalog).unwrap_err();
        assert_eq!(err.violations(), &[ValidationError::EmptyGraph]);
    }
}
