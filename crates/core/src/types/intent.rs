use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Intent Types
// =============================================================================

/// Recognized intent labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Describe,
    ExplainTechnically,
    SimplifyForBeginner,
    Summarize,
    /// Any label that is not in [`INTENT_TABLE`].
    Other,
}

/// Label and synthesis instruction for each recognized intent.
pub const INTENT_TABLE: &[(IntentKind, &str, &str)] = &[
    (
        IntentKind::Describe,
        "describe",
        "Provide a rich, descriptive narrative based on the analysis.",
    ),
    (
        IntentKind::ExplainTechnically,
        "explain technically",
        "Explain the content from a technical perspective, using precise terminology.",
    ),
    (
        IntentKind::SimplifyForBeginner,
        "simplify for a beginner",
        "Explain the content as if to a 5-year-old or a complete beginner. Use analogies.",
    ),
    (
        IntentKind::Summarize,
        "summarize",
        "Provide a concise summary in 1-2 sentences.",
    ),
];

/// Instruction used when the label is not recognized.
pub const DEFAULT_INSTRUCTION: &str = "Describe the content clearly.";

impl IntentKind {
    /// Match a label case-insensitively against the table.
    pub fn classify(label: &str) -> Self {
        let lowered = label.to_lowercase();
        INTENT_TABLE
            .iter()
            .find(|(_, name, _)| *name == lowered)
            .map(|(kind, _, _)| *kind)
            .unwrap_or(IntentKind::Other)
    }

    /// Synthesis instruction for this intent.
    pub fn instruction(&self) -> &'static str {
        INTENT_TABLE
            .iter()
            .find(|(kind, _, _)| kind == self)
            .map(|(_, _, instruction)| *instruction)
            .unwrap_or(DEFAULT_INSTRUCTION)
    }
}

/// Caller-selected intent.
///
/// The raw string is kept verbatim: it is echoed into the synthesis prompt
/// and is part of the cache fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent {
    raw: String,
    kind: IntentKind,
}

impl Intent {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let kind = IntentKind::classify(&raw);
        Self { raw, kind }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> IntentKind {
        self.kind
    }

    pub fn instruction(&self) -> &'static str {
        self.kind.instruction()
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(IntentKind::classify("describe"), IntentKind::Describe);
        assert_eq!(IntentKind::classify("Explain Technically"), IntentKind::ExplainTechnically);
        assert_eq!(IntentKind::classify("SIMPLIFY FOR A BEGINNER"), IntentKind::SimplifyForBeginner);
        assert_eq!(IntentKind::classify("Summarize"), IntentKind::Summarize);
    }

    #[test]
    fn test_unknown_label_falls_back() {
        assert_eq!(IntentKind::classify("translate"), IntentKind::Other);
        // Surrounding whitespace is not stripped.
        assert_eq!(IntentKind::classify(" summarize "), IntentKind::Other);
        assert_eq!(IntentKind::Other.instruction(), DEFAULT_INSTRUCTION);
    }

    #[test]
    fn test_intent_keeps_raw_label() {
        let intent = Intent::new("SUMMARIZE");
        assert_eq!(intent.as_str(), "SUMMARIZE");
        assert_eq!(intent.kind(), IntentKind::Summarize);
        assert_eq!(intent.instruction(), "Provide a concise summary in 1-2 sentences.");
    }

    #[test]
    fn test_every_kind_but_other_has_instruction() {
        for (kind, _, instruction) in INTENT_TABLE {
            assert_eq!(kind.instruction(), *instruction);
            assert_ne!(*instruction, DEFAULT_INSTRUCTION);
        }
    }
}
