use std::fmt;

use serde_json::{Map, Value};

/// Failures surfaced by the plugin contract.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("{provided} sys args provided (expected {expected}, e.g. 1 CLI arg)")]
    ArgumentCount { provided: usize, expected: usize },

    #[error("Failed to parse provided arg as JSON key-val pairs: {input:?}: {source}")]
    MalformedInput {
        input: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    SchemaViolation(SchemaViolation),

    #[error("Failed to serialize plugin results: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error(
        "invalid storage URL (must be like \"s3://bucketName/key/for/blob.txt\"). Provided: {url:?}"
    )]
    LocatorFormat { url: String },
}

impl PluginError {
    /// Returns the schema violation when this error came from key validation.
    pub fn schema_violation(&self) -> Option<&SchemaViolation> {
        match self {
            Self::SchemaViolation(violation) => Some(violation),
            _ => None,
        }
    }
}

/// Every key-level problem found in one validation pass.
///
/// Both lists are filled independently; at least one of them is non-empty.
/// The declared schema and the provided mapping are carried along so the
/// rendered message is self-contained.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaViolation {
    pub missing: Vec<String>,
    pub unexpected: Vec<String>,
    pub required: Vec<String>,
    pub optional: Vec<String>,
    pub provided: Map<String, Value>,
}

impl SchemaViolation {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty()
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.missing.is_empty() {
            writeln!(f, "Missing required input keys: {:?}", self.missing)?;
        }
        if !self.unexpected.is_empty() {
            writeln!(f, "Unexpected input keys: {:?}", self.unexpected)?;
        }
        write!(
            f,
            "Required: {:?}. Optional: {:?}. Provided: {}",
            self.required,
            self.optional,
            Value::Object(self.provided.clone())
        )
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn violation_renders_one_line_per_problem() {
        let provided = json!({"last": "Torvalds", "typo": true});
        let violation = SchemaViolation {
            missing: vec!["first".to_string()],
            unexpected: vec!["typo".to_string()],
            required: vec!["first".to_string(), "last".to_string()],
            optional: vec!["middle".to_string()],
            provided: provided.as_object().cloned().expect("object literal"),
        };

        let rendered = violation.to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], r#"Missing required input keys: ["first"]"#);
        assert_eq!(lines[1], r#"Unexpected input keys: ["typo"]"#);
        assert!(lines[2].starts_with(r#"Required: ["first", "last"]. Optional: ["middle"]."#));
        assert!(lines[2].contains(r#""typo":true"#));
    }

    #[test]
    fn argument_count_reports_both_counts() {
        let error = PluginError::ArgumentCount {
            provided: 3,
            expected: 2,
        };
        assert_eq!(
            error.to_string(),
            "3 sys args provided (expected 2, e.g. 1 CLI arg)"
        );
    }
}
