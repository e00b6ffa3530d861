use crate::label::Label;

/// Malformed label text or label component.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("label {what} '{value}' contains characters outside [A-Za-z0-9._+-]")]
    BadPart { what: &'static str, value: String },
    #[error("'{text}' is not a valid label: {reason}")]
    BadLabel { text: String, reason: String },
}

impl ParseError {
    pub(crate) fn bad_label(text: &str, reason: impl Into<String>) -> Self {
        ParseError::BadLabel {
            text: text.to_string(),
            reason: reason.into(),
        }
    }
}

/// Two rules disagree on the action for one target.
#[derive(Debug, Clone, thiserror::Error)]
#[error("conflicting actions registered for target {target}")]
pub struct ConflictError {
    pub target: Label,
}

/// Failures while computing dependency closures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GraphError {
    #[error("dependency cycle detected: {}", render_labels(chain))]
    Cycle { chain: Vec<Label> },
    #[error("no rule builds {label}, required while computing {target}")]
    Missing { label: Label, target: Label },
}

fn render_labels(labels: &[Label]) -> String {
    labels
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}
