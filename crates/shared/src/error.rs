use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Failure body returned by every assistant endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<ErrorDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Validation(Vec<ValidationIssue>),
    Other(Value),
}

/// One entry of a request-validation failure list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    #[serde(default)]
    pub loc: Vec<Value>,
    #[serde(default)]
    pub msg: Option<String>,
}

impl ErrorBody {
    /// Human-readable detail, if the body carries a usable one.
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            ErrorDetail::Message(text) if !text.trim().is_empty() => Some(text.clone()),
            ErrorDetail::Message(_) => None,
            ErrorDetail::Validation(issues) => {
                let joined = issues
                    .iter()
                    .filter_map(|issue| issue.msg.as_deref())
                    .filter(|msg| !msg.trim().is_empty())
                    .collect::<Vec<_>>()
                    .join("; ");
                (!joined.is_empty()).then_some(joined)
            }
            ErrorDetail::Other(_) => None,
        }
    }
}
