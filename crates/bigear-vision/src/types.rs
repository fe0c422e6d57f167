use serde::{Deserialize, Serialize};

/// Result of a successful enrichment call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelOutcome {
    /// Space-separated label names at or above the confidence threshold.
    Labels(String),
    NoLabels,
}

impl LabelOutcome {
    /// Keeps labels with `confidence >= min_confidence` and joins their names.
    #[must_use]
    pub fn from_labels(labels: &[Label], min_confidence: f32) -> Self {
        let names: Vec<&str> = labels
            .iter()
            .filter(|l| l.confidence >= min_confidence)
            .map(|l| l.name.trim())
            .filter(|n| !n.is_empty())
            .collect();

        if names.is_empty() {
            Self::NoLabels
        } else {
            Self::Labels(names.join(" "))
        }
    }

    #[must_use]
    pub fn into_option(self) -> Option<String> {
        match self {
            Self::Labels(joined) => Some(joined),
            Self::NoLabels => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Label {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Confidence", default)]
    pub confidence: f32,
}

#[derive(Debug, Serialize)]
pub(crate) struct DetectLabelsRequest<'a> {
    #[serde(rename = "Image")]
    pub(crate) image: ImagePayload<'a>,
    #[serde(rename = "MinConfidence")]
    pub(crate) min_confidence: f32,
}

#[derive(Debug, Serialize)]
pub(crate) struct ImagePayload<'a> {
    #[serde(rename = "Bytes")]
    pub(crate) bytes: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DetectLabelsResponse {
    #[serde(rename = "Labels", default)]
    pub(crate) labels: Vec<Label>,
}

/// Error body. Services put the code in `__type`, `code` or `Code`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ServiceErrorBody {
    #[serde(rename = "__type", default)]
    pub(crate) type_: Option<String>,
    #[serde(alias = "Code", default)]
    pub(crate) code: Option<String>,
    #[serde(alias = "Message", default)]
    pub(crate) message: Option<String>,
}
