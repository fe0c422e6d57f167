use serde::{Deserialize, Serialize};

/// A fully assembled record ready for a single create call.
///
/// Built in memory by the ingestion pipeline; nothing is written until every
/// field has been computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExpression {
    pub post_id: i64,
    pub owner: String,
    pub full_text: String,
    pub clean_text: String,
    pub is_verified: bool,
    pub has_attachment: bool,
    /// Space-joined content labels. `None` when no photo, enrichment failed,
    /// or no label cleared the confidence threshold.
    pub attachment_labels: Option<String>,
    pub media_url: Option<String>,
    pub followers: i64,
    pub following: i64,
    pub post_count: i64,
    /// Sum of favorites + retweets over the author's recent original posts.
    /// `None` means the timeline could not be measured.
    pub last_ten_interaction: Option<i64>,
    pub total_interaction: i64,
}
