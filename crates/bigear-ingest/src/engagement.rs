use bigear_core::TimelinePost;

/// Interaction summed over the author's recent posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailingEngagement {
    Measured(i64),
    /// The timeline could not be fetched. Stored as `NULL`, never as zero.
    Unknown,
}

impl TrailingEngagement {
    #[must_use]
    pub fn from_timeline(posts: &[TimelinePost]) -> Self {
        Self::Measured(
            posts
                .iter()
                .fold(0i64, |acc, post| acc.saturating_add(post.interaction())),
        )
    }

    #[must_use]
    pub fn as_option(self) -> Option<i64> {
        match self {
            Self::Measured(total) => Some(total),
            Self::Unknown => None,
        }
    }
}
