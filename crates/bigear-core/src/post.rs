use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One media attachment on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    /// Upstream media type: `photo`, `video`, `animated_gif`.
    pub kind: String,
}

impl Attachment {
    #[must_use]
    pub fn is_photo(&self) -> bool {
        self.kind == "photo"
    }
}

/// Structured entity metadata reported alongside the post text.
///
/// Values are the literal tokens as they appear in the text, without sigils
/// for hashtags and mentions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostEntities {
    pub hashtags: Vec<String>,
    pub mentions: Vec<String>,
    pub urls: Vec<String>,
    pub media_urls: Vec<String>,
}

/// A post returned by the search API, not yet validated or persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidatePost {
    pub post_id: i64,
    pub author_id: i64,
    pub author_verified: bool,
    pub author_followers: i64,
    pub author_following: i64,
    pub author_post_count: i64,
    pub text: String,
    pub entities: Option<PostEntities>,
    pub attachments: Vec<Attachment>,
    pub favorites: i64,
    pub retweets: i64,
    pub created_at: Option<DateTime<Utc>>,
}

impl CandidatePost {
    /// Own interaction count: favorites plus retweets.
    #[must_use]
    pub fn interaction(&self) -> i64 {
        self.favorites.saturating_add(self.retweets)
    }
}

/// One entry of an author's recent timeline, used only for the trailing
/// engagement aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelinePost {
    pub post_id: i64,
    pub favorites: i64,
    pub retweets: i64,
}

impl TimelinePost {
    #[must_use]
    pub fn interaction(&self) -> i64 {
        self.favorites.saturating_add(self.retweets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interaction_saturates_instead_of_overflowing() {
        let post = TimelinePost {
            post_id: 1,
            favorites: i64::MAX,
            retweets: 5,
        };
        assert_eq!(post.interaction(), i64::MAX);
    }

    #[test]
    fn attachment_kind_detection() {
        let photo = Attachment {
            url: "https://pbs.example/1.jpg".to_string(),
            kind: "photo".to_string(),
        };
        let video = Attachment {
            url: "https://pbs.example/2.mp4".to_string(),
            kind: "video".to_string(),
        };
        assert!(photo.is_photo());
        assert!(!video.is_photo());
    }

    #[test]
    fn candidate_round_trips_through_json() {
        let post = CandidatePost {
            post_id: 42,
            author_id: 7,
            author_verified: true,
            author_followers: 100,
            author_following: 50,
            author_post_count: 900,
            text: "hello".to_string(),
            entities: Some(PostEntities::default()),
            attachments: vec![],
            favorites: 3,
            retweets: 1,
            created_at: None,
        };
        let json = serde_json::to_string(&post).unwrap();
        let back: CandidatePost = serde_json::from_str(&json).unwrap();
        assert_eq!(back, post);
        assert_eq!(back.interaction(), 4);
    }
}
