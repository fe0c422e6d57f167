//! Wire types for the v1.1 search and timeline endpoints, and their
//! conversion into domain posts.

use bigear_core::{Attachment, CandidatePost, PostEntities, TimelinePost};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// `created_at` format used by the v1.1 API, e.g. `Wed Oct 10 20:19:24 +0000 2018`.
const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Search `result_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultOrdering {
    Popular,
    #[default]
    Mixed,
}

impl ResultOrdering {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ResultOrdering::Popular => "popular",
            ResultOrdering::Mixed => "mixed",
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub(crate) statuses: Vec<Tweet>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Tweet {
    pub(crate) id: i64,
    #[serde(default)]
    pub(crate) full_text: Option<String>,
    #[serde(default)]
    pub(crate) text: Option<String>,
    pub(crate) user: User,
    #[serde(default)]
    pub(crate) entities: Option<Entities>,
    #[serde(default)]
    pub(crate) extended_entities: Option<ExtendedEntities>,
    #[serde(default)]
    pub(crate) favorite_count: i64,
    #[serde(default)]
    pub(crate) retweet_count: i64,
    #[serde(default)]
    pub(crate) created_at: Option<String>,
    #[serde(default)]
    pub(crate) in_reply_to_status_id: Option<i64>,
    #[serde(default)]
    pub(crate) retweeted_status: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct User {
    pub(crate) id: i64,
    #[serde(default)]
    pub(crate) verified: bool,
    #[serde(default)]
    pub(crate) followers_count: i64,
    #[serde(default)]
    pub(crate) friends_count: i64,
    #[serde(default)]
    pub(crate) statuses_count: i64,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Entities {
    #[serde(default)]
    pub(crate) hashtags: Vec<Hashtag>,
    #[serde(default)]
    pub(crate) user_mentions: Vec<Mention>,
    #[serde(default)]
    pub(crate) urls: Vec<UrlEntity>,
    #[serde(default)]
    pub(crate) media: Vec<Media>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ExtendedEntities {
    #[serde(default)]
    pub(crate) media: Vec<Media>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Hashtag {
    pub(crate) text: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Mention {
    pub(crate) screen_name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UrlEntity {
    pub(crate) url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Media {
    /// The shortened link as it appears in the post text.
    #[serde(default)]
    pub(crate) url: Option<String>,
    pub(crate) media_url: String,
    #[serde(default)]
    pub(crate) media_url_https: Option<String>,
    #[serde(rename = "type")]
    pub(crate) kind: String,
}

impl Tweet {
    fn is_retweet_or_reply(&self) -> bool {
        self.retweeted_status.is_some() || self.in_reply_to_status_id.is_some()
    }

    /// Converts a search result into a candidate. Retweets and replies yield `None`.
    pub(crate) fn into_candidate(self) -> Option<CandidatePost> {
        if self.is_retweet_or_reply() {
            return None;
        }

        // `extended_entities` carries the real media types (video, gif);
        // `entities.media` reports everything as a photo.
        let media: &[Media] = match (&self.extended_entities, &self.entities) {
            (Some(ext), _) if !ext.media.is_empty() => &ext.media,
            (_, Some(ent)) => &ent.media,
            _ => &[],
        };

        let attachments = media
            .iter()
            .map(|m| Attachment {
                url: m
                    .media_url_https
                    .clone()
                    .unwrap_or_else(|| m.media_url.clone()),
                kind: m.kind.clone(),
            })
            .collect();

        let entities = self.entities.as_ref().map(|ent| PostEntities {
            hashtags: ent.hashtags.iter().map(|h| h.text.clone()).collect(),
            mentions: ent.user_mentions.iter().map(|m| m.screen_name.clone()).collect(),
            urls: ent.urls.iter().map(|u| u.url.clone()).collect(),
            media_urls: media.iter().filter_map(|m| m.url.clone()).collect(),
        });

        let created_at = self.created_at.as_deref().and_then(parse_created_at);

        Some(CandidatePost {
            post_id: self.id,
            author_id: self.user.id,
            author_verified: self.user.verified,
            author_followers: self.user.followers_count,
            author_following: self.user.friends_count,
            author_post_count: self.user.statuses_count,
            text: self.full_text.or(self.text).unwrap_or_default(),
            entities,
            attachments,
            favorites: self.favorite_count,
            retweets: self.retweet_count,
            created_at,
        })
    }

    /// Converts a timeline entry. Retweets and replies yield `None`.
    pub(crate) fn into_timeline_post(self) -> Option<TimelinePost> {
        if self.is_retweet_or_reply() {
            return None;
        }
        Some(TimelinePost {
            post_id: self.id,
            favorites: self.favorite_count,
            retweets: self.retweet_count,
        })
    }
}

fn parse_created_at(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(raw, CREATED_AT_FORMAT)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| tracing::debug!(raw, error = %e, "unparseable created_at"))
        .ok()
}
