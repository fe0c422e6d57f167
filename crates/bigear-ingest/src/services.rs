//! Seams over the post source and the image labeler.

use async_trait::async_trait;
use bigear_core::{CandidatePost, TimelinePost};
use bigear_twitter::{SearchRequest, TwitterClient, TwitterError};
use bigear_vision::{LabelClient, LabelOutcome, VisionError};

#[async_trait]
pub trait PostSource: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<CandidatePost>, TwitterError>;

    async fn author_timeline(
        &self,
        author_id: i64,
        count: u32,
    ) -> Result<Vec<TimelinePost>, TwitterError>;
}

/// Image download and labelling, split so each side can have its own limiter.
#[async_trait]
pub trait ImageLabeler: Send + Sync {
    async fn download(&self, image_url: &str) -> Result<Vec<u8>, VisionError>;

    async fn label(&self, image: &[u8], min_confidence: f32) -> Result<LabelOutcome, VisionError>;
}

#[async_trait]
impl PostSource for TwitterClient {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<CandidatePost>, TwitterError> {
        TwitterClient::search(self, request).await
    }

    async fn author_timeline(
        &self,
        author_id: i64,
        count: u32,
    ) -> Result<Vec<TimelinePost>, TwitterError> {
        TwitterClient::author_timeline(self, author_id, count).await
    }
}

#[async_trait]
impl ImageLabeler for LabelClient {
    async fn download(&self, image_url: &str) -> Result<Vec<u8>, VisionError> {
        self.download_image(image_url).await
    }

    async fn label(&self, image: &[u8], min_confidence: f32) -> Result<LabelOutcome, VisionError> {
        self.label_image(image, min_confidence).await
    }
}
