//! Ingestion pass orchestration.
//!
//! Each candidate moves through
//! `Fetched → (Duplicate | Filtered | Eligible) → Scored → [Enriched] → Persisted`.
//! The decisions are pure ([`triage`], [`assemble`]); [`Pipeline`] supplies
//! the I/O around them and runs candidates through a bounded worker pool.
//!
//! A record is assembled completely in memory and written with one create
//! call, so cancelling a pass never leaves a partial row behind.

use std::fmt;

use bigear_core::{CandidatePost, NewExpression};
use bigear_twitter::{ResultOrdering, SearchRequest};
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::attachment::{first_photo, has_attachment};
use crate::engagement::TrailingEngagement;
use crate::error::IngestError;
use crate::limits::Limiters;
use crate::normalize::{Normalizer, NormalizerConfig};
use crate::services::{ImageLabeler, PostSource};
use crate::store::{ExpressionStore, StoreOutcome};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub term: String,
    pub page_size: u32,
    pub ordering: ResultOrdering,
    /// `0` disables the age cutoff.
    pub min_age_days: u32,
    /// Candidates with `favorites + retweets <= engagement_floor` are dropped.
    pub engagement_floor: i64,
    pub timeline_count: u32,
    pub label_min_confidence: f32,
    pub max_workers: usize,
    pub normalizer: NormalizerConfig,
}

impl PipelineConfig {
    /// Pipeline settings for one search, with tunables taken from `config`.
    #[must_use]
    pub fn from_app_config(
        config: &bigear_core::AppConfig,
        term: impl Into<String>,
        page_size: u32,
        ordering: ResultOrdering,
    ) -> Self {
        Self {
            term: term.into(),
            page_size,
            ordering,
            min_age_days: config.min_age_days,
            engagement_floor: config.engagement_floor,
            timeline_count: config.timeline_count,
            label_min_confidence: config.label_min_confidence,
            max_workers: config.max_workers,
            normalizer: NormalizerConfig::from_app_config(config),
        }
    }

    fn search_request(&self) -> SearchRequest {
        SearchRequest::new(self.term.clone(), self.page_size, self.ordering)
            .min_age_days(self.min_age_days)
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterReason {
    EmptyText,
    LowEngagement { interaction: i64 },
}

impl fmt::Display for FilterReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyText => f.write_str("no usable text"),
            Self::LowEngagement { interaction } => write!(f, "interaction {interaction} at or below floor"),
        }
    }
}

/// Result of the pure triage step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Triage {
    Duplicate,
    Filtered(FilterReason),
    Eligible { clean_text: String },
}

/// Terminal state of one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateOutcome {
    Persisted { labelled: bool },
    Duplicate,
    Filtered(FilterReason),
    /// Storage failed. The candidate will be picked up again next pass.
    Failed(String),
    /// The pass was cancelled before this candidate finished.
    Abandoned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateReport {
    pub post_id: i64,
    pub outcome: CandidateOutcome,
}

/// Counters for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub fetched: usize,
    pub persisted: usize,
    pub labelled: usize,
    pub duplicates: usize,
    pub filtered: usize,
    pub failed: usize,
    pub abandoned: usize,
}

impl PassSummary {
    pub fn record(&mut self, outcome: &CandidateOutcome) {
        match outcome {
            CandidateOutcome::Persisted { labelled } => {
                self.persisted += 1;
                if *labelled {
                    self.labelled += 1;
                }
            }
            CandidateOutcome::Duplicate => self.duplicates += 1,
            CandidateOutcome::Filtered(_) => self.filtered += 1,
            CandidateOutcome::Failed(_) => self.failed += 1,
            CandidateOutcome::Abandoned => self.abandoned += 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Pure steps
// ---------------------------------------------------------------------------

/// Decides whether a candidate is worth enriching.
///
/// Runs after the existence check and before any other external call.
#[must_use]
pub fn triage(
    candidate: &CandidatePost,
    already_ingested: bool,
    normalizer: &Normalizer,
    engagement_floor: i64,
) -> Triage {
    if already_ingested {
        return Triage::Duplicate;
    }

    let clean_text = normalizer.normalize(&candidate.text, candidate.entities.as_ref());
    if clean_text.trim().is_empty() {
        return Triage::Filtered(FilterReason::EmptyText);
    }

    let interaction = candidate.interaction();
    if interaction <= engagement_floor {
        return Triage::Filtered(FilterReason::LowEngagement { interaction });
    }

    Triage::Eligible { clean_text }
}

/// Builds the record to persist.
///
/// `media_url` is the first photo whether or not labelling succeeded.
#[must_use]
pub fn assemble(
    candidate: &CandidatePost,
    clean_text: String,
    trailing: TrailingEngagement,
    attachment_labels: Option<String>,
) -> NewExpression {
    let media_url = first_photo(candidate).map(|i| candidate.attachments[i].url.clone());

    NewExpression {
        post_id: candidate.post_id,
        owner: candidate.author_id.to_string(),
        full_text: candidate.text.clone(),
        clean_text,
        is_verified: candidate.author_verified,
        has_attachment: has_attachment(candidate),
        attachment_labels,
        media_url,
        followers: candidate.author_followers,
        following: candidate.author_following,
        post_count: candidate.author_post_count,
        last_ten_interaction: trailing.as_option(),
        total_interaction: candidate.interaction(),
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

pub struct Pipeline<S, P, L> {
    store: S,
    source: P,
    labeler: Option<L>,
    limiters: Limiters,
    normalizer: Normalizer,
    config: PipelineConfig,
}

impl<S, P, L> Pipeline<S, P, L>
where
    S: ExpressionStore,
    P: PostSource,
    L: ImageLabeler,
{
    /// `labeler = None` disables enrichment; photo URLs are still recorded.
    pub fn new(
        store: S,
        source: P,
        labeler: Option<L>,
        limiters: Limiters,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            source,
            labeler,
            limiters,
            normalizer: Normalizer::new(config.normalizer),
            config,
        }
    }

    /// Runs one search and processes every candidate it returns.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Search`] if the search fails and
    /// [`IngestError::Cancelled`] if `cancel` fires before it completes.
    /// Per-candidate failures are counted in the summary instead.
    pub async fn run_pass(&self, cancel: &CancellationToken) -> Result<PassSummary, IngestError> {
        let (summary, _) = self.run_pass_detailed(cancel).await?;
        Ok(summary)
    }

    /// Like [`Pipeline::run_pass`], also returning one report per candidate.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::run_pass`].
    pub async fn run_pass_detailed(
        &self,
        cancel: &CancellationToken,
    ) -> Result<(PassSummary, Vec<CandidateReport>), IngestError> {
        let request = self.config.search_request();
        let search = self
            .limiters
            .search
            .run(|| self.source.search(&request));

        let candidates = tokio::select! {
            () = cancel.cancelled() => return Err(IngestError::Cancelled),
            result = search => result??,
        };

        let mut summary = PassSummary {
            fetched: candidates.len(),
            ..PassSummary::default()
        };
        tracing::info!(
            term = %self.config.term,
            fetched = summary.fetched,
            workers = self.config.max_workers,
            "search returned candidates"
        );

        let reports: Vec<CandidateReport> = stream::iter(candidates)
            .map(|candidate| async move {
                let post_id = candidate.post_id;
                let outcome = if cancel.is_cancelled() {
                    CandidateOutcome::Abandoned
                } else {
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => CandidateOutcome::Abandoned,
                        outcome = self.process(&candidate) => outcome,
                    }
                };
                tracing::debug!(post_id, outcome = ?outcome, "candidate finished");
                CandidateReport { post_id, outcome }
            })
            .buffer_unordered(self.config.max_workers.max(1))
            .collect()
            .await;

        for report in &reports {
            summary.record(&report.outcome);
        }

        tracing::info!(
            term = %self.config.term,
            fetched = summary.fetched,
            persisted = summary.persisted,
            labelled = summary.labelled,
            duplicates = summary.duplicates,
            filtered = summary.filtered,
            failed = summary.failed,
            abandoned = summary.abandoned,
            "ingest pass complete"
        );

        Ok((summary, reports))
    }

    async fn process(&self, candidate: &CandidatePost) -> CandidateOutcome {
        let post_id = candidate.post_id;

        let exists = match self.store.exists(post_id).await {
            Ok(exists) => exists,
            Err(e) => {
                tracing::warn!(post_id, error = %e, "existence check failed");
                return CandidateOutcome::Failed(format!("existence check: {e}"));
            }
        };

        let clean_text =
            match triage(candidate, exists, &self.normalizer, self.config.engagement_floor) {
                Triage::Duplicate => return CandidateOutcome::Duplicate,
                Triage::Filtered(reason) => return CandidateOutcome::Filtered(reason),
                Triage::Eligible { clean_text } => clean_text,
            };

        let trailing = self.trailing_engagement(candidate.author_id).await;
        let labels = self.labels_for(candidate).await;
        let labelled = labels.is_some();

        let expression = assemble(candidate, clean_text, trailing, labels);
        match self.store.create(&expression).await {
            Ok(StoreOutcome::Inserted) => CandidateOutcome::Persisted { labelled },
            Ok(StoreOutcome::AlreadyIngested) => {
                tracing::debug!(post_id, "lost insert race, already ingested");
                CandidateOutcome::Duplicate
            }
            Err(e) => {
                tracing::warn!(post_id, error = %e, "failed to persist expression");
                CandidateOutcome::Failed(format!("create: {e}"))
            }
        }
    }

    async fn trailing_engagement(&self, author_id: i64) -> TrailingEngagement {
        let result = self
            .limiters
            .timeline
            .run(|| self.source.author_timeline(author_id, self.config.timeline_count))
            .await;

        match result {
            Ok(Ok(posts)) => TrailingEngagement::from_timeline(&posts),
            Ok(Err(e)) => {
                tracing::warn!(author_id, error = %e, "timeline fetch failed, engagement unknown");
                TrailingEngagement::Unknown
            }
            Err(e) => {
                tracing::warn!(author_id, error = %e, "timeline limiter unavailable");
                TrailingEngagement::Unknown
            }
        }
    }

    /// Labels for the first photo. `None` when there is no photo, no labeler,
    /// no label above the threshold, or enrichment failed.
    async fn labels_for(&self, candidate: &CandidatePost) -> Option<String> {
        let index = first_photo(candidate)?;
        let labeler = self.labeler.as_ref()?;
        let url = candidate.attachments[index].url.as_str();
        let post_id = candidate.post_id;

        let image = match self.limiters.image.run(|| labeler.download(url)).await {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => {
                tracing::warn!(post_id, url, error = %e, "image download failed, skipping labels");
                return None;
            }
            Err(e) => {
                tracing::warn!(post_id, error = %e, "image limiter unavailable");
                return None;
            }
        };

        let min_confidence = self.config.label_min_confidence;
        match self
            .limiters
            .label
            .run(|| labeler.label(&image, min_confidence))
            .await
        {
            Ok(Ok(outcome)) => outcome.into_option(),
            Ok(Err(e)) => {
                tracing::warn!(post_id, error = %e, "label detection failed, storing without labels");
                None
            }
            Err(e) => {
                tracing::warn!(post_id, error = %e, "label limiter unavailable");
                None
            }
        }
    }
}
