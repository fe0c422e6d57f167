//! HTTP client for the Twitter v1.1 search and timeline endpoints.
//!
//! Authenticates with an app-only bearer token. Every request goes through
//! [`retry_with_backoff`]; status codes are mapped onto [`TwitterError`]
//! before the body is parsed.

use std::time::Duration;

use bigear_core::{CandidatePost, TimelinePost};
use chrono::{Days, NaiveDate, Utc};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::TwitterError;
use crate::retry::retry_with_backoff;
use crate::types::{ResultOrdering, SearchResponse, Tweet};

const DEFAULT_BASE_URL: &str = "https://api.twitter.com/";
const SEARCH_PATH: &str = "1.1/search/tweets.json";
const TIMELINE_PATH: &str = "1.1/statuses/user_timeline.json";

/// Largest `count` the search endpoint accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Seconds until the v1.1 rate-limit window resets when the header is absent.
const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 900;

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;

/// One search call.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub term: String,
    pub page_size: u32,
    pub ordering: ResultOrdering,
    /// Only return posts at least this many days old. `None` or `Some(0)`
    /// leaves the `until` parameter off.
    pub min_age_days: Option<u32>,
}

impl SearchRequest {
    #[must_use]
    pub fn new(term: impl Into<String>, page_size: u32, ordering: ResultOrdering) -> Self {
        Self {
            term: term.into(),
            page_size,
            ordering,
            min_age_days: None,
        }
    }

    #[must_use]
    pub fn min_age_days(mut self, days: u32) -> Self {
        self.min_age_days = Some(days);
        self
    }

    fn validate(&self) -> Result<&str, TwitterError> {
        let term = self.term.trim();
        if term.is_empty() {
            return Err(TwitterError::InvalidRequest(
                "search term must not be empty".to_owned(),
            ));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(TwitterError::InvalidRequest(format!(
                "page size {} is outside 1..={MAX_PAGE_SIZE}",
                self.page_size
            )));
        }
        Ok(term)
    }
}

/// Client for the Twitter v1.1 REST API.
///
/// Use [`TwitterClient::new`] for production or
/// [`TwitterClient::with_base_url`] to point at a mock server in tests.
pub struct TwitterClient {
    client: Client,
    bearer_token: String,
    base_url: Url,
    lang: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl TwitterClient {
    /// Creates a client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`TwitterError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        bearer_token: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, TwitterError> {
        Self::with_base_url(bearer_token, timeout_secs, user_agent, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`TwitterError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`TwitterError::InvalidRequest`] if `base_url` does not parse.
    pub fn with_base_url(
        bearer_token: &str,
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, TwitterError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash, so relative joins append to the path.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| {
            TwitterError::InvalidRequest(format!("invalid base URL '{base_url}': {e}"))
        })?;

        Ok(Self {
            client,
            bearer_token: bearer_token.to_owned(),
            base_url,
            lang: "en".to_owned(),
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        })
    }

    /// Sets the number of retries and the base back-off for transient errors.
    #[must_use]
    pub fn with_retry_policy(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Sets the `lang` filter sent with every search.
    #[must_use]
    pub fn with_lang(mut self, lang: &str) -> Self {
        lang.clone_into(&mut self.lang);
        self
    }

    /// Searches recent posts matching `request.term`.
    ///
    /// Retweets and replies are excluded by the query and again on the
    /// client side.
    ///
    /// # Errors
    ///
    /// - [`TwitterError::InvalidRequest`] for an empty term or out-of-range
    ///   page size. No request is sent.
    /// - [`TwitterError::RateLimited`] on HTTP 429.
    /// - [`TwitterError::Unauthorized`] on HTTP 401/403.
    /// - [`TwitterError::Http`] or [`TwitterError::UnexpectedStatus`] once
    ///   retries are exhausted.
    /// - [`TwitterError::Deserialize`] if the body has the wrong shape.
    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<CandidatePost>, TwitterError> {
        let term = request.validate()?;
        let query = format!("{term} AND -filter:retweets AND -filter:replies");
        let count = request.page_size.to_string();
        let until = request
            .min_age_days
            .and_then(|days| until_date(Utc::now().date_naive(), days));

        let mut params = vec![
            ("q", query.as_str()),
            ("lang", self.lang.as_str()),
            ("result_type", request.ordering.as_str()),
            ("count", count.as_str()),
            ("include_entities", "true"),
            ("tweet_mode", "extended"),
        ];
        if let Some(until) = until.as_deref() {
            params.push(("until", until));
        }

        let url = self.build_url(SEARCH_PATH, &params)?;
        let response: SearchResponse = self
            .get_json(&url, &format!("search(term={term})"))
            .await?;

        let fetched = response.statuses.len();
        let candidates: Vec<CandidatePost> = response
            .statuses
            .into_iter()
            .filter_map(Tweet::into_candidate)
            .collect();

        tracing::debug!(
            term,
            fetched,
            kept = candidates.len(),
            "search page received"
        );
        Ok(candidates)
    }

    /// Fetches the author's most recent original posts, newest first.
    ///
    /// # Errors
    ///
    /// Same status mapping as [`TwitterClient::search`].
    pub async fn author_timeline(
        &self,
        author_id: i64,
        count: u32,
    ) -> Result<Vec<TimelinePost>, TwitterError> {
        let author = author_id.to_string();
        let count = count.clamp(1, 200).to_string();
        let url = self.build_url(
            TIMELINE_PATH,
            &[
                ("user_id", author.as_str()),
                ("count", count.as_str()),
                ("exclude_replies", "true"),
                ("include_rts", "false"),
                ("tweet_mode", "extended"),
                ("trim_user", "true"),
            ],
        )?;

        let tweets: Vec<Tweet> = self
            .get_json(&url, &format!("user_timeline(user_id={author_id})"))
            .await?;

        Ok(tweets
            .into_iter()
            .filter_map(Tweet::into_timeline_post)
            .collect())
    }

    fn build_url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, TwitterError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| TwitterError::InvalidRequest(format!("invalid path '{path}': {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        context: &str,
    ) -> Result<T, TwitterError> {
        let body = retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            let response = self
                .client
                .get(url.clone())
                .bearer_auth(&self.bearer_token)
                .send()
                .await?;
            let response = check_status(response, url)?;
            Ok::<String, TwitterError>(response.text().await?)
        })
        .await?;

        serde_json::from_str(&body).map_err(|e| TwitterError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}

/// Returns the `until` date for a minimum post age, or `None` when `days` is 0.
///
/// The search API treats `until` as exclusive, so posts created on or after
/// `today - days` are left out.
#[must_use]
pub fn until_date(today: NaiveDate, days: u32) -> Option<String> {
    if days == 0 {
        return None;
    }
    today
        .checked_sub_days(Days::new(u64::from(days)))
        .map(|d| d.format("%Y-%m-%d").to_string())
}

fn check_status(response: Response, url: &Url) -> Result<Response, TwitterError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after_secs = rate_limit_reset_secs(&response);
            Err(TwitterError::RateLimited { retry_after_secs })
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(TwitterError::Unauthorized {
            status: status.as_u16(),
        }),
        _ => Err(TwitterError::UnexpectedStatus {
            status: status.as_u16(),
            url: redact_query(url),
        }),
    }
}

/// Seconds until `x-rate-limit-reset` (an epoch timestamp), or the default window.
fn rate_limit_reset_secs(response: &Response) -> u64 {
    response
        .headers()
        .get("x-rate-limit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok())
        .map_or(DEFAULT_RATE_LIMIT_WINDOW_SECS, |reset| {
            let remaining = reset - Utc::now().timestamp();
            u64::try_from(remaining).unwrap_or(0)
        })
}

/// Drops the query string so search terms do not end up in error messages.
fn redact_query(url: &Url) -> String {
    let mut redacted = url.clone();
    redacted.set_query(None);
    redacted.to_string()
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
