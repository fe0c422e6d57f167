#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,

    pub twitter_bearer_token: Option<String>,
    pub twitter_api_base_url: String,
    pub search_lang: String,
    /// Posts newer than this many days are excluded at query time. `0` disables the cutoff.
    pub min_age_days: u32,
    /// Candidates whose own favorites + retweets are at or below this are filtered.
    pub engagement_floor: i64,
    pub timeline_count: u32,

    pub vision_endpoint: Option<String>,
    pub vision_api_key: Option<String>,
    pub label_min_confidence: f32,

    pub max_workers: usize,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub timeline_concurrency: usize,
    pub image_concurrency: usize,
    pub label_concurrency: usize,
    pub request_spacing_ms: u64,

    pub normalize_allow_hyphen: bool,
    pub normalize_strict_punctuation: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "twitter_bearer_token",
                &self.twitter_bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .field("twitter_api_base_url", &self.twitter_api_base_url)
            .field("search_lang", &self.search_lang)
            .field("min_age_days", &self.min_age_days)
            .field("engagement_floor", &self.engagement_floor)
            .field("timeline_count", &self.timeline_count)
            .field("vision_endpoint", &self.vision_endpoint)
            .field(
                "vision_api_key",
                &self.vision_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("label_min_confidence", &self.label_min_confidence)
            .field("max_workers", &self.max_workers)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("timeline_concurrency", &self.timeline_concurrency)
            .field("image_concurrency", &self.image_concurrency)
            .field("label_concurrency", &self.label_concurrency)
            .field("request_spacing_ms", &self.request_spacing_ms)
            .field("normalize_allow_hyphen", &self.normalize_allow_hyphen)
            .field(
                "normalize_strict_punctuation",
                &self.normalize_strict_punctuation,
            )
            .finish()
    }
}
