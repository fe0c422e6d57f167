use super::*;

fn test_client(base_url: &str) -> TwitterClient {
    TwitterClient::with_base_url("token", 30, "bigear-test", base_url)
        .expect("client construction should not fail")
}

#[test]
fn build_url_appends_path_to_normalised_base() {
    let client = test_client("https://api.twitter.com");
    let url = client
        .build_url(SEARCH_PATH, &[("q", "rust"), ("count", "10")])
        .unwrap();
    assert_eq!(
        url.as_str(),
        "https://api.twitter.com/1.1/search/tweets.json?q=rust&count=10"
    );
}

#[test]
fn build_url_keeps_base_path_prefix() {
    let client = test_client("http://127.0.0.1:9999/proxy///");
    let url = client.build_url(TIMELINE_PATH, &[("user_id", "7")]).unwrap();
    assert_eq!(
        url.as_str(),
        "http://127.0.0.1:9999/proxy/1.1/statuses/user_timeline.json?user_id=7"
    );
}

#[test]
fn build_url_encodes_query_operators() {
    let client = test_client("https://api.twitter.com");
    let url = client
        .build_url(SEARCH_PATH, &[("q", "a AND -filter:retweets #x")])
        .unwrap();
    let q = url
        .query_pairs()
        .find(|(k, _)| k == "q")
        .map(|(_, v)| v.into_owned());
    assert_eq!(q.as_deref(), Some("a AND -filter:retweets #x"));
    assert!(!url.as_str().contains('#'), "fragment must be encoded: {url}");
}

#[test]
fn invalid_base_url_is_rejected() {
    let result = TwitterClient::with_base_url("token", 30, "ua", "not a url");
    assert!(matches!(result, Err(TwitterError::InvalidRequest(_))));
}

#[test]
fn until_date_subtracts_days() {
    let today = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
    assert_eq!(until_date(today, 2).as_deref(), Some("2024-02-29"));
    assert_eq!(until_date(today, 1).as_deref(), Some("2024-03-01"));
}

#[test]
fn until_date_zero_disables_cutoff() {
    let today = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
    assert!(until_date(today, 0).is_none());
}

#[test]
fn search_request_validation() {
    let ok = SearchRequest::new("  rust  ", 50, ResultOrdering::Popular);
    assert_eq!(ok.validate().unwrap(), "rust");

    let empty = SearchRequest::new("   ", 50, ResultOrdering::Popular);
    assert!(matches!(empty.validate(), Err(TwitterError::InvalidRequest(_))));

    let zero = SearchRequest::new("rust", 0, ResultOrdering::Mixed);
    assert!(matches!(zero.validate(), Err(TwitterError::InvalidRequest(_))));

    let too_big = SearchRequest::new("rust", MAX_PAGE_SIZE + 1, ResultOrdering::Mixed);
    assert!(matches!(too_big.validate(), Err(TwitterError::InvalidRequest(_))));

    let max = SearchRequest::new("rust", MAX_PAGE_SIZE, ResultOrdering::Mixed);
    assert!(max.validate().is_ok());
}

#[test]
fn redact_query_drops_search_terms() {
    let url = Url::parse("https://api.twitter.com/1.1/search/tweets.json?q=secret").unwrap();
    assert_eq!(
        redact_query(&url),
        "https://api.twitter.com/1.1/search/tweets.json"
    );
}
