//! Post text normalization.
//!
//! [`Normalizer::normalize`] runs an ordered list of named passes over the
//! raw text and repeats the list until the output stops changing. A pass can
//! expose a new match for an earlier one (removing a newline can join two
//! halves of a URL), so a single sweep is not enough for
//! `normalize(normalize(x)) == normalize(x)`.
//!
//! Every pass either deletes characters or turns `_` into a space, so the
//! loop always reaches a fixpoint.

use std::sync::LazyLock;

use bigear_core::PostEntities;
use regex::Regex;

// Scheme URLs, `www.` hosts and bare `host.tld[/path]` forms.
static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:\b[a-z][a-z0-9+.\-]*://\S+|\bwww\.\S+|\b(?:[a-z0-9](?:[a-z0-9\-]*[a-z0-9])?\.)+(?:com|net|org|edu|gov|io|co|ly|me|gl|us|uk|de|info|biz|app|dev|tv|ai|news)\b(?:/\S*)?)",
    )
    .expect("valid url regex")
});

static PUNCT_SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9 ]+ ").expect("valid punctuation regex"));
static PUNCT_SPACE_HYPHEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9 \-]+ ").expect("valid punctuation regex"));
static PUNCT_ANY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9 ]+").expect("valid punctuation regex"));
static PUNCT_ANY_HYPHEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9 \-]+").expect("valid punctuation regex"));

static MULTI_SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" {2,}").expect("valid whitespace regex"));

/// One normalization step. [`PASSES`] lists them in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    StripUrls,
    StripEntities,
    StripSigils,
    CollapsePunctuation,
    CollapseWhitespace,
}

pub const PASSES: [Pass; 5] = [
    Pass::StripUrls,
    Pass::StripEntities,
    Pass::StripSigils,
    Pass::CollapsePunctuation,
    Pass::CollapseWhitespace,
];

impl Pass {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Pass::StripUrls => "strip_urls",
            Pass::StripEntities => "strip_entities",
            Pass::StripSigils => "strip_sigils",
            Pass::CollapsePunctuation => "collapse_punctuation",
            Pass::CollapseWhitespace => "collapse_whitespace",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizerConfig {
    /// Keep `-` when collapsing punctuation.
    pub allow_hyphen: bool,
    /// Remove every punctuation run, not only runs followed by a space.
    pub strict_punctuation: bool,
}

impl NormalizerConfig {
    #[must_use]
    pub fn from_app_config(config: &bigear_core::AppConfig) -> Self {
        Self {
            allow_hyphen: config.normalize_allow_hyphen,
            strict_punctuation: config.normalize_strict_punctuation,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    #[must_use]
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Normalizes `raw`, removing the entity tokens in `entities` when given.
    ///
    /// The result may be empty; callers treat a blank result as "no usable text".
    #[must_use]
    pub fn normalize(&self, raw: &str, entities: Option<&PostEntities>) -> String {
        let mut current = raw.to_owned();
        loop {
            let next = PASSES
                .iter()
                .fold(current.clone(), |text, &pass| self.apply(pass, &text, entities));
            if next == current {
                return next;
            }
            current = next;
        }
    }

    /// Runs a single pass.
    #[must_use]
    pub fn apply(&self, pass: Pass, text: &str, entities: Option<&PostEntities>) -> String {
        match pass {
            Pass::StripUrls => URL_RE.replace_all(text, "").into_owned(),
            Pass::StripEntities => match entities {
                Some(entities) => strip_entities(text, entities),
                None => text.to_owned(),
            },
            Pass::StripSigils => strip_sigils(text),
            Pass::CollapsePunctuation => self.collapse_punctuation(text),
            Pass::CollapseWhitespace => MULTI_SPACE_RE.replace_all(text, " ").into_owned(),
        }
    }

    fn collapse_punctuation(&self, text: &str) -> String {
        let (re, replacement) = match (self.config.strict_punctuation, self.config.allow_hyphen) {
            (false, false) => (&*PUNCT_SPACE_RE, " "),
            (false, true) => (&*PUNCT_SPACE_HYPHEN_RE, " "),
            (true, false) => (&*PUNCT_ANY_RE, ""),
            (true, true) => (&*PUNCT_ANY_HYPHEN_RE, ""),
        };
        re.replace_all(text, replacement).into_owned()
    }
}

/// Normalizes with the default configuration and no entity metadata.
#[must_use]
pub fn normalize(raw: &str) -> String {
    Normalizer::default().normalize(raw, None)
}

fn strip_sigils(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '#' | '@' | '\n' | '\r'))
        .map(|c| if c == '_' { ' ' } else { c })
        .collect()
}

fn strip_entities(text: &str, entities: &PostEntities) -> String {
    let mut out = text.to_owned();
    for url in entities.urls.iter().chain(&entities.media_urls) {
        if !url.is_empty() {
            out = out.replace(url.as_str(), "");
        }
    }
    for tag in &entities.hashtags {
        out = remove_tagged_token(&out, '#', tag);
    }
    for name in &entities.mentions {
        out = remove_tagged_token(&out, '@', name);
    }
    out
}

/// Removes `{sigil}{token}` wherever it stands as a whole word, ignoring
/// ASCII case. `#rust` does not match inside `#rustlang`.
fn remove_tagged_token(text: &str, sigil: char, token: &str) -> String {
    if token.is_empty() {
        return text.to_owned();
    }
    let needle = format!("{sigil}{token}").to_ascii_lowercase();
    // ASCII lowercasing keeps byte offsets aligned with `text`.
    let haystack = text.to_ascii_lowercase();

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    let mut search_from = 0;
    while let Some(found) = haystack[search_from..].find(&needle) {
        let start = search_from + found;
        let end = start + needle.len();
        let continues_word = text[end..]
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric() || c == '_');
        if continues_word {
            search_from = end;
            continue;
        }
        out.push_str(&text[cursor..start]);
        cursor = end;
        search_from = end;
    }
    out.push_str(&text[cursor..]);
    out
}
