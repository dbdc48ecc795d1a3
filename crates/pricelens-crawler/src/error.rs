use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid product URL \"{url}\": {reason}")]
    InvalidProductUrl { url: String, reason: String },

    #[error("unsupported platform URL: {url}")]
    UnsupportedPlatform { url: String },

    #[error("none of the requested platforms has a registered crawler: {requested:?}")]
    NoKnownPlatforms { requested: Vec<String> },
}
