use thiserror::Error;

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {provider}")]
    UnexpectedStatus { status: u16, provider: &'static str },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{provider} response carried no message content")]
    MissingContent { provider: &'static str },

    #[error("image recognition produced no keywords")]
    NoKeywords,
}
