use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompareError {
    #[error(transparent)]
    Crawler(#[from] pricelens_crawler::CrawlerError),

    #[error(transparent)]
    Vision(#[from] pricelens_vision::VisionError),

    #[error("unable to extract product information from {url}")]
    NoProductInfo { url: String },
}
