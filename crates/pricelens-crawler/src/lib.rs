pub mod adapters;
pub mod crawler;
pub mod error;
pub mod parse;
pub mod registry;
pub mod retry;

pub use adapters::{Alibaba1688Crawler, MomoCrawler, PchomeCrawler, ShopeeCrawler};
pub use crawler::{CrawlerConfig, PlatformCrawler};
pub use error::CrawlerError;
pub use registry::CrawlerRegistry;
pub use retry::retry_with_backoff;
