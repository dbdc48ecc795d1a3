//! Search composition and batch orchestration.
//!
//! [`ComparisonService`] stitches the crawler registry, the image
//! recognizer, and the optional Postgres sink into the three user-facing
//! search modes (keyword, URL, image). [`batch::BatchRunner`] drives many
//! keyword searches strictly sequentially with observable per-item
//! progress.

pub mod batch;
pub mod error;
pub mod service;

pub use batch::{
    BatchItem, BatchOutcome, BatchProgress, BatchRunner, BatchSearcher, BatchStatus,
    PlatformBoundSearcher, MAX_BATCH_ITEMS,
};
pub use error::CompareError;
pub use service::{
    ComparisonService, ImageSearch, ImageSearchOutcome, KeywordSearch, UrlSearch,
};
