//! Concrete platform crawlers.
//!
//! Shopee talks JSON APIs, PChome and Momo parse storefront card markup,
//! and 1688 extracts the JSON blob embedded in its search page. Each
//! adapter owns its platform's sort-parameter mapping; there is no shared
//! sort vocabulary because the upstream platforms disagree about what the
//! orderings mean.

mod alibaba;
mod momo;
mod pchome;
mod shopee;

pub use alibaba::Alibaba1688Crawler;
pub use momo::MomoCrawler;
pub use pchome::PchomeCrawler;
pub use shopee::ShopeeCrawler;
