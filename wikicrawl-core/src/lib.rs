pub mod crawl;
pub mod data;

pub use crawl::{
    CrawlError, CrawlOptions, CrawlSummary, DEFAULT_DB_NAME, crawl_into_store, execute_crawl,
    generate_crawl_report,
};
pub use data::LinkStore;
