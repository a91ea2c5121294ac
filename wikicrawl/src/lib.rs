pub mod commands;
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{crawl_options_from_args, parse_seed, render_summary, resolve_db_path};

// Re-export crawl functionality from wikicrawl-core
pub use wikicrawl_core::crawl::{
    CrawlOptions, CrawlSummary, DEFAULT_DB_NAME, execute_crawl, generate_crawl_report,
};
