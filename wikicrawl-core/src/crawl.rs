use crate::data::LinkStore;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::info;
use wikicrawl_scanner::{
    CancellationToken, Crawler, HttpFetcher, LinkExtractor, PageFetcher, ScanError,
    WikiLinkExtractor,
};

pub const DEFAULT_DB_NAME: &str = "wiki_links.db";

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Link store failure: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Crawl failure: {0}")]
    Scan(#[from] ScanError),
}

/// Options for configuring a crawl operation
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub seed: String,
    pub db_path: PathBuf,
    pub max_depth: usize,
    /// 1 runs the sequential traversal; anything higher uses a worker pool.
    pub workers: usize,
    pub max_pages: Option<usize>,
    pub timeout_secs: u64,
    /// Clear the store before crawling.
    pub fresh: bool,
    pub show_progress_bars: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            seed: String::new(),
            db_path: PathBuf::from(DEFAULT_DB_NAME),
            max_depth: Crawler::DEFAULT_MAX_DEPTH,
            workers: 1,
            max_pages: None,
            timeout_secs: 10,
            fresh: false,
            show_progress_bars: false,
        }
    }
}

/// Outcome of one crawl run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub seed: String,
    pub max_depth: usize,
    pub workers: usize,
    /// Visited URLs in visit order.
    pub visited: Vec<String>,
    /// URLs newly written to the store by this run.
    pub inserted: usize,
    /// Size of the store after the run.
    pub stored_total: usize,
    /// The traversal stopped on cancellation rather than running out of pages.
    pub cancelled: bool,
    /// The traversal stopped because `max_pages` was reached.
    pub page_cap_reached: bool,
    pub elapsed_ms: u64,
}

impl CrawlSummary {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Execute a crawl against the live site and persist the visited set.
///
/// The store is opened (and its schema ensured) before any network work, and
/// is closed on every exit path.
pub async fn execute_crawl(
    options: CrawlOptions,
    cancel: CancellationToken,
) -> Result<CrawlSummary, CrawlError> {
    let mut store = LinkStore::open(&options.db_path)?;
    info!("Opened link store at {}", options.db_path.display());

    let fetcher = HttpFetcher::with_timeout(options.timeout_secs)?;
    let summary = crawl_into_store(
        &mut store,
        Arc::new(fetcher),
        Arc::new(WikiLinkExtractor::new()),
        &options,
        cancel,
    )
    .await?;

    store.close()?;
    Ok(summary)
}

/// Run a traversal with the given collaborators and bulk-write the result
/// into `store`.
pub async fn crawl_into_store(
    store: &mut LinkStore,
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<dyn LinkExtractor>,
    options: &CrawlOptions,
    cancel: CancellationToken,
) -> Result<CrawlSummary, CrawlError> {
    if options.fresh {
        let removed = store.clear()?;
        info!("Cleared {} stored links", removed);
    }

    let progress_bar = if options.show_progress_bars {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting crawl...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let visited_count = Arc::new(AtomicUsize::new(0));
    let count_clone = visited_count.clone();
    let pb_clone = progress_bar.clone();

    let mut crawler = Crawler::new(fetcher, extractor)
        .with_max_depth(options.max_depth)
        .with_cancellation(cancel.clone())
        .with_progress_callback(Arc::new(move |depth: usize, url: String| {
            let count = count_clone.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(ref pb) = pb_clone {
                pb.set_message(format!("{} pages visited [depth {}] {}", count, depth, url));
            }
        }));
    if let Some(cap) = options.max_pages {
        crawler = crawler.with_max_pages(cap);
    }

    let started = Instant::now();
    let result = if options.workers > 1 {
        crawler
            .crawl_concurrent(&options.seed, options.workers)
            .await
    } else {
        crawler.crawl(&options.seed).await
    };

    let cancelled = cancel.is_cancelled();
    let visited = match result {
        Ok(visited) => visited,
        Err(e) => {
            if let Some(ref pb) = progress_bar {
                pb.finish_and_clear();
            }
            return Err(e.into());
        }
    };

    if let Some(ref pb) = progress_bar {
        pb.set_message(format!("Saving {} links...", visited.len()));
    }

    let page_cap_reached = options
        .max_pages
        .is_some_and(|cap| !cancelled && visited.len() >= cap);
    let visited = visited.into_vec();
    let inserted = store.upsert_all(&visited)?;
    let stored_total = store.count()?;

    if let Some(ref pb) = progress_bar {
        pb.finish_with_message(format!(
            "Crawl complete! {} pages visited",
            visited_count.load(Ordering::Relaxed)
        ));
    }

    info!(
        "Persisted {} links ({} new, {} total in store)",
        visited.len(),
        inserted,
        stored_total
    );

    Ok(CrawlSummary {
        seed: options.seed.clone(),
        max_depth: options.max_depth,
        workers: options.workers.max(1),
        visited,
        inserted,
        stored_total,
        cancelled,
        page_cap_reached,
        elapsed_ms: started.elapsed().as_millis() as u64,
    })
}

/// Generate a plain-text report from a crawl summary
pub fn generate_crawl_report(summary: &CrawlSummary) -> String {
    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Seed: {}\n", summary.seed));
    report.push_str(&format!("  Max depth: {}\n", summary.max_depth));
    report.push_str(&format!("  Workers: {}\n", summary.workers));
    report.push_str(&format!("  Pages visited: {}\n", summary.visited.len()));
    report.push_str(&format!("  New links stored: {}\n", summary.inserted));
    report.push_str(&format!("  Links in store: {}\n", summary.stored_total));
    report.push_str(&format!(
        "  Elapsed: {:.2}s\n",
        summary.elapsed_ms as f64 / 1000.0
    ));
    if summary.cancelled {
        report.push_str("  Stopped early: cancelled\n");
    } else if summary.page_cap_reached {
        report.push_str("  Stopped early: page cap reached\n");
    }

    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    report.push_str("## Visited\n");
    for url in &summary.visited {
        report.push_str(&format!("  {}\n", url));
    }

    report
}
