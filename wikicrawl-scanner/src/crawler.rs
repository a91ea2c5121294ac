use crate::canonical::{canonicalize, origin_of};
use crate::error::{Result, ScanError};
use crate::extract::LinkExtractor;
use crate::fetch::PageFetcher;
use crate::result::{FrontierEntry, VisitedSet};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

/// Invoked with `(depth, url)` every time a URL is marked visited.
pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

/// Links a worker discovered on a page that sat at `depth`.
struct Expansion {
    depth: usize,
    links: Vec<String>,
}

/// Breadth-first, depth-bounded link traversal.
///
/// Pages at exactly `max_depth` are visited but never expanded. Duplicate
/// frontier entries are allowed; the visited check at dequeue time is the
/// only duplicate filter.
pub struct Crawler {
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<dyn LinkExtractor>,
    max_depth: usize,
    max_pages: Option<usize>,
    cancel: CancellationToken,
    progress_callback: Option<ProgressCallback>,
}

impl Crawler {
    pub const DEFAULT_MAX_DEPTH: usize = 6;

    pub fn new(fetcher: Arc<dyn PageFetcher>, extractor: Arc<dyn LinkExtractor>) -> Self {
        Self {
            fetcher,
            extractor,
            max_depth: Self::DEFAULT_MAX_DEPTH,
            max_pages: None,
            cancel: CancellationToken::new(),
            progress_callback: None,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Soft cap on the number of visited pages. Reaching it stops the
    /// traversal with everything visited so far.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Single-task traversal. Each fetch completes before the next entry is
    /// dequeued, so the visit order is strictly breadth-first.
    pub async fn crawl(&self, seed: &str) -> Result<VisitedSet> {
        let (seed, origin) = Self::prepare_seed(seed)?;
        info!("Starting crawl of {} to depth {}", seed, self.max_depth);

        let mut visited = VisitedSet::new();
        let mut frontier = VecDeque::from([FrontierEntry::new(seed, 0)]);

        loop {
            if self.cancel.is_cancelled() {
                info!("Crawl cancelled after {} pages", visited.len());
                break;
            }

            let Some(FrontierEntry { url, depth }) = frontier.pop_front() else {
                break;
            };

            // Unreachable while expansion stops at max_depth.
            if depth > self.max_depth {
                warn!("Dequeued {} at depth {} beyond limit, stopping", url, depth);
                break;
            }

            if !visited.insert(&url) {
                debug!("Already visited {}", url);
                continue;
            }
            self.report_progress(depth, &url);

            if self.cap_reached(visited.len()) {
                info!("Page cap of {} reached, stopping", visited.len());
                break;
            }

            if depth < self.max_depth {
                let links =
                    Self::expand(self.fetcher.as_ref(), self.extractor.as_ref(), &url, &origin)
                        .await;
                debug!("{} links queued from {} at depth {}", links.len(), url, depth);
                frontier.extend(
                    links
                        .into_iter()
                        .map(|link| FrontierEntry::new(link, depth + 1)),
                );
            }
        }

        info!("Crawl complete. Visited {} pages", visited.len());
        Ok(visited)
    }

    /// Traversal with a pool of `workers` fetch tasks.
    ///
    /// This task owns the frontier and the visited set, so check-then-mark is
    /// serialized without locks. Entries to expand go out over a work channel;
    /// workers send the discovered links back over a result channel. Only the
    /// depth bound and the visit-once rule hold here; visit order does not.
    /// A worker that panics ends the run with `ScanError::JoinError`.
    pub async fn crawl_concurrent(&self, seed: &str, workers: usize) -> Result<VisitedSet> {
        let workers = workers.max(1);
        let (seed, origin) = Self::prepare_seed(seed)?;
        info!(
            "Starting crawl of {} to depth {} with {} workers",
            seed, self.max_depth, workers
        );

        let stop = self.cancel.child_token();
        let (work_tx, work_rx) = mpsc::unbounded_channel::<FrontierEntry>();
        let work_rx = Arc::new(Mutex::new(work_rx));
        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<Expansion>();

        let mut worker_set = JoinSet::new();
        for worker_id in 0..workers {
            let fetcher = self.fetcher.clone();
            let extractor = self.extractor.clone();
            let origin = origin.clone();
            let work_rx = work_rx.clone();
            let result_tx = result_tx.clone();
            let stop = stop.clone();

            worker_set.spawn(async move {
                debug!("Worker {} started", worker_id);
                loop {
                    let entry = tokio::select! {
                        _ = stop.cancelled() => None,
                        entry = async { work_rx.lock().await.recv().await } => entry,
                    };
                    let Some(FrontierEntry { url, depth }) = entry else {
                        break;
                    };

                    let links =
                        Self::expand(fetcher.as_ref(), extractor.as_ref(), &url, &origin).await;
                    if result_tx.send(Expansion { depth, links }).is_err() {
                        break;
                    }
                }
                debug!("Worker {} finished", worker_id);
            });
        }
        drop(result_tx);

        let mut visited = VisitedSet::new();
        let mut frontier = VecDeque::from([FrontierEntry::new(seed, 0)]);
        let mut in_flight = 0usize;
        let mut interrupted = false;

        'owner: loop {
            while let Some(entry) = frontier.pop_front() {
                if self.cancel.is_cancelled() {
                    info!("Crawl cancelled after {} pages", visited.len());
                    interrupted = true;
                    break 'owner;
                }

                if entry.depth > self.max_depth {
                    warn!(
                        "Dequeued {} at depth {} beyond limit, stopping",
                        entry.url, entry.depth
                    );
                    interrupted = true;
                    break 'owner;
                }

                if !visited.insert(&entry.url) {
                    continue;
                }
                self.report_progress(entry.depth, &entry.url);

                if self.cap_reached(visited.len()) {
                    info!("Page cap of {} reached, stopping", visited.len());
                    interrupted = true;
                    break 'owner;
                }

                if entry.depth < self.max_depth {
                    work_tx.send(entry).map_err(|_| {
                        ScanError::Other("worker pool shut down unexpectedly".to_string())
                    })?;
                    in_flight += 1;
                }
            }

            if in_flight == 0 {
                break;
            }

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("Crawl cancelled after {} pages", visited.len());
                    interrupted = true;
                    break 'owner;
                }
                // A panicked worker never reports back, so its entry would stay
                // in flight forever.
                Some(joined) = worker_set.join_next() => {
                    if let Err(e) = joined {
                        warn!("Worker failed: {}", e);
                        return Err(e.into());
                    }
                }
                expansion = result_rx.recv() => {
                    let Some(Expansion { depth, links }) = expansion else {
                        return Err(ScanError::Other(
                            "all workers exited with work outstanding".to_string(),
                        ));
                    };
                    in_flight -= 1;
                    frontier.extend(
                        links
                            .into_iter()
                            .map(|link| FrontierEntry::new(link, depth + 1)),
                    );
                }
            }
        }

        stop.cancel();
        drop(work_tx);
        if interrupted {
            worker_set.abort_all();
        }
        while let Some(joined) = worker_set.join_next().await {
            match joined {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => {}
                Err(e) => return Err(e.into()),
            }
        }

        info!("Crawl complete. Visited {} pages", visited.len());
        Ok(visited)
    }

    fn prepare_seed(seed: &str) -> Result<(String, Url)> {
        let canonical = canonicalize(seed)
            .ok_or_else(|| ScanError::InvalidUrl(format!("not an absolute http(s) URL: {}", seed)))?;
        let origin = origin_of(&canonical)
            .ok_or_else(|| ScanError::InvalidUrl(format!("URL has no host: {}", seed)))?;
        Ok((canonical, origin))
    }

    /// Fetches `url` and returns its canonicalized outbound links. A missing
    /// page is a leaf, not an error.
    async fn expand(
        fetcher: &dyn PageFetcher,
        extractor: &dyn LinkExtractor,
        url: &str,
        origin: &Url,
    ) -> Vec<String> {
        let Some(content) = fetcher.fetch_page(url).await else {
            debug!("No content for {}, treating as leaf", url);
            return Vec::new();
        };

        extractor
            .extract_links(&content, origin)
            .into_iter()
            .filter_map(|link| canonicalize(&link))
            .collect()
    }

    fn cap_reached(&self, visited: usize) -> bool {
        self.max_pages.is_some_and(|cap| visited >= cap)
    }

    fn report_progress(&self, depth: usize, url: &str) {
        if let Some(ref callback) = self.progress_callback {
            callback(depth, url.to_string());
        }
    }
}
