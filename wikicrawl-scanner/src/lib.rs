pub mod canonical;
pub mod crawler;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod result;

pub use canonical::{canonicalize, origin_of};
pub use crawler::{Crawler, ProgressCallback};
pub use error::ScanError;
pub use extract::{LinkExtractor, WikiLinkExtractor};
pub use fetch::{HttpFetcher, PageFetcher};
pub use result::{FrontierEntry, VisitedSet};
pub use tokio_util::sync::CancellationToken;
