//! Raw data retrieval and caching

pub mod cache;
pub mod file;
pub mod http;
pub mod provider;

pub use cache::{CacheMeta, CacheStatus, RawCache};
pub use file::FileFetcher;
pub use http::{HttpFetcher, HttpSettings, MAX_BACKOFF};
pub use provider::{DataSource, FetchError, Fetcher, RawDocument, SourceSpec};
