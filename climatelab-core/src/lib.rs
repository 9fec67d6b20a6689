//! ClimateLab Core: domain types, fetchers, parsers, aligner and analyzer.
//!
//! This crate contains everything below the pipeline orchestration:
//! - Domain types (indicators, periods, time series, the merged table)
//! - Raw data retrieval over HTTP or from local files, plus the raw cache
//! - One parser per source dataset
//! - The aligner that merges series onto a shared period key
//! - Correlation, trend and summary analysis over the merged table

pub mod align;
pub mod analysis;
pub mod data;
pub mod domain;
pub mod parse;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything the runner hands across rayon workers
    /// is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::TimeSeries>();
        require_sync::<domain::TimeSeries>();
        require_send::<domain::MergedTable>();
        require_sync::<domain::MergedTable>();
        require_send::<domain::Period>();
        require_sync::<domain::Period>();

        // Data layer
        require_send::<data::RawDocument>();
        require_sync::<data::RawDocument>();
        require_send::<data::HttpFetcher>();
        require_sync::<data::HttpFetcher>();
        require_send::<data::FileFetcher>();
        require_sync::<data::FileFetcher>();
        require_send::<data::RawCache>();
        require_sync::<data::RawCache>();
        require_send::<data::FetchError>();
        require_sync::<data::FetchError>();

        // Parsers
        require_send::<parse::GistempParser>();
        require_sync::<parse::GistempParser>();
        require_send::<parse::OwidCo2Parser>();
        require_sync::<parse::OwidCo2Parser>();
        require_send::<parse::EpaSeaLevelParser>();
        require_sync::<parse::EpaSeaLevelParser>();

        // Results
        require_send::<analysis::Analysis>();
        require_sync::<analysis::Analysis>();
        require_send::<align::AlignError>();
        require_sync::<align::AlignError>();
    }

    /// Fetchers and parsers are used as trait objects by the runner.
    #[test]
    fn seams_are_object_safe() {
        fn _fetcher(f: &dyn data::Fetcher, spec: &data::SourceSpec) {
            let _ = f.fetch(spec);
        }
        fn _parser(p: &dyn parse::SeriesParser, raw: &str) {
            let _ = p.parse(raw);
        }
    }
}
