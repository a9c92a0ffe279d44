pub mod aggregator;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod report;
pub mod results;
pub mod search;

pub use config::SearchConfig;
pub use errors::{SearchError, SearchResult};
pub use report::ResultsDir;
pub use results::{MatchRecord, RunStats, ScanOutcome, ScanTarget, SearchReport};
pub use search::search;
