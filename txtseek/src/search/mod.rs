/// Concurrent scan-and-aggregate engine.
///
/// `engine` owns the run: it enumerates targets, fans them out across a
/// bounded rayon pool and collects completions in arrival order. `matcher`
/// compiles the literal query once and caches it; `processor` scans a
/// single target with a size-appropriate I/O strategy. Scan failures travel
/// as data through the same path as successes, so one bad file never
/// disturbs its siblings.
pub mod engine;
pub mod matcher;
pub mod processor;

pub use engine::search;
pub use matcher::QueryMatcher;
pub use processor::FileScanner;
