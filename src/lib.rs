//! Scans a wiki's recent-changes feed over a trailing window, keeps the
//! latest change per title, narrows to topical titles, pulls a fact line
//! from each article and posts one batched notification.

// Re-export modules
pub mod batch;
pub mod config;
pub mod enrich;
pub mod error;
pub mod feed;
pub mod filter;
pub mod notify;
pub mod parsers;
pub mod pipeline;
pub mod results;
pub mod utils;
pub mod wiki;

#[cfg(test)]
mod test_server;

// Re-export commonly used types for convenience
pub use batch::AlertBatcher;
pub use config::WatchConfig;
pub use enrich::{PageEnricher, PageSource};
pub use error::{Result, WatchError};
pub use feed::{ChangeFeed, ChangeStream, TitleDeduplicator};
pub use filter::CandidateFilter;
pub use notify::{NotificationSink, WebhookSink};
pub use pipeline::{RunSummary, Watch};
pub use results::{Alert, Candidate, ChangeRecord, PageExtract, Payload};
pub use wiki::WikiClient;
