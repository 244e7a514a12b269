pub mod dedup;
pub mod reader;

pub use dedup::TitleDeduplicator;
pub use reader::{ChangeFeed, ChangePage, ChangeQuery, ChangeStream, TimeWindow};
