use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Kind of change reported by the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Revision of an existing page
    Edit,
    /// Page creation
    New,
    /// Anything else the feed may report
    Other,
}

impl ChangeKind {
    /// Map the feed's `type` field
    pub fn from_feed(kind: &str) -> Self {
        match kind {
            "edit" => Self::Edit,
            "new" => Self::New,
            _ => Self::Other,
        }
    }
}

/// Edit-type markers attached to a change
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EditFlag {
    Minor,
    Bot,
    New,
}

/// One entry of the change feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Title of the changed article
    pub title: String,

    /// Numeric page id (absent when the feed does not report one)
    pub page_id: Option<u64>,

    /// ISO-8601 UTC timestamp, lexicographically sortable
    pub timestamp: String,

    /// Edit summary
    pub comment: String,

    /// Byte length difference introduced by the change
    pub size_delta: i64,

    /// Edit-type markers
    pub flags: BTreeSet<EditFlag>,

    /// Change type
    pub kind: ChangeKind,
}

impl ChangeRecord {
    /// Create a bare edit record with the given title and timestamp
    pub fn new(title: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            page_id: None,
            timestamp: timestamp.into(),
            comment: String::new(),
            size_delta: 0,
            flags: BTreeSet::new(),
            kind: ChangeKind::Edit,
        }
    }

    /// Attach a page id
    pub fn with_page_id(mut self, page_id: u64) -> Self {
        self.page_id = Some(page_id);
        self
    }
}

/// Plaintext body of a page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageExtract {
    pub title: String,

    /// Empty when the page is missing or has no extractable content
    pub text: String,
}

impl PageExtract {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
        }
    }

    /// Extract for a page that has no content
    pub fn empty(title: impl Into<String>) -> Self {
        Self::new(title, String::new())
    }
}

/// A deduplicated change paired with the text of its page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub change: ChangeRecord,
    pub extract: PageExtract,
}

/// A finding ready to be rendered into a display line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub fact_line: String,
    pub timestamp: String,
    pub url: String,
}

impl Alert {
    /// Render the two-line display form used in the notification
    pub fn render(&self) -> String {
        format!(
            "• *{}* — {}\n{} | {}",
            self.title, self.fact_line, self.timestamp, self.url
        )
    }
}

/// Final notification body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub text: String,
}
