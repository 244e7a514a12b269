use crate::error::{Result, WatchError};
use crate::results::ChangeRecord;
use crate::utils::format_timestamp;
use chrono::{DateTime, Utc};
use std::collections::{HashSet, VecDeque};
use std::future::Future;

/// Main article namespace
pub const MAIN_NAMESPACE: i32 = 0;

/// Change types requested from the feed (edits and page creations)
pub const CHANGE_TYPES: &str = "edit|new";

/// Fields requested for every change
pub const CHANGE_PROPS: &str = "title|ids|timestamp|comment|sizes|flags";

/// Trailing scan window
///
/// The feed enumerates newest first, so `start` is the later bound (now) and
/// `end` the earlier one. Ordering is passed through unchecked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Window covering `length` before `now`
    pub fn trailing(now: DateTime<Utc>, length: chrono::Duration) -> Self {
        Self {
            start: now,
            end: now - length,
        }
    }
}

/// Parameters of one change-feed request
///
/// Each request gets its own value; continuing produces a new query rather
/// than mutating the previous one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeQuery {
    pub window: TimeWindow,
    pub namespace: i32,
    pub page_size: u32,
    pub continuation: Option<String>,
}

impl ChangeQuery {
    /// First-page query over the main namespace
    pub fn new(window: TimeWindow, page_size: u32) -> Self {
        Self {
            window,
            namespace: MAIN_NAMESPACE,
            page_size,
            continuation: None,
        }
    }

    /// Same query carrying a continuation token
    pub fn continued(&self, token: impl Into<String>) -> Self {
        Self {
            continuation: Some(token.into()),
            ..self.clone()
        }
    }

    /// Query-string parameters for the wiki API
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("action", "query".to_string()),
            ("list", "recentchanges".to_string()),
            ("rcstart", format_timestamp(self.window.start)),
            ("rcend", format_timestamp(self.window.end)),
            ("rcnamespace", self.namespace.to_string()),
            ("rctype", CHANGE_TYPES.to_string()),
            ("rcprop", CHANGE_PROPS.to_string()),
            ("rclimit", self.page_size.to_string()),
            ("format", "json".to_string()),
            ("formatversion", "2".to_string()),
        ];
        if let Some(token) = &self.continuation {
            params.push(("rccontinue", token.clone()));
        }
        params
    }
}

/// One page of feed results
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangePage {
    pub records: Vec<ChangeRecord>,

    /// Present when more results exist
    pub continuation: Option<String>,
}

/// Source of change-feed pages
pub trait ChangeFeed {
    /// Fetch a single page. Any failure is `FeedUnavailable`.
    fn fetch_changes(
        &self,
        query: &ChangeQuery,
    ) -> impl Future<Output = Result<ChangePage>> + Send;
}

/// Lazy, forward-only sequence of change records
///
/// Pages are requested one at a time as the buffer drains, following
/// continuation tokens until the feed stops returning one.
pub struct ChangeStream<'a, F> {
    feed: &'a F,
    query: ChangeQuery,
    buffer: VecDeque<ChangeRecord>,
    next_token: Option<String>,
    tokens_seen: HashSet<String>,
    finished: bool,
    pages_fetched: usize,
    records_yielded: usize,
}

impl<'a, F: ChangeFeed> ChangeStream<'a, F> {
    pub fn new(feed: &'a F, query: ChangeQuery) -> Self {
        Self {
            feed,
            query,
            buffer: VecDeque::new(),
            next_token: None,
            tokens_seen: HashSet::new(),
            finished: false,
            pages_fetched: 0,
            records_yielded: 0,
        }
    }

    /// Next record, `Ok(None)` once the feed is exhausted
    pub async fn next(&mut self) -> Result<Option<ChangeRecord>> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                self.records_yielded += 1;
                return Ok(Some(record));
            }
            if self.finished {
                return Ok(None);
            }
            self.fetch_page().await?;
        }
    }

    /// Drain the remaining records into a vector
    pub async fn collect_all(mut self) -> Result<Vec<ChangeRecord>> {
        let mut records = Vec::new();
        while let Some(record) = self.next().await? {
            records.push(record);
        }
        Ok(records)
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    pub fn records_yielded(&self) -> usize {
        self.records_yielded
    }

    async fn fetch_page(&mut self) -> Result<()> {
        let query = match &self.next_token {
            Some(token) => self.query.continued(token.clone()),
            None => self.query.clone(),
        };

        let page = match self.feed.fetch_changes(&query).await {
            Ok(page) => page,
            Err(e) => {
                self.finished = true;
                return Err(e);
            }
        };
        self.pages_fetched += 1;

        ::log::debug!(
            "Feed page {} returned {} records (continuation: {:?})",
            self.pages_fetched,
            page.records.len(),
            page.continuation
        );

        match page.continuation.filter(|token| !token.is_empty()) {
            // A token handed out twice means the feed is cycling
            Some(token) if self.tokens_seen.contains(&token) => {
                self.finished = true;
                return Err(WatchError::FeedUnavailable(format!(
                    "continuation token {token:?} was already used"
                )));
            }
            Some(token) => {
                self.tokens_seen.insert(token.clone());
                self.next_token = Some(token);
            }
            None => {
                self.next_token = None;
                self.finished = true;
            }
        }

        self.buffer.extend(page.records);
        Ok(())
    }
}
