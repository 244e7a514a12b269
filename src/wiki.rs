use crate::config::WatchConfig;
use crate::enrich::PageSource;
use crate::error::{Result, WatchError};
use crate::feed::{ChangeFeed, ChangePage, ChangeQuery};
use crate::results::{ChangeKind, ChangeRecord, EditFlag, PageExtract};
use serde::Deserialize;
use std::collections::BTreeSet;
use url::Url;

/// Build the HTTP client shared by every component of a run
pub fn build_http_client(config: &WatchConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.request_timeout())
        .build()
        .map_err(|e| WatchError::ConfigInvalid(format!("HTTP client: {e}")))
}

/// MediaWiki query API client serving the change feed and page extracts
#[derive(Debug, Clone)]
pub struct WikiClient {
    client: reqwest::Client,
    api: Url,
}

impl WikiClient {
    pub fn new(client: reqwest::Client, api: Url) -> Self {
        Self { client, api }
    }

    async fn get(
        &self,
        params: &[(&str, String)],
    ) -> std::result::Result<String, reqwest::Error> {
        self.client
            .get(self.api.clone())
            .query(params)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

impl ChangeFeed for WikiClient {
    async fn fetch_changes(&self, query: &ChangeQuery) -> Result<ChangePage> {
        let body = self
            .get(&query.params())
            .await
            .map_err(|e| WatchError::FeedUnavailable(e.to_string()))?;
        parse_change_page(&body)
    }
}

impl PageSource for WikiClient {
    async fn fetch_extract(&self, title: &str) -> Result<PageExtract> {
        let body = self
            .get(&extract_params(title))
            .await
            .map_err(|e| WatchError::lookup(title, e))?;
        parse_extract(title, &body)
    }
}

/// Query-string parameters for a plaintext extract of one title
pub fn extract_params(title: &str) -> Vec<(&'static str, String)> {
    vec![
        ("action", "query".to_string()),
        ("prop", "extracts".to_string()),
        ("explaintext", "1".to_string()),
        ("titles", title.to_string()),
        ("format", "json".to_string()),
        ("formatversion", "2".to_string()),
    ]
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    info: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "API error {}: {}", self.code, self.info)
    }
}

#[derive(Debug, Deserialize)]
struct RecentChangesResponse {
    #[serde(default)]
    query: Option<RecentChangesQuery>,
    #[serde(rename = "continue", default)]
    continuation: Option<RecentChangesContinue>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct RecentChangesQuery {
    #[serde(default)]
    recentchanges: Vec<WireChange>,
}

#[derive(Debug, Deserialize)]
struct RecentChangesContinue {
    #[serde(default)]
    rccontinue: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireChange {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    pageid: Option<u64>,
    #[serde(default)]
    timestamp: String,
    #[serde(default)]
    comment: String,
    #[serde(default)]
    oldlen: Option<i64>,
    #[serde(default)]
    newlen: Option<i64>,
    #[serde(default)]
    minor: bool,
    #[serde(default)]
    bot: bool,
    #[serde(default)]
    new: bool,
}

impl From<WireChange> for ChangeRecord {
    fn from(wire: WireChange) -> Self {
        let mut flags = BTreeSet::new();
        if wire.minor {
            flags.insert(EditFlag::Minor);
        }
        if wire.bot {
            flags.insert(EditFlag::Bot);
        }
        if wire.new {
            flags.insert(EditFlag::New);
        }

        Self {
            title: wire.title,
            // page id 0 means the feed had none
            page_id: wire.pageid.filter(|id| *id != 0),
            timestamp: wire.timestamp,
            comment: wire.comment,
            size_delta: wire.newlen.unwrap_or(0) - wire.oldlen.unwrap_or(0),
            flags,
            kind: wire
                .kind
                .as_deref()
                .map_or(ChangeKind::Other, ChangeKind::from_feed),
        }
    }
}

/// Decode one `list=recentchanges` response body
pub fn parse_change_page(body: &str) -> Result<ChangePage> {
    let response: RecentChangesResponse = serde_json::from_str(body)
        .map_err(|e| WatchError::FeedUnavailable(format!("malformed feed response: {e}")))?;

    if let Some(error) = response.error {
        return Err(WatchError::FeedUnavailable(error.to_string()));
    }

    let records = response
        .query
        .map(|q| q.recentchanges)
        .unwrap_or_default()
        .into_iter()
        .map(ChangeRecord::from)
        .collect();
    let continuation = response.continuation.and_then(|c| c.rccontinue);

    Ok(ChangePage {
        records,
        continuation,
    })
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    query: Option<ExtractQuery>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: Vec<WirePage>,
}

#[derive(Debug, Deserialize)]
struct WirePage {
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    missing: bool,
}

/// Decode one `prop=extracts` response body
///
/// Only the first page entry is used. A missing page, or one without an
/// extract, gives empty text.
pub fn parse_extract(title: &str, body: &str) -> Result<PageExtract> {
    let response: ExtractResponse = serde_json::from_str(body)
        .map_err(|e| WatchError::lookup(title, format!("malformed extract response: {e}")))?;

    if let Some(error) = response.error {
        return Err(WatchError::lookup(title, error));
    }

    let text = response
        .query
        .and_then(|q| q.pages.into_iter().next())
        .filter(|page| !page.missing)
        .and_then(|page| page.extract)
        .unwrap_or_default();

    Ok(PageExtract::new(title, text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::serve_once;

    const FEED_PAGE: &str = r#"{
        "batchcomplete": true,
        "continue": {"rccontinue": "20240501113000|123456", "continue": "-||"},
        "query": {"recentchanges": [
            {"type": "edit", "ns": 0, "title": "Jane Roe", "pageid": 42, "revid": 2, "old_revid": 1,
             "rcid": 9, "oldlen": 1000, "newlen": 1042, "timestamp": "2024-05-01T11:45:00Z",
             "comment": "update team", "minor": true, "bot": false, "new": false},
            {"type": "new", "ns": 0, "title": "John Doe (American football)", "pageid": 43,
             "oldlen": 0, "newlen": 500, "timestamp": "2024-05-01T11:40:00Z",
             "comment": "", "minor": false, "bot": false, "new": true},
            {"type": "edit", "ns": 0, "title": "Hidden", "pageid": 0,
             "timestamp": "2024-05-01T11:30:00Z", "commenthidden": true}
        ]}
    }"#;

    #[test]
    fn test_parse_change_page() {
        let page = parse_change_page(FEED_PAGE).unwrap();
        assert_eq!(page.continuation.as_deref(), Some("20240501113000|123456"));
        assert_eq!(page.records.len(), 3);

        let first = &page.records[0];
        assert_eq!(first.title, "Jane Roe");
        assert_eq!(first.page_id, Some(42));
        assert_eq!(first.size_delta, 42);
        assert_eq!(first.kind, ChangeKind::Edit);
        assert!(first.flags.contains(&EditFlag::Minor));
        assert!(!first.flags.contains(&EditFlag::Bot));

        let second = &page.records[1];
        assert_eq!(second.kind, ChangeKind::New);
        assert!(second.flags.contains(&EditFlag::New));
        assert_eq!(second.size_delta, 500);

        let third = &page.records[2];
        assert_eq!(third.page_id, None);
        assert_eq!(third.comment, "");
        assert_eq!(third.size_delta, 0);
    }

    #[test]
    fn test_last_page_has_no_continuation() {
        let page =
            parse_change_page(r#"{"batchcomplete": true, "query": {"recentchanges": []}}"#).unwrap();
        assert!(page.records.is_empty());
        assert!(page.continuation.is_none());
    }

    #[test]
    fn test_feed_errors() {
        assert!(matches!(
            parse_change_page("<html>502 Bad Gateway</html>"),
            Err(WatchError::FeedUnavailable(_))
        ));
        assert!(matches!(
            parse_change_page(r#"{"error": {"code": "badtimestamp", "info": "Invalid value"}}"#),
            Err(WatchError::FeedUnavailable(msg)) if msg.contains("badtimestamp")
        ));
    }

    #[test]
    fn test_parse_extract() {
        let body = r#"{"batchcomplete": true, "query": {"pages": [
            {"pageid": 42, "ns": 0, "title": "Jane Roe",
             "extract": "Jane Roe is a player.\nCurrent team: Example FC"}
        ]}}"#;
        let extract = parse_extract("Jane Roe", body).unwrap();
        assert_eq!(extract.title, "Jane Roe");
        assert_eq!(extract.text, "Jane Roe is a player.\nCurrent team: Example FC");
    }

    #[test]
    fn test_missing_page_is_empty() {
        let body = r#"{"batchcomplete": true, "query": {"pages": [
            {"ns": 0, "title": "Nobody", "missing": true}
        ]}}"#;
        assert_eq!(
            parse_extract("Nobody", body).unwrap(),
            PageExtract::empty("Nobody")
        );

        let no_pages = r#"{"batchcomplete": true, "query": {"pages": []}}"#;
        assert_eq!(parse_extract("Nobody", no_pages).unwrap().text, "");
    }

    #[test]
    fn test_malformed_extract_is_lookup_failure() {
        match parse_extract("Jane Roe", "not json") {
            Err(WatchError::LookupFailure { title, .. }) => assert_eq!(title, "Jane Roe"),
            other => panic!("expected lookup failure, got {other:?}"),
        }
    }

    fn local_client(api: Url) -> WikiClient {
        WikiClient::new(crate::test_server::client(), api)
    }

    fn query() -> ChangeQuery {
        let window = crate::feed::TimeWindow::trailing(
            chrono::Utc::now(),
            chrono::Duration::minutes(60),
        );
        ChangeQuery::new(window, 500)
    }

    #[tokio::test]
    async fn test_feed_over_http() {
        let (api, request) = serve_once("200 OK", FEED_PAGE).await;

        let page = local_client(api)
            .fetch_changes(&query())
            .await
            .unwrap();
        assert_eq!(page.records.len(), 3);
        assert_eq!(page.continuation.as_deref(), Some("20240501113000|123456"));

        let request = request.await.unwrap();
        assert!(request.starts_with("GET /?"));
        assert!(request.contains("list=recentchanges"));
    }

    #[tokio::test]
    async fn test_feed_server_error_is_feed_unavailable() {
        let (api, _request) = serve_once("500 Internal Server Error", "{}").await;

        let result = local_client(api).fetch_changes(&query()).await;
        assert!(matches!(result, Err(WatchError::FeedUnavailable(msg)) if msg.contains("500")));
    }

    #[tokio::test]
    async fn test_extract_server_error_is_lookup_failure() {
        let (api, _request) = serve_once("500 Internal Server Error", "{}").await;

        match local_client(api).fetch_extract("Jane Roe").await {
            Err(WatchError::LookupFailure { title, reason }) => {
                assert_eq!(title, "Jane Roe");
                assert!(reason.contains("500"));
            }
            other => panic!("expected lookup failure, got {other:?}"),
        }
    }

    #[test]
    fn test_extract_params() {
        let params = extract_params("Jane Roe");
        assert!(params.contains(&("titles", "Jane Roe".to_string())));
        assert!(params.contains(&("explaintext", "1".to_string())));
        assert!(params.contains(&("prop", "extracts".to_string())));
    }
}
