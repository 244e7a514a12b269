use crate::batch::AlertBatcher;
use crate::config::WatchConfig;
use crate::enrich::{PageEnricher, PageSource};
use crate::error::{Result, WatchError};
use crate::feed::{ChangeFeed, ChangeQuery, ChangeStream, TimeWindow, TitleDeduplicator};
use crate::filter::CandidateFilter;
use crate::notify::{NotificationSink, WebhookSink};
use crate::parsers::FactExtractor;
use crate::results::Payload;
use crate::utils::format_timestamp;
use crate::wiki::{WikiClient, build_http_client};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Counts describing one completed run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Feed pages requested
    pub pages: usize,
    /// Change records read from the feed
    pub records: usize,
    /// Distinct titles after deduplication
    pub titles: usize,
    /// Titles that passed the heuristic and were enriched
    pub candidates: usize,
    /// Alerts produced before truncation
    pub alerts: usize,
    /// Alerts actually sent
    pub sent: usize,
}

impl RunSummary {
    /// Whether the payload carried only the heartbeat line
    pub fn is_heartbeat(&self) -> bool {
        self.sent == 0
    }
}

/// One scan of the change feed: read, dedupe, filter, enrich, batch, deliver
pub struct Watch<F, S, N> {
    feed: F,
    enricher: PageEnricher<S>,
    sink: N,
    filter: CandidateFilter,
    batcher: AlertBatcher,
    window: chrono::Duration,
    page_size: u32,
}

impl Watch<WikiClient, WikiClient, WebhookSink> {
    /// Build a watch against the configured wiki and webhook.
    ///
    /// The configuration is validated first, so a missing webhook fails here
    /// before any request is made.
    pub fn from_config(config: &WatchConfig) -> Result<Self> {
        config.validate()?;

        let client = build_http_client(config)?;
        let wiki = WikiClient::new(client.clone(), config.api()?);
        let sink = WebhookSink::new(client, config.webhook()?, config.delivery_timeout());

        Self::new(wiki.clone(), Arc::new(wiki), sink, config)
    }
}

impl<F, S, N> Watch<F, S, N>
where
    F: ChangeFeed,
    S: PageSource + Send + Sync + 'static,
    N: NotificationSink,
{
    pub fn new(feed: F, source: Arc<S>, sink: N, config: &WatchConfig) -> Result<Self> {
        let filter = CandidateFilter::from_markers(&config.markers)
            .map_err(|e| WatchError::ConfigInvalid(format!("markers: {e}")))?;

        let batcher = AlertBatcher::new(config.site()?, FactExtractor::new(&config.field_labels))
            .with_header(config.header_text())
            .with_heartbeat(config.heartbeat_text())
            .with_max_alerts(config.max_alerts);

        Ok(Self {
            feed,
            enricher: PageEnricher::new(source, config.max_concurrency),
            sink,
            filter,
            batcher,
            window: config.window(),
            page_size: config.effective_page_size(),
        })
    }

    /// Scan the window ending now and deliver the result
    pub async fn run(&self) -> Result<RunSummary> {
        self.run_at(Utc::now()).await
    }

    /// Scan the window ending at `now` and deliver the result
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<RunSummary> {
        let (payload, summary) = self.scan(now).await?;
        self.sink.deliver(&payload).await?;
        Ok(summary)
    }

    /// Everything except delivery
    pub async fn scan(&self, now: DateTime<Utc>) -> Result<(Payload, RunSummary)> {
        let window = TimeWindow::trailing(now, self.window);
        ::log::info!(
            "Scanning changes from {} back to {}",
            format_timestamp(window.start),
            format_timestamp(window.end)
        );

        let mut stream = ChangeStream::new(&self.feed, ChangeQuery::new(window, self.page_size));
        let mut dedup = TitleDeduplicator::new();
        while let Some(record) = stream.next().await? {
            dedup.observe(record);
        }

        let mut summary = RunSummary {
            pages: stream.pages_fetched(),
            records: stream.records_yielded(),
            titles: dedup.len(),
            ..RunSummary::default()
        };
        ::log::info!(
            "Read {} changes over {} pages, {} distinct titles",
            summary.records,
            summary.pages,
            summary.titles
        );

        let candidates = dedup
            .into_map()
            .into_values()
            .filter(|change| self.filter.matches(&change.title))
            .collect::<Vec<_>>();
        summary.candidates = candidates.len();
        ::log::info!("{} titles look like candidates", summary.candidates);

        let enriched = self.enricher.enrich_all(candidates).await?;
        let alerts = self.batcher.alerts(enriched);
        summary.alerts = alerts.len();
        summary.sent = alerts.len().min(self.batcher.max_alerts());

        if summary.alerts == 0 {
            ::log::info!("No alerts, sending heartbeat");
        } else {
            ::log::info!("Sending {} of {} alerts", summary.sent, summary.alerts);
        }

        Ok((self.batcher.render(&alerts), summary))
    }
}
