use crate::parsers::FactExtractor;
use crate::results::{Alert, Candidate, ChangeRecord, Payload};
use crate::utils::title_to_path;
use url::Url;

/// Default cap on alert lines per notification
pub const DEFAULT_MAX_ALERTS: usize = 45;

/// Default first line of every notification, as rendered for an hourly window
pub const DEFAULT_HEADER: &str = "*NFL Wikipedia Watch — last hour*";

/// Default line sent when no candidate produced an alert, for an hourly window
pub const DEFAULT_HEARTBEAT: &str = "No NFL player page updates detected in the past hour.";

/// Turns enriched candidates into one notification payload
///
/// Candidates without a fact line are dropped silently, alerts beyond
/// `max_alerts` are dropped silently, and an empty result is replaced by the
/// heartbeat line so an empty run still produces a message.
#[derive(Debug, Clone)]
pub struct AlertBatcher {
    site: Url,
    extractor: FactExtractor,
    header: String,
    heartbeat: String,
    max_alerts: usize,
}

impl AlertBatcher {
    pub fn new(site: Url, extractor: FactExtractor) -> Self {
        Self {
            site,
            extractor,
            header: DEFAULT_HEADER.to_string(),
            heartbeat: DEFAULT_HEARTBEAT.to_string(),
            max_alerts: DEFAULT_MAX_ALERTS,
        }
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    pub fn with_heartbeat(mut self, heartbeat: impl Into<String>) -> Self {
        self.heartbeat = heartbeat.into();
        self
    }

    pub fn with_max_alerts(mut self, max_alerts: usize) -> Self {
        self.max_alerts = max_alerts;
        self
    }

    pub fn max_alerts(&self) -> usize {
        self.max_alerts
    }

    /// Link to the changed article: by page id when known, else by title
    pub fn canonical_url(&self, change: &ChangeRecord) -> String {
        let mut url = self.site.clone();
        url.set_fragment(None);

        match change.page_id {
            Some(page_id) => {
                url.set_path("/");
                url.set_query(Some(&format!("curid={page_id}")));
            }
            None => {
                let path = title_to_path(&change.title);
                url.set_query(None);
                // Pushed as one segment, so `/` and `?` in a title are
                // percent-encoded instead of splitting the path
                match url.path_segments_mut() {
                    Ok(mut segments) => {
                        segments.clear().push("wiki").push(&path);
                    }
                    Err(()) => {
                        return format!(
                            "{}/wiki/{}",
                            self.site.as_str().trim_end_matches('/'),
                            path
                        );
                    }
                }
            }
        }

        url.to_string()
    }

    /// Alerts for every candidate with a fact line, newest first
    pub fn alerts(&self, candidates: Vec<Candidate>) -> Vec<Alert> {
        let mut alerts = Vec::with_capacity(candidates.len());

        for Candidate { change, extract } in candidates {
            let fact_line = self.extractor.extract_fact_line(&extract.text);
            if fact_line.is_empty() {
                ::log::debug!("No fact line for {:?}, dropping", change.title);
                continue;
            }

            let url = self.canonical_url(&change);
            alerts.push(Alert {
                title: change.title,
                fact_line,
                timestamp: change.timestamp,
                url,
            });
        }

        // Completion order of lookups is arbitrary
        alerts.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| a.title.cmp(&b.title))
        });
        alerts
    }

    /// Render alerts into the payload, truncating and substituting the heartbeat
    pub fn render(&self, alerts: &[Alert]) -> Payload {
        if alerts.len() > self.max_alerts {
            ::log::warn!(
                "{} alerts found, sending the first {}",
                alerts.len(),
                self.max_alerts
            );
        }

        let mut lines = alerts
            .iter()
            .take(self.max_alerts)
            .map(Alert::render)
            .collect::<Vec<_>>();

        if lines.is_empty() {
            lines.push(self.heartbeat.clone());
        }

        Payload {
            text: format!("{}\n{}", self.header, lines.join("\n")),
        }
    }

    /// Build the payload for a set of enriched candidates
    pub fn build(&self, candidates: Vec<Candidate>) -> Payload {
        let alerts = self.alerts(candidates);
        self.render(&alerts)
    }
}
