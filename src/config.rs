use crate::batch::DEFAULT_MAX_ALERTS;
use crate::error::{Result, WatchError};
use crate::utils::describe_window;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Environment variable holding the notification endpoint
pub const WEBHOOK_ENV: &str = "SLACK_WEBHOOK";

/// Largest page size the change feed accepts
pub const MAX_PAGE_SIZE: u32 = 500;

/// The feed only retains about thirty days of changes
pub const MAX_WINDOW_MINUTES: u64 = 30 * 24 * 60;

/// Replaced in `header` and `heartbeat` with the length of the scan window
pub const WINDOW_PLACEHOLDER: &str = "{window}";

/// Configuration for one watch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Endpoint of the wiki query API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Public site root used to build article links
    #[serde(default = "default_site_url")]
    pub site_url: String,

    /// User-Agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Length of the trailing scan window
    #[serde(default = "default_window_minutes")]
    pub window_minutes: u64,

    /// Records requested per feed page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Timeout for feed and content requests
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Timeout for the notification POST
    #[serde(default = "default_delivery_timeout_secs")]
    pub delivery_timeout_secs: u64,

    /// Maximum number of alert lines in one payload
    #[serde(default = "default_max_alerts")]
    pub max_alerts: usize,

    /// Maximum number of content lookups in flight
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Case-insensitive title markers selecting candidates
    #[serde(default = "default_markers")]
    pub markers: Vec<String>,

    /// Labels identifying the fact line in article text
    #[serde(default = "default_field_labels")]
    pub field_labels: Vec<String>,

    /// First line of every notification; `{window}` names the scan window
    #[serde(default = "default_header")]
    pub header: String,

    /// Line sent when nothing qualified; `{window}` names the scan window
    #[serde(default = "default_heartbeat")]
    pub heartbeat: String,

    /// Notification endpoint (overridden by `SLACK_WEBHOOK`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

fn default_api_url() -> String {
    "https://en.wikipedia.org/w/api.php".to_string()
}

fn default_site_url() -> String {
    "https://en.wikipedia.org".to_string()
}

fn default_user_agent() -> String {
    "wiki-watch/1.0 (contact: your-email@example.com)".to_string()
}

fn default_window_minutes() -> u64 {
    60
}

fn default_page_size() -> u32 {
    MAX_PAGE_SIZE
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_delivery_timeout_secs() -> u64 {
    15
}

fn default_max_alerts() -> usize {
    DEFAULT_MAX_ALERTS
}

fn default_max_concurrency() -> usize {
    4
}

fn default_markers() -> Vec<String> {
    vec![
        "(american football)".to_string(),
        "nfl".to_string(),
        "football player".to_string(),
    ]
}

fn default_field_labels() -> Vec<String> {
    vec![
        "Current team".to_string(),
        "Team(s)".to_string(),
        "NFL team".to_string(),
        "Roster status".to_string(),
    ]
}

fn default_header() -> String {
    "*NFL Wikipedia Watch — last {window}*".to_string()
}

fn default_heartbeat() -> String {
    "No NFL player page updates detected in the past {window}.".to_string()
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            site_url: default_site_url(),
            user_agent: default_user_agent(),
            window_minutes: default_window_minutes(),
            page_size: default_page_size(),
            request_timeout_secs: default_request_timeout_secs(),
            delivery_timeout_secs: default_delivery_timeout_secs(),
            max_alerts: default_max_alerts(),
            max_concurrency: default_max_concurrency(),
            markers: default_markers(),
            field_labels: default_field_labels(),
            header: default_header(),
            heartbeat: default_heartbeat(),
            webhook_url: None,
        }
    }
}

impl WatchConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut contents = String::new();
        File::open(path)
            .and_then(|mut file| file.read_to_string(&mut contents))
            .map_err(|e| WatchError::ConfigInvalid(format!("{}: {}", path.display(), e)))?;

        Self::from_json(&contents)
    }

    /// Parse configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| WatchError::ConfigInvalid(e.to_string()))
    }

    /// Take the webhook from the environment when it is set and non-blank
    pub fn apply_env(&mut self) {
        if let Ok(webhook) = std::env::var(WEBHOOK_ENV) {
            let webhook = webhook.trim();
            if !webhook.is_empty() {
                self.webhook_url = Some(webhook.to_string());
            }
        }
    }

    /// The notification endpoint, or `ConfigMissing` when none was supplied
    pub fn webhook(&self) -> Result<Url> {
        let raw = self
            .webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .ok_or(WatchError::ConfigMissing(WEBHOOK_ENV))?;
        parse_url("webhook_url", raw)
    }

    /// Check every value before any network activity
    pub fn validate(&self) -> Result<()> {
        self.webhook()?;
        self.api()?;
        self.site()?;

        if self.window_minutes == 0 || self.window_minutes > MAX_WINDOW_MINUTES {
            return Err(invalid("window_minutes must be between 1 and 43200"));
        }
        if self.request_timeout_secs == 0 {
            return Err(invalid("request_timeout_secs must be positive"));
        }
        if self.delivery_timeout_secs == 0 {
            return Err(invalid("delivery_timeout_secs must be positive"));
        }
        if self.max_concurrency == 0 {
            return Err(invalid("max_concurrency must be positive"));
        }
        if self.max_alerts == 0 {
            return Err(invalid("max_alerts must be positive"));
        }
        if self.markers.iter().all(|m| m.trim().is_empty()) {
            return Err(invalid("markers must not be empty"));
        }
        if self.field_labels.iter().all(|l| l.is_empty()) {
            return Err(invalid("field_labels must not be empty"));
        }
        Ok(())
    }

    pub fn api(&self) -> Result<Url> {
        parse_url("api_url", &self.api_url)
    }

    pub fn site(&self) -> Result<Url> {
        parse_url("site_url", &self.site_url)
    }

    /// Page size clamped to what the feed accepts
    pub fn effective_page_size(&self) -> u32 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    pub fn window(&self) -> chrono::Duration {
        let minutes = self.window_minutes.min(MAX_WINDOW_MINUTES) as i64;
        chrono::Duration::minutes(minutes)
    }

    /// Notification header with the window filled in
    pub fn header_text(&self) -> String {
        self.fill_window(&self.header)
    }

    /// Heartbeat line with the window filled in
    pub fn heartbeat_text(&self) -> String {
        self.fill_window(&self.heartbeat)
    }

    fn fill_window(&self, template: &str) -> String {
        template.replace(WINDOW_PLACEHOLDER, &describe_window(self.window_minutes))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_secs(self.delivery_timeout_secs)
    }
}

fn parse_url(field: &str, raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| WatchError::ConfigInvalid(format!("{field}: {e}")))
}

fn invalid(msg: &str) -> WatchError {
    WatchError::ConfigInvalid(msg.to_string())
}
