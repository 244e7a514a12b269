use thiserror::Error;

/// Failures that end a watch run
#[derive(Debug, Error)]
pub enum WatchError {
    /// A required setting (the notification endpoint) was not supplied
    #[error("missing required configuration: {0}")]
    ConfigMissing(&'static str),

    /// The config file could not be read or holds unusable values
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// A change-feed page request failed or returned an unreadable body
    #[error("change feed unavailable: {0}")]
    FeedUnavailable(String),

    /// A page content request failed
    #[error("page lookup failed for {title:?}: {reason}")]
    LookupFailure { title: String, reason: String },

    /// The notification endpoint rejected the payload
    #[error("notification delivery failed: {0}")]
    DeliveryFailure(String),

    /// An enrichment task panicked or was cancelled
    #[error("enrichment worker failed: {0}")]
    Worker(String),
}

impl WatchError {
    pub fn lookup(title: &str, reason: impl ToString) -> Self {
        Self::LookupFailure {
            title: title.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WatchError>;
