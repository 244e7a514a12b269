use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Configuration for the title heuristic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateFilterConfig {
    /// Phrases that mark a title as a candidate (matched case-insensitively)
    pub markers: Vec<String>,
}

/// Title heuristic selecting topical candidates
///
/// Intentionally over-inclusive: any title containing one of the markers
/// passes. False positives are expected to produce no fact line later on.
#[derive(Debug)]
pub struct CandidateFilter {
    config: CandidateFilterConfig,
    pattern: Option<Regex>,
}

impl CandidateFilter {
    /// Create a new candidate filter from configuration
    pub fn new(config: CandidateFilterConfig) -> Result<Self, regex::Error> {
        let alternatives = config
            .markers
            .iter()
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
            .map(regex::escape)
            .collect::<Vec<_>>();

        let pattern = if alternatives.is_empty() {
            None
        } else {
            Some(
                RegexBuilder::new(&alternatives.join("|"))
                    .case_insensitive(true)
                    .build()?,
            )
        };

        Ok(Self { config, pattern })
    }

    /// Convenience constructor from a list of markers
    pub fn from_markers<S: AsRef<str>>(markers: &[S]) -> Result<Self, regex::Error> {
        Self::new(CandidateFilterConfig {
            markers: markers.iter().map(|m| m.as_ref().to_string()).collect(),
        })
    }

    /// Whether the title contains any marker, ignoring case
    pub fn matches(&self, title: &str) -> bool {
        match &self.pattern {
            Some(pattern) => pattern.is_match(title),
            None => false,
        }
    }

    pub fn markers(&self) -> &[String] {
        &self.config.markers
    }
}
