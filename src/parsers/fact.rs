/// Finds the line of article text carrying a recognized field label
///
/// This is a plain keyword scan over lines, not a structured parse: the first
/// line containing any label (case-sensitive substring) wins.
#[derive(Debug, Clone)]
pub struct FactExtractor {
    labels: Vec<String>,
}

impl FactExtractor {
    /// Create an extractor for the given labels. Empty labels are ignored.
    pub fn new<S: AsRef<str>>(labels: &[S]) -> Self {
        Self {
            labels: labels
                .iter()
                .map(|l| l.as_ref().to_string())
                .filter(|l| !l.is_empty())
                .collect(),
        }
    }

    /// First matching line in document order, trimmed; empty when nothing matches
    pub fn extract_fact_line(&self, text: &str) -> String {
        extract_fact_line(text, &self.labels)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

/// Scan `text` line by line for the first line containing any of `labels`
pub fn extract_fact_line<S: AsRef<str>>(text: &str, labels: &[S]) -> String {
    text.lines()
        .find(|line| {
            labels
                .iter()
                .map(AsRef::as_ref)
                .any(|label| !label.is_empty() && line.contains(label))
        })
        .map(|line| line.trim().to_string())
        .unwrap_or_default()
}
