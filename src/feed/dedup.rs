use crate::results::ChangeRecord;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Latest change per title within one scan
pub type DedupedChanges = HashMap<String, ChangeRecord>;

/// Keeps only the most recent change for each title
///
/// A later record replaces the kept one only when its timestamp compares
/// strictly greater. Feed timestamps are ISO-8601 UTC at a fixed precision,
/// so string order is chronological order.
#[derive(Debug, Default)]
pub struct TitleDeduplicator {
    latest: DedupedChanges,
    discarded: usize,
}

impl TitleDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record in. Returns true when it is now the kept record for its title.
    pub fn observe(&mut self, record: ChangeRecord) -> bool {
        if record.title.trim().is_empty() {
            self.discarded += 1;
            return false;
        }

        match self.latest.entry(record.title.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
            Entry::Occupied(mut slot) => {
                if record.timestamp > slot.get().timestamp {
                    slot.insert(record);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Reduce a whole sequence at once
    pub fn reduce<I>(records: I) -> DedupedChanges
    where
        I: IntoIterator<Item = ChangeRecord>,
    {
        let mut dedup = Self::new();
        for record in records {
            dedup.observe(record);
        }
        dedup.into_map()
    }

    /// Number of distinct titles kept
    pub fn len(&self) -> usize {
        self.latest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }

    /// Records dropped for lacking a title
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    pub fn into_map(self) -> DedupedChanges {
        self.latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rc(title: &str, ts: &str, comment: &str) -> ChangeRecord {
        ChangeRecord {
            comment: comment.to_string(),
            ..ChangeRecord::new(title, ts)
        }
    }

    #[test]
    fn test_latest_edit_wins() {
        let map = TitleDeduplicator::reduce(vec![
            rc("Jane Roe", "2024-05-01T11:10:00Z", "middle"),
            rc("Jane Roe", "2024-05-01T11:50:00Z", "latest"),
            rc("Jane Roe", "2024-05-01T11:05:00Z", "earliest"),
            rc("John Doe", "2024-05-01T11:20:00Z", "only"),
        ]);

        assert_eq!(map.len(), 2);
        assert_eq!(map["Jane Roe"].comment, "latest");
        assert_eq!(map["John Doe"].comment, "only");
    }

    #[test]
    fn test_order_independent() {
        let records = vec![
            rc("A", "2024-05-01T11:00:00Z", "1"),
            rc("A", "2024-05-01T11:30:00Z", "2"),
            rc("A", "2024-05-01T11:15:00Z", "3"),
        ];
        let forward = TitleDeduplicator::reduce(records.clone());
        let backward = TitleDeduplicator::reduce(records.into_iter().rev());
        assert_eq!(forward, backward);
        assert_eq!(forward["A"].comment, "2");
    }

    #[test]
    fn test_tie_keeps_exactly_one() {
        let mut dedup = TitleDeduplicator::new();
        assert!(dedup.observe(rc("A", "2024-05-01T11:00:00Z", "first")));
        assert!(!dedup.observe(rc("A", "2024-05-01T11:00:00Z", "second")));
        let map = dedup.into_map();
        assert_eq!(map.len(), 1);
        assert_eq!(map["A"].comment, "first");
    }

    #[test]
    fn test_empty_titles_discarded() {
        let mut dedup = TitleDeduplicator::new();
        assert!(!dedup.observe(rc("", "2024-05-01T11:00:00Z", "")));
        assert!(dedup.observe(rc("B", "2024-05-01T11:00:00Z", "")));
        assert_eq!(dedup.len(), 1);
        assert_eq!(dedup.discarded(), 1);
    }

    #[test]
    fn test_maximum_kept_for_many_permutations() {
        let stamps = [
            "2024-05-01T11:01:00Z",
            "2024-05-01T11:59:00Z",
            "2024-05-01T11:30:00Z",
            "2024-05-01T11:45:00Z",
        ];
        for rotation in 0..stamps.len() {
            let mut order = stamps.to_vec();
            order.rotate_left(rotation);
            let map = TitleDeduplicator::reduce(order.iter().map(|ts| rc("T", ts, ts)));
            assert_eq!(map["T"].timestamp, "2024-05-01T11:59:00Z");
        }
    }
}
