//! Bounded, most-recent-first calculation history.

use std::collections::VecDeque;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Default number of entries kept.
pub const DEFAULT_CAPACITY: usize = 50;

/// One successful calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Expression as it was evaluated
    pub expression: String,

    /// Formatted result
    pub result: String,

    /// When the calculation finished
    pub timestamp: DateTime<Utc>,
}

/// Calculation history, newest first, capped at a fixed capacity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
    capacity: usize,
    entries: VecDeque<HistoryEntry>,
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// A history holding at most `capacity` entries (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record a calculation at the front, evicting the oldest entries beyond
    /// capacity.
    pub fn record(&mut self, expression: impl Into<String>, result: impl Into<String>) {
        self.push(HistoryEntry {
            expression: expression.into(),
            result: result.into(),
            timestamp: Utc::now(),
        });
    }

    /// Insert a prebuilt entry at the front.
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        while self.entries.len() > self.capacity {
            if let Some(evicted) = self.entries.pop_back() {
                tracing::trace!(expression = %evicted.expression, "History entry evicted");
            }
        }
    }

    /// Newest entry.
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    /// Entry by position, 0 being the newest.
    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Export as CSV with an `Expression,Result,Timestamp` header.
    ///
    /// Every field is quoted, embedded quotes are doubled, and timestamps are
    /// RFC 3339 in UTC.
    pub fn to_csv(&self) -> String {
        let mut csv = String::from("Expression,Result,Timestamp\n");
        for entry in &self.entries {
            let timestamp = entry.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
            csv.push_str(&format!(
                "{},{},{}\n",
                quote(&entry.expression),
                quote(&entry.result),
                quote(&timestamp)
            ));
        }
        csv
    }
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_newest_first() {
        let mut history = History::new();
        history.record("1+1", "2");
        history.record("2+2", "4");

        assert_eq!(history.len(), 2);
        assert_eq!(history.latest().unwrap().expression, "2+2");
        assert_eq!(history.get(1).unwrap().expression, "1+1");
        let results: Vec<_> = history.iter().map(|e| e.result.as_str()).collect();
        assert_eq!(results, vec!["4", "2"]);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = History::new();
        for i in 0..51 {
            history.record(format!("{}+0", i), i.to_string());
        }

        assert_eq!(history.len(), DEFAULT_CAPACITY);
        assert_eq!(history.latest().unwrap().result, "50");
        // The very first calculation is gone.
        assert!(history.iter().all(|e| e.result != "0"));
        assert_eq!(history.get(49).unwrap().result, "1");
    }

    #[test]
    fn test_zero_capacity_keeps_one() {
        let mut history = History::with_capacity(0);
        history.record("1", "1");
        history.record("2", "2");
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest().unwrap().result, "2");
    }

    #[test]
    fn test_clear() {
        let mut history = History::new();
        history.record("1+1", "2");
        history.clear();
        assert!(history.is_empty());
        assert!(history.latest().is_none());
    }

    #[test]
    fn test_csv_export() {
        let mut history = History::new();
        history.push(HistoryEntry {
            expression: "5+3".to_string(),
            result: "8".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        });
        history.push(HistoryEntry {
            expression: "say \"hi\"".to_string(),
            result: "0".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 1).unwrap(),
        });

        let csv = history.to_csv();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], "Expression,Result,Timestamp");
        assert_eq!(lines[1], r#""say ""hi""","0","2024-05-01T12:00:01.000Z""#);
        assert_eq!(lines[2], r#""5+3","8","2024-05-01T12:00:00.000Z""#);
    }

    #[test]
    fn test_csv_empty_history_has_header() {
        assert_eq!(History::new().to_csv(), "Expression,Result,Timestamp\n");
    }
}
