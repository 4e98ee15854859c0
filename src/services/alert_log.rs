use std::collections::VecDeque;
use std::sync::Mutex;

use crate::models::AlertEntry;

pub const ALERT_LOG_CAPACITY: usize = 50;

/// Bounded in-memory alert buffer; the oldest entry is evicted on overflow.
///
/// Nothing inside this service raises alerts. Producers are external.
pub struct AlertLog {
    entries: Mutex<VecDeque<AlertEntry>>,
    capacity: usize,
}

impl AlertLog {
    pub fn new() -> Self {
        Self::with_capacity(ALERT_LOG_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: Mutex::new(VecDeque::with_capacity(capacity)), capacity }
    }

    pub fn push(&self, entry: AlertEntry) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Entries, most recent first
    pub fn recent(&self) -> Vec<AlertEntry> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.iter().rev().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for AlertLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AlertLevel;

    fn entry(i: usize) -> AlertEntry {
        AlertEntry::new(AlertLevel::Warning, "cpu", format!("alert {}", i))
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let log = AlertLog::new();
        for i in 0..200 {
            log.push(entry(i));
            assert!(log.len() <= ALERT_LOG_CAPACITY);
        }
        assert_eq!(log.len(), ALERT_LOG_CAPACITY);
    }

    #[test]
    fn test_fifty_first_entry_evicts_oldest() {
        let log = AlertLog::new();
        for i in 1..=51 {
            log.push(entry(i));
        }

        let recent = log.recent();
        assert_eq!(recent.len(), 50);
        assert_eq!(recent.first().unwrap().message, "alert 51");
        assert_eq!(recent.last().unwrap().message, "alert 2");
        assert!(recent.iter().all(|a| a.message != "alert 1"));
    }

    #[test]
    fn test_empty_log() {
        let log = AlertLog::default();
        assert!(log.is_empty());
        assert!(log.recent().is_empty());
        assert_eq!(log.capacity(), 50);
    }
}
