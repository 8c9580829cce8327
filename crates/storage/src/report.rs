//! Monthly detection statistics

use std::collections::{BTreeMap, HashMap};

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use warning::WarningLevel;

use crate::entry::DetectionLogEntry;

/// Occurrences of one object class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectCount {
    pub name: String,
    pub count: usize,
}

/// Detection statistics for one calendar month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u32,
    /// Logged events in the month
    pub total: usize,
    pub by_level: BTreeMap<WarningLevel, usize>,
    /// Most common first, ties broken by name
    pub by_object: Vec<ObjectCount>,
    /// Malformed log lines encountered while reading
    pub skipped_lines: usize,
}

impl MonthlyReport {
    /// Aggregate the entries whose local timestamp falls in `year`/`month`
    pub fn build(entries: &[DetectionLogEntry], year: i32, month: u32) -> Self {
        let mut by_level = BTreeMap::new();
        let mut objects: HashMap<String, usize> = HashMap::new();
        let mut total = 0;

        for entry in entries
            .iter()
            .filter(|e| e.timestamp.year() == year && e.timestamp.month() == month)
        {
            total += 1;
            *by_level.entry(entry.level).or_insert(0) += 1;
            for name in entry.object_names() {
                *objects.entry(name).or_insert(0) += 1;
            }
        }

        let mut by_object: Vec<ObjectCount> = objects
            .into_iter()
            .map(|(name, count)| ObjectCount { name, count })
            .collect();
        by_object.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

        Self {
            year,
            month,
            total,
            by_level,
            by_object,
            skipped_lines: 0,
        }
    }

    /// Carry over the reader's malformed-line count
    pub fn with_skipped(mut self, skipped: usize) -> Self {
        self.skipped_lines = skipped;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}
