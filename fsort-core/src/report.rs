//! Run summary

use crate::category::Category;
use crate::relocate::BatchOutcome;
use crate::scanner::ScanStats;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Summary of one sorting run
#[derive(Debug, Clone, Serialize)]
pub struct SortReport {
    /// Folder that was sorted
    pub root: PathBuf,
    /// Output root
    pub output_dir: PathBuf,
    /// Run start time
    pub started_at: DateTime<Utc>,
    /// Wall time of the run
    pub elapsed_ms: u64,
    /// Scan counters
    pub scan: ScanStats,
    /// Per-category outcome
    pub categories: BTreeMap<Category, BatchOutcome>,
    /// Tasks that panicked
    pub task_failures: usize,
    /// Known extensions seen (upper-case)
    pub extensions: BTreeSet<String>,
    /// Unrecognized extensions (upper-case)
    pub unknown_extensions: BTreeSet<String>,
}

impl SortReport {
    /// Files moved into non-archive folders
    pub fn moved(&self) -> usize {
        self.categories
            .iter()
            .filter(|(category, _)| !category.is_archive())
            .map(|(_, outcome)| outcome.succeeded)
            .sum()
    }

    /// Archives unpacked
    pub fn unpacked(&self) -> usize {
        self.outcome(Category::Archive).succeeded
    }

    /// Items left in place
    pub fn failed(&self) -> usize {
        self.categories.values().map(|outcome| outcome.failed).sum()
    }

    /// Unpacked archives whose source is still present
    pub fn not_deleted(&self) -> usize {
        self.outcome(Category::Archive).not_deleted
    }

    /// Outcome for one category
    pub fn outcome(&self, category: Category) -> BatchOutcome {
        self.categories.get(&category).copied().unwrap_or_default()
    }

    /// True when nothing failed
    pub fn is_clean(&self) -> bool {
        self.failed() == 0 && self.not_deleted() == 0 && self.task_failures == 0 && self.scan.skipped == 0
    }
}

#[derive(Debug, Default)]
struct CategoryCounters {
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    not_deleted: AtomicUsize,
}

/// Shared counters the category tasks report into
#[derive(Debug, Default)]
pub(crate) struct ReportCollector {
    counters: [CategoryCounters; Category::COUNT],
    task_failures: AtomicUsize,
}

impl ReportCollector {
    pub(crate) fn record(&self, category: Category, outcome: BatchOutcome) {
        let counters = &self.counters[category.index()];
        counters.succeeded.fetch_add(outcome.succeeded, Ordering::Relaxed);
        counters.failed.fetch_add(outcome.failed, Ordering::Relaxed);
        counters.not_deleted.fetch_add(outcome.not_deleted, Ordering::Relaxed);
    }

    pub(crate) fn task_failed(&self) {
        self.task_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn outcomes(&self) -> BTreeMap<Category, BatchOutcome> {
        Category::ALL
            .iter()
            .map(|category| {
                let counters = &self.counters[category.index()];
                let outcome = BatchOutcome {
                    succeeded: counters.succeeded.load(Ordering::Relaxed),
                    failed: counters.failed.load(Ordering::Relaxed),
                    not_deleted: counters.not_deleted.load(Ordering::Relaxed),
                };
                (*category, outcome)
            })
            .collect()
    }

    pub(crate) fn task_failures(&self) -> usize {
        self.task_failures.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(collector: &ReportCollector) -> SortReport {
        SortReport {
            root: PathBuf::from("in"),
            output_dir: PathBuf::from("result"),
            started_at: Utc::now(),
            elapsed_ms: 0,
            scan: ScanStats::default(),
            categories: collector.outcomes(),
            task_failures: collector.task_failures(),
            extensions: BTreeSet::new(),
            unknown_extensions: BTreeSet::new(),
        }
    }

    #[test]
    fn test_collector_accumulates() {
        let collector = ReportCollector::default();
        collector.record(Category::Image, BatchOutcome { succeeded: 2, failed: 1, not_deleted: 0 });
        collector.record(Category::Image, BatchOutcome { succeeded: 3, failed: 0, not_deleted: 0 });
        collector.record(Category::Archive, BatchOutcome { succeeded: 1, failed: 1, not_deleted: 1 });

        let report = report(&collector);
        assert_eq!(report.outcome(Category::Image).succeeded, 5);
        assert_eq!(report.moved(), 5);
        assert_eq!(report.unpacked(), 1);
        assert_eq!(report.failed(), 2);
        assert_eq!(report.not_deleted(), 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_collector_from_threads() {
        let collector = ReportCollector::default();
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    collector.record(Category::Audio, BatchOutcome { succeeded: 1, ..Default::default() });
                    collector.task_failed();
                });
            }
        });
        let report = report(&collector);
        assert_eq!(report.outcome(Category::Audio).succeeded, 4);
        assert_eq!(report.task_failures, 4);
    }

    #[test]
    fn test_empty_report_is_clean() {
        let report = report(&ReportCollector::default());
        assert!(report.is_clean());
        assert_eq!(report.categories.len(), Category::COUNT);
    }

    #[test]
    fn test_report_serializes() {
        let report = report(&ReportCollector::default());
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["categories"]["image"].is_object());
        assert_eq!(json["task_failures"], 0);
    }
}
