//! Run orchestration
//!
//! A run has two phases:
//! 1. scan the whole tree into a fresh [`ScanState`];
//! 2. dispatch: every folder gets six category tasks over its own files,
//!    plus one recursive task per child folder, all on a single bounded
//!    work-stealing pool.
//!
//! Every file belongs to exactly one folder, so it is handled by exactly one
//! category task.

use crate::archive;
use crate::category::Category;
use crate::config::SortConfig;
use crate::relocate::{self, BatchOutcome};
use crate::report::{ReportCollector, SortReport};
use crate::scanner::{FileRecord, ScanState, ScanStats, TreeScanner};
use crate::{Result, SortError};
use chrono::Utc;
use rayon::{Scope, ThreadPool, ThreadPoolBuilder};
use std::any::Any;
use std::collections::HashMap;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::time::Instant;

/// Work assigned to one folder
#[derive(Debug, Default)]
pub struct FolderPlan<'a> {
    /// Files directly in this folder, per category, in walk order
    pub batches: [Vec<&'a FileRecord>; Category::COUNT],
    /// Child folders to process recursively
    pub children: Vec<&'a Path>,
}

/// Folder tree with per-folder batches, derived from a finished scan
#[derive(Debug)]
pub struct DispatchPlan<'a> {
    root: &'a Path,
    folders: HashMap<&'a Path, FolderPlan<'a>>,
}

impl<'a> DispatchPlan<'a> {
    /// Build the plan for `root` from a completed scan
    pub fn build(root: &'a Path, state: &'a ScanState) -> Self {
        let mut folders: HashMap<&'a Path, FolderPlan<'a>> = HashMap::new();
        let mut order: Vec<&'a Path> = Vec::new();

        folders.insert(root, FolderPlan::default());
        for folder in state.folders() {
            if !folders.contains_key(folder.as_path()) {
                folders.insert(folder.as_path(), FolderPlan::default());
                order.push(folder.as_path());
            }
        }

        for category in Category::ALL {
            for record in state.bucket(category) {
                let folder = record.folder.as_path();
                if !folders.contains_key(folder) {
                    folders.insert(folder, FolderPlan::default());
                    order.push(folder);
                }
                if let Some(plan) = folders.get_mut(folder) {
                    plan.batches[category.index()].push(record);
                }
            }
        }

        // Link each folder under its parent; anything whose parent is not
        // part of the plan hangs off the root so it is still reached.
        for folder in order {
            let parent = folder
                .parent()
                .filter(|parent| folders.contains_key(parent))
                .unwrap_or(root);
            if let Some(plan) = folders.get_mut(parent) {
                plan.children.push(folder);
            }
        }

        Self { root, folders }
    }

    /// Root folder of the plan
    pub fn root(&self) -> &'a Path {
        self.root
    }

    /// Plan for one folder
    pub fn folder(&self, path: &Path) -> Option<&FolderPlan<'a>> {
        self.folders.get(path)
    }

    /// Number of folders in the plan, root included
    pub fn folder_count(&self) -> usize {
        self.folders.len()
    }
}

/// Sorts folders into category output folders on a bounded worker pool.
///
/// The pool is built once and reused for every run; each run owns its own
/// scan state, so runs on disjoint roots do not interfere.
pub struct Sorter {
    config: SortConfig,
    pool: ThreadPool,
}

impl Sorter {
    /// Create a sorter, validating the config and building the pool
    pub fn new(config: SortConfig) -> Result<Self> {
        config.validate()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.concurrency)
            .thread_name(|i| format!("fsort-worker-{}", i))
            .build()?;

        Ok(Self { config, pool })
    }

    /// Configuration in use
    pub fn config(&self) -> &SortConfig {
        &self.config
    }

    /// Scan `root` and sort everything under it.
    ///
    /// Only setup problems are returned as errors; per-file failures are
    /// logged and counted in the report.
    pub fn run(&self, root: &Path) -> Result<SortReport> {
        let started_at = Utc::now();
        let start = Instant::now();

        if !root.is_dir() {
            return Err(SortError::NotADirectory(root.to_path_buf()));
        }
        fs::create_dir_all(&self.config.output_dir)?;

        tracing::info!("Sorting {:?} into {:?}", root, self.config.output_dir);

        let mut state = ScanState::new();
        let scan = self.scan(root, &mut state)?;

        let collector = ReportCollector::default();
        if state.is_empty() {
            tracing::info!("Nothing to sort in {:?}", root);
        } else {
            self.dispatch(root, &state, &collector);
        }

        let report = SortReport {
            root: root.to_path_buf(),
            output_dir: self.config.output_dir.clone(),
            started_at,
            elapsed_ms: start.elapsed().as_millis() as u64,
            scan,
            categories: collector.outcomes(),
            task_failures: collector.task_failures(),
            extensions: state.extensions().clone(),
            unknown_extensions: state.unknown_extensions().clone(),
        };

        tracing::info!(
            "Done: {} moved, {} unpacked, {} failed in {} ms",
            report.moved(),
            report.unpacked(),
            report.failed(),
            report.elapsed_ms
        );
        if !report.unknown_extensions.is_empty() {
            tracing::info!(
                "Unknown extensions: {}",
                report.unknown_extensions.iter().cloned().collect::<Vec<_>>().join(", ")
            );
        }

        Ok(report)
    }

    /// Phase 1: fill `state` from the tree under `root`
    pub fn scan(&self, root: &Path, state: &mut ScanState) -> Result<ScanStats> {
        let scanner = TreeScanner::from_config(&self.config);
        if self.config.parallel_scan {
            self.pool.install(|| scanner.scan_parallel(root, state))
        } else {
            scanner.scan(root, state)
        }
    }

    /// Phase 2: run every folder's category tasks. Returns when all are done.
    fn dispatch(&self, root: &Path, state: &ScanState, collector: &ReportCollector) {
        let plan = DispatchPlan::build(root, state);
        tracing::debug!("Dispatching {} folders", plan.folder_count());

        self.pool.scope(|scope| self.process(scope, plan.root(), &plan, collector));
    }

    fn process<'s>(
        &'s self,
        scope: &Scope<'s>,
        folder: &'s Path,
        plan: &'s DispatchPlan<'s>,
        collector: &'s ReportCollector,
    ) {
        let Some(entry) = plan.folder(folder) else {
            return;
        };

        for &child in &entry.children {
            scope.spawn(move |scope| self.process(scope, child, plan, collector));
        }

        for category in Category::ALL {
            let batch = &entry.batches[category.index()];
            scope.spawn(move |_| self.run_category(category, batch, collector));
        }
    }

    fn run_category(&self, category: Category, batch: &[&FileRecord], collector: &ReportCollector) {
        let dest = self.config.target_dir(category);
        run_isolated(category, collector, || process_batch(category, batch, &dest));
    }
}

/// Run one category task, turning a panic into a counted task failure.
fn run_isolated<F>(category: Category, collector: &ReportCollector, task: F)
where
    F: FnOnce() -> BatchOutcome,
{
    match panic::catch_unwind(AssertUnwindSafe(task)) {
        Ok(outcome) => collector.record(category, outcome),
        Err(payload) => {
            tracing::error!("{} task panicked: {}", category, panic_message(payload.as_ref()));
            collector.task_failed();
        }
    }
}

/// Process one category batch into `dest`
pub fn process_batch(category: Category, batch: &[&FileRecord], dest: &Path) -> BatchOutcome {
    let records = batch.iter().copied();
    match category {
        Category::Archive => archive::unpack(records, dest),
        Category::Image
        | Category::Audio
        | Category::Video
        | Category::Document
        | Category::Other => relocate::relocate(records, dest),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic"
    }
}

/// Sort `root` with a one-off [`Sorter`]
pub fn sort_folder(root: &Path, config: SortConfig) -> Result<SortReport> {
    Sorter::new(config)?.run(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn state_with(paths: &[&str], folders: &[&str]) -> ScanState {
        let mut state = ScanState::new();
        for folder in folders {
            state.add_folder(PathBuf::from(folder));
        }
        for path in paths {
            state.add_file(PathBuf::from(path));
        }
        state
    }

    #[test]
    fn test_plan_groups_by_folder() {
        let state = state_with(
            &["/in/a.jpg", "/in/b.mp3", "/in/x/c.jpg", "/in/x/y/d.zip"],
            &["/in/x", "/in/x/y"],
        );
        let root = Path::new("/in");
        let plan = DispatchPlan::build(root, &state);

        assert_eq!(plan.folder_count(), 3);
        let top = plan.folder(root).unwrap();
        assert_eq!(top.batches[Category::Image.index()].len(), 1);
        assert_eq!(top.batches[Category::Audio.index()].len(), 1);
        assert_eq!(top.children, vec![Path::new("/in/x")]);

        let x = plan.folder(Path::new("/in/x")).unwrap();
        assert_eq!(x.children, vec![Path::new("/in/x/y")]);
        assert_eq!(x.batches[Category::Image.index()].len(), 1);

        let y = plan.folder(Path::new("/in/x/y")).unwrap();
        assert_eq!(y.batches[Category::Archive.index()].len(), 1);
        assert!(y.children.is_empty());
    }

    #[test]
    fn test_plan_covers_every_record_once() {
        let state = state_with(
            &["/in/a.txt", "/in/x/b.txt", "/in/x/c.png", "/in/z/d"],
            &["/in/x", "/in/z"],
        );
        let root = Path::new("/in");
        let plan = DispatchPlan::build(root, &state);

        let mut seen = Vec::new();
        let mut stack = vec![root];
        while let Some(folder) = stack.pop() {
            let entry = plan.folder(folder).unwrap();
            for batch in &entry.batches {
                seen.extend(batch.iter().map(|r| r.path.clone()));
            }
            stack.extend(entry.children.iter().copied());
        }
        seen.sort();
        assert_eq!(seen.len(), state.file_count());
        seen.dedup();
        assert_eq!(seen.len(), state.file_count());
    }

    #[test]
    fn test_orphan_folder_attaches_to_root() {
        let state = state_with(&["/elsewhere/a.txt"], &[]);
        let root = Path::new("/in");
        let plan = DispatchPlan::build(root, &state);

        assert_eq!(plan.folder(root).unwrap().children, vec![Path::new("/elsewhere")]);
    }

    #[test]
    fn test_sorter_rejects_bad_config() {
        let result = Sorter::new(SortConfig::new().with_concurrency(0));
        assert!(matches!(result, Err(SortError::Config(_))));
    }

    #[test]
    fn test_sorter_keeps_config() {
        let config = SortConfig::new().with_concurrency(2).with_output_dir("sorted");
        let sorter = Sorter::new(config).unwrap();
        assert_eq!(sorter.config().concurrency, 2);
        assert_eq!(sorter.config().output_dir, PathBuf::from("sorted"));
    }

    #[test]
    fn test_panicking_task_is_isolated() {
        let collector = ReportCollector::default();

        run_isolated(Category::Image, &collector, || panic!("disk on fire"));
        run_isolated(Category::Audio, &collector, || BatchOutcome {
            succeeded: 3,
            ..Default::default()
        });

        assert_eq!(collector.task_failures(), 1);
        let outcomes = collector.outcomes();
        assert_eq!(outcomes[&Category::Image], BatchOutcome::default());
        assert_eq!(outcomes[&Category::Audio].succeeded, 3);
    }

    #[test]
    fn test_panic_inside_pool_does_not_stop_siblings() {
        let sorter = Sorter::new(SortConfig::new().with_concurrency(2)).unwrap();
        let collector = ReportCollector::default();

        sorter.pool.scope(|scope| {
            scope.spawn(|_| run_isolated(Category::Video, &collector, || panic!("boom")));
            for category in [Category::Document, Category::Other] {
                let collector = &collector;
                scope.spawn(move |_| {
                    run_isolated(category, collector, || BatchOutcome {
                        succeeded: 1,
                        ..Default::default()
                    })
                });
            }
        });

        assert_eq!(collector.task_failures(), 1);
        assert_eq!(collector.outcomes()[&Category::Document].succeeded, 1);
        assert_eq!(collector.outcomes()[&Category::Other].succeeded, 1);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
