// imgbatch/src/processors/batch.rs
use crate::core::{EmptyBatchPolicy, ImageOperation, ImageToolError, Quality, Result};
use crate::utils::{ensure_no_traversal, matches_pattern, DEFAULT_PATTERN};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// `;`-separated wildcard patterns matched against file names.
    pub pattern: String,
    pub recursive: bool,
    /// 1 runs sequentially; 0 uses the global rayon pool.
    pub threads: usize,
    pub quality: Quality,
    pub show_progress: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.to_string(),
            recursive: false,
            threads: 1,
            quality: Quality::default(),
            show_progress: false,
        }
    }
}

/// What happened to one enumerated file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchItemOutcome {
    pub source: PathBuf,
    pub target: PathBuf,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchResult {
    pub total_files: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub successful_paths: Vec<PathBuf>,
    pub failed_paths: Vec<PathBuf>,
    pub outcomes: Vec<BatchItemOutcome>,
    pub error_message: Option<String>,
}

impl BatchResult {
    fn aborted(message: impl Into<String>) -> Self {
        Self {
            error_message: Some(message.into()),
            ..Self::default()
        }
    }

    fn record(&mut self, outcome: BatchItemOutcome) {
        self.total_files += 1;
        if outcome.success {
            self.success_count += 1;
            self.successful_paths.push(outcome.target.clone());
        } else {
            self.failure_count += 1;
            self.failed_paths.push(outcome.source.clone());
        }
        self.outcomes.push(outcome);
    }

    pub fn is_success(&self) -> bool {
        self.failure_count == 0 && self.error_message.is_none()
    }
}

/// Runs one [`ImageOperation`] over every matching file of a directory.
///
/// Every enumerated file produces exactly one outcome; a failing file never
/// stops the rest of the batch.
pub struct BatchProcessor {
    options: BatchOptions,
    thread_pool: Option<rayon::ThreadPool>,
}

impl BatchProcessor {
    pub fn new(options: BatchOptions) -> Result<Self> {
        let thread_pool = if options.threads > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(options.threads)
                .build()
                .map_err(|e| {
                    ImageToolError::ProcessingError(format!("Failed to create thread pool: {}", e))
                })?;
            Some(pool)
        } else {
            None
        };

        Ok(Self {
            options,
            thread_pool,
        })
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    pub fn run(&self, source_dir: &Path, output_dir: &Path, operation: &dyn ImageOperation) -> BatchResult {
        if let Err(e) = self.validate_paths(source_dir, output_dir) {
            log::error!("Batch {} aborted: {}", operation.name(), e);
            return BatchResult::aborted(e.to_string());
        }

        if let Err(e) = std::fs::create_dir_all(output_dir) {
            log::error!("Cannot create {}: {}", output_dir.display(), e);
            return BatchResult::aborted(format!(
                "Cannot create output directory {}: {}",
                output_dir.display(),
                e
            ));
        }

        let sources = self.collect_image_paths(source_dir, output_dir);
        if sources.is_empty() {
            log::warn!(
                "No files matching '{}' in {}",
                self.options.pattern,
                source_dir.display()
            );
            return match operation.empty_batch_policy() {
                EmptyBatchPolicy::Error => BatchResult::aborted(format!(
                    "No files matching '{}' found in {}",
                    self.options.pattern,
                    source_dir.display()
                )),
                EmptyBatchPolicy::EmptySuccess => BatchResult::default(),
            };
        }

        log::info!(
            "Running {} on {} files from {}",
            operation.name(),
            sources.len(),
            source_dir.display()
        );

        let pb = self.create_progress_bar(sources.len());
        let process = |source: &PathBuf| {
            let outcome = self.process_item(operation, source, source_dir, output_dir);
            pb.inc(1);
            outcome
        };

        let outcomes: Vec<BatchItemOutcome> = match (&self.thread_pool, self.options.threads) {
            (Some(pool), _) => pool.install(|| sources.par_iter().map(process).collect()),
            (None, 0) => sources.par_iter().map(process).collect(),
            (None, _) => sources.iter().map(process).collect(),
        };

        let mut result = BatchResult::default();
        for outcome in outcomes {
            result.record(outcome);
        }

        pb.finish_with_message(format!(
            "{} succeeded, {} failed",
            result.success_count, result.failure_count
        ));
        log::info!(
            "Batch {} finished: {}/{} succeeded",
            operation.name(),
            result.success_count,
            result.total_files
        );

        result
    }

    fn process_item(
        &self,
        operation: &dyn ImageOperation,
        source: &Path,
        source_dir: &Path,
        output_dir: &Path,
    ) -> BatchItemOutcome {
        // Recursive runs mirror the source tree below the output directory.
        let target_dir = source
            .parent()
            .and_then(|parent| parent.strip_prefix(source_dir).ok())
            .map(|relative| output_dir.join(relative))
            .unwrap_or_else(|| output_dir.to_path_buf());
        let target = operation.target_path(source, &target_dir);

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            operation.process_one(source, &target, self.options.quality)
        }));

        let error = match result {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(payload) => Some(panic_message(payload.as_ref())),
        };

        if let Some(message) = &error {
            log::warn!("Failed to process {}: {}", source.display(), message);
        } else {
            log::debug!("{} -> {}", source.display(), target.display());
        }

        BatchItemOutcome {
            source: source.to_path_buf(),
            target,
            success: error.is_none(),
            error,
        }
    }

    fn collect_image_paths(&self, source_dir: &Path, output_dir: &Path) -> Vec<PathBuf> {
        let walker = if self.options.recursive {
            WalkDir::new(source_dir)
        } else {
            WalkDir::new(source_dir).max_depth(1)
        };

        let mut paths: Vec<PathBuf> = walker
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || entry.path() != output_dir)
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .map(|name| matches_pattern(name, &self.options.pattern))
                    .unwrap_or(false)
            })
            .map(|entry| entry.into_path())
            .collect();

        paths.sort();
        paths
    }

    fn create_progress_bar(&self, total: usize) -> ProgressBar {
        if !self.options.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(total as u64);
        match ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
        {
            Ok(style) => pb.set_style(style.progress_chars("#>-")),
            Err(e) => log::debug!("Falling back to default progress style: {}", e),
        }
        pb
    }

    pub fn validate_paths(&self, source_dir: &Path, output_dir: &Path) -> Result<()> {
        ensure_no_traversal(source_dir, "source")?;
        ensure_no_traversal(output_dir, "output")?;

        if !source_dir.exists() {
            return Err(ImageToolError::InvalidParameter(format!(
                "Source directory does not exist: {}",
                source_dir.display()
            )));
        }

        if !source_dir.is_dir() {
            return Err(ImageToolError::InvalidParameter(format!(
                "Source path is not a directory: {}",
                source_dir.display()
            )));
        }

        if output_dir.exists() && !output_dir.is_dir() {
            return Err(ImageToolError::InvalidParameter(format!(
                "Output path exists but is not a directory: {}",
                output_dir.display()
            )));
        }

        // Name-preserving operations would overwrite their own inputs.
        if source_dir == output_dir {
            return Err(ImageToolError::InvalidParameter(
                "Source and output directories cannot be the same".to_string(),
            ));
        }

        Ok(())
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {}", s)
    } else {
        "panic while processing image".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Copies files, failing on any whose name contains "bad".
    struct CopyOp {
        policy: EmptyBatchPolicy,
        seen: Mutex<Vec<PathBuf>>,
    }

    impl CopyOp {
        fn new(policy: EmptyBatchPolicy) -> Self {
            Self {
                policy,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl ImageOperation for CopyOp {
        fn name(&self) -> &'static str {
            "copy"
        }

        fn process_one(&self, source: &Path, target: &Path, _quality: Quality) -> Result<()> {
            self.seen.lock().unwrap().push(source.to_path_buf());
            let name = source.file_name().unwrap().to_string_lossy();
            if name.contains("bad") {
                return Err(ImageToolError::ProcessingError("bad input".into()));
            }
            if name.contains("panic") {
                panic!("boom");
            }
            std::fs::create_dir_all(target.parent().unwrap())?;
            std::fs::copy(source, target)?;
            Ok(())
        }

        fn empty_batch_policy(&self) -> EmptyBatchPolicy {
            self.policy
        }
    }

    fn touch(dir: &Path, names: &[&str]) {
        for name in names {
            let path = dir.join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, b"x").unwrap();
        }
    }

    fn processor(options: BatchOptions) -> BatchProcessor {
        BatchProcessor::new(options).unwrap()
    }

    #[test]
    fn missing_source_short_circuits() {
        let tmp = TempDir::new().unwrap();
        let op = CopyOp::new(EmptyBatchPolicy::EmptySuccess);
        let result = processor(BatchOptions::default()).run(
            &tmp.path().join("missing"),
            &tmp.path().join("out"),
            &op,
        );
        assert_eq!(result.total_files, 0);
        assert!(result.outcomes.is_empty());
        assert!(result.error_message.unwrap().contains("does not exist"));
        assert!(op.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn empty_batch_follows_operation_policy() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        touch(&src, &["notes.txt"]);
        let out = tmp.path().join("out");
        let batch = processor(BatchOptions::default());

        let strict = batch.run(&src, &out, &CopyOp::new(EmptyBatchPolicy::Error));
        assert_eq!(strict.total_files, 0);
        assert!(strict.error_message.is_some());
        assert!(!strict.is_success());

        let lenient = batch.run(&src, &out, &CopyOp::new(EmptyBatchPolicy::EmptySuccess));
        assert_eq!(lenient, BatchResult::default());
        assert!(lenient.is_success());
        assert!(out.is_dir());
    }

    #[test]
    fn failures_are_isolated_per_file() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        touch(&src, &["a.jpg", "bad.jpg", "c.jpg", "d.png", "skip.txt"]);
        let out = tmp.path().join("out");

        let result = processor(BatchOptions::default()).run(&src, &out, &CopyOp::new(EmptyBatchPolicy::Error));

        assert_eq!(result.total_files, 4);
        assert_eq!(result.success_count, 3);
        assert_eq!(result.failure_count, 1);
        assert_eq!(result.success_count + result.failure_count, result.total_files);
        assert_eq!(result.failed_paths, vec![src.join("bad.jpg")]);
        assert!(out.join("a.jpg").exists());
        assert!(out.join("c.jpg").exists());
        assert!(!out.join("bad.jpg").exists());
        assert_eq!(result.outcomes.len(), 4);
        assert_eq!(result.outcomes[1].error.as_deref(), Some("Processing error: bad input"));
    }

    #[test]
    fn panics_become_failures() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        touch(&src, &["ok.png", "panic.png"]);

        let result = processor(BatchOptions::default()).run(
            &src,
            &tmp.path().join("out"),
            &CopyOp::new(EmptyBatchPolicy::Error),
        );
        assert_eq!((result.success_count, result.failure_count), (1, 1));
        assert!(result.outcomes[1].error.as_ref().unwrap().contains("boom"));
    }

    #[test]
    fn pattern_filters_and_recursion_mirrors_tree() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        touch(&src, &["a.png", "b.jpg", "nested/c.png"]);
        let out = tmp.path().join("out");

        let flat = processor(BatchOptions {
            pattern: "*.png".into(),
            ..BatchOptions::default()
        })
        .run(&src, &out, &CopyOp::new(EmptyBatchPolicy::Error));
        assert_eq!(flat.total_files, 1);

        let deep = processor(BatchOptions {
            pattern: "*.png".into(),
            recursive: true,
            ..BatchOptions::default()
        })
        .run(&src, &out, &CopyOp::new(EmptyBatchPolicy::Error));
        assert_eq!(deep.total_files, 2);
        assert!(out.join("nested").join("c.png").exists());
    }

    #[test]
    fn output_inside_source_is_not_reprocessed() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        touch(&src, &["a.png", "out/old.png"]);

        let result = processor(BatchOptions {
            recursive: true,
            ..BatchOptions::default()
        })
        .run(&src, &src.join("out"), &CopyOp::new(EmptyBatchPolicy::Error));
        assert_eq!(result.total_files, 1);
    }

    #[test]
    fn parallel_run_keeps_enumeration_order() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let names: Vec<String> = (0..20).map(|i| format!("img{:02}.jpg", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        touch(&src, &refs);

        let result = processor(BatchOptions {
            threads: 4,
            ..BatchOptions::default()
        })
        .run(&src, &tmp.path().join("out"), &CopyOp::new(EmptyBatchPolicy::Error));

        assert_eq!(result.success_count, 20);
        let sources: Vec<PathBuf> = result.outcomes.iter().map(|o| o.source.clone()).collect();
        let mut sorted = sources.clone();
        sorted.sort();
        assert_eq!(sources, sorted);
    }

    #[test]
    fn same_source_and_output_is_rejected() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), &["a.jpg"]);
        let result = processor(BatchOptions::default()).run(
            tmp.path(),
            tmp.path(),
            &CopyOp::new(EmptyBatchPolicy::Error),
        );
        assert_eq!(result.total_files, 0);
        assert!(result.error_message.is_some());
    }
}
