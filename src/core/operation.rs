// imgbatch/src/core/operation.rs
use super::{Quality, Result};
use std::path::{Path, PathBuf};

/// What a batch reports when its pattern matched nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyBatchPolicy {
    /// `error_message` is set; the batch is not a success.
    Error,
    /// Zero counts and no message.
    EmptySuccess,
}

/// The narrow capability the batch harness needs from an operation.
///
/// Operations expose richer, operation-specific methods on their own types;
/// this trait only covers "process one file into one target".
pub trait ImageOperation: Sync {
    /// Short name used in logs and HTTP routes.
    fn name(&self) -> &'static str;

    fn process_one(&self, source: &Path, target: &Path, quality: Quality) -> Result<()>;

    /// Where the output for `source` lands inside `output_dir`.
    fn target_path(&self, source: &Path, output_dir: &Path) -> PathBuf {
        match source.file_name() {
            Some(name) => output_dir.join(name),
            None => output_dir.join("image"),
        }
    }

    fn empty_batch_policy(&self) -> EmptyBatchPolicy {
        EmptyBatchPolicy::EmptySuccess
    }
}
