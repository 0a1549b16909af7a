use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Local;

use crate::models::error::CaptureError;

/// Process-wide sequence appended to every generated name.
static SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Where an output file goes. The engine appends its own extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub directory: PathBuf,
    pub file_stem: String,
}

impl OutputTarget {
    /// Resolve the final path for a container extension (without dot).
    pub fn with_extension(&self, extension: &str) -> PathBuf {
        self.directory.join(format!("{}.{}", self.file_stem, extension))
    }

    /// Create the target directory if it does not exist yet.
    pub fn ensure_directory(&self) -> Result<(), CaptureError> {
        fs::create_dir_all(&self.directory)
            .map_err(|e| CaptureError::StorageError(format!("failed to create directory: {}", e)))
    }
}

/// Generate a unique output target inside `directory`.
///
/// Names combine a millisecond timestamp with a monotonic sequence number,
/// so two recordings started within the same millisecond still differ.
pub fn next_output_target(directory: &Path) -> OutputTarget {
    let seq = SEQUENCE.fetch_add(1, Ordering::SeqCst);
    let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S-%3f");
    OutputTarget {
        directory: directory.to_path_buf(),
        file_stem: format!("{}-{}", stamp, seq),
    }
}
