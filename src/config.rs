//! Dataset layout and tunables shared by the snippet commands.

use std::path::{Path, PathBuf};

pub const DEFAULT_DATASETS_DIR: &str = "datasets";
pub const DEFAULT_MARKER: &str = "Query";
pub const DEFAULT_MAX_SNIPPET_SIZE: usize = 2048;

/// Where the dataset files live and how snippets are selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetConfig {
    pub root: PathBuf,
    /// Annotation a method must carry for its file to be kept.
    pub marker: String,
    /// Snippets longer than this many characters are dropped.
    pub max_snippet_size: usize,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_DATASETS_DIR),
            marker: DEFAULT_MARKER.to_string(),
            max_snippet_size: DEFAULT_MAX_SNIPPET_SIZE,
        }
    }
}

impl DatasetConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    pub fn with_max_snippet_size(mut self, size: usize) -> Self {
        self.max_snippet_size = size;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn rawdump_dir(&self) -> PathBuf {
        self.root.join("rawdump")
    }

    pub fn filtered_file(&self) -> PathBuf {
        self.root.join("filtered.json")
    }

    pub fn split_file(&self) -> PathBuf {
        self.root.join("split.json")
    }

    pub fn types_file(&self) -> PathBuf {
        self.root.join("types.json")
    }

    pub fn database_file(&self) -> PathBuf {
        self.root.join("data.db")
    }

    pub fn arrow_file(&self) -> PathBuf {
        self.root.join("rawdump.arrow")
    }

    /// Default output for a parsed API collection, keyed by the input stem.
    pub fn api_output_file(&self, collection: &Path) -> PathBuf {
        let stem = collection
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "collection".to_string());
        self.root.join("api").join(format!("{stem}.json"))
    }
}
