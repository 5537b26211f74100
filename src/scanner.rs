use crate::error::{Error, Result};
use log::warn;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Directory walker that collects the source files a type model is loaded from.
///
/// Build output (`target`) and hidden directories are skipped. Additional directory
/// names can be excluded with [`SourceScanner::exclude`].
///
/// # Example
///
/// ```no_run
/// use apidoc_materializer::scanner::SourceScanner;
/// use std::path::PathBuf;
///
/// let scanner = SourceScanner::new(PathBuf::from("./my-service"));
/// let result = scanner.scan().unwrap();
/// println!("Found {} Rust files", result.rust_files.len());
/// ```
pub struct SourceScanner {
    root_path: PathBuf,
    excluded: Vec<String>,
}

/// Files found by a scan, plus the paths that could not be read.
pub struct ScanResult {
    pub rust_files: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

impl SourceScanner {
    pub fn new(root_path: PathBuf) -> Self {
        Self {
            root_path,
            excluded: vec!["target".to_string()],
        }
    }

    /// Skip every directory with this name
    pub fn exclude(mut self, dir_name: impl Into<String>) -> Self {
        self.excluded.push(dir_name.into());
        self
    }

    /// Walk the tree and collect every `.rs` file.
    ///
    /// A single `.rs` file given as the root is returned as-is. Unreadable entries
    /// below the root become warnings; a missing root is an error.
    pub fn scan(&self) -> Result<ScanResult> {
        if !self.root_path.exists() {
            return Err(Error::InvalidArgument(format!(
                "source path does not exist: {}",
                self.root_path.display()
            )));
        }

        let mut rust_files = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                if e.path() == self.root_path {
                    return true;
                }
                let file_name = e.file_name().to_string_lossy();
                let is_hidden = file_name.starts_with('.');
                let is_excluded =
                    e.file_type().is_dir() && self.excluded.iter().any(|d| *d == file_name);
                !is_hidden && !is_excluded
            })
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("rs") {
                        rust_files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        Ok(ScanResult {
            rust_files,
            warnings,
        })
    }
}
