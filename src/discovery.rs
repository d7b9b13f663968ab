//! Usage report over a source tree.
//!
//! Recursively scans a directory for `.vue` files and runs the analysis half
//! of the pipeline on each, in parallel. Files are independent, so one file
//! failing never stops the scan.

use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::host::{FsHost, LoaderHost, Request};
use crate::loader::{Analysis, Loader};
use crate::matcher::Category;

const COMPONENT_EXTENSION: &str = "vue";

/// Directories never descended into.
const SKIPPED_DIRS: &[&str] = &["node_modules", "dist"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileError {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    /// Path relative to the scanned root, `/`-separated.
    pub path: String,
    pub analysis: Option<Analysis>,
    pub error: Option<FileError>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageReport {
    /// Sorted by path.
    pub files: Vec<FileReport>,
}

impl UsageReport {
    pub fn failed(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| f.error.is_some())
    }

    /// How many files register each key of `category`.
    pub fn key_counts(&self, category: Category) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for analysis in self.files.iter().filter_map(|f| f.analysis.as_ref()) {
            for import in analysis.imports(category) {
                *counts.entry(import.key.clone()).or_insert(0) += 1;
            }
        }
        counts
    }
}

/// Scan `root` with a plain file-system host.
pub fn scan_directory(root: &Path, loader: &Loader) -> UsageReport {
    scan_directory_with(root, loader, &FsHost::with_root(root))
}

pub fn scan_directory_with(root: &Path, loader: &Loader, host: &dyn LoaderHost) -> UsageReport {
    if !root.is_dir() {
        tracing::warn!(root = %root.display(), "scan root is not a directory");
        return UsageReport::default();
    }

    let files = find_component_files(root);
    tracing::debug!(root = %root.display(), files = files.len(), "scanning components");

    let mut reports: Vec<FileReport> = files
        .par_iter()
        .map(|path| {
            let request = Request::new(path, root);
            let relative = request.relative_path();
            match loader.analyze(host, &request) {
                Ok(analysis) => FileReport {
                    path: relative,
                    analysis: Some(analysis),
                    error: None,
                },
                Err(e) => {
                    tracing::warn!(file = %relative, code = e.code(), error = %e, "analysis failed");
                    FileReport {
                        path: relative,
                        analysis: None,
                        error: Some(FileError {
                            code: e.code().to_string(),
                            message: e.to_string(),
                        }),
                    }
                }
            }
        })
        .collect();

    reports.sort_by(|a, b| a.path.cmp(&b.path));
    UsageReport { files: reports }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.') || SKIPPED_DIRS.contains(&name))
}

fn find_component_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| !is_skipped_dir(entry))
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .is_some_and(|ext| ext == COMPONENT_EXTENSION)
        })
        .map(|entry| entry.into_path())
        .collect()
}
