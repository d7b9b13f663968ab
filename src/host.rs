//! Host pipeline boundary.
//!
//! The bundler owns file reads, module resolution and dependency tracking. The
//! engine reaches them only through [`LoaderHost`], so the same pipeline runs
//! inside a bundler binding, a test, or the directory scanner.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use crate::error::{LoaderError, Result};

/// The module being transformed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    /// Absolute path of the single-file component.
    pub resource_path: PathBuf,
    /// Query string of the request, including the leading `?` (empty if none).
    pub resource_query: String,
    /// Project root that `resource_path` is reported relative to.
    pub root_context: PathBuf,
}

impl Request {
    pub fn new(resource_path: impl Into<PathBuf>, root_context: impl Into<PathBuf>) -> Self {
        Request {
            resource_path: resource_path.into(),
            resource_query: String::new(),
            root_context: root_context.into(),
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.resource_query = query.into();
        self
    }

    /// Sub-block requests (`?vue&type=template`) belong to a component that
    /// was already processed as a whole.
    pub fn is_sub_request(&self) -> bool {
        !self.resource_query.is_empty()
    }

    /// Component path relative to the project root, `/`-separated.
    pub fn relative_path(&self) -> String {
        match self.resource_path.strip_prefix(&self.root_context) {
            Ok(relative) => relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
            Err(_) => self.resource_path.to_string_lossy().into_owned(),
        }
    }

    /// Directory that relative template references resolve from.
    pub fn context_dir(&self) -> &Path {
        self.resource_path.parent().unwrap_or(Path::new(""))
    }
}

pub trait LoaderHost: Sync {
    fn read_file(&self, path: &Path) -> Result<String>;

    /// Resolve `request` as written in a component, relative to `context`.
    fn resolve(&self, context: &Path, request: &str) -> Result<PathBuf>;

    /// Tell the host that the output depends on `path`.
    fn add_dependency(&self, _path: &Path) {}
}

/// Plain file-system host: relative requests resolve against the context
/// directory, everything else against the root.
#[derive(Debug, Default)]
pub struct FsHost {
    root: Option<PathBuf>,
    dependencies: Mutex<Vec<PathBuf>>,
}

impl FsHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bare requests (`components/foo.html`) resolve against `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        FsHost {
            root: Some(root.into()),
            ..Self::default()
        }
    }

    pub fn dependencies(&self) -> Vec<PathBuf> {
        self.dependencies
            .lock()
            .map(|deps| deps.clone())
            .unwrap_or_default()
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

impl LoaderHost for FsHost {
    fn read_file(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|source| LoaderError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    fn resolve(&self, context: &Path, request: &str) -> Result<PathBuf> {
        let request_path = Path::new(request);
        let base = if request.starts_with("./") || request.starts_with("../") {
            context
        } else {
            self.root.as_deref().unwrap_or(context)
        };
        let candidate = normalize(&base.join(request_path));

        if candidate.is_file() {
            Ok(candidate)
        } else {
            Err(LoaderError::Resolve {
                request: request.to_string(),
                context: context.to_path_buf(),
                reason: format!("{} does not exist", candidate.display()),
            })
        }
    }

    fn add_dependency(&self, path: &Path) {
        if let Ok(mut deps) = self.dependencies.lock() {
            deps.push(path.to_path_buf());
        }
    }
}
