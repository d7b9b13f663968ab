//! # Component Usage Loader
//!
//! Static usage analysis for single-file UI components. Only the library
//! components, directives and icons a template actually references get
//! registered on the component, so everything else in the library can be
//! tree-shaken away.
//!
//! ## Pipeline
//!
//! 1. **Bypass**: requests carrying a query string are sub-blocks of a
//!    component already processed as a whole and pass through untouched.
//! 2. **Extraction**: the template block (inline, external or rendered from
//!    another language) is parsed and every element visited once, collecting
//!    raw tag names, directive names and `$getIcon('...')` literals.
//! 3. **Resolution**: each raw name goes through its category's matcher
//!    chain (programmatic, declarative, built-in). First match wins; the
//!    result is sorted by registration key.
//! 4. **Injection**: one block per non-empty category is spliced into the
//!    host module before the hot-reload sentinel, in the order components,
//!    directives, icons. Each block calls a runtime helper that merges the
//!    registrations without overriding existing ones.
//!
//! The engine holds no state between files; one [`Loader`] may serve many
//! files concurrently.

#[cfg(feature = "napi")]
use napi_derive::napi;

pub mod ast;
pub mod codegen;
pub mod discovery;
pub mod error;
pub mod host;
pub mod loader;
pub mod matcher;
pub mod naming;
pub mod options;
pub mod parse;
pub mod resolve;
pub mod runtime;
pub mod sfc;
pub mod usage;
pub mod visitor;


pub use codegen::{CodeGenerator, InsertionPoint};
pub use discovery::{scan_directory, UsageReport};
pub use error::{LoaderError, Result};
pub use host::{FsHost, LoaderHost, Request};
pub use loader::{Analysis, Loader, ProcessOutput};
pub use matcher::{from_fn, Category, MatchResult, Matcher, MatcherChain, ResolvedImport, UsageContext};
pub use options::{LoaderOptions, OneOrMany, RuntimePaths};
pub use usage::{TemplateRenderer, TemplateUsage};

#[cfg(feature = "napi")]
fn to_napi_error(e: LoaderError) -> napi::Error {
    napi::Error::from_reason(format!("[{}] {}", e.code(), e))
}

#[cfg(feature = "napi")]
fn loader_from(options_json: Option<String>) -> napi::Result<Loader> {
    match options_json {
        Some(json) => Loader::from_json(&json),
        None => Loader::new(LoaderOptions::default()),
    }
    .map_err(to_napi_error)
}

/// Transform one host module. Returns the module source with registration
/// blocks injected, or unchanged when `resource_query` is non-empty.
#[cfg(feature = "napi")]
#[napi]
pub fn transform_component_native(
    content: String,
    resource_path: String,
    resource_query: Option<String>,
    root_context: String,
    options_json: Option<String>,
) -> napi::Result<String> {
    let loader = loader_from(options_json)?;
    let request =
        Request::new(resource_path, &root_context).with_query(resource_query.unwrap_or_default());
    let host = FsHost::with_root(root_context);
    loader
        .process(&host, &request, &content)
        .map_err(to_napi_error)
}

/// Source of a runtime helper (`installComponents`, `installDirectives`,
/// `installIcons`), for hosts that serve them as virtual modules.
#[cfg(feature = "napi")]
#[napi]
pub fn runtime_helper_native(name: String) -> Option<String> {
    runtime::helper_source_by_name(&name).map(str::to_string)
}

/// Usage report for every component under `root`.
#[cfg(feature = "napi")]
#[napi]
pub fn scan_usages_native(root: String, options_json: Option<String>) -> napi::Result<serde_json::Value> {
    let loader = loader_from(options_json)?;
    let report = scan_directory(std::path::Path::new(&root), &loader);
    serde_json::to_value(report).map_err(|e| napi::Error::from_reason(e.to_string()))
}
