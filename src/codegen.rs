//! Codegen module
//!
//! Builds the registration block for one category and splices it into the
//! module source produced by the host's component compiler.
//!
//! Generated block layout:
//!
//! ```text
//! /* vuetify-loader */
//! import installComponents from "!<runtime path>"
//! import { VBtn } from 'vuetify/lib'
//! installComponents(component, {VBtn})
//! ```
//!
//! `component` is the binding the host module already declares for the
//! component definition.

use oxc_allocator::Allocator;
use oxc_ast::ast::{ImportDeclarationSpecifier, Statement};
use oxc_parser::Parser;
use oxc_span::SourceType;
use std::collections::HashSet;

use crate::matcher::{Category, ResolvedImport};
use crate::options::{LoaderOptions, RuntimePaths, DEFAULT_MARKER, DEFAULT_SENTINEL};

/// Where a generated block goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionPoint {
    /// Before the first occurrence of the sentinel, else at the end.
    Sentinel,
    /// Before this byte offset of the current source.
    Offset(usize),
    End,
}

#[derive(Debug, Clone)]
pub struct CodeGenerator {
    runtime: RuntimePaths,
    sentinel: String,
    marker: String,
}

impl Default for CodeGenerator {
    fn default() -> Self {
        CodeGenerator::new(RuntimePaths::default(), DEFAULT_SENTINEL, DEFAULT_MARKER)
    }
}

impl CodeGenerator {
    pub fn new(runtime: RuntimePaths, sentinel: &str, marker: &str) -> Self {
        CodeGenerator {
            runtime,
            sentinel: sentinel.to_string(),
            marker: marker.to_string(),
        }
    }

    pub fn from_options(options: &LoaderOptions) -> Self {
        CodeGenerator::new(options.runtime.clone(), &options.sentinel, &options.marker)
    }

    /// The registration block for `imports`, or `None` when there is nothing
    /// to register.
    pub fn build_block(&self, category: Category, imports: &[ResolvedImport]) -> Option<String> {
        if imports.is_empty() {
            return None;
        }

        let helper = category.helper();
        let request = serde_json::Value::String(format!(
            "!{}",
            self.runtime.for_category(category)
        ));

        let mut block = format!("{}\n", self.marker);
        block.push_str(&format!("import {} from {}\n", helper, request));

        let mut seen_imports = HashSet::new();
        let lines: Vec<&str> = imports
            .iter()
            .map(|i| i.import.as_str())
            .filter(|line| seen_imports.insert(*line))
            .collect();
        block.push_str(&lines.join("\n"));
        block.push('\n');

        block.push_str(&format!(
            "{}(component, {{{}}})\n",
            helper,
            registration_keys(imports).join(",")
        ));

        for import in imports {
            check_binding(category, import);
        }

        Some(block)
    }

    /// Splice the block for `imports` before the sentinel, or append it.
    pub fn inject(&self, source: &str, category: Category, imports: &[ResolvedImport]) -> String {
        self.inject_at(source, category, imports, InsertionPoint::Sentinel)
    }

    pub fn inject_at(
        &self,
        source: &str,
        category: Category,
        imports: &[ResolvedImport],
        point: InsertionPoint,
    ) -> String {
        let Some(block) = self.build_block(category, imports) else {
            return source.to_string();
        };

        let offset = match point {
            InsertionPoint::Sentinel => locate_sentinel(source, &self.sentinel),
            InsertionPoint::Offset(offset) => {
                Some(offset).filter(|&o| o <= source.len() && source.is_char_boundary(o))
            }
            InsertionPoint::End => None,
        };

        match offset {
            Some(at) => format!("{}{}\n\n{}", &source[..at], block, &source[at..]),
            None => format!("{}\n\n{}", source, block),
        }
    }
}

/// Keys of the registration object, one entry per key. Repeated keys keep
/// their last position, which is where a duplicated shorthand entry would
/// take effect.
fn registration_keys(imports: &[ResolvedImport]) -> Vec<&str> {
    let mut keys: Vec<&str> = Vec::with_capacity(imports.len());
    for import in imports {
        keys.retain(|k| *k != import.key);
        keys.push(&import.key);
    }
    keys
}

// ═══════════════════════════════════════════════════════════════════════════════
// SENTINEL LOOKUP
// ═══════════════════════════════════════════════════════════════════════════════

/// Byte offset of the sentinel in `source`.
///
/// A comment-shaped sentinel is looked up among the module's real comments so
/// an occurrence inside a string literal is not mistaken for it. Modules that
/// do not parse fall back to the first textual occurrence.
pub fn locate_sentinel(source: &str, sentinel: &str) -> Option<usize> {
    if sentinel.is_empty() {
        return None;
    }
    if !(sentinel.starts_with("/*") || sentinel.starts_with("//")) {
        return source.find(sentinel);
    }

    match comment_starts(source) {
        Some(starts) => {
            let found = starts
                .into_iter()
                .find(|&start| source[start..].starts_with(sentinel));
            tracing::trace!(found = found.is_some(), "sentinel lookup by comment");
            found
        }
        None => {
            tracing::trace!("module did not parse, sentinel lookup by text");
            source.find(sentinel)
        }
    }
}

/// Start offsets (including the delimiter) of every comment, or `None` when
/// the module does not parse.
fn comment_starts(source: &str) -> Option<Vec<usize>> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();
    if ret.panicked || !ret.errors.is_empty() {
        return None;
    }

    let starts = ret
        .program
        .comments
        .iter()
        .map(|comment| delimiter_start(source, comment.span.start as usize))
        .collect();
    Some(starts)
}

fn delimiter_start(source: &str, start: usize) -> usize {
    let opens_here = source
        .get(start..)
        .is_some_and(|rest| rest.starts_with("/*") || rest.starts_with("//"));
    if opens_here {
        return start;
    }
    match start.checked_sub(2).and_then(|s| source.get(s..start)) {
        Some("/*") | Some("//") => start - 2,
        _ => start,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BINDING CHECK
// ═══════════════════════════════════════════════════════════════════════════════

/// Local names an import statement binds, or `None` if it does not parse.
pub fn import_bindings(import: &str) -> Option<Vec<String>> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, import, SourceType::mjs()).parse();
    if ret.panicked || !ret.errors.is_empty() {
        return None;
    }

    let mut names = Vec::new();
    for stmt in ret.program.body.iter() {
        let Statement::ImportDeclaration(decl) = stmt else {
            continue;
        };
        let Some(specifiers) = &decl.specifiers else {
            continue;
        };
        for specifier in specifiers.iter() {
            let local = match specifier {
                ImportDeclarationSpecifier::ImportSpecifier(s) => &s.local,
                ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => &s.local,
                ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => &s.local,
            };
            names.push(local.name.as_str().to_string());
        }
    }
    Some(names)
}

/// Shorthand entries need the import to bind the registration key.
fn check_binding(category: Category, import: &ResolvedImport) {
    match import_bindings(&import.import) {
        Some(names) if names.iter().any(|n| *n == import.key) => {}
        Some(_) => tracing::warn!(
            category = %category,
            key = %import.key,
            import = %import.import,
            "import does not bind its registration key"
        ),
        None => tracing::warn!(
            category = %category,
            import = %import.import,
            "import statement does not parse"
        ),
    }
}
