//! Per-file pipeline.
//!
//! ```text
//! component source → descriptor → template → usages → resolved imports
//!                                                          ↓
//! host module ──────────────→ inject(components) → inject(directives) → inject(icons)
//! ```
//!
//! A [`Loader`] is built once from options and then serves any number of
//! files, possibly concurrently. It holds no per-file state.

use serde::Serialize;

use crate::codegen::CodeGenerator;
use crate::error::Result;
use crate::host::{LoaderHost, Request};
use crate::matcher::{builtin_matcher, Category, Matcher, MatcherChain, PatternMatcher, ResolvedImport};
use crate::options::LoaderOptions;
use crate::resolve::resolve;
use crate::sfc::parse_component;
use crate::usage::{collect_usages, load_template, RendererRegistry, SortedUsage, TemplateRenderer, TemplateUsage};

/// Usages of one component and what they resolved to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub usage: SortedUsage,
    pub components: Vec<ResolvedImport>,
    pub directives: Vec<ResolvedImport>,
    pub icons: Vec<ResolvedImport>,
}

impl Analysis {
    pub fn imports(&self, category: Category) -> &[ResolvedImport] {
        match category {
            Category::Tag => &self.components,
            Category::Attr => &self.directives,
            Category::Icon => &self.icons,
        }
    }

    fn imports_mut(&mut self, category: Category) -> &mut Vec<ResolvedImport> {
        match category {
            Category::Tag => &mut self.components,
            Category::Attr => &mut self.directives,
            Category::Icon => &mut self.icons,
        }
    }

    pub fn is_empty(&self) -> bool {
        Category::ALL.iter().all(|c| self.imports(*c).is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub code: String,
    /// `None` when the request was bypassed.
    pub analysis: Option<Analysis>,
}

pub struct Loader {
    options: LoaderOptions,
    /// Indexed like [`Category::ALL`].
    chains: [MatcherChain; 3],
    /// Programmatic matchers at the head of each chain.
    programmatic: [usize; 3],
    renderers: RendererRegistry,
    codegen: CodeGenerator,
}

fn slot(category: Category) -> usize {
    match category {
        Category::Tag => 0,
        Category::Attr => 1,
        Category::Icon => 2,
    }
}

impl Loader {
    /// Build the chains: declarative rules from `options` first, then the
    /// built-in matcher of each category.
    pub fn new(options: LoaderOptions) -> Result<Self> {
        let chain = |category: Category| -> Result<MatcherChain> {
            let mut user: Vec<Box<dyn Matcher>> = Vec::new();
            for rule in options.rules(category) {
                user.push(Box::new(PatternMatcher::new(rule)?));
            }
            Ok(MatcherChain::new(
                user,
                builtin_matcher(category, &options.library),
            ))
        };
        let chains = [
            chain(Category::Tag)?,
            chain(Category::Attr)?,
            chain(Category::Icon)?,
        ];

        Ok(Loader {
            codegen: CodeGenerator::from_options(&options),
            options,
            chains,
            programmatic: [0; 3],
            renderers: RendererRegistry::new(),
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Loader::new(LoaderOptions::from_json(json)?)
    }

    /// Add a matcher ahead of the declarative rules and the built-in one.
    /// Programmatic matchers run in the order they were added.
    pub fn with_matcher(mut self, category: Category, matcher: impl Matcher + 'static) -> Self {
        let i = slot(category);
        self.chains[i].insert(self.programmatic[i], Box::new(matcher));
        self.programmatic[i] += 1;
        self
    }

    /// Register a renderer for templates written in `lang`.
    pub fn with_renderer(mut self, lang: &str, renderer: impl TemplateRenderer + 'static) -> Self {
        self.renderers.insert(lang.to_string(), Box::new(renderer));
        self
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    pub fn chain(&self, category: Category) -> &MatcherChain {
        &self.chains[slot(category)]
    }

    /// Transform the host module `content` generated for `request`.
    pub fn process(&self, host: &dyn LoaderHost, request: &Request, content: &str) -> Result<String> {
        Ok(self.transform(host, request, content)?.code)
    }

    /// Like [`Loader::process`], also returning what was resolved.
    pub fn transform(
        &self,
        host: &dyn LoaderHost,
        request: &Request,
        content: &str,
    ) -> Result<ProcessOutput> {
        if request.is_sub_request() {
            tracing::debug!(
                file = %request.resource_path.display(),
                query = %request.resource_query,
                "sub-block request, skipping"
            );
            return Ok(ProcessOutput {
                code: content.to_string(),
                analysis: None,
            });
        }

        let analysis = self.analyze(host, request)?;

        let mut code = content.to_string();
        for category in Category::ALL {
            code = self.codegen.inject(&code, category, analysis.imports(category));
        }

        Ok(ProcessOutput {
            code,
            analysis: Some(analysis),
        })
    }

    /// Read the component behind `request` and resolve its usages, without
    /// touching any module source.
    pub fn analyze(&self, host: &dyn LoaderHost, request: &Request) -> Result<Analysis> {
        host.add_dependency(&request.resource_path);
        let source = host.read_file(&request.resource_path)?;
        let descriptor = parse_component(&source);
        let file_path = request.relative_path();

        let usage = match load_template(&descriptor, host, request, &self.renderers)? {
            Some(template) => collect_usages(&template, &file_path)?,
            None => TemplateUsage::default(),
        };

        let mut analysis = Analysis {
            usage: SortedUsage::from(&usage),
            ..Analysis::default()
        };
        for category in Category::ALL {
            let imports = resolve(
                usage.get(category),
                self.chain(category),
                category,
                &descriptor,
                &file_path,
            );
            tracing::debug!(
                file = %file_path,
                category = %category,
                used = usage.get(category).len(),
                resolved = imports.len(),
                "resolved usages"
            );
            *analysis.imports_mut(category) = imports;
        }

        Ok(analysis)
    }
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("options", &self.options)
            .field("chains", &self.chains)
            .field("renderers", &self.renderers.keys().collect::<Vec<_>>())
            .finish()
    }
}
