//! Matcher protocol.
//!
//! A matcher maps one raw usage name (a tag, a directive name, an icon
//! identifier) to a registration key plus the import statement that binds it,
//! or declines. Matchers are composed per category into a [`MatcherChain`]
//! where the first matcher that answers wins.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::{LoaderError, Result};
use crate::naming::{camelize, hyphenate, pascalize};
use crate::options::LibraryConfig;
use crate::sfc::SfcDescriptor;

// ═══════════════════════════════════════════════════════════════════════════════
// CATEGORIES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Tag,
    Attr,
    Icon,
}

impl Category {
    /// Injection order. Each step re-scans the source produced by the previous one.
    pub const ALL: [Category; 3] = [Category::Tag, Category::Attr, Category::Icon];

    /// Name of the runtime helper, which is also its local import binding.
    pub fn helper(self) -> &'static str {
        match self {
            Category::Tag => "installComponents",
            Category::Attr => "installDirectives",
            Category::Icon => "installIcons",
        }
    }

    /// Options field the runtime helper merges into.
    pub fn options_field(self) -> &'static str {
        match self {
            Category::Tag => "components",
            Category::Attr => "directives",
            Category::Icon => "icons",
        }
    }

    /// Icons are plain camelCase; tags and directives are PascalCase.
    pub fn camel_name(self, raw: &str) -> String {
        match self {
            Category::Icon => camelize(raw),
            Category::Tag | Category::Attr => pascalize(raw),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.options_field())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONTEXT & RESULT
// ═══════════════════════════════════════════════════════════════════════════════

/// Everything a matcher may inspect about one usage. Built fresh per name.
#[derive(Debug, Clone)]
pub struct UsageContext<'a> {
    pub category: Category,
    pub raw_name: String,
    pub kebab_name: String,
    pub camel_name: String,
    /// Component path relative to the project root.
    pub file_path: String,
    pub component: &'a SfcDescriptor,
}

impl<'a> UsageContext<'a> {
    pub fn new(category: Category, raw: &str, file_path: &str, component: &'a SfcDescriptor) -> Self {
        UsageContext {
            category,
            raw_name: raw.to_string(),
            kebab_name: hyphenate(raw),
            camel_name: category.camel_name(raw),
            file_path: file_path.to_string(),
            component,
        }
    }
}

/// `(registration key, import statement)` for one resolved usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub key: String,
    pub import: String,
}

impl MatchResult {
    pub fn new(key: impl Into<String>, import: impl Into<String>) -> Self {
        MatchResult {
            key: key.into(),
            import: import.into(),
        }
    }
}

pub type ResolvedImport = MatchResult;

// ═══════════════════════════════════════════════════════════════════════════════
// MATCHER TRAIT & CHAIN
// ═══════════════════════════════════════════════════════════════════════════════

/// A resolver for one category. Implementations must not keep per-call state:
/// the same matcher serves every file, possibly from several threads.
pub trait Matcher: Send + Sync {
    fn try_match(&self, name: &str, ctx: &UsageContext<'_>) -> Option<MatchResult>;
}

impl<F> Matcher for F
where
    F: Fn(&str, &UsageContext<'_>) -> Option<MatchResult> + Send + Sync,
{
    fn try_match(&self, name: &str, ctx: &UsageContext<'_>) -> Option<MatchResult> {
        self(name, ctx)
    }
}

/// Pins a closure to the matcher signature so its argument types infer.
pub fn from_fn<F>(f: F) -> F
where
    F: Fn(&str, &UsageContext<'_>) -> Option<MatchResult> + Send + Sync,
{
    f
}

/// Ordered matchers for one category: user matchers first, built-in last.
pub struct MatcherChain {
    matchers: Vec<Box<dyn Matcher>>,
}

impl MatcherChain {
    pub fn new(user: Vec<Box<dyn Matcher>>, builtin: Box<dyn Matcher>) -> Self {
        let mut matchers = user;
        matchers.push(builtin);
        MatcherChain { matchers }
    }

    /// A chain without a built-in fallback.
    pub fn from_matchers(matchers: Vec<Box<dyn Matcher>>) -> Self {
        MatcherChain { matchers }
    }

    /// Insert at `index`, clamped to the end of the chain.
    pub fn insert(&mut self, index: usize, matcher: Box<dyn Matcher>) {
        let index = index.min(self.matchers.len());
        self.matchers.insert(index, matcher);
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// First match wins; later matchers are never consulted.
    pub fn try_match(&self, name: &str, ctx: &UsageContext<'_>) -> Option<MatchResult> {
        self.matchers.iter().find_map(|m| m.try_match(name, ctx))
    }
}

impl fmt::Debug for MatcherChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatcherChain")
            .field("len", &self.matchers.len())
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BUILT-IN MATCHERS
// ═══════════════════════════════════════════════════════════════════════════════

lazy_static! {
    /// Components shipped by the UI library's tree-shakable entry.
    pub static ref LIBRARY_COMPONENTS: HashSet<&'static str> = [
        "VApp", "VAppBar", "VAppBarNavIcon", "VAppBarTitle", "VAlert", "VAutocomplete",
        "VAvatar", "VBadge", "VBanner", "VBottomNavigation", "VBottomSheet", "VBreadcrumbs",
        "VBreadcrumbsItem", "VBreadcrumbsDivider", "VBtn", "VBtnToggle", "VCalendar",
        "VCalendarCategory", "VCalendarDaily", "VCalendarWeekly", "VCalendarMonthly", "VCard",
        "VCardActions", "VCardSubtitle", "VCardText", "VCardTitle", "VCarousel", "VCarouselItem",
        "VCheckbox", "VSimpleCheckbox", "VChip", "VChipGroup", "VColorPicker",
        "VColorPickerSwatches", "VColorPickerCanvas", "VContent", "VCombobox", "VCounter",
        "VData", "VDataIterator", "VDataFooter", "VDataTable", "VEditDialog", "VTableOverflow",
        "VDataTableHeader", "VSimpleTable", "VVirtualTable", "VDatePicker", "VDatePickerTitle",
        "VDatePickerHeader", "VDatePickerDateTable", "VDatePickerMonthTable", "VDatePickerYears",
        "VDialog", "VDivider", "VExpansionPanels", "VExpansionPanel", "VExpansionPanelHeader",
        "VExpansionPanelContent", "VFileInput", "VFooter", "VForm", "VContainer", "VCol", "VRow",
        "VSpacer", "VLayout", "VFlex", "VHover", "VIcon", "VImg", "VInput", "VItem",
        "VItemGroup", "VLabel", "VLazy", "VList", "VListGroup", "VListItem",
        "VListItemAction", "VListItemActionText", "VListItemAvatar", "VListItemContent",
        "VListItemGroup", "VListItemIcon", "VListItemSubtitle", "VListItemTitle", "VMain",
        "VMenu", "VMessages", "VNavigationDrawer", "VOverflowBtn", "VOverlay", "VPagination",
        "VSheet", "VParallax", "VPicker", "VProgressCircular", "VProgressLinear",
        "VRadioGroup", "VRadio", "VRangeSlider", "VRating", "VResponsive", "VSelect",
        "VSkeletonLoader", "VSlider", "VSlideGroup", "VSlideItem", "VSnackbar", "VSparkline",
        "VSpeedDial", "VStepper", "VStepperContent", "VStepperStep", "VStepperHeader",
        "VStepperItems", "VSubheader", "VSwitch", "VSystemBar", "VTabs", "VTab", "VTabItem",
        "VTabsItems", "VTabsSlider", "VTextarea", "VTextField", "VThemeProvider", "VTimeline",
        "VTimelineItem", "VTimePicker", "VTimePickerClock", "VTimePickerTitle", "VToolbar",
        "VToolbarItems", "VToolbarTitle", "VTooltip", "VTreeview", "VTreeviewNode",
        "VVirtualScroll", "VWindow", "VWindowItem", "VCarouselTransition",
        "VCarouselReverseTransition", "VTabTransition", "VTabReverseTransition",
        "VMenuTransition", "VFabTransition", "VDialogTransition", "VDialogBottomTransition",
        "VFadeTransition", "VScaleTransition", "VScrollXTransition", "VScrollXReverseTransition",
        "VScrollYTransition", "VScrollYReverseTransition", "VSlideXTransition",
        "VSlideXReverseTransition", "VSlideYTransition", "VSlideYReverseTransition",
        "VExpandTransition", "VExpandXTransition",
    ]
    .into_iter()
    .collect();

    /// Directives shipped by the UI library.
    pub static ref LIBRARY_DIRECTIVES: HashSet<&'static str> = [
        "ClickOutside", "Intersect", "Mutate", "Resize", "Ripple", "Scroll", "Touch",
    ]
    .into_iter()
    .collect();
}

/// Library components: kebab name carries the library prefix and, when a
/// catalog is configured, the PascalCase name is part of it.
#[derive(Debug, Clone)]
pub struct LibraryTagMatcher {
    prefix: String,
    module: String,
    known: Option<HashSet<String>>,
}

impl LibraryTagMatcher {
    pub fn new(config: &LibraryConfig) -> Self {
        LibraryTagMatcher {
            prefix: config.tag_prefix.clone(),
            module: config.components_module.clone(),
            known: config.known_components(),
        }
    }
}

impl Matcher for LibraryTagMatcher {
    fn try_match(&self, _name: &str, ctx: &UsageContext<'_>) -> Option<MatchResult> {
        if !ctx.kebab_name.starts_with(&self.prefix) {
            return None;
        }
        if let Some(known) = &self.known {
            if !known.contains(&ctx.camel_name) {
                return None;
            }
        }
        Some(MatchResult::new(
            ctx.camel_name.clone(),
            format!("import {{ {} }} from '{}'", ctx.camel_name, self.module),
        ))
    }
}

/// Library directives, matched by PascalCase name against the catalog.
#[derive(Debug, Clone)]
pub struct LibraryDirectiveMatcher {
    module: String,
    known: HashSet<String>,
}

impl LibraryDirectiveMatcher {
    pub fn new(config: &LibraryConfig) -> Self {
        LibraryDirectiveMatcher {
            module: config.directives_module.clone(),
            known: config.known_directives(),
        }
    }
}

impl Matcher for LibraryDirectiveMatcher {
    fn try_match(&self, _name: &str, ctx: &UsageContext<'_>) -> Option<MatchResult> {
        if !self.known.contains(&ctx.camel_name) {
            return None;
        }
        Some(MatchResult::new(
            ctx.camel_name.clone(),
            format!("import {{ {} }} from '{}'", ctx.camel_name, self.module),
        ))
    }
}

/// Icon identifiers carrying the icon-set prefix (`mdi-home` → `mdiHome`).
#[derive(Debug, Clone)]
pub struct IconSetMatcher {
    prefix: String,
    module: String,
}

impl IconSetMatcher {
    pub fn new(config: &LibraryConfig) -> Self {
        IconSetMatcher {
            prefix: config.icon_prefix.clone(),
            module: config.icons_module.clone(),
        }
    }
}

impl Matcher for IconSetMatcher {
    fn try_match(&self, _name: &str, ctx: &UsageContext<'_>) -> Option<MatchResult> {
        if !ctx.kebab_name.starts_with(&self.prefix) || ctx.kebab_name.len() == self.prefix.len() {
            return None;
        }
        Some(MatchResult::new(
            ctx.camel_name.clone(),
            format!("import {{ {} }} from '{}'", ctx.camel_name, self.module),
        ))
    }
}

/// Built-in fallback for a category.
pub fn builtin_matcher(category: Category, config: &LibraryConfig) -> Box<dyn Matcher> {
    match category {
        Category::Tag => Box::new(LibraryTagMatcher::new(config)),
        Category::Attr => Box::new(LibraryDirectiveMatcher::new(config)),
        Category::Icon => Box::new(IconSetMatcher::new(config)),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DECLARATIVE MATCHERS
// ═══════════════════════════════════════════════════════════════════════════════

lazy_static! {
    static ref PLACEHOLDER_RE: Regex = Regex::new(r"\{(raw|kebab|camel|path|[0-9])\}").unwrap();
}

/// Matcher rule as written in loader options.
///
/// `key` and `import` are templates: `{raw}`, `{kebab}`, `{camel}`, `{path}`
/// and the capture groups `{0}`..`{9}` of `pattern` are substituted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternRule {
    pub pattern: String,
    #[serde(default = "default_key_template")]
    pub key: String,
    pub import: String,
}

fn default_key_template() -> String {
    "{camel}".to_string()
}

#[derive(Debug, Clone)]
pub struct PatternMatcher {
    regex: Regex,
    key: String,
    import: String,
}

impl PatternMatcher {
    pub fn new(rule: &PatternRule) -> Result<Self> {
        let regex = Regex::new(&rule.pattern).map_err(|source| LoaderError::InvalidPattern {
            pattern: rule.pattern.clone(),
            source,
        })?;
        Ok(PatternMatcher {
            regex,
            key: rule.key.clone(),
            import: rule.import.clone(),
        })
    }

    fn render(template: &str, caps: &regex::Captures<'_>, ctx: &UsageContext<'_>) -> String {
        PLACEHOLDER_RE
            .replace_all(template, |p: &regex::Captures<'_>| match &p[1] {
                "raw" => ctx.raw_name.clone(),
                "kebab" => ctx.kebab_name.clone(),
                "camel" => ctx.camel_name.clone(),
                "path" => ctx.file_path.clone(),
                group => group
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| caps.get(i))
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
            })
            .to_string()
    }
}

impl Matcher for PatternMatcher {
    fn try_match(&self, name: &str, ctx: &UsageContext<'_>) -> Option<MatchResult> {
        let caps = self.regex.captures(name)?;
        Some(MatchResult::new(
            Self::render(&self.key, &caps, ctx),
            Self::render(&self.import, &caps, ctx),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(category: Category, raw: &str, component: &'a SfcDescriptor) -> UsageContext<'a> {
        UsageContext::new(category, raw, "src/App.vue", component)
    }

    #[test]
    fn test_context_casing_per_category() {
        let sfc = SfcDescriptor::default();
        let tag = ctx(Category::Tag, "v-btn", &sfc);
        assert_eq!(tag.kebab_name, "v-btn");
        assert_eq!(tag.camel_name, "VBtn");

        let icon = ctx(Category::Icon, "mdi-home", &sfc);
        assert_eq!(icon.camel_name, "mdiHome");
        assert_eq!(icon.file_path, "src/App.vue");
    }

    #[test]
    fn test_library_tag_matcher() {
        let sfc = SfcDescriptor::default();
        let matcher = LibraryTagMatcher::new(&LibraryConfig::default());

        let hit = matcher.try_match("VBtn", &ctx(Category::Tag, "VBtn", &sfc));
        assert_eq!(
            hit,
            Some(MatchResult::new("VBtn", "import { VBtn } from 'vuetify/lib'"))
        );
        assert!(matcher
            .try_match("v-bogus", &ctx(Category::Tag, "v-bogus", &sfc))
            .is_none());
        assert!(matcher
            .try_match("div", &ctx(Category::Tag, "div", &sfc))
            .is_none());
    }

    #[test]
    fn test_library_tag_matcher_without_catalog() {
        let sfc = SfcDescriptor::default();
        let config = LibraryConfig {
            check_components: false,
            ..LibraryConfig::default()
        };
        let matcher = LibraryTagMatcher::new(&config);
        assert!(matcher
            .try_match("v-bogus", &ctx(Category::Tag, "v-bogus", &sfc))
            .is_some());
    }

    #[test]
    fn test_library_directive_matcher() {
        let sfc = SfcDescriptor::default();
        let matcher = LibraryDirectiveMatcher::new(&LibraryConfig::default());
        let hit = matcher
            .try_match("click-outside", &ctx(Category::Attr, "click-outside", &sfc))
            .unwrap();
        assert_eq!(hit.key, "ClickOutside");
        assert_eq!(hit.import, "import { ClickOutside } from 'vuetify/lib/directives'");
        assert!(matcher
            .try_match("model", &ctx(Category::Attr, "model", &sfc))
            .is_none());
    }

    #[test]
    fn test_icon_set_matcher() {
        let sfc = SfcDescriptor::default();
        let matcher = IconSetMatcher::new(&LibraryConfig::default());
        let hit = matcher
            .try_match("mdi-home", &ctx(Category::Icon, "mdi-home", &sfc))
            .unwrap();
        assert_eq!(hit.key, "mdiHome");
        assert_eq!(hit.import, "import { mdiHome } from '@mdi/js'");
        assert!(matcher
            .try_match("fa-home", &ctx(Category::Icon, "fa-home", &sfc))
            .is_none());
        assert!(matcher
            .try_match("mdi-", &ctx(Category::Icon, "mdi-", &sfc))
            .is_none());
    }

    #[test]
    fn test_chain_first_match_wins() {
        let sfc = SfcDescriptor::default();
        let first = from_fn(|_name: &str, _ctx: &UsageContext<'_>| {
            Some(MatchResult::new("First", "import First from 'first'"))
        });
        let second = from_fn(|_name: &str, _ctx: &UsageContext<'_>| {
            panic!("second matcher must not run")
        });
        let chain = MatcherChain::new(vec![Box::new(first)], Box::new(second));
        let hit = chain.try_match("v-btn", &ctx(Category::Tag, "v-btn", &sfc));
        assert_eq!(hit.unwrap().key, "First");
    }

    #[test]
    fn test_chain_falls_through_declines() {
        let sfc = SfcDescriptor::default();
        let declining = from_fn(|_name: &str, _ctx: &UsageContext<'_>| None);
        let chain = MatcherChain::new(
            vec![Box::new(declining)],
            builtin_matcher(Category::Tag, &LibraryConfig::default()),
        );
        assert_eq!(chain.len(), 2);
        let hit = chain.try_match("v-card", &ctx(Category::Tag, "v-card", &sfc));
        assert_eq!(hit.unwrap().key, "VCard");
    }

    #[test]
    fn test_pattern_matcher_templates() {
        let sfc = SfcDescriptor::default();
        let matcher = PatternMatcher::new(&PatternRule {
            pattern: r"^app-(.+)$".to_string(),
            key: "{camel}".to_string(),
            import: "import {camel} from '@/components/{1}.vue' // {path}".to_string(),
        })
        .unwrap();

        let hit = matcher
            .try_match("app-header", &ctx(Category::Tag, "app-header", &sfc))
            .unwrap();
        assert_eq!(hit.key, "AppHeader");
        assert_eq!(
            hit.import,
            "import AppHeader from '@/components/header.vue' // src/App.vue"
        );
        assert!(matcher
            .try_match("v-btn", &ctx(Category::Tag, "v-btn", &sfc))
            .is_none());
    }

    #[test]
    fn test_pattern_matcher_rejects_bad_regex() {
        let err = PatternMatcher::new(&PatternRule {
            pattern: "(".to_string(),
            key: default_key_template(),
            import: String::new(),
        })
        .unwrap_err();
        assert_eq!(err.code(), crate::error::ERR_PATTERN);
    }
}
