use crate::matcher::{Category, MatcherChain, ResolvedImport, UsageContext};
use crate::sfc::SfcDescriptor;
use crate::usage::UsageSet;

/// Run every raw name of one category through its chain.
///
/// Unmatched names are dropped: they are either registered globally or not
/// library usages at all. The result is sorted by registration key. The sort
/// is stable, so equal keys stay in template order; when they reach the
/// generated object the later one overrides.
pub fn resolve(
    usages: &UsageSet,
    chain: &MatcherChain,
    category: Category,
    component: &SfcDescriptor,
    file_path: &str,
) -> Vec<ResolvedImport> {
    let mut imports = Vec::new();

    for raw in usages {
        let ctx = UsageContext::new(category, raw, file_path, component);
        match chain.try_match(raw, &ctx) {
            Some(resolved) => imports.push(resolved),
            None => tracing::trace!(category = %category, name = %raw, "no matcher"),
        }
    }

    imports.sort_by(|a, b| a.key.cmp(&b.key));
    imports
}
