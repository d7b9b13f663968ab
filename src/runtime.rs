//! Runtime merge helpers.
//!
//! The generated blocks import one helper per category. Their JS sources ship
//! with the crate so a host can serve them as virtual modules, and
//! [`merge_registrations`] models what they do to a component definition.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::matcher::Category;
use crate::options::RuntimePaths;

const INSTALL_COMPONENTS: &str = include_str!("../runtime/installComponents.js");
const INSTALL_DIRECTIVES: &str = include_str!("../runtime/installDirectives.js");
const INSTALL_ICONS: &str = include_str!("../runtime/installIcons.js");

pub fn helper_source(category: Category) -> &'static str {
    match category {
        Category::Tag => INSTALL_COMPONENTS,
        Category::Attr => INSTALL_DIRECTIVES,
        Category::Icon => INSTALL_ICONS,
    }
}

/// Helper source by helper name (`installIcons`), or by file name.
pub fn helper_source_by_name(name: &str) -> Option<&'static str> {
    let name = name.strip_suffix(".js").unwrap_or(name);
    Category::ALL
        .into_iter()
        .find(|c| c.helper() == name)
        .map(helper_source)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VirtualModule {
    /// The import path generated blocks use for this helper.
    pub id: String,
    pub code: &'static str,
}

pub fn virtual_modules(paths: &RuntimePaths) -> Vec<VirtualModule> {
    Category::ALL
        .into_iter()
        .map(|category| VirtualModule {
            id: paths.for_category(category).to_string(),
            code: helper_source(category),
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// MERGE MODEL
// ═══════════════════════════════════════════════════════════════════════════════

/// Merge `registrations` into a JSON model of a component definition.
///
/// Plain definitions are `{ "options": {..} }`. Constructor definitions are
/// `{ "exports": { "$function": true, "extendOptions": {..}, "options": {..} } }`;
/// for those the container is shared between `options` and `extendOptions`,
/// so both receive the merged result. Entries already present (and truthy)
/// are never replaced.
pub fn merge_registrations(
    definition: &mut Value,
    category: Category,
    registrations: &Map<String, Value>,
) {
    let field = category.options_field();
    let is_constructor = definition
        .pointer("/exports/$function")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    if is_constructor {
        let existing = definition.pointer(&format!("/exports/options/{}", field)).cloned();
        let container = merged(existing, registrations);
        set_path(definition, &["exports", "extendOptions", field], container.clone());
        set_path(definition, &["exports", "options", field], container);
    } else {
        let existing = definition.pointer(&format!("/options/{}", field)).cloned();
        set_path(definition, &["options", field], merged(existing, registrations));
    }
}

fn merged(existing: Option<Value>, registrations: &Map<String, Value>) -> Value {
    let mut container = match existing {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    for (key, value) in registrations {
        let occupied = container.get(key).is_some_and(is_truthy);
        if !occupied {
            container.insert(key.clone(), value.clone());
        }
    }
    Value::Object(container)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn set_path(target: &mut Value, path: &[&str], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        *target = value;
        return;
    };

    let mut current = target;
    for key in parents {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Some(map) = current.as_object_mut() else {
            return;
        };
        current = map
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    if !current.is_object() {
        *current = Value::Object(Map::new());
    }
    if let Some(map) = current.as_object_mut() {
        map.insert(last.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(m) => m,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_helper_sources() {
        for category in Category::ALL {
            let source = helper_source(category);
            assert!(source.contains(&format!("function {} (", category.helper())));
            assert!(source.contains(&format!("options.{}", category.options_field())));
        }
        assert_eq!(helper_source_by_name("installIcons.js"), Some(INSTALL_ICONS));
        assert_eq!(helper_source_by_name("installDirectives"), Some(INSTALL_DIRECTIVES));
        assert_eq!(helper_source_by_name("installEverything"), None);
    }

    #[test]
    fn test_virtual_module_ids_follow_paths() {
        let modules = virtual_modules(&RuntimePaths::default());
        let ids: Vec<_> = modules.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "vuetify-loader/lib/runtime/installComponents",
                "vuetify-loader/lib/runtime/installDirectives",
                "vuetify-loader/lib/runtime/installIcons",
            ]
        );
    }

    #[test]
    fn test_merge_creates_container() {
        let mut definition = json!({ "options": { "name": "App" } });
        merge_registrations(&mut definition, Category::Tag, &map(json!({ "VBtn": "btn" })));
        assert_eq!(
            definition,
            json!({ "options": { "name": "App", "components": { "VBtn": "btn" } } })
        );
    }

    #[test]
    fn test_merge_first_writer_wins() {
        let mut definition = json!({
            "options": { "directives": { "Ripple": "local", "Touch": null } }
        });
        merge_registrations(
            &mut definition,
            Category::Attr,
            &map(json!({ "Ripple": "library", "Touch": "library", "Scroll": "library" })),
        );
        assert_eq!(
            definition["options"]["directives"],
            json!({ "Ripple": "local", "Touch": "library", "Scroll": "library" })
        );
    }

    #[test]
    fn test_merge_is_idempotent() {
        let registrations = map(json!({ "mdiHome": "M10 20", "mdiClose": "M19 6" }));
        for start in [
            json!({ "options": {} }),
            json!({ "options": { "icons": { "mdiHome": "custom" } } }),
            json!({ "exports": { "$function": true, "extendOptions": {}, "options": {} } }),
        ] {
            let mut once = start.clone();
            merge_registrations(&mut once, Category::Icon, &registrations);
            let mut twice = once.clone();
            merge_registrations(&mut twice, Category::Icon, &registrations);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_merge_constructor_shares_container() {
        let mut definition = json!({
            "exports": {
                "$function": true,
                "extendOptions": { "name": "App" },
                "options": { "components": { "VBtn": "global" } }
            }
        });
        merge_registrations(
            &mut definition,
            Category::Tag,
            &map(json!({ "VBtn": "library", "VCard": "library" })),
        );

        let expected = json!({ "VBtn": "global", "VCard": "library" });
        assert_eq!(definition["exports"]["options"]["components"], expected);
        assert_eq!(definition["exports"]["extendOptions"]["components"], expected);
        assert_eq!(definition["exports"]["extendOptions"]["name"], "App");
    }
}
