//! Case conversion shared by the matcher contexts.

/// `VBtn` / `vBtn` → `v-btn`. Names that are already kebab-case pass through.
pub fn hyphenate(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;

    for c in name.chars() {
        if c.is_ascii_uppercase() && prev.is_some_and(is_word_char) {
            out.push('-');
        }
        out.extend(c.to_lowercase());
        prev = Some(c);
    }

    out
}

/// `v-btn` → `vBtn`. A dash not followed by a word character is kept.
pub fn camelize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();

    while let Some(c) = chars.next() {
        match chars.peek() {
            Some(&next) if c == '-' && is_word_char(next) => {
                out.extend(next.to_uppercase());
                chars.next();
            }
            _ => out.push(c),
        }
    }

    out
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `v-btn` → `VBtn`
pub fn pascalize(name: &str) -> String {
    capitalize(&camelize(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("VBtn", "v-btn")]
    #[case("vBtn", "v-btn")]
    #[case("v-btn", "v-btn")]
    #[case("VListItemTitle", "v-list-item-title")]
    #[case("div", "div")]
    #[case("ClickOutside", "click-outside")]
    fn test_hyphenate(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(hyphenate(input), expected);
    }

    #[rstest]
    #[case("v-btn", "vBtn")]
    #[case("mdi-home", "mdiHome")]
    #[case("click-outside", "clickOutside")]
    #[case("ripple", "ripple")]
    #[case("trailing-", "trailing-")]
    fn test_camelize(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(camelize(input), expected);
    }

    #[test]
    fn test_pascalize() {
        assert_eq!(pascalize("v-btn"), "VBtn");
        assert_eq!(pascalize("VBtn"), "VBtn");
        assert_eq!(pascalize("ripple"), "Ripple");
        assert_eq!(pascalize(""), "");
    }
}
