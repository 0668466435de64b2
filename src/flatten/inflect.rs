//! English plural forms for container/member tag pairs.

const SIBILANT_ENDINGS: [&str; 5] = ["s", "x", "z", "ch", "sh"];

/// Plural form of a singular tag.
pub fn pluralize(singular: &str) -> String {
    if let Some(stem) = singular.strip_suffix('y') {
        if stem.chars().last().is_some_and(|c| !is_vowel(c)) {
            return format!("{stem}ies");
        }
    }
    if SIBILANT_ENDINGS.iter().any(|end| singular.ends_with(end)) {
        return format!("{singular}es");
    }
    format!("{singular}s")
}

/// Whether `plural` is the plural form of `singular`.
pub fn is_plural_of(plural: &str, singular: &str) -> bool {
    !singular.is_empty() && (plural == pluralize(singular) || plural == format!("{singular}s"))
}

fn is_vowel(c: char) -> bool {
    matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plural_forms() {
        assert_eq!(pluralize("item"), "items");
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("day"), "days");
        assert_eq!(pluralize("address"), "addresses");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("branch"), "branches");
    }

    #[test]
    fn plural_pairs() {
        assert!(is_plural_of("items", "item"));
        assert!(is_plural_of("categories", "category"));
        assert!(is_plural_of("addresses", "address"));
        assert!(!is_plural_of("item", "item"));
        assert!(!is_plural_of("data", "item"));
        assert!(!is_plural_of("s", ""));
    }

    #[test]
    fn sibilant_and_silent_e_pairs() {
        assert!(is_plural_of("houses", "house"));
        assert!(is_plural_of("boxes", "box"));
        assert!(is_plural_of("keys", "key"));
        assert!(!is_plural_of("keies", "key"));
    }
}
