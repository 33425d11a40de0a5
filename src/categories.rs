pub const CATEGORIES: [&str; 7] = [
    "Business",
    "Entertainment",
    "General",
    "Health",
    "Science",
    "Sports",
    "Technology",
];

/// Categories offered by the filter bar, in display order.
pub fn list_categories() -> Vec<&'static str> {
    CATEGORIES.to_vec()
}

/// Map a user-supplied category onto the provider's top-headlines category.
/// Absent, blank, `all` and `general` all fan in to `general`.
pub fn provider_category(category: Option<&str>) -> String {
    let normalized = category.map(|c| c.trim().to_lowercase()).unwrap_or_default();
    match normalized.as_str() {
        "" | "all" | "general" => "general".to_string(),
        _ => normalized,
    }
}

/// Display form of a provider category, e.g. `technology` -> `Technology`.
pub fn display_category(provider_category: &str) -> String {
    CATEGORIES
        .iter()
        .find(|c| c.eq_ignore_ascii_case(provider_category))
        .map(|c| c.to_string())
        .unwrap_or_else(|| {
            let mut chars = provider_category.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => "General".to_string(),
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_catalog() {
        let first = list_categories();
        let second = list_categories();
        assert_eq!(first.len(), 7);
        assert_eq!(first, second);
        assert_eq!(first[0], "Business");
        assert_eq!(first[6], "Technology");
    }

    #[test]
    fn test_provider_category_defaults_to_general() {
        assert_eq!(provider_category(None), "general");
        assert_eq!(provider_category(Some("")), "general");
        assert_eq!(provider_category(Some("All")), "general");
        assert_eq!(provider_category(Some("GENERAL")), "general");
    }

    #[test]
    fn test_provider_category_lowercases() {
        assert_eq!(provider_category(Some("Technology")), "technology");
        assert_eq!(provider_category(Some(" Sports ")), "sports");
    }

    #[test]
    fn test_display_category() {
        assert_eq!(display_category("technology"), "Technology");
        assert_eq!(display_category("general"), "General");
        assert_eq!(display_category("weather"), "Weather");
        assert_eq!(display_category(""), "General");
    }
}
