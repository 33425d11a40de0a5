//! Fallback imagery for articles the provider returned without a picture.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder {
    pub image_url: &'static str,
    pub image_hint: &'static str,
}

pub const PLACEHOLDERS: [Placeholder; 6] = [
    Placeholder {
        image_url: "https://picsum.photos/seed/summit/1200/800",
        image_hint: "world leaders",
    },
    Placeholder {
        image_url: "https://picsum.photos/seed/circuit/1200/800",
        image_hint: "technology circuit",
    },
    Placeholder {
        image_url: "https://picsum.photos/seed/mars/1200/800",
        image_hint: "mars planet",
    },
    Placeholder {
        image_url: "https://picsum.photos/seed/parliament/1200/800",
        image_hint: "government building",
    },
    Placeholder {
        image_url: "https://picsum.photos/seed/market/1200/800",
        image_hint: "stock market",
    },
    Placeholder {
        image_url: "https://picsum.photos/seed/stadium/1200/800",
        image_hint: "soccer stadium",
    },
];

pub fn placeholder_for(index: usize) -> &'static Placeholder {
    &PLACEHOLDERS[index % PLACEHOLDERS.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_wraps_around_catalog() {
        assert_eq!(placeholder_for(0), &PLACEHOLDERS[0]);
        assert_eq!(placeholder_for(5), &PLACEHOLDERS[5]);
        assert_eq!(placeholder_for(6), &PLACEHOLDERS[0]);
        assert_eq!(placeholder_for(39), &PLACEHOLDERS[3]);
    }

    #[test]
    fn test_catalog_entries_are_populated() {
        for p in PLACEHOLDERS.iter() {
            assert!(p.image_url.starts_with("https://"));
            assert!(!p.image_hint.is_empty());
        }
    }
}
