//! Fixed vocabulary tables for categories, countries, and terminal states.
//!
//! Loaded once as process-wide constants and never mutated; an entry's code
//! is its position in the table.

/// Known campaign categories, in vocabulary order.
pub const CATEGORIES: [&str; 15] = [
    "Art",
    "Comics",
    "Crafts",
    "Dance",
    "Design",
    "Fashion",
    "Film & Video",
    "Food",
    "Games",
    "Journalism",
    "Music",
    "Photography",
    "Publishing",
    "Technology",
    "Theater",
];

/// Known campaign countries (ISO 3166-1 alpha-2), in vocabulary order.
pub const COUNTRIES: [&str; 22] = [
    "US", "MX", "NZ", "CA", "CH", "HK", "GB", "ES", "JP", "AU", "FR", "DE", "NL", "SE", "IT",
    "AT", "DK", "NO", "SG", "IE", "BE", "LU",
];

/// Numeric code for a terminal campaign state, or `None` for anything else.
#[must_use]
pub fn state_code(state: &str) -> Option<u8> {
    match state {
        "failed" => Some(0),
        "successful" => Some(1),
        _ => None,
    }
}

/// One-hot column name for a category label: lowercased, with every run of
/// non-alphabetic characters collapsed into a single `_`.
///
/// `"Film & Video"` becomes `category_film_video`.
#[must_use]
pub fn category_column(label: &str) -> String {
    let raw = format!("category_{}", label.to_lowercase());
    let spaced: String = raw
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphabetic() { c } else { ' ' })
        .collect();
    spaced.split_whitespace().collect::<Vec<_>>().join("_")
}

/// One-hot column name for a country code: `"US"` becomes `country_us`.
#[must_use]
pub fn country_column(code: &str) -> String {
    format!("country_{}", code.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_code_covers_terminal_states_only() {
        assert_eq!(state_code("failed"), Some(0));
        assert_eq!(state_code("successful"), Some(1));
        assert_eq!(state_code("live"), None);
        assert_eq!(state_code("canceled"), None);
        assert_eq!(state_code(""), None);
    }

    #[test]
    fn category_column_collapses_punctuation() {
        assert_eq!(category_column("Film & Video"), "category_film_video");
        assert_eq!(category_column("Theater"), "category_theater");
        assert_eq!(category_column("Art"), "category_art");
    }

    #[test]
    fn country_column_lowercases_code() {
        assert_eq!(country_column("US"), "country_us");
        assert_eq!(country_column("LU"), "country_lu");
    }

    #[test]
    fn vocabularies_have_expected_sizes() {
        assert_eq!(CATEGORIES.len(), 15);
        assert_eq!(COUNTRIES.len(), 22);
    }
}
