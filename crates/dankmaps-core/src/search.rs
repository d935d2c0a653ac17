//! Title search and category filtering over a store list.

use crate::store::StoreRecord;

/// Category chips offered by the list view. `All` disables category filtering.
pub const CATEGORIES: &[&str] = &[
    "All", "THC", "CBD", "Clubs", "Flower", "Edibles", "Delivery", "Oils",
];

pub const ALL_CATEGORIES: &str = "All";

/// Stores whose title contains `query`, ignoring case. A blank query matches
/// nothing, which is how the search panel clears its result list.
#[must_use]
pub fn search_by_title<'a>(stores: &'a [StoreRecord], query: &str) -> Vec<&'a StoreRecord> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    stores
        .iter()
        .filter(|s| s.title.to_lowercase().contains(&needle))
        .collect()
}

/// Applies the category chip and then the title query.
///
/// Unlike [`search_by_title`], a blank query keeps every store that passed
/// the category filter.
#[must_use]
pub fn filter_stores<'a>(
    stores: &'a [StoreRecord],
    category: Option<&str>,
    query: &str,
) -> Vec<&'a StoreRecord> {
    let category = category
        .map(str::trim)
        .filter(|c| !c.is_empty() && *c != ALL_CATEGORIES);
    let needle = query.trim().to_lowercase();

    stores
        .iter()
        .filter(|s| category.is_none_or(|c| s.has_category(c)))
        .filter(|s| needle.is_empty() || s.title.to_lowercase().contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Logo;

    fn store(id: &str, title: &str, categories: &[&str]) -> StoreRecord {
        StoreRecord {
            id: id.to_owned(),
            title: title.to_owned(),
            description: None,
            logo: Logo::None,
            categories: categories.iter().map(|c| (*c).to_owned()).collect(),
            latitude: -26.0,
            longitude: 28.0,
            website: None,
            status: None,
        }
    }

    fn stores() -> Vec<StoreRecord> {
        vec![
            store("1", "CannAfrica Lifestyle Centurion", &["CBD", "Oils"]),
            store("2", "High Rollers Highveld", &["Clubs", "THC"]),
            store("3", "The Honeycomb Club", &["CBD", "Edibles"]),
        ]
    }

    #[test]
    fn title_search_is_case_insensitive() {
        let all = stores();
        let hits = search_by_title(&all, "HIGH");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "2");
    }

    #[test]
    fn blank_title_search_returns_nothing() {
        let all = stores();
        assert!(search_by_title(&all, "   ").is_empty());
    }

    #[test]
    fn all_category_keeps_everything() {
        let all = stores();
        assert_eq!(filter_stores(&all, Some("All"), "").len(), 3);
        assert_eq!(filter_stores(&all, None, "").len(), 3);
    }

    #[test]
    fn category_then_query_filters_compose() {
        let all = stores();
        let cbd = filter_stores(&all, Some("CBD"), "");
        assert_eq!(cbd.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(), ["1", "3"]);

        let cbd_club = filter_stores(&all, Some("CBD"), "club");
        assert_eq!(cbd_club.len(), 1);
        assert_eq!(cbd_club[0].id, "3");
    }

    #[test]
    fn category_match_is_exact() {
        let all = stores();
        assert!(filter_stores(&all, Some("cbd"), "").is_empty());
    }
}
