//! Orderings offered by panel surfaces over the cached items.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::Item;

/// Panel sort order. Ties keep cache order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOption {
    /// Newest release first.
    #[default]
    Latest,
    /// Oldest release first.
    Oldest,
    /// Most viewed first; unenriched items count as zero.
    Views,
    Likes,
    Comments,
}

impl SortOption {
    /// Return a sorted copy of `items`.
    pub fn sorted(self, items: &[Item]) -> Vec<Item> {
        let mut sorted = items.to_vec();
        match self {
            SortOption::Latest => sorted.sort_by(|a, b| b.released_at.cmp(&a.released_at)),
            SortOption::Oldest => sorted.sort_by(|a, b| a.released_at.cmp(&b.released_at)),
            SortOption::Views => sorted.sort_by_key(|item| std::cmp::Reverse(item.views())),
            SortOption::Likes => sorted.sort_by_key(|item| std::cmp::Reverse(item.likes)),
            SortOption::Comments => sorted.sort_by_key(|item| std::cmp::Reverse(item.comments_count)),
        }
        sorted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ViewStat;
    use crate::model::fixtures::item;
    use chrono::{Duration, TimeZone, Utc};

    fn sample() -> Vec<Item> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut a = item("a");
        a.released_at = base;
        a.likes = 1;
        a.comments_count = 9;
        let mut b = item("b");
        b.released_at = base + Duration::days(2);
        b.likes = 5;
        b.comments_count = 0;
        b.view_stat = Some(ViewStat { views: 40, ..Default::default() });
        let mut c = item("c");
        c.released_at = base + Duration::days(1);
        c.likes = 5;
        c.comments_count = 2;
        c.view_stat = Some(ViewStat { views: 100, ..Default::default() });
        vec![a, b, c]
    }

    fn ids(items: &[Item]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_release_orders() {
        let items = sample();
        assert_eq!(ids(&SortOption::Latest.sorted(&items)), vec!["b", "c", "a"]);
        assert_eq!(ids(&SortOption::Oldest.sorted(&items)), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_counter_orders() {
        let items = sample();
        assert_eq!(ids(&SortOption::Views.sorted(&items)), vec!["c", "b", "a"]);
        assert_eq!(ids(&SortOption::Likes.sorted(&items)), vec!["b", "c", "a"]);
        assert_eq!(ids(&SortOption::Comments.sorted(&items)), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_sort_option_serde() {
        let option: SortOption = serde_json::from_str(r#""comments""#).unwrap();
        assert_eq!(option, SortOption::Comments);
        assert_eq!(serde_json::to_string(&SortOption::Latest).unwrap(), r#""latest""#);
    }
}
