//! Derived views over the merged item list. Everything here is a pure
//! function of its inputs and is recomputed on each call.

use std::collections::BTreeMap;
use std::fmt::Display;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};

use crate::models::FeedItem;

pub const ALL_SOURCES: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFilter {
    /// Items must carry at least one of these keywords; empty means any
    pub selected_keywords: Vec<String>,
    /// Exact source name, or [`ALL_SOURCES`]
    pub selected_source: String,
    pub search_query: String,
}

impl Default for FeedFilter {
    fn default() -> Self {
        Self {
            selected_keywords: Vec::new(),
            selected_source: ALL_SOURCES.to_string(),
            search_query: String::new(),
        }
    }
}

impl FeedFilter {
    pub fn toggle_keyword(&mut self, keyword: &str) {
        match self.selected_keywords.iter().position(|k| k == keyword) {
            Some(index) => {
                self.selected_keywords.remove(index);
            }
            None => self.selected_keywords.push(keyword.to_string()),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn matches(&self, item: &FeedItem) -> bool {
        if !self.selected_keywords.is_empty()
            && !item
                .keywords
                .iter()
                .any(|k| self.selected_keywords.contains(k))
        {
            return false;
        }

        if self.selected_source != ALL_SOURCES && item.source != self.selected_source {
            return false;
        }

        if !self.search_query.trim().is_empty() {
            let query = self.search_query.to_lowercase();
            return item.title.to_lowercase().contains(&query)
                || item.description.to_lowercase().contains(&query);
        }

        true
    }
}

pub fn filter_items<'a>(items: &'a [FeedItem], filter: &FeedFilter) -> Vec<&'a FeedItem> {
    items.iter().filter(|item| filter.matches(item)).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct DateGroup<'a> {
    pub label: String,
    pub date: NaiveDate,
    pub items: Vec<&'a FeedItem>,
}

/// `Today`, `Yesterday`, otherwise `M/D`.
pub fn date_label(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        "Today".to_string()
    } else if Some(date) == today.pred_opt() {
        "Yesterday".to_string()
    } else {
        format!("{}/{}", date.month(), date.day())
    }
}

/// Bucket items by calendar day in `now`'s timezone, newest day first.
/// Items keep their relative order inside a bucket.
pub fn group_by_date<'a, Tz: TimeZone>(
    items: &[&'a FeedItem],
    now: &DateTime<Tz>,
) -> Vec<DateGroup<'a>> {
    let tz = now.timezone();
    let today = now.date_naive();

    let mut buckets: BTreeMap<NaiveDate, Vec<&'a FeedItem>> = BTreeMap::new();
    for &item in items {
        let day = item.timestamp.with_timezone(&tz).date_naive();
        buckets.entry(day).or_default().push(item);
    }

    buckets
        .into_iter()
        .rev()
        .map(|(date, items)| DateGroup {
            label: date_label(date, today),
            date,
            items,
        })
        .collect()
}

/// [`ALL_SOURCES`] followed by each distinct source in first-seen order.
pub fn available_sources(items: &[FeedItem]) -> Vec<String> {
    let mut sources = vec![ALL_SOURCES.to_string()];
    for item in items {
        if !sources[1..].contains(&item.source) {
            sources.push(item.source.clone());
        }
    }
    sources
}

/// `HH:MM` in the given timezone.
pub fn format_time<Tz: TimeZone>(timestamp: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    timestamp.with_timezone(tz).format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, ts: &str, source: &str, keywords: &[&str]) -> FeedItem {
        FeedItem {
            id: format!("test-{}", title),
            title: title.to_string(),
            description: String::new(),
            source: source.to_string(),
            url: format!("https://example.com/{}", title),
            timestamp: ts.parse().unwrap(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            image_url: None,
        }
    }

    fn scenario() -> Vec<FeedItem> {
        vec![
            item("Vue tips", "2024-01-02T10:00:00Z", "A", &["Vue.js"]),
            item("Go news", "2024-01-01T10:00:00Z", "B", &["Go"]),
        ]
    }

    mod filter_tests {
        use super::*;

        #[test]
        fn test_default_filter_is_identity() {
            let items = scenario();
            let filtered = filter_items(&items, &FeedFilter::default());
            assert_eq!(filtered, items.iter().collect::<Vec<_>>());
        }

        #[test]
        fn test_keyword_filter() {
            let items = scenario();
            let filter = FeedFilter {
                selected_keywords: vec!["Vue.js".to_string()],
                ..Default::default()
            };

            let filtered = filter_items(&items, &filter);
            assert_eq!(filtered, vec![&items[0]]);
        }

        #[test]
        fn test_keyword_filter_is_case_sensitive() {
            let items = scenario();
            let filter = FeedFilter {
                selected_keywords: vec!["vue.js".to_string()],
                ..Default::default()
            };
            assert!(filter_items(&items, &filter).is_empty());
        }

        #[test]
        fn test_keyword_filter_needs_one_overlap() {
            let items = scenario();
            let filter = FeedFilter {
                selected_keywords: vec!["Rust".to_string(), "Go".to_string()],
                ..Default::default()
            };
            assert_eq!(filter_items(&items, &filter), vec![&items[1]]);
        }

        #[test]
        fn test_search_query_matches_title_case_insensitively() {
            let items = scenario();
            let filter = FeedFilter {
                search_query: "TIPS".to_string(),
                ..Default::default()
            };
            assert_eq!(filter_items(&items, &filter), vec![&items[0]]);
        }

        #[test]
        fn test_search_query_matches_description() {
            let mut items = scenario();
            items[1].description = "Generics landed".to_string();
            let filter = FeedFilter {
                search_query: "generics".to_string(),
                ..Default::default()
            };
            assert_eq!(filter_items(&items, &filter), vec![&items[1]]);
        }

        #[test]
        fn test_whitespace_query_is_ignored() {
            let items = scenario();
            let filter = FeedFilter {
                search_query: "   ".to_string(),
                ..Default::default()
            };
            assert_eq!(filter_items(&items, &filter).len(), 2);
        }

        #[test]
        fn test_source_filter() {
            let items = scenario();
            let filter = FeedFilter {
                selected_source: "B".to_string(),
                ..Default::default()
            };
            assert_eq!(filter_items(&items, &filter), vec![&items[1]]);
        }

        #[test]
        fn test_filters_combine() {
            let items = scenario();
            let filter = FeedFilter {
                selected_keywords: vec!["Vue.js".to_string()],
                selected_source: "B".to_string(),
                search_query: String::new(),
            };
            assert!(filter_items(&items, &filter).is_empty());
        }

        #[test]
        fn test_toggle_keyword_and_clear() {
            let mut filter = FeedFilter::default();
            filter.toggle_keyword("AI");
            filter.toggle_keyword("Go");
            filter.toggle_keyword("AI");
            assert_eq!(filter.selected_keywords, vec!["Go".to_string()]);

            filter.selected_source = "B".to_string();
            filter.search_query = "x".to_string();
            filter.clear();
            assert_eq!(filter, FeedFilter::default());
        }
    }

    mod group_tests {
        use super::*;

        fn now() -> DateTime<Utc> {
            "2024-03-10T15:00:00Z".parse().unwrap()
        }

        #[test]
        fn test_today_and_yesterday() {
            let items = vec![
                item("a", "2024-03-10T08:00:00Z", "A", &[]),
                item("b", "2024-03-09T08:00:00Z", "A", &[]),
            ];
            let refs: Vec<_> = items.iter().collect();

            let groups = group_by_date(&refs, &now());

            assert_eq!(groups.len(), 2);
            assert_eq!(groups[0].label, "Today");
            assert_eq!(groups[0].items, vec![&items[0]]);
            assert_eq!(groups[1].label, "Yesterday");
            assert_eq!(groups[1].items, vec![&items[1]]);
        }

        #[test]
        fn test_older_dates_use_month_day_label() {
            let items = vec![item("a", "2024-03-01T08:00:00Z", "A", &[])];
            let refs: Vec<_> = items.iter().collect();

            let groups = group_by_date(&refs, &now());
            assert_eq!(groups[0].label, "3/1");
        }

        #[test]
        fn test_buckets_descend_and_keep_item_order() {
            let items = vec![
                item("a", "2024-03-10T12:00:00Z", "A", &[]),
                item("b", "2024-03-10T09:00:00Z", "A", &[]),
                item("c", "2024-02-20T09:00:00Z", "A", &[]),
                item("d", "2024-03-09T23:00:00Z", "A", &[]),
            ];
            let refs: Vec<_> = items.iter().collect();

            let groups = group_by_date(&refs, &now());
            let labels: Vec<_> = groups.iter().map(|g| g.label.as_str()).collect();
            assert_eq!(labels, vec!["Today", "Yesterday", "2/20"]);
            assert_eq!(groups[0].items, vec![&items[0], &items[1]]);
        }

        #[test]
        fn test_groups_partition_input() {
            let items: Vec<FeedItem> = (0..40)
                .map(|i| {
                    let ts = (now() - chrono::Duration::hours(i * 7)).to_rfc3339();
                    item(&format!("item-{}", i), &ts, "A", &[])
                })
                .collect();
            let refs: Vec<_> = items.iter().collect();

            let groups = group_by_date(&refs, &now());
            let flattened: Vec<&FeedItem> = groups.iter().flat_map(|g| g.items.clone()).collect();

            assert_eq!(flattened, refs);
        }

        #[test]
        fn test_days_follow_the_given_timezone() {
            let tz = chrono::FixedOffset::east_opt(10 * 3600).unwrap();
            // 2024-03-10 01:00 local time
            let now = tz.with_ymd_and_hms(2024, 3, 10, 1, 0, 0).unwrap();
            // 2024-03-10 08:00 local, 2024-03-09 22:00 UTC
            let items = vec![item("a", "2024-03-09T22:00:00Z", "A", &[])];
            let refs: Vec<_> = items.iter().collect();

            let groups = group_by_date(&refs, &now);
            assert_eq!(groups[0].label, "Today");
        }

        #[test]
        fn test_empty_input() {
            assert!(group_by_date(&[], &now()).is_empty());
        }
    }

    #[test]
    fn test_available_sources_first_seen_order() {
        let items = vec![
            item("a", "2024-01-03T00:00:00Z", "GitHub", &[]),
            item("b", "2024-01-02T00:00:00Z", "Dev.to", &[]),
            item("c", "2024-01-01T00:00:00Z", "GitHub", &[]),
        ];

        assert_eq!(available_sources(&items), vec!["all", "GitHub", "Dev.to"]);
        assert_eq!(available_sources(&[]), vec!["all"]);
    }

    #[test]
    fn test_format_time() {
        let ts: DateTime<Utc> = "2024-03-10T08:05:00Z".parse().unwrap();
        assert_eq!(format_time(&ts, &Utc), "08:05");

        let tz = chrono::FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(format_time(&ts, &tz), "10:05");
    }
}
