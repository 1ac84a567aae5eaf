//! Search across the captured logs.
//!
//! Matches console messages, request URLs and annotations by text and turns
//! them into a list of playback waypoints the user can step through.

use super::recording::Recording;

/// Search query criteria for finding matching waypoints.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Text to look for (empty matches nothing)
    pub text: String,
    /// Whether the match is case sensitive
    pub case_sensitive: bool,
    /// Search console messages
    pub in_console: bool,
    /// Search request methods and URLs
    pub in_network: bool,
    /// Search annotation text
    pub in_annotations: bool,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            text: String::new(),
            case_sensitive: false,
            in_console: true,
            in_network: true,
            in_annotations: true,
        }
    }
}

impl SearchQuery {
    /// Create a query for `text` across every source.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Make the match case sensitive.
    pub fn case_sensitive(mut self) -> Self {
        self.case_sensitive = true;
        self
    }

    /// Check if the query has any text to search for.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Check if a piece of text matches this query.
    pub fn matches(&self, haystack: &str) -> bool {
        if self.is_empty() {
            return false;
        }
        if self.case_sensitive {
            haystack.contains(self.text.as_str())
        } else {
            haystack
                .to_lowercase()
                .contains(&self.text.to_lowercase())
        }
    }
}

/// Matching timestamps and the one currently selected.
#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    /// Ascending, without duplicates
    times: Vec<u64>,
    selected: Option<usize>,
}

impl SearchResult {
    /// Results over `times`, with the first one selected.
    pub fn from_matches(times: Vec<u64>) -> Self {
        let selected = (!times.is_empty()).then_some(0);
        Self { times, selected }
    }

    pub fn count(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Timestamp of the selected match.
    pub fn current(&self) -> Option<u64> {
        self.times.get(self.selected?).copied()
    }

    /// 1-based position of the selection, for "3 of 10".
    pub fn current_position(&self) -> Option<usize> {
        self.selected.map(|i| i + 1)
    }

    /// Select the following match, wrapping to the first.
    pub fn next(&mut self) -> Option<u64> {
        self.step(true)
    }

    /// Select the preceding match, wrapping to the last.
    pub fn prev(&mut self) -> Option<u64> {
        self.step(false)
    }

    fn step(&mut self, forward: bool) -> Option<u64> {
        let len = self.times.len();
        if len == 0 {
            return None;
        }
        let index = match (self.selected, forward) {
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
            (None, true) => 0,
            (None, false) => len - 1,
        };
        self.selected = Some(index);
        self.current()
    }

    /// Select the first match at or after `time`, or the first match when
    /// every match lies before it.
    pub fn set_closest_to_time(&mut self, time: u64) {
        self.selected = if self.times.is_empty() {
            None
        } else {
            Some(self.times.partition_point(|&t| t < time) % self.times.len())
        };
    }
}

/// Find every timestamp in `recording` with at least one matching entry.
///
/// Returns unique timestamps in ascending order.
pub fn find_matches(recording: &Recording, query: &SearchQuery) -> Vec<u64> {
    // An empty query matches nothing rather than everything
    if query.is_empty() {
        return Vec::new();
    }

    let mut times = Vec::new();

    if query.in_console {
        times.extend(
            recording
                .console_logs
                .iter()
                .filter(|entry| query.matches(&entry.message))
                .map(|entry| entry.timestamp),
        );
    }

    if query.in_network {
        times.extend(
            recording
                .network_logs
                .iter()
                .filter(|entry| {
                    query.matches(&entry.url) || query.matches(&entry.method)
                })
                .map(|entry| entry.timestamp),
        );
    }

    if query.in_annotations {
        times.extend(
            recording
                .annotations
                .iter()
                .filter(|note| query.matches(&note.text))
                .map(|note| note.timestamp),
        );
    }

    times.sort_unstable();
    times.dedup();
    times
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::recording::{
        Annotation, ConsoleLevel, ConsoleLogEntry, NetworkLogEntry,
    };

    fn create_test_recording() -> Recording {
        Recording {
            console_logs: vec![
                ConsoleLogEntry {
                    timestamp: 100,
                    level: ConsoleLevel::Log,
                    message: "Checkout started".to_string(),
                },
                ConsoleLogEntry {
                    timestamp: 2_500,
                    level: ConsoleLevel::Error,
                    message: "TypeError: cart is undefined".to_string(),
                },
            ],
            network_logs: vec![
                NetworkLogEntry {
                    timestamp: 2_400,
                    method: "POST".to_string(),
                    url: "https://shop.test/api/cart".to_string(),
                    status: Some(500),
                    duration_ms: Some(320),
                },
                NetworkLogEntry {
                    timestamp: 2_500,
                    method: "GET".to_string(),
                    url: "https://shop.test/api/cart/items".to_string(),
                    status: Some(200),
                    duration_ms: Some(40),
                },
            ],
            annotations: vec![Annotation {
                timestamp: 3_000,
                text: "Cart empties here".to_string(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_query() {
        let recording = create_test_recording();
        let query = SearchQuery::new("   ");
        assert!(query.is_empty());
        assert!(find_matches(&recording, &query).is_empty());
    }

    #[test]
    fn test_search_across_sources() {
        let recording = create_test_recording();
        let results = find_matches(&recording, &SearchQuery::new("cart"));

        // 2_500 matches both a console message and a request; listed once.
        assert_eq!(results, vec![2_400, 2_500, 3_000]);
    }

    #[test]
    fn test_case_sensitive_search() {
        let recording = create_test_recording();
        let results = find_matches(&recording, &SearchQuery::new("Cart").case_sensitive());
        assert_eq!(results, vec![3_000]);
    }

    #[test]
    fn test_console_only_search() {
        let recording = create_test_recording();
        let query = SearchQuery {
            in_network: false,
            in_annotations: false,
            ..SearchQuery::new("cart")
        };
        let results = find_matches(&recording, &query);
        assert_eq!(results, vec![2_500]);
    }

    #[test]
    fn test_search_by_method() {
        let recording = create_test_recording();
        let results = find_matches(&recording, &SearchQuery::new("post"));
        assert_eq!(results, vec![2_400]);
    }

    #[test]
    fn test_search_result_navigation() {
        let mut result = SearchResult::from_matches(vec![0, 500, 1_000, 2_000]);

        assert_eq!(result.count(), 4);
        assert_eq!(result.current(), Some(0));
        assert_eq!(result.current_position(), Some(1));

        assert_eq!(result.next(), Some(500));
        assert_eq!(result.next(), Some(1_000));
        assert_eq!(result.next(), Some(2_000));

        // Wrap around
        assert_eq!(result.next(), Some(0));
        assert_eq!(result.prev(), Some(2_000));
        assert_eq!(result.prev(), Some(1_000));
    }

    #[test]
    fn test_search_result_closest() {
        let mut result = SearchResult::from_matches(vec![0, 500, 1_000, 2_000]);

        result.set_closest_to_time(700);
        assert_eq!(result.current(), Some(1_000));

        result.set_closest_to_time(5_000);
        assert_eq!(result.current(), Some(0));

        let mut empty = SearchResult::default();
        empty.set_closest_to_time(10);
        assert_eq!(empty.current(), None);
        assert_eq!(empty.next(), None);
    }
}
