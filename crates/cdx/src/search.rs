// ai
//! 🔍 search.rs: "did you mean Widget?" as a service.
//!
//! 🎬 *[a user types "wigdet". a lesser search box returns nothing.]*
//! *[this one shrugs, computes an edit distance, and finds the Widget anyway.]*
//!
//! Scores live in `[0, 1]` where 0 is a perfect hit:
//!
//! ```text
//!   0.00         exact match (case-insensitive)
//!   0.05..0.20   substring match, earlier is better
//!   0.25..1.00   fuzzy: best approximate substring, scaled by edits / query length
//! ```
//!
//! Exact and substring hits always outrank fuzzy ones. Records scoring above
//! the threshold are dropped. Survivors come back best-first, ties in input order.
//!
//! 🧠 Knowledge graph:
//! - Default keys: first record's fields minus anything that smells like an image URL
//! - Pure and reentrant: no state, no mutation, safe to call on every render 🦆

use serde::Deserialize;

use crate::record::Record;

const DEFAULT_THRESHOLD: f64 = 0.4;
const SUBSTRING_FLOOR: f64 = 0.05;
const SUBSTRING_SPAN: f64 = 0.15;
const FUZZY_FLOOR: f64 = 0.25;

/// 🔧 Search knobs.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SearchParams {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub term: String,
    /// 🎯 Fields to search. Empty → [`default_search_keys`].
    #[serde(default)]
    pub keys: Vec<String>,
    /// Highest score that still counts as a match. 0.0 = exact only, 1.0 = anything goes.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_enabled() -> bool {
    true
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            term: String::new(),
            keys: Vec::new(),
            threshold: default_threshold(),
        }
    }
}

impl SearchParams {
    pub fn for_term(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Self::default()
        }
    }

    /// ✅ Only an enabled search with something typed in does anything.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.term.trim().is_empty()
    }
}

/// 🖼️ URL-ish fields make terrible fuzzy matches. "https" matches everything.
fn is_image_field(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.contains("avatar") || key.contains("image")
}

/// 🎯 Every key of the first record, except avatars and images.
pub fn default_search_keys(records: &[Record]) -> Vec<String> {
    records
        .first()
        .map(|first| {
            first
                .keys()
                .filter(|key| !is_image_field(key))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// 🔍 Filter and rank `records` against the query.
///
/// Inactive search → the input, unchanged, same order.
pub fn search(records: &[Record], params: &SearchParams) -> Vec<Record> {
    if !params.is_active() {
        return records.to_vec();
    }

    let keys = if params.keys.is_empty() {
        default_search_keys(records)
    } else {
        params.keys.clone()
    };
    let query = params.term.trim().to_lowercase();

    let mut scored: Vec<(f64, &Record)> = records
        .iter()
        .filter_map(|record| {
            let best = keys
                .iter()
                .filter_map(|key| record.get(key))
                .map(|value| score(&query, &value.display_text().to_lowercase()))
                .fold(f64::INFINITY, f64::min);
            (best <= params.threshold).then_some((best, record))
        })
        .collect();

    // -- 🔄 stable sort: equal scores keep their original order
    scored.sort_by(|a, b| a.0.total_cmp(&b.0));
    scored.into_iter().map(|(_, record)| record.clone()).collect()
}

/// 🎯 Score one field. Both sides are already lowercased.
pub(crate) fn score(query: &str, text: &str) -> f64 {
    if query.is_empty() || text.is_empty() {
        return 1.0;
    }
    if text == query {
        return 0.0;
    }
    if let Some(position) = text.find(query) {
        let span = text.len().saturating_sub(query.len()).max(1) as f64;
        return SUBSTRING_FLOOR + SUBSTRING_SPAN * (position as f64 / span);
    }

    let query_chars: Vec<char> = query.chars().collect();
    let text_chars: Vec<char> = text.chars().collect();
    let distance = approximate_substring_distance(&query_chars, &text_chars);
    let ratio = (distance as f64 / query_chars.len() as f64).min(1.0);
    FUZZY_FLOOR + (1.0 - FUZZY_FLOOR) * ratio
}

/// 📐 Sellers' algorithm: fewest edits turning `query` into *some* substring of `text`.
///
/// Edit distance with a free start anywhere in the text (row 0 is all zeros) and
/// a free end anywhere (min over the last row). Adjacent transpositions cost one
/// edit, so "wigdet" is one typo away from "widget", not two.
fn approximate_substring_distance(query: &[char], text: &[char]) -> usize {
    let width = text.len() + 1;
    let mut before = vec![0usize; width];
    let mut previous = vec![0usize; width];
    let mut current = vec![0usize; width];

    for i in 1..=query.len() {
        current[0] = i;
        for j in 1..=text.len() {
            let cost = usize::from(query[i - 1] != text[j - 1]);
            let mut best = (previous[j - 1] + cost)
                .min(previous[j] + 1)
                .min(current[j - 1] + 1);
            if i > 1 && j > 1 && query[i - 1] == text[j - 2] && query[i - 2] == text[j - 1] {
                best = best.min(before[j - 2] + 1);
            }
            current[j] = best;
        }
        // -- 🔄 rotate rows: before ← previous ← current
        std::mem::swap(&mut before, &mut previous);
        std::mem::swap(&mut previous, &mut current);
    }

    previous.into_iter().min().unwrap_or(query.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Record> {
        vec![
            Record::new("1").with("name", "Gadget").with("image", "https://cdn/widget.png"),
            Record::new("2").with("name", "Widget").with("image", "https://cdn/a.png"),
            Record::new("3").with("name", "Blue Widget Pro").with("image", "https://cdn/b.png"),
            Record::new("4").with("name", "Sprocket").with("image", "https://cdn/c.png"),
        ]
    }

    fn ids(records: &[Record]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn the_one_where_an_empty_query_changes_nothing() {
        let records = catalog();
        assert_eq!(search(&records, &SearchParams::for_term("")), records);
        assert_eq!(search(&records, &SearchParams::for_term("   ")), records);

        let disabled = SearchParams {
            enabled: false,
            ..SearchParams::for_term("widget")
        };
        assert_eq!(search(&records, &disabled), records);
    }

    #[test]
    fn the_one_where_exact_beats_substring_beats_fuzzy() {
        let records = vec![
            Record::new("fuzzy").with("name", "Wigdet"),
            Record::new("substring").with("name", "Blue Widget"),
            Record::new("exact").with("name", "widget"),
        ];
        let results = search(&records, &SearchParams::for_term("Widget"));
        assert_eq!(ids(&results), vec!["exact", "substring", "fuzzy"]);
    }

    #[test]
    fn the_one_where_image_urls_do_not_crash_the_party() {
        // -- 🖼️ record 1's image URL contains "widget" but images are not searched
        let results = search(&catalog(), &SearchParams::for_term("widget"));
        assert_eq!(ids(&results), vec!["2", "3"]);
    }

    #[test]
    fn the_one_where_explicit_keys_override_the_defaults() {
        let params = SearchParams {
            keys: vec!["image".into()],
            ..SearchParams::for_term("widget")
        };
        assert_eq!(ids(&search(&catalog(), &params)), vec!["1"]);
    }

    #[test]
    fn the_one_where_typos_are_forgiven_but_nonsense_is_not() {
        assert_eq!(ids(&search(&catalog(), &SearchParams::for_term("sprokcet"))), vec!["4"]);
        assert!(search(&catalog(), &SearchParams::for_term("zzzzqqqq")).is_empty());
    }

    #[test]
    fn the_one_where_the_threshold_is_respected() {
        let strict = SearchParams {
            threshold: 0.0,
            ..SearchParams::for_term("widget")
        };
        assert_eq!(ids(&search(&catalog(), &strict)), vec!["2"]);
    }

    #[test]
    fn the_one_where_sellers_counts_edits_not_vibes() {
        let chars = |s: &str| s.chars().collect::<Vec<_>>();
        assert_eq!(approximate_substring_distance(&chars("abc"), &chars("xxabcxx")), 0);
        assert_eq!(approximate_substring_distance(&chars("abd"), &chars("xxabcxx")), 1);
        assert_eq!(approximate_substring_distance(&chars("abc"), &chars("")), 3);
        assert_eq!(approximate_substring_distance(&chars("wigdet"), &chars("widget")), 1);
        assert_eq!(approximate_substring_distance(&chars("widget"), &chars("gadget")), 2);
    }

    #[test]
    fn the_one_where_default_keys_skip_avatars() {
        let records = vec![Record::new("1").with("name", "A").with("userAvatar", "x").with("ImageUrl", "y")];
        assert_eq!(default_search_keys(&records), vec!["name".to_string()]);
        assert!(default_search_keys(&[]).is_empty());
    }
}
