//! 🔄 sort.rs: order records by one field, politely.
//!
//! Numbers compare as numbers, strings compare the way a human reads a list
//! (accents and case folded first, then accents, then case), and anything else ties.
//! Ties never move: the merge below is stable, so equal keys keep their
//! original order and the list doesn't flicker between renders. 🦆

use std::cmp::Ordering;

use serde::Deserialize;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::record::{FieldValue, Record};

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// 🔧 Sort knobs. Disabled or key-less means "leave it exactly as it is".
#[derive(Debug, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct SortParams {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortParams {
    pub fn by(key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            enabled: true,
            key: Some(key.into()),
            direction,
        }
    }
}

/// 🔄 Sort `records` by `params.key`. Disabled → same order, not a default ascending sort.
pub fn sort(records: Vec<Record>, params: &SortParams) -> Vec<Record> {
    let Some(key) = params.key.as_deref().filter(|_| params.enabled) else {
        return records;
    };

    stable_merge_sort(records, &|a: &Record, b: &Record| {
        let ordering = compare_values(a.get(key), b.get(key));
        match params.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    })
}

/// 🧮 Top-down stable merge sort.
///
/// `slice::sort_by` may panic when the comparator is not a total order, and
/// "mixed types tie" is not one. This merge only ever asks "is right strictly
/// less than left?", so a partial comparator just means fewer moves.
fn stable_merge_sort<T>(mut items: Vec<T>, compare: &impl Fn(&T, &T) -> Ordering) -> Vec<T> {
    if items.len() <= 1 {
        return items;
    }

    let right = items.split_off(items.len() / 2);
    let left = stable_merge_sort(items, compare);
    let right = stable_merge_sort(right, compare);

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    while let (Some(l), Some(r)) = (left.peek(), right.peek()) {
        let next = if compare(r, l) == Ordering::Less {
            right.next()
        } else {
            left.next()
        };
        merged.extend(next);
    }
    merged.extend(left);
    merged.extend(right);
    merged
}

fn compare_values(a: Option<&FieldValue>, b: Option<&FieldValue>) -> Ordering {
    match (a, b) {
        (Some(FieldValue::Number(x)), Some(FieldValue::Number(y))) => {
            x.partial_cmp(y).unwrap_or(Ordering::Equal)
        }
        (Some(FieldValue::String(x)), Some(FieldValue::String(y))) => compare_text(x, y),
        // -- 🤷 mixed, missing, bools, nested: everybody ties, nobody moves
        _ => Ordering::Equal,
    }
}

/// 🔤 Dictionary order, three passes deep.
///
/// 1. base letters: accents and case folded away, so "Émile" files under E
/// 2. accents: "resume" before "résumé"
/// 3. case: lowercase before uppercase, "a" before "A"
fn compare_text(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(base_letters(b))
        .then_with(|| a.chars().flat_map(char::to_lowercase).cmp(b.chars().flat_map(char::to_lowercase)))
        .then_with(|| case_order(a).cmp(case_order(b)))
}

fn base_letters(text: &str) -> impl Iterator<Item = char> + '_ {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
}

fn case_order(text: &str) -> impl Iterator<Item = (char, bool)> + '_ {
    text.chars().map(|c| (c.to_lowercase().next().unwrap_or(c), c.is_uppercase()))
}
