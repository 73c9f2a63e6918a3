//! Closed lists of exercise categories and tags.

use crate::error::ValidationError;

/// Primary category of a solved exercise. Exactly one per exercise.
pub const PRIMARY_CATEGORIES: [&str; 17] = [
    "Array & Hashing",
    "Two Pointers",
    "Sliding Window",
    "Stack",
    "Binary Search",
    "Linked Lists",
    "Trees",
    "Tries",
    "Heap / Priority Queue",
    "Backtracking",
    "Graphs",
    "Advanced Graphs",
    "Dynamic Programming",
    "Greedy",
    "Intervals",
    "Math & Geometry",
    "Bit Manipulation",
];

/// Optional secondary tags. Any subset per exercise.
pub const ADDITIONAL_TAGS: [&str; 19] = [
    "Recursion",
    "DFS",
    "BFS",
    "Memoization",
    "Binary Tree",
    "Binary Search Tree",
    "Sorting",
    "String Manipulation",
    "Matrix",
    "Hash Map",
    "Queue",
    "Deque",
    "Union Find",
    "Divide & Conquer",
    "Prefix Sum",
    "Monotonic Stack",
    "Trie",
    "Segment Tree",
    "Fenwick Tree",
];

/// Category used when the caller does not pick one.
pub const DEFAULT_CATEGORY: &str = PRIMARY_CATEGORIES[0];

/// Match `input` against the primary categories, case-insensitively, and
/// return the canonical spelling.
pub fn primary_category(input: &str) -> Result<&'static str, ValidationError> {
    let wanted = input.trim();
    PRIMARY_CATEGORIES
        .iter()
        .find(|c| c.eq_ignore_ascii_case(wanted))
        .copied()
        .ok_or_else(|| ValidationError::UnknownCategory(wanted.to_string()))
}

/// Canonicalize a tag list: known tags only, first occurrence wins.
pub fn additional_tags<S: AsRef<str>>(input: &[S]) -> Result<Vec<String>, ValidationError> {
    let mut tags: Vec<String> = Vec::with_capacity(input.len());
    for raw in input {
        let wanted = raw.as_ref().trim();
        let tag = ADDITIONAL_TAGS
            .iter()
            .find(|t| t.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::UnknownTag(wanted.to_string()))?;
        if !tags.iter().any(|t| t == tag) {
            tags.push((*tag).to_string());
        }
    }
    Ok(tags)
}
