//! Keyword-scored labels for when the generative path is unavailable.

use std::collections::HashSet;

/// Priority-ordered keyword groups, more specific first. Substring counts
/// over the cluster's sample text pick the winning label.
const KEYWORD_GROUPS: &[(&[&str], &str)] = &[
    (
        &["close", "near", "closer", "nearby", "distance"],
        "Closer Parking",
    ),
    (&["far", "walk", "walking", "remote"], "Reduce Walking"),
    (
        &["more", "spots", "add", "increase", "build", "expand"],
        "Add More Capacity",
    ),
    (
        &["cost", "expensive", "price", "afford", "cheaper", "free", "pay"],
        "Lower Costs",
    ),
    (
        &["bus", "transit", "shuttle", "crimson", "ride", "route"],
        "Improve Transit",
    ),
    (
        &["time", "wait", "find", "search", "faster"],
        "Reduce Wait Time",
    ),
    (
        &["accessible", "ada", "disability", "handicap"],
        "Better Accessibility",
    ),
    (&["deck", "garage", "structure"], "Parking Structures"),
    (&["lot", "surface"], "Surface Lots"),
];

const SUFFIXES: &[&str] = &["(Priority)", "(Secondary)", "(Other)"];

/// How many texts from the cluster get scanned for keywords.
const SAMPLE_SIZE: usize = 15;

fn count_occurrences(haystack: &str, needle: &str) -> usize {
    haystack.match_indices(needle).count()
}

/// Produce a label for a cluster from its member texts, guaranteed not to
/// collide with anything already in `used`.
pub fn fallback_label(texts: &[String], used: &HashSet<String>) -> String {
    let sample = texts
        .iter()
        .take(SAMPLE_SIZE)
        .map(|t| t.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");

    let mut scored: Vec<(usize, &str)> = KEYWORD_GROUPS
        .iter()
        .filter_map(|(keywords, label)| {
            let score: usize = keywords
                .iter()
                .map(|kw| count_occurrences(&sample, kw))
                .sum();
            (score > 0).then_some((score, *label))
        })
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    for (_, label) in &scored {
        if !used.contains(*label) {
            return (*label).to_string();
        }
    }
    for (_, label) in &scored {
        for suffix in SUFFIXES {
            let candidate = format!("{label} {suffix}");
            if !used.contains(&candidate) {
                return candidate;
            }
        }
    }
    format!("Theme {}", used.len() + 1)
}
