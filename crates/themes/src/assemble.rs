//! Turn per-cluster results into the final, ordered theme list.

use ingest::TextDocument;

use crate::theme::{Segments, Theme};

/// One labeled group of documents, produced by either analysis method.
#[derive(Debug, Clone)]
pub struct ThemeInput {
    pub label: String,
    pub description: String,
    pub count: usize,
    pub quotes: Vec<String>,
    /// Indices into the document corpus for segment tallies. May be empty
    /// when membership could not be established.
    pub members: Vec<usize>,
    pub degraded: bool,
}

/// Round to one decimal place, the precision the artifact promises.
fn round_pct(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Tally the covariates of a theme's member documents.
pub fn segment_breakdown(documents: &[TextDocument], members: &[usize]) -> Segments {
    let mut segments = Segments::default();
    let mut skipped = 0usize;
    let mut tallied = 0usize;

    for &idx in members {
        let Some(doc) = documents.get(idx) else {
            continue;
        };
        let cov = &doc.covariates;
        if !cov.arrival_time.is_empty() {
            *segments
                .by_arrival_time
                .entry(cov.arrival_time.clone())
                .or_default() += 1;
        }
        if !cov.mode.is_empty() {
            *segments.by_mode.entry(cov.mode.clone()).or_default() += 1;
        }
        if !cov.frequency.is_empty() {
            *segments.by_frequency.entry(cov.frequency.clone()).or_default() += 1;
        }
        if cov.skipped_class {
            skipped += 1;
        }
        tallied += 1;
    }

    segments.skip_rate = (tallied > 0).then(|| skipped as f64 / tallied as f64);
    segments
}

/// Assemble the final theme list: segments tallied, percentages computed
/// against `total_texts`, ordered by count descending (ties keep input
/// order), ids assigned after the sort.
pub fn assemble_themes(
    inputs: Vec<ThemeInput>,
    documents: &[TextDocument],
    total_texts: usize,
) -> Vec<Theme> {
    let mut themes: Vec<Theme> = inputs
        .into_iter()
        .map(|input| {
            let segments = segment_breakdown(documents, &input.members);
            let pct = if total_texts > 0 {
                round_pct(input.count as f64 / total_texts as f64 * 100.0)
            } else {
                0.0
            };
            Theme {
                id: 0,
                label: input.label,
                description: input.description,
                count: input.count,
                pct,
                quotes: input.quotes,
                segments,
                degraded: input.degraded,
            }
        })
        .collect();

    themes.sort_by(|a, b| b.count.cmp(&a.count));
    for (i, theme) in themes.iter_mut().enumerate() {
        theme.id = i;
    }
    themes
}

#[cfg(test)]
mod tests {
    use ingest::{Covariates, TextSource};

    use super::*;

    fn doc(arrival: &str, mode: &str, frequency: &str, skipped: bool) -> TextDocument {
        TextDocument {
            id: "r".into(),
            text: "some comment".into(),
            source: TextSource::Suggestion,
            covariates: Covariates {
                arrival_time: arrival.into(),
                mode: mode.into(),
                frequency: frequency.into(),
                skipped_class: skipped,
            },
        }
    }

    fn input(label: &str, count: usize, members: Vec<usize>) -> ThemeInput {
        ThemeInput {
            label: label.into(),
            description: String::new(),
            count,
            quotes: vec![],
            members,
            degraded: false,
        }
    }

    #[test]
    fn tallies_covariates_and_skip_rate() {
        let docs = vec![
            doc("8-10 AM", "Drive alone", "Daily", true),
            doc("8-10 AM", "Carpool", "Daily", false),
            doc("Before 8 AM", "Drive alone", "Weekly", true),
        ];
        let segments = segment_breakdown(&docs, &[0, 1, 2]);
        assert_eq!(segments.by_arrival_time["8-10 AM"], 2);
        assert_eq!(segments.by_arrival_time["Before 8 AM"], 1);
        assert_eq!(segments.by_mode["Drive alone"], 2);
        assert_eq!(segments.by_frequency["Daily"], 2);
        assert_eq!(segments.skip_rate, Some(2.0 / 3.0));
    }

    #[test]
    fn empty_categories_are_not_tallied() {
        let docs = vec![doc("", "", "", false)];
        let segments = segment_breakdown(&docs, &[0]);
        assert!(segments.by_arrival_time.is_empty());
        assert!(segments.by_mode.is_empty());
        assert!(segments.by_frequency.is_empty());
        assert_eq!(segments.skip_rate, Some(0.0));
    }

    #[test]
    fn no_members_means_no_skip_rate() {
        let segments = segment_breakdown(&[], &[]);
        assert_eq!(segments.skip_rate, None);
    }

    #[test]
    fn sorts_by_count_and_reassigns_ids() {
        let docs = vec![doc("8-10 AM", "Drive alone", "Daily", false)];
        let themes = assemble_themes(
            vec![
                input("Small", 3, vec![0]),
                input("Big", 10, vec![0]),
                input("Middle", 7, vec![0]),
            ],
            &docs,
            20,
        );
        assert_eq!(
            themes.iter().map(|t| t.label.as_str()).collect::<Vec<_>>(),
            vec!["Big", "Middle", "Small"]
        );
        assert_eq!(themes.iter().map(|t| t.id).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn pct_rounds_to_one_decimal() {
        let docs = vec![doc("8-10 AM", "Drive alone", "Daily", false)];
        let themes = assemble_themes(vec![input("Only", 1, vec![0])], &docs, 3);
        // 1/3 = 33.333...%
        assert_eq!(themes[0].pct, 33.3);
    }

    #[test]
    fn tie_on_count_keeps_input_order() {
        let docs = vec![doc("8-10 AM", "Drive alone", "Daily", false)];
        let themes = assemble_themes(
            vec![input("First", 5, vec![0]), input("Second", 5, vec![0])],
            &docs,
            10,
        );
        assert_eq!(themes[0].label, "First");
        assert_eq!(themes[1].label, "Second");
    }
}
