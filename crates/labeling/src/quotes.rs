//! Representative quote selection: centroid-nearest pool, model re-rank.

use std::sync::Arc;

use gemini::{with_retry, GenerativeService, ModelRole, RetryPolicy};

/// Candidate pool size drawn by centroid distance before re-ranking.
const POOL_SIZE: usize = 20;
/// Characters of each candidate shown in the re-rank prompt. Returned
/// quotes are always the verbatim full text.
const PROMPT_CLIP: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteSelection {
    pub quotes: Vec<String>,
    /// True when the re-rank failed and quotes are pure centroid-nearest.
    pub degraded: bool,
}

pub struct QuoteSelector {
    service: Arc<dyn GenerativeService>,
    retry: RetryPolicy,
}

fn distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = (*x - *y) as f64;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// Indices of `embeddings` ordered by distance to `centroid`, ties keeping
/// input order.
fn nearest_indices(embeddings: &[Vec<f32>], centroid: &[f32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..embeddings.len()).collect();
    order.sort_by(|&a, &b| {
        distance(&embeddings[a], centroid)
            .partial_cmp(&distance(&embeddings[b], centroid))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order
}

fn rerank_prompt(label: &str, candidates: &[String], n_quotes: usize) -> String {
    let numbered: Vec<String> = candidates
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let shown = match q.char_indices().nth(PROMPT_CLIP) {
                Some((idx, _)) => &q[..idx],
                None => q.as_str(),
            };
            format!("{}. \"{}\"", i + 1, shown)
        })
        .collect();
    format!(
        "You are curating representative quotes for a survey theme.\n\
         \n\
         Theme: \"{label}\"\n\
         \n\
         Here are {count} candidate quotes from this theme cluster. Pick the {n_quotes} that BEST \
         represent this theme — they should clearly and directly relate to \"{label}\".\n\
         \n\
         Candidates:\n\
         {numbered}\n\
         \n\
         Reply with ONLY the numbers of your top {n_quotes} picks, separated by commas. Example: 1,5,8,12,3",
        count = candidates.len(),
        numbered = numbered.join("\n")
    )
}

/// Parse a comma-separated (or newline-separated) list of 1-based picks.
/// Repeated picks keep their first occurrence only, so a degenerate reply
/// cannot fill the quota with the same quote.
fn parse_picks(response: &str, pool_size: usize) -> Vec<usize> {
    let mut seen = vec![false; pool_size];
    response
        .replace('\n', ",")
        .split(',')
        .filter_map(|part| part.trim().parse::<usize>().ok())
        .filter(|&n| n >= 1 && n <= pool_size)
        .map(|n| n - 1)
        .filter(|&idx| !std::mem::replace(&mut seen[idx], true))
        .collect()
}

impl QuoteSelector {
    pub fn new(service: Arc<dyn GenerativeService>, retry: RetryPolicy) -> Self {
        Self { service, retry }
    }

    /// Pick up to `n_quotes` quotes for a cluster. `texts` and `embeddings`
    /// are parallel slices of the cluster's members.
    pub async fn select_quotes(
        &self,
        texts: &[String],
        embeddings: &[Vec<f32>],
        centroid: &[f32],
        n_quotes: usize,
        label: &str,
    ) -> QuoteSelection {
        debug_assert_eq!(texts.len(), embeddings.len());

        let order = nearest_indices(embeddings, centroid);
        let pool: Vec<String> = order
            .iter()
            .take(POOL_SIZE)
            .map(|&i| texts[i].clone())
            .collect();

        // A pool that cannot overfill the quota needs no curation.
        if pool.len() <= n_quotes {
            return QuoteSelection {
                quotes: pool,
                degraded: false,
            };
        }

        let prompt = rerank_prompt(label, &pool, n_quotes);
        let response = with_retry(&self.retry, |_| {
            self.service.generate(ModelRole::Rerank, &prompt)
        })
        .await;

        match response {
            Ok(text) => {
                let picks = parse_picks(&text, pool.len());
                if picks.len() >= n_quotes {
                    return QuoteSelection {
                        quotes: picks[..n_quotes].iter().map(|&i| pool[i].clone()).collect(),
                        degraded: false,
                    };
                }
                tracing::warn!(
                    label,
                    picks = picks.len(),
                    wanted = n_quotes,
                    "re-rank returned too few picks, using centroid order"
                );
            }
            Err(err) => {
                tracing::warn!(label, error = %err, "quote re-rank failed, using centroid order");
            }
        }

        QuoteSelection {
            quotes: pool.into_iter().take(n_quotes).collect(),
            degraded: true,
        }
    }
}
