//! Mean silhouette scoring and the k scan that uses it.

use crate::error::ClusterError;
use crate::kmeans::{kmeans, squared_distance, KMeansConfig};

/// Mean silhouette coefficient over all points, in [-1, 1]. Points in
/// singleton clusters score 0.
pub fn silhouette_score(points: &[Vec<f32>], assignments: &[usize], k: usize) -> f64 {
    debug_assert_eq!(points.len(), assignments.len());
    if points.is_empty() || k < 2 {
        return 0.0;
    }

    let mut cluster_sizes = vec![0usize; k];
    for &a in assignments {
        cluster_sizes[a] += 1;
    }

    let mut total = 0.0;
    for (i, p) in points.iter().enumerate() {
        let own = assignments[i];
        if cluster_sizes[own] <= 1 {
            continue; // silhouette of a singleton is defined as 0
        }

        // Mean distance to every other cluster and to the point's own cluster.
        let mut sums = vec![0.0f64; k];
        for (j, q) in points.iter().enumerate() {
            if i == j {
                continue;
            }
            sums[assignments[j]] += squared_distance(p, q).sqrt();
        }

        let a = sums[own] / (cluster_sizes[own] - 1) as f64;
        let b = (0..k)
            .filter(|&c| c != own && cluster_sizes[c] > 0)
            .map(|c| sums[c] / cluster_sizes[c] as f64)
            .fold(f64::INFINITY, f64::min);
        if !b.is_finite() {
            continue;
        }
        let denom = a.max(b);
        if denom > 0.0 {
            total += (b - a) / denom;
        }
    }
    total / points.len() as f64
}

/// Scan `min_k..=max_k` and return the k with the best mean silhouette.
///
/// The scan is ascending and ties keep the earlier (smaller) k, so a flat
/// silhouette curve yields the most parsimonious model. `max_k` is clamped to
/// one less than the corpus size; the corpus must support at least one
/// candidate.
pub fn choose_k(
    points: &[Vec<f32>],
    min_k: usize,
    max_k: usize,
    config: &KMeansConfig,
) -> Result<usize, ClusterError> {
    let min_k = min_k.max(2);
    if points.len() < min_k + 1 {
        return Err(ClusterError::TooFewPoints {
            required: min_k + 1,
            found: points.len(),
            k: min_k,
        });
    }
    let max_k = max_k.min(points.len() - 1).max(min_k);

    let mut best_k = min_k;
    let mut best_score = f64::NEG_INFINITY;
    for k in min_k..=max_k {
        let clustering = kmeans(points, k, config)?;
        let score = silhouette_score(points, &clustering.assignments, k);
        tracing::debug!(k, score, "silhouette candidate");
        if score > best_score {
            best_score = score;
            best_k = k;
        }
    }
    tracing::info!(k = best_k, score = best_score, "selected cluster count");
    Ok(best_k)
}
