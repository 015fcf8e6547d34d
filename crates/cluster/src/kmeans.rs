//! Lloyd's algorithm with k-means++ seeding and deterministic restarts.

use serde::{Deserialize, Serialize};

use crate::error::ClusterError;

/// Tuning knobs for a k-means run. Defaults reproduce the same partition on
/// every invocation for a given corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMeansConfig {
    /// Base RNG seed; each restart derives its own stream from this.
    pub seed: u64,
    /// Number of independent restarts, keeping the lowest-inertia result.
    pub n_init: usize,
    /// Iteration ceiling per restart.
    pub max_iter: usize,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            n_init: 10,
            max_iter: 100,
        }
    }
}

/// Result of a k-means run.
#[derive(Debug, Clone)]
pub struct Clustering {
    /// Cluster index per input point, parallel to the input slice.
    pub assignments: Vec<usize>,
    /// Final centroid per cluster.
    pub centroids: Vec<Vec<f32>>,
    /// Sum of squared distances from each point to its centroid.
    pub inertia: f64,
}

pub(crate) fn squared_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = (*x - *y) as f64;
            d * d
        })
        .sum()
}

fn check_points(points: &[Vec<f32>], k: usize) -> Result<(), ClusterError> {
    if k == 0 {
        return Err(ClusterError::ZeroClusters);
    }
    if points.len() < k {
        return Err(ClusterError::TooFewPoints {
            required: k,
            found: points.len(),
            k,
        });
    }
    let first = points[0].len();
    for p in points {
        if p.len() != first {
            return Err(ClusterError::DimensionMismatch {
                first,
                other: p.len(),
            });
        }
    }
    Ok(())
}

/// k-means++ seeding: the first centroid is uniform, each further centroid is
/// sampled proportionally to squared distance from the nearest chosen one.
fn seed_centroids(points: &[Vec<f32>], k: usize, rng: &mut fastrand::Rng) -> Vec<Vec<f32>> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.usize(..points.len())].clone());

    let mut nearest = vec![f64::INFINITY; points.len()];
    while centroids.len() < k {
        let latest = centroids.last().map(|c: &Vec<f32>| c.as_slice());
        if let Some(c) = latest {
            for (i, p) in points.iter().enumerate() {
                let d = squared_distance(p, c);
                if d < nearest[i] {
                    nearest[i] = d;
                }
            }
        }
        let total: f64 = nearest.iter().sum();
        if total <= 0.0 {
            // All points coincide with a centroid; fall back to uniform picks.
            centroids.push(points[rng.usize(..points.len())].clone());
            continue;
        }
        let mut target = rng.f64() * total;
        let mut chosen = points.len() - 1;
        for (i, d) in nearest.iter().enumerate() {
            target -= d;
            if target <= 0.0 {
                chosen = i;
                break;
            }
        }
        centroids.push(points[chosen].clone());
    }
    centroids
}

fn assign(points: &[Vec<f32>], centroids: &[Vec<f32>]) -> (Vec<usize>, f64) {
    let mut assignments = Vec::with_capacity(points.len());
    let mut inertia = 0.0;
    for p in points {
        let mut best = 0;
        let mut best_d = f64::INFINITY;
        for (ci, c) in centroids.iter().enumerate() {
            let d = squared_distance(p, c);
            if d < best_d {
                best_d = d;
                best = ci;
            }
        }
        assignments.push(best);
        inertia += best_d;
    }
    (assignments, inertia)
}

fn recompute_centroids(
    points: &[Vec<f32>],
    assignments: &[usize],
    centroids: &mut [Vec<f32>],
) {
    let dim = points[0].len();
    let k = centroids.len();
    let mut sums = vec![vec![0.0f64; dim]; k];
    let mut counts = vec![0usize; k];
    for (p, &a) in points.iter().zip(assignments.iter()) {
        counts[a] += 1;
        for (s, v) in sums[a].iter_mut().zip(p.iter()) {
            *s += *v as f64;
        }
    }
    for (ci, centroid) in centroids.iter_mut().enumerate() {
        // An empty cluster keeps its previous centroid.
        if counts[ci] == 0 {
            continue;
        }
        for (slot, s) in centroid.iter_mut().zip(sums[ci].iter()) {
            *slot = (*s / counts[ci] as f64) as f32;
        }
    }
}

fn run_once(
    points: &[Vec<f32>],
    k: usize,
    max_iter: usize,
    rng: &mut fastrand::Rng,
) -> Clustering {
    let mut centroids = seed_centroids(points, k, rng);
    let (mut assignments, mut inertia) = assign(points, &centroids);
    for _ in 0..max_iter {
        recompute_centroids(points, &assignments, &mut centroids);
        let (next, next_inertia) = assign(points, &centroids);
        let converged = next == assignments;
        assignments = next;
        inertia = next_inertia;
        if converged {
            break;
        }
    }
    Clustering {
        assignments,
        centroids,
        inertia,
    }
}

/// Cluster `points` into `k` groups, keeping the best of `n_init` restarts.
pub fn kmeans(
    points: &[Vec<f32>],
    k: usize,
    config: &KMeansConfig,
) -> Result<Clustering, ClusterError> {
    check_points(points, k)?;

    let mut rng = fastrand::Rng::with_seed(config.seed);
    let mut best = run_once(points, k, config.max_iter, &mut rng);
    for restart in 1..config.n_init.max(1) {
        let mut rng = fastrand::Rng::with_seed(config.seed.wrapping_add(restart as u64));
        let run = run_once(points, k, config.max_iter, &mut rng);
        if run.inertia < best.inertia {
            best = run;
        }
    }
    tracing::debug!(k, inertia = best.inertia, "k-means finished");
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blobs() -> Vec<Vec<f32>> {
        let mut points = Vec::new();
        for i in 0..10 {
            let jitter = i as f32 * 0.01;
            points.push(vec![0.0 + jitter, 0.0 - jitter]);
            points.push(vec![10.0 - jitter, 10.0 + jitter]);
        }
        points
    }

    #[test]
    fn separates_two_blobs() {
        let points = two_blobs();
        let result = kmeans(&points, 2, &KMeansConfig::default()).unwrap();
        // Every even index is in one blob, every odd in the other.
        let first = result.assignments[0];
        let second = result.assignments[1];
        assert_ne!(first, second);
        for (i, &a) in result.assignments.iter().enumerate() {
            if i % 2 == 0 {
                assert_eq!(a, first);
            } else {
                assert_eq!(a, second);
            }
        }
    }

    #[test]
    fn deterministic_across_runs() {
        let points = two_blobs();
        let cfg = KMeansConfig::default();
        let a = kmeans(&points, 2, &cfg).unwrap();
        let b = kmeans(&points, 2, &cfg).unwrap();
        assert_eq!(a.assignments, b.assignments);
        assert_eq!(a.inertia, b.inertia);
    }

    #[test]
    fn rejects_k_larger_than_corpus() {
        let points = vec![vec![0.0], vec![1.0]];
        let err = kmeans(&points, 3, &KMeansConfig::default()).unwrap_err();
        assert!(matches!(err, ClusterError::TooFewPoints { .. }));
    }

    #[test]
    fn rejects_zero_k() {
        let points = vec![vec![0.0]];
        assert_eq!(
            kmeans(&points, 0, &KMeansConfig::default()).unwrap_err(),
            ClusterError::ZeroClusters
        );
    }

    #[test]
    fn rejects_ragged_input() {
        let points = vec![vec![0.0, 1.0], vec![0.0]];
        let err = kmeans(&points, 1, &KMeansConfig::default()).unwrap_err();
        assert!(matches!(err, ClusterError::DimensionMismatch { .. }));
    }

    #[test]
    fn identical_points_still_terminate() {
        let points = vec![vec![1.0, 1.0]; 8];
        let result = kmeans(&points, 2, &KMeansConfig::default()).unwrap();
        assert_eq!(result.assignments.len(), 8);
        assert!(result.inertia < 1e-9);
    }
}
