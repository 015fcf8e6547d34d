use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClusterError {
    #[error("need at least {required} points for k={k}, got {found}")]
    TooFewPoints { required: usize, found: usize, k: usize },

    #[error("k must be at least 1")]
    ZeroClusters,

    #[error("points have inconsistent dimensions ({first} vs {other})")]
    DimensionMismatch { first: usize, other: usize },
}
