//! Seeded k-means clustering with silhouette-based model selection.
//!
//! The clustering here is deliberately boring: Lloyd's algorithm with
//! k-means++ seeding, restarted a fixed number of times from a fixed seed so
//! that the same corpus always produces the same partition. The number of
//! clusters is chosen by scanning a candidate range and keeping the k with
//! the best mean silhouette score.

pub mod error;
pub mod kmeans;
pub mod silhouette;

pub use crate::error::ClusterError;
pub use crate::kmeans::{kmeans, Clustering, KMeansConfig};
pub use crate::silhouette::{choose_k, silhouette_score};
