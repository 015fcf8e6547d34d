//! Theme naming: cluster labels, representative quotes, and the
//! whole-corpus generative analysis path.
//!
//! Everything here degrades instead of failing: labels fall back to keyword
//! scoring, quotes fall back to centroid order. Only the one-shot analysis
//! call surfaces errors, because it has nothing local to fall back on.

pub mod analysis;
pub mod fallback;
pub mod labels;
pub mod quotes;

pub use crate::analysis::{AnalyzedTheme, ThematicAnalysis, ThematicAnalyzer};
pub use crate::fallback::fallback_label;
pub use crate::labels::{ClusterLabel, LabelGenerator};
pub use crate::quotes::{QuoteSelection, QuoteSelector};
