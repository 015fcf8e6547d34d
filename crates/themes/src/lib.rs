//! Final theme assembly and the themes.json artifact.
//!
//! Both analysis methods feed [`ThemeInput`]s into [`assemble_themes`],
//! which tallies segment breakdowns, computes corpus percentages, orders by
//! count and assigns ids. The resulting [`ThemeReport`] serializes to the
//! artifact the dashboard consumes.

pub mod artifact;
pub mod assemble;
pub mod theme;

pub use crate::artifact::{write_report, ThemeError};
pub use crate::assemble::{assemble_themes, segment_breakdown, ThemeInput};
pub use crate::theme::{RunMetadata, Segments, Theme, ThemeReport};
