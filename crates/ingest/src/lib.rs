//! Survey ingestion: CSV loading and free-text selection.
//!
//! This crate turns the cleaned survey export into a list of
//! [`TextDocument`]s ready for embedding. Each row contributes at most one
//! document: the open-ended suggestion when it is substantive, otherwise the
//! skip-experience narrative, otherwise nothing.

pub mod csv;
pub mod error;
pub mod select;
pub mod types;

pub use crate::csv::{load_responses, read_responses};
pub use crate::error::IngestError;
pub use crate::select::{select_documents, SelectConfig};
pub use crate::types::{Covariates, ResponseRecord, TextDocument, TextSource};
