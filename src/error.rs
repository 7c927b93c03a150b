//! Error types for the segmentation engine.
//!
//! Only precondition failures at pipeline entry surface as errors; pixel
//! processing in steady state never fails. Degenerate geometry and coverage
//! fallbacks are handled internally and documented on the functions that
//! take them.

use thiserror::Error;

/// Errors produced by the segmentation pipeline.
#[derive(Debug, Error)]
pub enum SegmentError {
    /// The input image or a parameter failed validation before any work
    /// was done. No partial state is produced.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, SegmentError>;

impl SegmentError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        SegmentError::InvalidInput(msg.into())
    }
}
