//! Failure policy for the export pipeline.
//!
//! Nothing in the pipeline is retried. Every error either skips the unit of
//! work it belongs to (one subreddit, one post) or aborts the run.

use crate::CoreError;

/// What the pipeline does after an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStrategy {
    /// Drop everything fetched for the current subreddit and move to the next one
    SkipForum,
    /// Drop the current post and keep reading the listing
    SkipRow,
    /// Stop the run and surface the error
    Abort,
}

pub struct ErrorRecovery;

impl ErrorRecovery {
    /// Determine the recovery strategy for a given error
    pub fn determine_strategy(error: &CoreError) -> RecoveryStrategy {
        match error {
            // Upstream rejected the subreddit, the credentials or the payload
            CoreError::RedditApi(_) | CoreError::Network(_) => RecoveryStrategy::SkipForum,

            CoreError::Extraction(_) => RecoveryStrategy::SkipRow,

            // Configuration and output failures need user intervention
            CoreError::Config(_)
            | CoreError::Export(_)
            | CoreError::Io(_)
            | CoreError::Internal { .. } => RecoveryStrategy::Abort,
        }
    }
}
