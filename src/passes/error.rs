//! Pass engine errors
//!
//! Three families, surfaced to the direct caller and never retried:
//! build-time scheduling errors, lifecycle ordering errors, and
//! execution-time analysis resolution errors. Precondition violations
//! (bad level index, malformed units) are contract bugs and panic instead
//! of returning a value.

use super::{AnalysisId, ManagerState};
use std::fmt;

/// Errors reported by [`PipelineBuilder`](super::PipelineBuilder); both
/// abort construction and leave the pipeline unusable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// A pass requires an analysis with no producer at any reachable
    /// nesting level. A configuration error, not an execution error.
    UnschedulableAnalysis { analysis: AnalysisId, pass: String },

    /// The schedule was already frozen
    AlreadyBuilt,
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::UnschedulableAnalysis { analysis, pass } => write!(
                f,
                "analysis '{}' required by pass '{}' has no producer at any reachable level",
                analysis, pass
            ),
            BuildError::AlreadyBuilt => write!(f, "pipeline schedule is already frozen"),
        }
    }
}

impl std::error::Error for BuildError {}

/// Out-of-order initialize/run/finalize call. Fatal: signals a caller bug,
/// never recovered by retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleError {
    /// The operation that was attempted
    pub operation: &'static str,

    /// The state the manager was in
    pub state: ManagerState,
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot {} while the pass manager is in the {:?} state",
            self.operation, self.state
        )
    }
}

impl std::error::Error for LifecycleError {}

/// Errors surfaced by [`FunctionPassManager::run`](super::FunctionPassManager::run).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// Lifecycle precondition failed
    Lifecycle(LifecycleError),

    /// On-the-fly resolution found no producer for the analysis, even
    /// recursively. Distinct from [`BuildError::UnschedulableAnalysis`]
    /// because it surfaces during execution rather than construction.
    AnalysisUnavailable {
        analysis: AnalysisId,
        requested_by: String,
    },
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionError::Lifecycle(err) => err.fmt(f),
            ExecutionError::AnalysisUnavailable {
                analysis,
                requested_by,
            } => write!(
                f,
                "analysis '{}' requested by '{}' is unavailable: no producer is registered",
                analysis, requested_by
            ),
        }
    }
}

impl std::error::Error for ExecutionError {}

impl From<LifecycleError> for ExecutionError {
    fn from(err: LifecycleError) -> Self {
        ExecutionError::Lifecycle(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_ids_verbatim() {
        let err = BuildError::UnschedulableAnalysis {
            analysis: AnalysisId("dominators"),
            pass: "licm".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("dominators"));
        assert!(msg.contains("licm"));

        let err = ExecutionError::AnalysisUnavailable {
            analysis: AnalysisId("loops"),
            requested_by: "inline".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("loops"));
        assert!(msg.contains("inline"));
    }
}
