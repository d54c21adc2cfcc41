use thiserror::Error;

use crate::model::ExerciseId;

/// Failures of the in-memory editing operations.
///
/// None of these are fatal: the editor state is left as it was before the
/// failing call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditorError {
    #[error("{what} index {index} out of range (len {len})")]
    InvalidIndex {
        what: &'static str,
        index: usize,
        len: usize,
    },
    #[error("no exercise with id {0}")]
    UnknownExercise(ExerciseId),
    #[error("preset for '{name}' is malformed: {reason}")]
    MalformedPreset { name: String, reason: String },
    #[error("result for exercise {0} arrived after it was changed or removed")]
    StaleAsyncResult(ExerciseId),
    #[error("exercise at index {0} is a superset member and cannot start a superset")]
    NotSupersetRoot(usize),
    #[error("superset chain starting at {0} loops back on itself")]
    SupersetCycle(ExerciseId),
    #[error("invalid set key '{0}'")]
    InvalidSetKey(String),
}

/// Failures talking to the remote document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("request failed: {0}")]
    Http(String),
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("stored template is invalid: {0}")]
    Invalid(#[from] EditorError),
}

impl StoreError {
    /// Whether retrying the same call could succeed without user changes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Http(_))
    }

    /// Short message suitable for a "save failed" notice.
    pub fn save_failed_notice(&self) -> String {
        if self.is_retryable() {
            format!("Save failed, tap to retry ({self})")
        } else {
            format!("Save failed: {self}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_errors_are_retryable() {
        assert!(StoreError::Http("timeout".into()).is_retryable());
        assert!(!StoreError::Forbidden("nope".into()).is_retryable());
        let notice = StoreError::Http("timeout".into()).save_failed_notice();
        assert!(notice.starts_with("Save failed, tap to retry"));
    }

    #[test]
    fn invalid_index_message() {
        let err = EditorError::InvalidIndex {
            what: "set",
            index: 4,
            len: 2,
        };
        assert_eq!(err.to_string(), "set index 4 out of range (len 2)");
    }
}
