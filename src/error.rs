//! Error types for evaluation.

use thiserror::Error;

/// Evaluation errors. Every variant aborts the whole `evaluate()` call.
///
/// Keys are carried in their `Debug` rendering so the error type does not
/// depend on the key type.
#[derive(Debug, Error)]
pub enum EvalError {
    /// No function is registered for the kind of a key.
    #[error("no function registered for kind {kind} (key {key})")]
    UnknownKeyKind {
        /// Debug representation of the kind.
        kind: String,
        /// Debug representation of the key.
        key: String,
    },

    /// A function invocation raised a fault.
    ///
    /// Faults are never retried.
    #[error("function for {key} failed: {source}")]
    FunctionFault {
        /// Debug representation of the key being computed.
        key: String,
        /// The fault raised by the function.
        #[source]
        source: anyhow::Error,
    },

    /// A function returned a value although some dependency was missing.
    #[error("function for {key} finished while dependencies were missing")]
    FinishedWithMissingDependencies {
        /// Debug representation of the key.
        key: String,
    },

    /// A function returned not-finished without any missing dependency.
    ///
    /// Such a node would never be signaled again.
    #[error("function for {key} returned not-finished without missing dependencies")]
    NotFinishedWithoutMissingDependencies {
        /// Debug representation of the key.
        key: String,
    },

    /// The work queue drained while the root was still pending.
    ///
    /// This happens when dependency declarations form a cycle.
    #[error("evaluation of {root} stalled with {} pending keys: {}", .pending.len(), .pending.join(", "))]
    Stalled {
        /// Debug representation of the root key.
        root: String,
        /// Debug representations of every key left pending.
        pending: Vec<String>,
    },

    /// The configured step limit was reached before the root finished.
    #[error("evaluation exceeded the limit of {limit} steps")]
    StepLimitExceeded {
        /// The configured limit.
        limit: usize,
    },
}

impl EvalError {
    /// Returns the underlying function fault if this is a `FunctionFault` variant.
    pub fn fault(&self) -> Option<&anyhow::Error> {
        match self {
            EvalError::FunctionFault { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Returns `true` if this is a function fault containing an error of type `E`.
    pub fn is<E: std::error::Error + Send + Sync + 'static>(&self) -> bool {
        self.fault().is_some_and(|e| e.downcast_ref::<E>().is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Missing(&'static str);

    impl std::fmt::Display for Missing {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "missing {}", self.0)
        }
    }

    impl std::error::Error for Missing {}

    #[test]
    fn test_fault_downcast() {
        let err = EvalError::FunctionFault {
            key: "File(\"a\")".to_string(),
            source: anyhow::Error::new(Missing("a")),
        };
        assert!(err.is::<Missing>());
        assert!(!err.is::<std::io::Error>());
        assert_eq!(err.to_string(), "function for File(\"a\") failed: missing a");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_stalled_display() {
        let err = EvalError::Stalled {
            root: "A".to_string(),
            pending: vec!["A".to_string(), "B".to_string()],
        };
        assert_eq!(err.to_string(), "evaluation of A stalled with 2 pending keys: A, B");
        assert!(err.fault().is_none());
    }
}
