//! Failure handling for fan-out batches.
//!
//! Listing and cleanup degrade: a failed item is logged and left out.
//! Clearing a space is all-or-nothing: any failed item fails the whole call,
//! though the items that did succeed stay done.

/// How a batch reacts to per-item failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStrategy {
    /// Drop failed items, keep the rest.
    BestEffort,
    /// Report failure if any item failed.
    AllOrNothing,
}

/// Outcome of settling a batch under a [`FailureStrategy`].
#[derive(Debug)]
pub enum Settled<T, E> {
    /// Results that succeeded, in input order.
    Complete(Vec<T>),
    /// At least one item failed under [`FailureStrategy::AllOrNothing`].
    Failed {
        /// Successful results.
        succeeded: Vec<T>,
        /// Failed items.
        failed: Vec<E>,
    },
}

impl FailureStrategy {
    /// Split settled results according to the strategy.
    ///
    /// `on_failure` sees every failed item first, so callers log in one place.
    pub fn settle<T, E>(
        self,
        results: impl IntoIterator<Item = Result<T, E>>,
        mut on_failure: impl FnMut(&E),
    ) -> Settled<T, E> {
        let mut succeeded = Vec::new();
        let mut failed = Vec::new();

        for result in results {
            match result {
                Ok(value) => succeeded.push(value),
                Err(err) => {
                    on_failure(&err);
                    if self == Self::AllOrNothing {
                        failed.push(err);
                    }
                }
            }
        }

        if failed.is_empty() {
            Settled::Complete(succeeded)
        } else {
            Settled::Failed { succeeded, failed }
        }
    }
}
