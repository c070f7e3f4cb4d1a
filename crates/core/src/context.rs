use std::num::NonZeroUsize;
use std::thread;

/// Explicit execution context for a run.
///
/// Owned by the top-level caller and passed to constructors, in place of
/// process-wide logger and thread-pool singletons. Log records are emitted
/// under [`RunContext::target`]; [`RunContext::num_threads`] is the thread
/// budget handed to collaborators that parallelize internally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    target: String,
    num_threads: usize,
}

impl RunContext {
    /// Creates a context logging under `target` with at most `max_threads`
    /// threads.
    ///
    /// The budget is clamped to the available parallelism and is at least one.
    pub fn new(target: impl Into<String>, max_threads: usize) -> Self {
        let available = thread::available_parallelism().map_or(1, NonZeroUsize::get);
        Self {
            target: target.into(),
            num_threads: max_threads.min(available).max(1),
        }
    }

    /// Returns the log target.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns the thread budget.
    #[must_use]
    pub fn num_threads(&self) -> usize {
        self.num_threads
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new("weft", usize::MAX)
    }
}
