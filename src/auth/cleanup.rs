// ABOUTME: Ordered chain of release actions for one remote operation.
// ABOUTME: Runs exactly once, on explicit completion or when dropped.

use super::error::{Error, Result};
use std::fmt;

type Action = Box<dyn FnOnce() -> Result<()> + Send>;

/// Release actions accumulated while staging, run front to back.
///
/// Every action runs even if an earlier one fails. A chain that is dropped
/// without [`CleanupChain::run`] runs itself and logs failures, so no exit
/// path leaves staged key files behind.
#[derive(Default)]
pub struct CleanupChain {
    actions: Vec<Action>,
}

impl CleanupChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an action to the end of the chain.
    pub fn push(&mut self, action: impl FnOnce() -> Result<()> + Send + 'static) {
        self.actions.push(Box::new(action));
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Run every action in order, returning the first failure.
    pub fn run(mut self) -> Result<()> {
        self.run_all()
    }

    fn run_all(&mut self) -> Result<()> {
        let mut first_error: Option<Error> = None;
        for action in self.actions.drain(..) {
            if let Err(e) = action() {
                tracing::warn!("cleanup action failed: {}", e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Drop for CleanupChain {
    fn drop(&mut self) {
        if !self.actions.is_empty() {
            let _ = self.run_all();
        }
    }
}

impl fmt::Debug for CleanupChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CleanupChain")
            .field("pending", &self.actions.len())
            .finish()
    }
}
