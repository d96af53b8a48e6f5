//! Execution context that runs tasks on the submitting thread.

use crate::bridge::{ContextClosed, ExecutionContext, Task};

/// Runs each task immediately, so bridge calls complete synchronously.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineContext;

impl ExecutionContext for InlineContext {
    fn submit(&self, task: Task) -> Result<(), ContextClosed> {
        task();
        Ok(())
    }
}
