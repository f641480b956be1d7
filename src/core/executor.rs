//! BK-006: Executor — the recipe driver loop.
//!
//! Advances through the operation list feeding the dish through each step:
//! disabled steps are skipped outright, breakpoints pause and return the
//! current index, flow-control steps receive the whole execution state and
//! own the advance, everything else converts, runs, stores, and moves on.
//! Fail-fast: the first error is annotated with positional context and
//! returned; no later step runs.

use super::dish::Dish;
use super::error::BakeError;
use super::flow;
use super::operation::{OpRun, Operation};
use super::recipe::Recipe;
use log::debug;

/// Execution state threaded through flow-control operations.
///
/// Created fresh per `execute` call and discarded when it returns.
/// `num_jumps` only ever increases; it is the sole loop-termination guard.
pub struct ExecutionState<'a> {
    /// Index into the operation list.
    pub progress: usize,
    /// Jumps taken so far in this bake.
    pub num_jumps: u32,
    /// The dish being operated on.
    pub dish: &'a mut Dish,
    /// The full operation list, for Fork's forward scan.
    pub op_list: &'a [Operation],
}

impl Recipe {
    /// Run the recipe over `dish`, starting at `start_from`.
    ///
    /// Returns the final progress index: `self.len()` on completion, or the
    /// index of a breakpointed step when pausing. A paused bake resumes with
    /// `execute(dish, returned_index)` once the caller clears the flag.
    pub fn execute(&self, dish: &mut Dish, start_from: usize) -> Result<usize, BakeError> {
        let ops = self.ops();
        let mut i = start_from;
        let mut num_jumps = 0u32;

        while i < ops.len() {
            let op = &ops[i];

            if op.is_disabled() {
                debug!("[{i}] '{}' is disabled, skipping", op.name());
                i += 1;
                continue;
            }

            if op.is_breakpoint() {
                debug!("[{i}] pausing at breakpoint before '{}'", op.name());
                return Ok(i);
            }

            match op.run() {
                OpRun::Flow(kind) => {
                    debug!("[{i}] flow control '{}'", op.name());
                    let mut state = ExecutionState {
                        progress: i,
                        num_jumps,
                        dish: &mut *dish,
                        op_list: ops,
                    };
                    flow::run(kind, op, &mut state)?;
                    i = state.progress;
                    num_jumps = state.num_jumps;
                }
                OpRun::Transform(run) => {
                    debug!("[{i}] executing '{}'", op.name());
                    let input = dish
                        .get(op.input_type())
                        .map_err(|e| BakeError::new(i, op.name(), e))?;
                    let output = run(input, &op.ingredient_values())
                        .map_err(|e| BakeError::new(i, op.name(), e))?;
                    dish.set(output);
                    i += 1;
                }
            }
        }

        Ok(ops.len())
    }
}

// ============================================================================
// Tests
// ============================================================================
