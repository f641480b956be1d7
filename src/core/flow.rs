//! BK-007: Flow-control operations — Fork, Merge, Jump, Conditional Jump,
//! Return.
//!
//! These run against the whole execution state instead of a bare value and
//! own responsibility for advancing progress; the driver loop does not
//! auto-increment after them. Errors raised here are already annotated with
//! positional context, including child-recipe errors re-based to the outer
//! operation list.

use super::dish::{Dish, DishType, DishValue};
use super::error::{BakeError, EngineError};
use super::executor::ExecutionState;
use super::ingredient::IngredientValue;
use super::operation::{FlowKind, OpRun, Operation};
use super::recipe::Recipe;
use log::debug;
use regex::Regex;

/// Dispatch one flow-control step.
pub(crate) fn run(
    kind: FlowKind,
    op: &Operation,
    state: &mut ExecutionState<'_>,
) -> Result<(), BakeError> {
    match kind {
        FlowKind::Fork => fork(op, state),
        // Merge is a no-op scan target for Fork; reached directly it just
        // advances one step.
        FlowKind::Merge => {
            state.progress += 1;
            Ok(())
        }
        FlowKind::Jump => jump(op, state),
        FlowKind::ConditionalJump => conditional_jump(op, state),
        FlowKind::Return => {
            state.progress = state.op_list.len();
            Ok(())
        }
    }
}

// ============================================================================
// Fork
// ============================================================================

/// Split the dish text, run the operations between this Fork and the first
/// enabled Merge (or the end of the list) once per partition over a fresh
/// child dish, and rejoin with the merge delimiter appended after every
/// partition.
fn fork(op: &Operation, state: &mut ExecutionState<'_>) -> Result<(), BakeError> {
    let at = state.progress;
    let args = op.ingredient_values();
    let split_delim = arg_str(&args, 0);
    let merge_delim = arg_str(&args, 1);

    let input = dish_text(state.dish, op.input_type())
        .map_err(|e| BakeError::new(at, op.name(), e))?;

    // Child op list: everything strictly after the Fork up to (excluding)
    // the first enabled Merge. Disabled Merges are scanned past like any
    // other disabled step.
    let start = at + 1;
    let end = state.op_list[start..]
        .iter()
        .position(|o| !o.is_disabled() && o.run() == OpRun::Flow(FlowKind::Merge))
        .map_or(state.op_list.len(), |offset| start + offset);
    let sub_len = end - start;

    // The child recipe gets independent clones of the outer operations, so
    // nothing a branch does is visible in the parent list.
    let child = Recipe::from_ops(state.op_list[start..end].to_vec());

    // Empty input means zero partitions: no child runs, no delimiter.
    let partitions: Vec<&str> = if input.is_empty() {
        Vec::new()
    } else if split_delim.is_empty() {
        vec![input.as_str()]
    } else {
        input.split(split_delim.as_str()).collect()
    };
    debug!(
        "[{at}] fork into {} partition(s) over {} op(s)",
        partitions.len(),
        sub_len
    );

    let mut output = String::new();
    for partition in partitions {
        let mut child_dish = Dish::from(partition);
        child
            .execute(&mut child_dish, 0)
            .map_err(|e| BakeError::new(start + e.progress, e.op_name, e.source))?;
        output.push_str(
            &dish_text(&child_dish, DishType::String)
                .map_err(|e| BakeError::new(at, op.name(), e))?,
        );
        output.push_str(&merge_delim);
    }

    state.dish.set(DishValue::Str(output));
    state.progress = start + sub_len;
    Ok(())
}

// ============================================================================
// Jumps
// ============================================================================

/// Unconditional jump, guarded by the shared jump counter.
fn jump(op: &Operation, state: &mut ExecutionState<'_>) -> Result<(), BakeError> {
    let args = op.ingredient_values();
    let amount = arg_i64(&args, 0);
    let max = arg_u32(&args, 1);
    take_jump(op, state, amount, max)
}

/// Jump only when the dish's text form matches the configured regex;
/// otherwise advance exactly one step. The jump-count guard fires only when
/// the jump would be taken.
fn conditional_jump(op: &Operation, state: &mut ExecutionState<'_>) -> Result<(), BakeError> {
    let at = state.progress;
    let args = op.ingredient_values();
    let pattern = arg_str(&args, 0);
    let amount = arg_i64(&args, 1);
    let max = arg_u32(&args, 2);

    if !pattern.is_empty() {
        let regex = Regex::new(&pattern).map_err(|e| {
            BakeError::new(at, op.name(), EngineError::op(format!("invalid regex: {e}")))
        })?;
        let text = dish_text(state.dish, DishType::String)
            .map_err(|e| BakeError::new(at, op.name(), e))?;
        if regex.is_match(&text) {
            return take_jump(op, state, amount, max);
        }
    }

    state.progress += 1;
    Ok(())
}

fn take_jump(
    op: &Operation,
    state: &mut ExecutionState<'_>,
    amount: i64,
    max: u32,
) -> Result<(), BakeError> {
    if state.num_jumps >= max {
        return Err(BakeError::new(
            state.progress,
            op.name(),
            EngineError::MaxJumps { max },
        ));
    }
    state.num_jumps += 1;
    // Backward jumps clamp at the start of the list.
    let target = (state.progress as i64).saturating_add(amount).max(0);
    debug!(
        "[{}] jump {} of {} to index {target}",
        state.progress, state.num_jumps, max
    );
    state.progress = target as usize;
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn dish_text(dish: &Dish, ty: DishType) -> Result<String, EngineError> {
    match dish.get(ty)? {
        DishValue::Str(s) => Ok(s),
        other => Err(EngineError::op(format!(
            "expected text, got {}",
            other.dish_type()
        ))),
    }
}

fn arg_str(args: &[IngredientValue], idx: usize) -> String {
    args.get(idx)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

fn arg_i64(args: &[IngredientValue], idx: usize) -> i64 {
    args.get(idx).and_then(|v| v.as_number()).unwrap_or(0.0) as i64
}

fn arg_u32(args: &[IngredientValue], idx: usize) -> u32 {
    args.get(idx)
        .and_then(|v| v.as_number())
        .unwrap_or(0.0)
        .max(0.0) as u32
}

// ============================================================================
// Tests
// ============================================================================
