//! BK-003: Operation — one named, configured transformation step.
//!
//! An operation is plain data plus a function pointer: name, declared
//! input/output dish types, the bound ingredients, and the step flags
//! (breakpoint, disabled). Flow-control operations carry a kind tag instead
//! of a transform function; their dispatch lives in the executor.

use super::dish::{DishType, DishValue};
use super::error::EngineError;
use super::ingredient::{Ingredient, IngredientValue};
use serde_json::Value;

/// A pure transform: `(value, args) -> value`.
pub type TransformFn = fn(DishValue, &[IngredientValue]) -> Result<DishValue, EngineError>;

/// Which flow-control primitive an operation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    Fork,
    Merge,
    Jump,
    ConditionalJump,
    Return,
}

/// What running an operation means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpRun {
    /// A pure value transform.
    Transform(TransformFn),
    /// A flow-control primitive operating on the whole execution state.
    Flow(FlowKind),
}

/// One step in a recipe. Instances are constructed per bake and never shared
/// between in-flight executions, because ingredient values are mutable.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    name: String,
    description: String,
    input_type: DishType,
    output_type: DishType,
    run: OpRun,
    breakpoint: bool,
    disabled: bool,
    ingredients: Vec<Ingredient>,
}

impl Operation {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_type: DishType,
        output_type: DishType,
        run: OpRun,
        ingredients: Vec<Ingredient>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_type,
            output_type,
            run,
            breakpoint: false,
            disabled: false,
            ingredients,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn input_type(&self) -> DishType {
        self.input_type
    }

    pub fn output_type(&self) -> DishType {
        self.output_type
    }

    pub fn run(&self) -> OpRun {
        self.run
    }

    pub fn ingredients(&self) -> &[Ingredient] {
        &self.ingredients
    }

    /// The coerced ingredient values, in declaration order.
    pub fn ingredient_values(&self) -> Vec<IngredientValue> {
        self.ingredients.iter().map(|i| i.value().clone()).collect()
    }

    /// Assign raw args positionally. The shape (count, declared types) is
    /// fixed by the descriptor; a length mismatch is a catalogue bug and is
    /// not re-validated here — extra args are ignored, missing ones keep
    /// their defaults.
    pub fn set_ingredient_values(&mut self, values: &[Value]) -> Result<(), EngineError> {
        for (ingredient, raw) in self.ingredients.iter_mut().zip(values) {
            ingredient.set_value(raw).map_err(|e| EngineError::Coercion {
                operation: self.name.clone(),
                ingredient: ingredient.name().to_string(),
                expected: e.expected,
                sample: e.sample,
            })?;
        }
        Ok(())
    }

    /// Serializable snapshot: the operation name and the raw args exactly as
    /// the caller provided them.
    pub fn get_config(&self) -> (String, Vec<Value>) {
        (
            self.name.clone(),
            self.ingredients.iter().map(|i| i.raw().clone()).collect(),
        )
    }

    pub fn set_breakpoint(&mut self, set: bool) {
        self.breakpoint = set;
    }

    pub fn set_disabled(&mut self, set: bool) {
        self.disabled = set;
    }

    pub fn is_breakpoint(&self) -> bool {
        self.breakpoint
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn is_flow_control(&self) -> bool {
        matches!(self.run, OpRun::Flow(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ingredient::IngredientType;
    use serde_json::json;

    fn upper(input: DishValue, _args: &[IngredientValue]) -> Result<DishValue, EngineError> {
        match input {
            DishValue::Str(s) => Ok(DishValue::Str(s.to_uppercase())),
            _ => Err(EngineError::op("expected text input")),
        }
    }

    fn sample_op() -> Operation {
        Operation::new(
            "To Upper case",
            "Uppercases the input.",
            DishType::String,
            DishType::String,
            OpRun::Transform(upper),
            vec![Ingredient::new("Scope", IngredientType::Option)],
        )
    }

    #[test]
    fn test_bk003_flags_default_off() {
        let op = sample_op();
        assert!(!op.is_breakpoint());
        assert!(!op.is_disabled());
        assert!(!op.is_flow_control());
    }

    #[test]
    fn test_bk003_flag_mutation() {
        let mut op = sample_op();
        op.set_breakpoint(true);
        op.set_disabled(true);
        assert!(op.is_breakpoint());
        assert!(op.is_disabled());
    }

    #[test]
    fn test_bk003_flow_control_query() {
        let op = Operation::new(
            "Merge",
            "",
            DishType::String,
            DishType::String,
            OpRun::Flow(FlowKind::Merge),
            vec![],
        );
        assert!(op.is_flow_control());
    }

    #[test]
    fn test_bk003_get_config_echoes_raw_args() {
        let mut op = sample_op();
        op.set_ingredient_values(&[json!("All")]).unwrap();
        let (name, args) = op.get_config();
        assert_eq!(name, "To Upper case");
        assert_eq!(args, vec![json!("All")]);
    }

    #[test]
    fn test_bk003_coercion_failure_names_operation() {
        let mut op = Operation::new(
            "Jump",
            "",
            DishType::String,
            DishType::String,
            OpRun::Flow(FlowKind::Jump),
            vec![
                Ingredient::new("Jump amount", IngredientType::Number),
                Ingredient::new("Maximum jumps", IngredientType::Number),
            ],
        );
        let err = op
            .set_ingredient_values(&[json!("ten-ish maybe"), json!(10)])
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Jump"), "got: {msg}");
        assert!(msg.contains("Jump amount"));
        assert!(msg.contains("ten-ish ma…"));
    }

    #[test]
    fn test_bk003_extra_args_ignored() {
        let mut op = sample_op();
        op.set_ingredient_values(&[json!("All"), json!("surplus")])
            .unwrap();
        assert_eq!(op.ingredient_values().len(), 1);
    }
}
