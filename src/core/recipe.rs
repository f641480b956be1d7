//! BK-005: Recipe — an ordered list of operations plus its config form.
//!
//! A recipe is rebuilt from a plain serializable config for every bake.
//! `Recipe::from_string` and `Display` (JSON text of the step array) form
//! the round-trip contract: rebuilding from a recipe's own text yields an
//! equivalent recipe.

use super::catalogue::Catalogue;
use super::error::EngineError;
use super::operation::Operation;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// One step in the serializable recipe config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepConfig {
    /// Operation name, as registered in the catalogue.
    pub op: String,

    /// Raw args, bound positionally to the operation's ingredients.
    #[serde(default)]
    pub args: Vec<Value>,

    /// Pause before this step runs.
    #[serde(default)]
    pub breakpoint: bool,

    /// Skip this step entirely.
    #[serde(default)]
    pub disabled: bool,
}

impl StepConfig {
    pub fn new(op: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            op: op.into(),
            args,
            breakpoint: false,
            disabled: false,
        }
    }
}

/// An ordered sequence of operations. Constructed once per bake; never
/// shared across unrelated bakes, since ingredient values are mutable.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    ops: Vec<Operation>,
}

impl Recipe {
    /// Build a recipe from step configs, instantiating each operation from
    /// the catalogue and binding its args. Coercion failures surface here,
    /// before execution starts.
    pub fn from_config(steps: &[StepConfig], catalogue: &Catalogue) -> Result<Self, EngineError> {
        let mut ops = Vec::with_capacity(steps.len());
        for step in steps {
            let mut op = catalogue.build(&step.op)?;
            op.set_ingredient_values(&step.args)?;
            op.set_breakpoint(step.breakpoint);
            op.set_disabled(step.disabled);
            ops.push(op);
        }
        Ok(Self { ops })
    }

    /// Rebuild a recipe from its JSON text form.
    pub fn from_string(text: &str, catalogue: &Catalogue) -> Result<Self, EngineError> {
        let steps: Vec<StepConfig> = serde_json::from_str(text)
            .map_err(|e| EngineError::Config(e.to_string()))?;
        Self::from_config(&steps, catalogue)
    }

    /// Wrap an already-built operation list. Fork uses this to run a child
    /// recipe over a cloned slice of the outer list.
    pub(crate) fn from_ops(ops: Vec<Operation>) -> Self {
        Self { ops }
    }

    /// The serializable snapshot of this recipe.
    pub fn to_config(&self) -> Vec<StepConfig> {
        self.ops
            .iter()
            .map(|op| {
                let (name, args) = op.get_config();
                StepConfig {
                    op: name,
                    args,
                    breakpoint: op.is_breakpoint(),
                    disabled: op.is_disabled(),
                }
            })
            .collect()
    }

    pub fn ops(&self) -> &[Operation] {
        &self.ops
    }

    /// Mutable step access, for toggling breakpoint/disabled flags between
    /// bakes.
    pub fn op_mut(&mut self, index: usize) -> Option<&mut Operation> {
        self.ops.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl fmt::Display for Recipe {
    /// JSON text of the step config array.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(&self.to_config()).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

// ============================================================================
// Tests
// ============================================================================
