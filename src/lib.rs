//! Bakehouse — a recipe execution engine.
//!
//! Typed dishes, positional error reporting, resumable bakes.
//! Compose an ordered chain of operations, feed a dish through it, and let
//! flow control (Fork, Merge, Jump, Conditional Jump, Return) redirect or
//! fan out the normal linear run.

pub mod core;

pub use crate::core::catalogue::{ArgDescriptor, Catalogue, OpDescriptor};
pub use crate::core::dish::{Dish, DishType, DishValue};
pub use crate::core::error::{BakeError, EngineError};
pub use crate::core::ingredient::{CoercionError, Ingredient, IngredientType, IngredientValue};
pub use crate::core::executor::ExecutionState;
pub use crate::core::operation::{FlowKind, OpRun, Operation, TransformFn};
pub use crate::core::recipe::{Recipe, StepConfig};
