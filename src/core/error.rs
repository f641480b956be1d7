//! BK-008: Error taxonomy for the bake engine.
//!
//! Two layers: `EngineError` is the kind enum (what went wrong),
//! `BakeError` is the positional wrapper the executor surfaces to callers
//! (what went wrong, at which step, in which operation).

use super::dish::DishType;
use thiserror::Error;

/// What went wrong, independent of position in the recipe.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An ingredient's raw value could not be coerced to its declared type.
    #[error("invalid value for ingredient '{ingredient}' of '{operation}': expected {expected}, got \"{sample}\"")]
    Coercion {
        operation: String,
        ingredient: String,
        expected: &'static str,
        /// Truncated (≤10 char) sample of the offending input.
        sample: String,
    },

    /// A dish could not be converted to the type an operation requires.
    #[error("cannot convert {from} to {to}")]
    Conversion { from: DishType, to: DishType },

    /// The transform function itself failed on its input.
    #[error("{0}")]
    Operation(String),

    /// Jump counter reached its configured maximum.
    #[error("reached maximum jumps ({max})")]
    MaxJumps { max: u32 },

    /// Step config names an operation the catalogue does not know.
    #[error("unknown operation '{0}'")]
    UnknownOperation(String),

    /// Step config is structurally unusable.
    #[error("invalid recipe config: {0}")]
    Config(String),
}

impl EngineError {
    /// Build an operation runtime error from any message.
    pub fn op(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }
}

/// A mid-bake failure annotated with positional context.
///
/// `Display` is the composite string shown to users:
/// `"<operation name> - <message>"`.
#[derive(Debug, Error)]
#[error("{op_name} - {source}")]
pub struct BakeError {
    /// Index of the failing operation in the recipe's op list.
    pub progress: usize,
    /// Name of the failing operation.
    pub op_name: String,
    #[source]
    pub source: EngineError,
}

impl BakeError {
    pub fn new(progress: usize, op_name: impl Into<String>, source: EngineError) -> Self {
        Self {
            progress,
            op_name: op_name.into(),
            source,
        }
    }

    /// The composite human-readable string, same as `Display`.
    pub fn display_string(&self) -> String {
        self.to_string()
    }
}
