//! Core engine logic — dishes, ingredients, operations, recipes, execution.

pub mod catalogue;
pub mod dish;
pub mod error;
pub mod executor;
pub mod flow;
pub mod ingredient;
pub mod operation;
pub mod recipe;
