//! A tree-walking evaluator for a small Scheme dialect.

pub mod arena;
pub mod builtin;
pub mod config;
pub mod error;
pub mod interpreter;
pub mod number;
pub mod read;
pub mod runtime;
pub mod scheme;
pub mod syntax;

pub use crate::error::{Error, Result};
pub use crate::interpreter::Interpreter;
pub use crate::scheme::Scheme;
