//! # shadelink-core
//!
//! Core types and primitives for the Shadelink shader compatibility pass.
//! This crate contains foundational types shared across all Shadelink crates:
//! pipeline stages, builtin numeric types, configuration, and error types.

pub mod config;
pub mod error;
pub mod stage;
pub mod types;

pub use config::*;

pub use error::{ShadelinkError, ShadelinkResult};
pub use stage::{PatchStage, ShaderStage};
pub use types::{Literal, NumericType, ScalarKind, Shape};
