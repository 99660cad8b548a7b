//! # shadelink-transform
//!
//! Makes a set of GLSL stage documents acceptable to strict compilers:
//! each document is normalized on its own, then the outputs of every stage
//! are reconciled with the inputs of the next present stage.

pub mod diagnostics;
pub mod normalize;
pub mod pipeline;
pub mod reconcile;

pub use diagnostics::{Diagnostic, DiagnosticClass, DiagnosticSeverity, Diagnostics};
pub use normalize::{normalize, NormalizeReport};
pub use pipeline::{transform_pipeline, Pipeline, TransformReport};
pub use reconcile::{reconcile, InterfacePatch, ReconcileReport};
