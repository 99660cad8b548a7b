//! # shadelink-ast
//!
//! The syntax tree side of Shadelink: an arena [`Document`] with an always
//! consistent identifier index, the serde interchange tree it is built from,
//! structural matchers, fragment templates and a GLSL printer.

pub mod document;
pub mod index;
pub mod matcher;
pub mod node;
pub mod printer;
pub mod syntax;
pub mod template;

pub use document::{Descendants, Document};
pub use index::IdentifierIndex;
pub use matcher::{Captures, DeclarationMatch, DeclarationMatcher, Matcher};
pub use node::{
    AssignOp, BinaryOp, JumpKind, NodeClass, NodeId, NodeKind, Slot, StorageQualifier, TypeName,
    UnaryOp,
};
pub use printer::Printer;
pub use template::{SlotValue, Template};
