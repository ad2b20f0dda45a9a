//! Query planning subsystem for shardscan
//!
//! Holds the query expression tree and the planning passes that run before
//! a query is split into chunks.
//!
//! # Passes
//!
//! - Literal normalization: string literals compared against fields with
//!   no declared type are re-parsed as numbers when possible.
//!
//! Passes never mutate their input. A rewritten tree shares unchanged
//! subtrees with the original, so earlier stages may keep their references.

mod ast;
mod errors;
mod normalizer;
mod numeric;
mod registry;

pub use ast::{CompareOp, Expr, Literal};
pub use errors::{PlannerError, PlannerErrorCode, PlannerResult, Severity};
pub use normalizer::{normalize_literals, LiteralNormalizer, Normalized};
pub use numeric::parse_numeric_literal;
pub use registry::{FieldType, FieldTypeRegistry};
