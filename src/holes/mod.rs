//! Index holes
//!
//! An index hole is a (value range × date range) rectangle for one field
//! where the secondary index is known to be incomplete. The planner consults
//! these before trusting an index lookup; a hit means the query must fall
//! back to a full scan for that term.

mod errors;
mod hole;
mod set;
mod source;

pub use errors::{HoleError, HoleResult};
pub use hole::{IndexHole, HOLE_DATE_FORMAT};
pub use set::IndexHoleSet;
pub use source::{HoleSource, MemoryHoleSource};
