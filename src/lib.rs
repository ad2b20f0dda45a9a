//! shardscan - a shard-aware query execution kernel
//!
//! - `uid`: hash-based and snowflake record identifiers
//! - `holes`: known gaps in secondary index coverage
//! - `planner`: query expression tree and literal normalization
//! - `executor`: chunked query execution over scan sessions

pub mod cli;
pub mod config;
pub mod executor;
pub mod holes;
pub mod observability;
pub mod planner;
pub mod uid;
