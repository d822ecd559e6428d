//! CLI command implementations.

pub mod repos;
pub mod tags;
