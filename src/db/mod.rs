//! Database access helpers

pub mod queries;
