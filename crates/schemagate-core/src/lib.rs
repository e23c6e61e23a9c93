//! Core schema model for schemagate.
//!
//! This crate turns a generic parsed schema tree into a [`Model`], checks
//! its foreign keys for referential integrity and cycles, and resolves the
//! order in which tables must be created.

pub mod builder;
pub mod error;
pub mod graph;
pub mod model;
pub mod registry;
pub mod validation;

pub use builder::build_model;
pub use error::{Error, Result};
pub use graph::{resolve_order, DependencyGraph, GraphSummary};
pub use model::{Column, ColumnSet, ForeignKey, Model, Table};
pub use registry::Registry;
pub use validation::{validate, IssueKind, ValidationIssue, ValidationReport};
