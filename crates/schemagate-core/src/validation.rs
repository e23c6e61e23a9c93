use std::fmt;

use serde::Serialize;

use crate::error::Error;
use crate::graph::DependencyGraph;
use crate::model::{ForeignKey, Model, Table};

/// Kind of integrity violation found in a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// The foreign key column is not a column of its own table.
    UnknownColumn,
    /// The referenced table does not exist.
    UnknownTable,
    /// The referenced column does not exist in the referenced table.
    UnknownRefColumn,
    /// The foreign key graph is cyclic.
    Cycle,
}

impl IssueKind {
    pub fn code(&self) -> &'static str {
        match self {
            IssueKind::UnknownColumn => "unknown_fk_column",
            IssueKind::UnknownTable => "unknown_ref_table",
            IssueKind::UnknownRefColumn => "unknown_ref_column",
            IssueKind::Cycle => "fk_cycle",
        }
    }
}

/// A single integrity violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    /// Owning table; `None` for model-wide issues such as cycles.
    pub table: Option<String>,
    /// The name that could not be resolved.
    pub subject: String,
    pub message: String,
}

impl ValidationIssue {
    fn reference(kind: IssueKind, table: &Table, subject: &str, message: String) -> Self {
        Self {
            kind,
            table: Some(table.name.clone()),
            subject: subject.to_string(),
            message,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ERROR: {}", self.message)
    }
}

/// Aggregated result of [`validate`].
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Returns true when no violation was found.
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.issues.len()
    }

    /// One descriptive line per violation.
    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }

    fn push(&mut self, issue: ValidationIssue) {
        tracing::debug!(
            event = "integrity_issue",
            code = issue.kind.code(),
            message = %issue.message
        );
        self.issues.push(issue);
    }
}

/// Check foreign key references and acyclicity of a built model.
///
/// All violations are collected; nothing short-circuits. A missing target
/// table surfaces in the reference check only. The cycle check runs over the
/// foreign keys whose target exists, so a broken reference elsewhere never
/// hides a cycle.
pub fn validate(model: &Model) -> ValidationReport {
    let mut report = ValidationReport::default();

    for table in model.tables.values() {
        for fk in &table.foreign_keys {
            check_foreign_key(model, table, fk, &mut report);
        }
    }

    if let Err(Error::Cycle(cycle)) = DependencyGraph::build_known(&model.tables).toposort() {
        report.push(ValidationIssue {
            kind: IssueKind::Cycle,
            table: None,
            subject: cycle.join(" -> "),
            message: Error::Cycle(cycle).to_string(),
        });
    }

    tracing::info!(event = "model_validated", errors = report.error_count());
    report
}

fn check_foreign_key(model: &Model, table: &Table, fk: &ForeignKey, report: &mut ValidationReport) {
    if !table.columns.contains(&fk.column) {
        report.push(ValidationIssue::reference(
            IssueKind::UnknownColumn,
            table,
            &fk.column,
            format!(
                "table {} references non-existing column in foreign key: {}",
                table.name, fk.column
            ),
        ));
    }

    let Some(ref_table) = model.table(&fk.ref_table) else {
        report.push(ValidationIssue::reference(
            IssueKind::UnknownTable,
            table,
            &fk.ref_table,
            format!(
                "table {} references non-existing table: {} (foreign key {}.{})",
                table.name, fk.ref_table, table.name, fk.column
            ),
        ));
        return;
    };

    if !ref_table.columns.contains(&fk.ref_column) {
        report.push(ValidationIssue::reference(
            IssueKind::UnknownRefColumn,
            table,
            &fk.ref_column,
            format!(
                "table {} references non-existing column in table {}: {}",
                table.name, ref_table.name, fk.ref_column
            ),
        ));
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::builder::build_model;

    fn model(raw: serde_json::Value) -> Model {
        build_model(&raw).expect("model should build")
    }

    #[test]
    fn reports_every_broken_reference() {
        let model = model(json!({
            "tables": {
                "users": {
                    "columns": [{ "name": "id", "type": "INTEGER" }],
                    "primarykey": "id",
                },
                "orders": {
                    "columns": [
                        { "name": "id", "type": "INTEGER" },
                        { "name": "user_id", "type": "INTEGER" },
                    ],
                    "primarykey": "id",
                    "foreignkeys": [
                        { "column": "customer_id", "reftable": "users", "refcolumn": "id" },
                        { "column": "user_id", "reftable": "users", "refcolumn": "uid" },
                        { "column": "user_id", "reftable": "accounts", "refcolumn": "id" },
                    ],
                },
            },
        }));

        let report = validate(&model);
        let kinds: Vec<IssueKind> = report.issues.iter().map(|issue| issue.kind).collect();
        assert_eq!(
            kinds,
            vec![
                IssueKind::UnknownColumn,
                IssueKind::UnknownRefColumn,
                IssueKind::UnknownTable,
            ]
        );
        assert_eq!(report.error_count(), 3);
    }

    #[test]
    fn missing_column_and_table_on_same_key_are_both_reported() {
        let model = model(json!({
            "tables": {
                "orders": {
                    "columns": [{ "name": "id", "type": "INTEGER" }],
                    "primarykey": "id",
                    "foreignkeys": [
                        { "column": "user_id", "reftable": "users", "refcolumn": "id" },
                    ],
                },
            },
        }));

        let report = validate(&model);
        assert_eq!(report.error_count(), 2);
        assert!(report.issues.iter().all(|issue| issue.kind != IssueKind::Cycle));
    }

    #[test]
    fn cycle_is_reported_once() {
        let model = model(json!({
            "tables": {
                "a": {
                    "columns": [{ "name": "id", "type": "INTEGER" }, { "name": "b_id", "type": "INTEGER" }],
                    "primarykey": "id",
                    "foreignkeys": [{ "column": "b_id", "reftable": "b", "refcolumn": "id" }],
                },
                "b": {
                    "columns": [{ "name": "id", "type": "INTEGER" }, { "name": "a_id", "type": "INTEGER" }],
                    "primarykey": "id",
                    "foreignkeys": [{ "column": "a_id", "reftable": "a", "refcolumn": "id" }],
                },
            },
        }));

        let report = validate(&model);
        assert_eq!(report.error_count(), 1);
        let issue = &report.issues[0];
        assert_eq!(issue.kind, IssueKind::Cycle);
        assert_eq!(issue.subject, "a -> b -> a");
        assert_eq!(
            issue.to_string(),
            "ERROR: cyclic dependencies in tables found: a -> b -> a"
        );
    }

    #[test]
    fn cycle_is_reported_alongside_missing_table() {
        let model = model(json!({
            "tables": {
                "a": {
                    "columns": [{ "name": "id", "type": "INTEGER" }, { "name": "b_id", "type": "INTEGER" }],
                    "primarykey": "id",
                    "foreignkeys": [{ "column": "b_id", "reftable": "b", "refcolumn": "id" }],
                },
                "b": {
                    "columns": [{ "name": "id", "type": "INTEGER" }, { "name": "a_id", "type": "INTEGER" }],
                    "primarykey": "id",
                    "foreignkeys": [{ "column": "a_id", "reftable": "a", "refcolumn": "id" }],
                },
                "c": {
                    "columns": [{ "name": "id", "type": "INTEGER" }, { "name": "x_id", "type": "INTEGER" }],
                    "primarykey": "id",
                    "foreignkeys": [{ "column": "x_id", "reftable": "missing", "refcolumn": "id" }],
                },
            },
        }));

        let report = validate(&model);
        let kinds: Vec<IssueKind> = report.issues.iter().map(|issue| issue.kind).collect();
        assert_eq!(kinds, vec![IssueKind::UnknownTable, IssueKind::Cycle]);
        assert_eq!(report.issues[1].subject, "a -> b -> a");
    }

    #[test]
    fn clean_model_has_no_issues() {
        let model = model(json!({
            "tables": {
                "users": {
                    "columns": [{ "name": "id", "type": "INTEGER" }],
                    "primarykey": "id",
                },
            },
        }));
        assert!(validate(&model).is_ok());
    }
}
