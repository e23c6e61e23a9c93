use serde::Serialize;

use crate::registry::Registry;

/// A column declared in a table or column set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub db_type: String,
}

/// Foreign key from a column of the owning table to a column of `ref_table`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKey {
    pub column: String,
    pub ref_table: String,
    pub ref_column: String,
}

/// A table with its columns, primary key and foreign keys.
#[derive(Debug, Clone, Serialize)]
pub struct Table {
    pub name: String,
    pub columns: Registry<Column>,
    /// Primary key columns in declared order.
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn has_foreign_keys(&self) -> bool {
        !self.foreign_keys.is_empty()
    }
}

/// Named, reusable group of columns.
pub type ColumnSet = Registry<Column>;

/// The complete schema built from one input tree.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Model {
    pub tables: Registry<Table>,
    pub type_aliases: Registry<String>,
    pub column_sets: Registry<ColumnSet>,
}

impl Model {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }
}
