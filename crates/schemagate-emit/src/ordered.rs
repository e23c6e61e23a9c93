use schemagate_core::{resolve_order, Model, Table};

use crate::errors::Result;

/// A model together with a dependency-respecting table order.
#[derive(Debug, Clone)]
pub struct OrderedModel<'a> {
    model: &'a Model,
    order: Vec<String>,
}

impl<'a> OrderedModel<'a> {
    pub fn resolve(model: &'a Model) -> Result<Self> {
        let order = resolve_order(&model.tables)?;
        Ok(Self { model, order })
    }

    /// Table names in emission order.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Tables in emission order.
    pub fn tables(&self) -> impl Iterator<Item = &'a Table> + '_ {
        self.order.iter().filter_map(|name| self.model.table(name))
    }

    /// Declared name of a referenced table, or `name` itself when unknown.
    pub fn table_name<'n>(&self, name: &'n str) -> &'n str
    where
        'a: 'n,
    {
        self.model
            .tables
            .get_key_value(name)
            .map(|(declared, _)| declared)
            .unwrap_or(name)
    }

    /// Declared name of a column of `table`, or `column` itself when unknown.
    pub fn column_name<'n>(&self, table: &str, column: &'n str) -> &'n str
    where
        'a: 'n,
    {
        self.model
            .table(table)
            .and_then(|t| t.column(column))
            .map(|c| c.name.as_str())
            .unwrap_or(column)
    }
}
