//! Construction of a [`Model`] from a generic parsed configuration tree.
//!
//! The builder only performs structural checks: required attributes,
//! alias and column set resolution, name uniqueness and primary keys.
//! Foreign key targets are checked later by [`crate::validation`], once
//! every table is known.

use serde_json::{Map, Value};

use crate::error::{Error, Result, ResultExt};
use crate::model::{Column, ColumnSet, ForeignKey, Model, Table};
use crate::registry::Registry;

/// Build the full model. Fails on the first structural error, wrapped with
/// the table or column set it occurred in.
pub fn build_model(raw: &Value) -> Result<Model> {
    let root = raw
        .as_object()
        .ok_or_else(|| Error::invalid_value("schema", "a mapping"))?;

    let type_aliases = build_type_aliases(root.get("typealiases"))?;
    let column_sets = build_column_sets(root.get("columnsets"), &type_aliases)?;

    let raw_tables = root
        .get("tables")
        .filter(|tables| !tables.is_null())
        .ok_or_else(|| Error::MissingSection("tables".to_string()))?;

    let mut tables = Registry::new();
    for (name, raw_table) in mapping(Some(raw_tables), "tables")? {
        build_table(name, raw_table, &type_aliases, &column_sets)
            .and_then(|table| tables.set(name.as_str(), table))
            .context_with(|| format!("table '{name}'"))?;
    }

    tracing::debug!(
        event = "model_built",
        tables = tables.len(),
        type_aliases = type_aliases.len(),
        column_sets = column_sets.len()
    );

    Ok(Model {
        tables,
        type_aliases,
        column_sets,
    })
}

/// Copy the `typealiases` section into a registry.
pub fn build_type_aliases(raw: Option<&Value>) -> Result<Registry<String>> {
    let mut aliases = Registry::new();
    for (name, value) in mapping(raw, "typealiases")? {
        let db_type = value
            .as_str()
            .ok_or_else(|| Error::invalid_value(format!("typealias '{name}'"), "a string"))?;
        aliases.set(name.as_str(), db_type.to_string())?;
    }
    Ok(aliases)
}

/// Build every named column set of the `columnsets` section.
pub fn build_column_sets(
    raw: Option<&Value>,
    aliases: &Registry<String>,
) -> Result<Registry<ColumnSet>> {
    let mut sets = Registry::new();
    for (name, value) in mapping(raw, "columnsets")? {
        build_columns(value, aliases)
            .and_then(|set| sets.set(name.as_str(), set))
            .context_with(|| format!("columnset '{name}'"))?;
    }
    Ok(sets)
}

fn build_columns(raw: &Value, aliases: &Registry<String>) -> Result<ColumnSet> {
    let mut columns = Registry::new();
    for raw_column in sequence(raw, "columns")? {
        let column = build_column(raw_column, aliases)?;
        columns.set(column.name.clone(), column)?;
    }
    Ok(columns)
}

/// Build one column, resolving `typealias` when no explicit `type` is given.
pub fn build_column(raw: &Value, aliases: &Registry<String>) -> Result<Column> {
    let attrs = raw
        .as_object()
        .ok_or_else(|| Error::invalid_value("column", "a mapping"))?;

    let name = optional_str(attrs, "name")?
        .ok_or_else(|| Error::MissingField("column name".to_string()))?;

    let db_type = resolve_type(attrs, aliases).context_with(|| format!("column '{name}'"))?;

    Ok(Column {
        name: name.to_string(),
        db_type,
    })
}

fn resolve_type(attrs: &Map<String, Value>, aliases: &Registry<String>) -> Result<String> {
    if let Some(db_type) = optional_str(attrs, "type")? {
        return Ok(db_type.to_string());
    }
    match optional_str(attrs, "typealias")? {
        Some(alias) => aliases
            .get(alias)
            .cloned()
            .ok_or_else(|| Error::UnknownAlias(alias.to_string())),
        None => Err(Error::MissingField("column type or typealias".to_string())),
    }
}

/// Build a table: direct columns, merged column sets, primary key and
/// foreign keys.
pub fn build_table(
    name: &str,
    raw: &Value,
    aliases: &Registry<String>,
    column_sets: &Registry<ColumnSet>,
) -> Result<Table> {
    let attrs = raw
        .as_object()
        .ok_or_else(|| Error::invalid_value("table", "a mapping"))?;

    let mut columns = match attrs.get("columns") {
        Some(raw_columns) if !raw_columns.is_null() => build_columns(raw_columns, aliases)?,
        _ => Registry::new(),
    };

    for set_name in string_list(attrs.get("columnsets"), "columnsets")? {
        let set = column_sets
            .get(&set_name)
            .ok_or_else(|| Error::UnknownColumnSet(set_name.clone()))?;
        for column in set.values() {
            columns.set(column.name.clone(), column.clone())?;
        }
    }

    if columns.is_empty() {
        return Err(Error::MissingField("columns".to_string()));
    }

    let raw_primary_key = attrs
        .get("primarykey")
        .filter(|value| !value.is_null())
        .ok_or_else(|| Error::MissingField("primarykey".to_string()))?;
    let mut primary_key = Vec::new();
    for entry in string_list(Some(raw_primary_key), "primarykey")? {
        let column = columns
            .get(&entry)
            .ok_or_else(|| Error::InvalidPrimaryKey(entry.clone()))?;
        primary_key.push(column.name.clone());
    }
    if primary_key.is_empty() {
        return Err(Error::MissingField("primarykey".to_string()));
    }

    let foreign_keys = match attrs.get("foreignkeys") {
        Some(raw_fks) if !raw_fks.is_null() => sequence(raw_fks, "foreignkeys")?
            .iter()
            .map(build_foreign_key)
            .collect::<Result<Vec<_>>>()?,
        _ => Vec::new(),
    };

    tracing::debug!(
        event = "table_built",
        table = %name,
        columns = columns.len(),
        foreign_keys = foreign_keys.len()
    );

    Ok(Table {
        name: name.to_string(),
        columns,
        primary_key,
        foreign_keys,
    })
}

/// Build a foreign key; `column`, `reftable` and `refcolumn` are required.
pub fn build_foreign_key(raw: &Value) -> Result<ForeignKey> {
    let attrs = raw
        .as_object()
        .ok_or_else(|| Error::invalid_value("foreign key", "a mapping"))?;

    let required = |field: &str| -> Result<String> {
        optional_str(attrs, field)?
            .map(str::to_string)
            .ok_or_else(|| Error::MissingField(format!("{field} in foreign key")))
    };

    Ok(ForeignKey {
        column: required("column")?,
        ref_table: required("reftable")?,
        ref_column: required("refcolumn")?,
    })
}

fn mapping<'a>(raw: Option<&'a Value>, field: &str) -> Result<Vec<(&'a String, &'a Value)>> {
    match raw {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Object(map)) => Ok(map.iter().collect()),
        Some(_) => Err(Error::invalid_value(field, "a mapping")),
    }
}

fn sequence<'a>(raw: &'a Value, field: &str) -> Result<&'a [Value]> {
    raw.as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| Error::invalid_value(field, "a list"))
}

/// A single string or a list of strings; absent means empty.
fn string_list(raw: Option<&Value>, field: &str) -> Result<Vec<String>> {
    match raw {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(single)) => Ok(vec![single.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| Error::invalid_value(field, "a string or list of strings"))
            })
            .collect(),
        Some(_) => Err(Error::invalid_value(field, "a string or list of strings")),
    }
}

fn optional_str<'a>(attrs: &'a Map<String, Value>, field: &str) -> Result<Option<&'a str>> {
    match attrs.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.as_str())),
        Some(_) => Err(Error::invalid_value(field, "a string")),
    }
}
