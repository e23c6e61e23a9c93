use std::fmt::Write;

use schemagate_core::Table;

use crate::options::EmitOptions;
use crate::ordered::OrderedModel;
use crate::Emitter;

/// Writes `CREATE TABLE` statements in dependency order.
#[derive(Debug, Clone, Default)]
pub struct SqlEmitter {
    options: EmitOptions,
}

impl SqlEmitter {
    pub fn new(options: EmitOptions) -> Self {
        Self { options }
    }

    fn write_header(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "-- {}", "-".repeat(70))?;
        writeln!(out, "-- schemagate generated database structure")?;
        if let Some(generated_on) = self.options.generated_on() {
            writeln!(out, "--")?;
            writeln!(out, "-- generated on {generated_on}")?;
        }
        writeln!(out, "-- {}", "-".repeat(70))?;
        writeln!(out)
    }

    fn write_table(
        &self,
        model: &OrderedModel<'_>,
        table: &Table,
        out: &mut String,
    ) -> std::fmt::Result {
        let q = self.options.quote;

        writeln!(out, "CREATE TABLE {} (", q.quote(&table.name))?;
        for column in table.columns.values() {
            writeln!(out, "  {} {},", q.quote(&column.name), column.db_type)?;
        }
        writeln!(out)?;

        let primary_key: Vec<String> = table.primary_key.iter().map(|c| q.quote(c)).collect();
        write!(out, "  PRIMARY KEY ({})", primary_key.join(", "))?;

        for fk in &table.foreign_keys {
            let ref_table = model.table_name(&fk.ref_table);
            writeln!(out, ",")?;
            write!(
                out,
                "  FOREIGN KEY ({}) REFERENCES {} ({})",
                q.quote(model.column_name(&table.name, &fk.column)),
                q.quote(ref_table),
                q.quote(model.column_name(ref_table, &fk.ref_column)),
            )?;
        }

        writeln!(out)?;
        writeln!(out, ");")?;
        writeln!(out)
    }
}

impl Emitter for SqlEmitter {
    fn name(&self) -> &'static str {
        "sql"
    }

    fn emit(&self, model: &OrderedModel<'_>, out: &mut String) -> std::fmt::Result {
        self.write_header(out)?;
        for table in model.tables() {
            tracing::debug!(event = "table_emitted", emitter = "sql", table = %table.name);
            self.write_table(model, table, out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use schemagate_core::build_model;
    use serde_json::json;

    use super::*;
    use crate::options::QuoteStyle;
    use crate::render;

    fn schema() -> schemagate_core::Model {
        build_model(&json!({
            "tables": {
                "Tags": {
                    "columns": [
                        { "name": "post_id", "type": "INTEGER" },
                        { "name": "tag", "type": "VARCHAR(20)" },
                    ],
                    "primarykey": ["post_id", "tag"],
                    "foreignkeys": [
                        { "column": "POST_ID", "reftable": "POSTS", "refcolumn": "ID" },
                    ],
                },
                "posts": {
                    "columns": [{ "name": "id", "type": "INTEGER" }],
                    "primarykey": "id",
                },
            },
        }))
        .expect("build model")
    }

    #[test]
    fn renders_tables_in_dependency_order() {
        let sql = render(&SqlEmitter::default(), &schema()).unwrap();
        let expected = "\
CREATE TABLE `posts` (
  `id` INTEGER,

  PRIMARY KEY (`id`)
);

CREATE TABLE `Tags` (
  `post_id` INTEGER,
  `tag` VARCHAR(20),

  PRIMARY KEY (`post_id`, `tag`),
  FOREIGN KEY (`post_id`) REFERENCES `posts` (`id`)
);

";
        assert!(sql.ends_with(expected), "unexpected output:\n{sql}");
    }

    #[test]
    fn header_includes_timestamp_when_set() {
        let options = EmitOptions {
            timestamp: Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap()),
            ..EmitOptions::default()
        };
        let sql = render(&SqlEmitter::new(options), &schema()).unwrap();
        assert!(sql.starts_with("-- ----"));
        assert!(sql.contains("-- generated on 2024-03-01 12:30:00\n"));

        let sql = render(&SqlEmitter::default(), &schema()).unwrap();
        assert!(!sql.contains("generated on"));
    }

    #[test]
    fn honours_quote_style() {
        let options = EmitOptions {
            quote: QuoteStyle::Double,
            ..EmitOptions::default()
        };
        let sql = render(&SqlEmitter::new(options), &schema()).unwrap();
        assert!(sql.contains("FOREIGN KEY (\"post_id\") REFERENCES \"posts\" (\"id\")"));
    }

    #[test]
    fn cyclic_model_is_not_rendered() {
        let model = build_model(&json!({
            "tables": {
                "a": {
                    "columns": [{ "name": "id", "type": "INTEGER" }],
                    "primarykey": "id",
                    "foreignkeys": [{ "column": "id", "reftable": "a", "refcolumn": "id" }],
                },
            },
        }))
        .unwrap();
        let err = render(&SqlEmitter::default(), &model).unwrap_err();
        assert!(matches!(
            err,
            crate::EmitError::Model(schemagate_core::Error::Cycle(_))
        ));
    }
}
