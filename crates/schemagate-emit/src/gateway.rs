//! PHP/PDO gateway classes, one per table.
//!
//! Each class carries one public field per column, array (de)serialization,
//! a select helper, CRUD entry points and one finder per foreign key. The
//! generated file starts with a small set of PDO helper functions shared by
//! all classes.

use std::collections::HashMap;
use std::fmt::Write;

use schemagate_core::{ForeignKey, Table};

use crate::errors::{EmitError, Result};
use crate::options::EmitOptions;
use crate::ordered::OrderedModel;
use crate::Emitter;

const DB_HELPERS: &str = r#"
// ---------- db helpers ----------

$_db_debug = false;

class VersionMismatchError extends \Exception { }


class AmbiguousQueryError extends \Exception { }


function _db_helper_enableDebug($enabled = false) {
    global $_db_debug;
    $_db_debug = $enabled;
}


// placeholders are not allowed in LIMIT, so the clause is rendered inline
function _db_helper_limitClause($offset = 0, $pagesize = 50) {
    if (!is_int($offset)) {
        throw new \Exception("offset must be integer");
    }
    if ($offset < 0) {
        throw new \Exception("offset must be greater or equals 0");
    }
    if (!is_int($pagesize)) {
        throw new \Exception("pagesize must be integer");
    }
    if ($pagesize < 1) {
        throw new \Exception("pagesize must be greater 0");
    }
    return "LIMIT {$offset}, {$pagesize}";
}


function _db_helper_stopWithError($errorInfo = null) {
    global $_db_debug;
    $msg = "Error during DB access";
    if ($_db_debug && !is_null($errorInfo)) {
        $msg .= "\n\nDEBUG INFO:\n" . implode("\n", $errorInfo);
    }
    die($msg);
}


/**
 * _db_helper_query executes $sql as a prepared statement and returns all rows.
 */
function _db_helper_query(&$pdo, $sql, $values = null) {
    $statement = $pdo->prepare($sql);
    if ($statement === false) {
        _db_helper_stopWithError($pdo->errorInfo());
    }
    if ($statement->execute($values) !== true) {
        _db_helper_stopWithError($statement->errorInfo());
    }

    $results = $statement->fetchAll();
    if ($results === false) {
        _db_helper_stopWithError($statement->errorInfo());
    }
    return $results;
}


/**
 * _db_helper_querySingle expects 0 or 1 rows and throws AmbiguousQueryError otherwise.
 */
function _db_helper_querySingle(&$pdo, $sql, $values = null) {
    $results = _db_helper_query($pdo, $sql, $values);
    $count = count($results);
    if ($count === 0) {
        return null;
    }
    if ($count > 1) {
        throw new AmbiguousQueryError("Query returned $count results");
    }
    return $results[0];
}


/**
 * _db_helper_execute executes $sql as a prepared statement.
 */
function _db_helper_execute(&$pdo, $sql, $values = null) {
    $statement = $pdo->prepare($sql);
    if ($statement === false) {
        _db_helper_stopWithError($pdo->errorInfo());
    }
    if ($statement->execute($values) !== true) {
        _db_helper_stopWithError($statement->errorInfo());
    }
}


/**
 * _db_helper_insert executes $sql and returns the id generated by the insert.
 */
function _db_helper_insert(&$pdo, $sql, $values = null) {
    _db_helper_execute($pdo, $sql, $values);
    return $pdo->lastInsertId();
}

"#;

/// Writes PHP gateway classes in dependency order.
#[derive(Debug, Clone, Default)]
pub struct GatewayEmitter {
    options: EmitOptions,
}

impl GatewayEmitter {
    pub fn new(options: EmitOptions) -> Self {
        Self { options }
    }

    fn write_header(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "<?php")?;
        writeln!(out, "// {}", "-".repeat(70))?;
        writeln!(out, "// schemagate generated DB gateway classes")?;
        if let Some(generated_on) = self.options.generated_on() {
            writeln!(out, "//")?;
            writeln!(out, "// generated on {generated_on}")?;
        }
        writeln!(out, "// {}", "-".repeat(70))
    }

    fn write_class(
        &self,
        model: &OrderedModel<'_>,
        table: &Table,
        out: &mut String,
    ) -> std::fmt::Result {
        let class = php_ident(&table.name);
        let q = self.options.quote;
        let quoted_table = escape_single(&q.quote(&table.name));
        let page_size = self.options.default_page_size;
        let fields: Vec<(&str, String)> = table
            .columns
            .values()
            .map(|column| (column.name.as_str(), php_ident(&column.name)))
            .collect();

        writeln!(out, "/** gateway class for table {} */", table.name)?;
        writeln!(out, "class {class} {{")?;
        for (_, field) in &fields {
            writeln!(out, "\tpublic ${field} = null;")?;
        }
        writeln!(out)?;

        writeln!(out, "\tpublic function toArray() {{")?;
        writeln!(out, "\t\treturn array(")?;
        for (column, field) in &fields {
            writeln!(out, "\t\t\t'{}' => $this->{field},", escape_single(column))?;
        }
        writeln!(out, "\t\t);")?;
        writeln!(out, "\t}}\n")?;

        writeln!(out, "\tpublic function fromArray($arr) {{")?;
        for (column, field) in &fields {
            writeln!(
                out,
                "\t\t$this->{field} = $arr['{}'] ?? $this->{field};",
                escape_single(column)
            )?;
        }
        writeln!(out, "\t}}\n")?;

        writeln!(out, "\tpublic static function createFromArray($arr) {{")?;
        writeln!(out, "\t\t$obj = new {class}();")?;
        writeln!(out, "\t\t$obj->fromArray($arr);")?;
        writeln!(out, "\t\treturn $obj;")?;
        writeln!(out, "\t}}\n")?;

        let select_fields: Vec<String> = fields
            .iter()
            .map(|(column, _)| format!("{}.{}", q.quote(&table.name), q.quote(column)))
            .collect();
        writeln!(out, "\tprivate static function _select_snippet() {{")?;
        writeln!(out, "\t\t$sql = <<<'SQL'")?;
        writeln!(out, "SELECT")?;
        writeln!(out, "  {}", select_fields.join(",\n  "))?;
        writeln!(out, "FROM {}", q.quote(&table.name))?;
        writeln!(out, "SQL;")?;
        writeln!(out, "\t\treturn $sql;")?;
        writeln!(out, "\t}}\n")?;

        writeln!(out, "\t// ---------- CRUD operations ----------\n")?;

        writeln!(out, "\tpublic static function dbCount(&$pdo) {{")?;
        writeln!(out, "\t\t$sql = 'SELECT COUNT(*) FROM {quoted_table}';")?;
        writeln!(out, "\t\t$row = _db_helper_querySingle($pdo, $sql);")?;
        writeln!(out, "\t\treturn intval($row[0]);")?;
        writeln!(out, "\t}}\n")?;

        writeln!(
            out,
            "\tpublic static function dbLoadWhere(&$pdo, $values=null, $offset=0, $pagesize={page_size}) {{"
        )?;
        writeln!(out, "\t\t$sql = {class}::_select_snippet();")?;
        writeln!(out, "\t\t$params = null;")?;
        writeln!(out, "\t\tif (!is_null($values) && count($values) > 0) {{")?;
        writeln!(out, "\t\t\t$parts = array();")?;
        writeln!(out, "\t\t\t$params = array();")?;
        writeln!(out, "\t\t\tforeach ($values as $k => $v) {{")?;
        writeln!(out, "\t\t\t\t$p = preg_replace('/[^A-Za-z0-9_]/', '_', $k);")?;
        writeln!(
            out,
            "\t\t\t\t$parts[] = '({quoted_table}.{}' . $k . '{} = :' . $p . ')';",
            q.open(),
            q.close()
        )?;
        writeln!(out, "\t\t\t\t$params[$p] = $v;")?;
        writeln!(out, "\t\t\t}}")?;
        writeln!(out, "\t\t\t$sql .= ' WHERE ' . implode(' AND ', $parts);")?;
        writeln!(out, "\t\t}}")?;
        writeln!(out, "\t\t$sql .= ' ' . _db_helper_limitClause($offset, $pagesize);")?;
        writeln!(out, "\t\t$dbresults = _db_helper_query($pdo, $sql, $params);")?;
        writeln!(out, "\t\t$arr = array_map('{class}::createFromArray', $dbresults);")?;
        writeln!(out, "\t\treturn $arr;")?;
        writeln!(out, "\t}}\n")?;

        writeln!(
            out,
            "\tpublic static function dbList(&$pdo, $offset=0, $pagesize={page_size}) {{"
        )?;
        writeln!(out, "\t\treturn {class}::dbLoadWhere($pdo, null, $offset, $pagesize);")?;
        writeln!(out, "\t}}\n")?;

        self.write_load_by_primary_key(&class, table, out)?;

        for op in ["dbInsert", "dbUpdate", "dbUpsert", "dbDelete"] {
            writeln!(out, "\tpublic function {op}(&$pdo) {{")?;
            writeln!(out, "\t}}\n")?;
        }

        writeln!(out, "\t// ---------- navigating relationships ----------\n")?;
        if !table.has_foreign_keys() {
            writeln!(out, "\t// table has no foreign keys\n")?;
        }

        let mut per_target: HashMap<String, usize> = HashMap::new();
        for fk in &table.foreign_keys {
            *per_target.entry(fk.ref_table.to_lowercase()).or_default() += 1;
        }
        for fk in &table.foreign_keys {
            let shared = per_target
                .get(&fk.ref_table.to_lowercase())
                .is_some_and(|count| *count > 1);
            self.write_navigation(model, &class, table, fk, shared, out)?;
        }

        writeln!(out, "}}\n")
    }

    fn write_load_by_primary_key(
        &self,
        class: &str,
        table: &Table,
        out: &mut String,
    ) -> std::fmt::Result {
        let params: Vec<String> = table
            .primary_key
            .iter()
            .map(|column| format!("${}", php_ident(column)))
            .collect();
        let values: Vec<String> = table
            .primary_key
            .iter()
            .map(|column| format!("'{}' => ${}", escape_single(column), php_ident(column)))
            .collect();

        writeln!(
            out,
            "\tpublic static function dbLoadByPrimaryKey(&$pdo, {}) {{",
            params.join(", ")
        )?;
        writeln!(out, "\t\t$values = array({});", values.join(", "))?;
        writeln!(out, "\t\t$results = {class}::dbLoadWhere($pdo, $values, 0, 2);")?;
        writeln!(out, "\t\t$count = count($results);")?;
        writeln!(out, "\t\tif ($count === 0) return null;")?;
        writeln!(
            out,
            "\t\tif ($count > 1) throw new AmbiguousQueryError('{class}::dbLoadByPrimaryKey found more than 1 entry');"
        )?;
        writeln!(out, "\t\treturn $results[0];")?;
        writeln!(out, "\t}}\n")
    }

    fn write_navigation(
        &self,
        model: &OrderedModel<'_>,
        class: &str,
        table: &Table,
        fk: &ForeignKey,
        shared_target: bool,
        out: &mut String,
    ) -> std::fmt::Result {
        let q = self.options.quote;
        let column = model.column_name(&table.name, &fk.column);
        let param = php_ident(column);
        let mut method = format!("dbLoadAllFor{}", php_ident(model.table_name(&fk.ref_table)));
        if shared_target {
            write!(method, "By{param}")?;
        }
        let predicate = escape_single(&format!(
            "{}.{} = :{param}",
            q.quote(&table.name),
            q.quote(column)
        ));

        writeln!(out, "\tpublic static function {method}(&$pdo, ${param}) {{")?;
        writeln!(
            out,
            "\t\t$sql = {class}::_select_snippet() . ' WHERE {predicate}';"
        )?;
        writeln!(out, "\t\t$values = array('{param}' => ${param});")?;
        writeln!(out, "\t\t$dbresults = _db_helper_query($pdo, $sql, $values);")?;
        writeln!(out, "\t\treturn array_map('{class}::createFromArray', $dbresults);")?;
        writeln!(out, "\t}}\n")
    }
}

impl Emitter for GatewayEmitter {
    fn name(&self) -> &'static str {
        "gateway"
    }

    fn check(&self, model: &OrderedModel<'_>) -> Result<()> {
        // PHP class names are case-insensitive, properties are not
        let mut classes: HashMap<String, &str> = HashMap::new();
        for table in model.tables() {
            let class = php_ident(&table.name);
            if let Some(first) = classes.insert(class.to_lowercase(), table.name.as_str()) {
                return Err(collision("tables", first, &table.name, class));
            }

            let mut fields: HashMap<String, &str> = HashMap::new();
            for column in table.columns.values() {
                let field = php_ident(&column.name);
                if let Some(first) = fields.insert(field.clone(), column.name.as_str()) {
                    let scope = format!("columns of table {}", table.name);
                    return Err(collision(&scope, first, &column.name, field));
                }
            }
        }
        Ok(())
    }

    fn emit(&self, model: &OrderedModel<'_>, out: &mut String) -> std::fmt::Result {
        self.write_header(out)?;
        out.push_str(DB_HELPERS);
        writeln!(out, "\n// ---------- gateway classes for tables ----------\n")?;
        for table in model.tables() {
            tracing::debug!(event = "table_emitted", emitter = "gateway", table = %table.name);
            self.write_class(model, table, out)?;
        }
        Ok(())
    }
}

/// PHP identifier for a table or column name.
pub fn php_ident(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}

fn collision(scope: &str, first: &str, second: &str, ident: String) -> EmitError {
    EmitError::IdentifierCollision {
        scope: scope.to_string(),
        first: first.to_string(),
        second: second.to_string(),
        ident,
    }
}

fn escape_single(text: &str) -> String {
    text.replace('\\', "\\\\").replace('\'', "\\'")
}
