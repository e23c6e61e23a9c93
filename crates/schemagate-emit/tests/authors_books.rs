use schemagate_core::{build_model, validate, Model};
use schemagate_emit::{emit_gateway_source, emit_sql, EmitOptions, OrderedModel};
use serde_json::{json, Value};

fn schema() -> Value {
    json!({
        "typealiases": { "id": "INTEGER NOT NULL" },
        "tables": {
            "books": {
                "columns": [
                    { "name": "id", "typealias": "id" },
                    { "name": "author_id", "typealias": "id" },
                    { "name": "title", "type": "VARCHAR(200)" },
                ],
                "primarykey": "id",
                "foreignkeys": [
                    { "column": "author_id", "reftable": "authors", "refcolumn": "id" },
                ],
            },
            "authors": {
                "columns": [
                    { "name": "id", "typealias": "id" },
                    { "name": "name", "type": "VARCHAR(100)" },
                ],
                "primarykey": "id",
            },
        },
    })
}

fn model() -> Model {
    build_model(&schema()).expect("build model")
}

#[test]
fn resolves_authors_before_books() {
    let model = model();
    let ordered = OrderedModel::resolve(&model).expect("resolve order");
    assert_eq!(ordered.order(), ["authors", "books"]);
    assert_eq!(validate(&model).error_count(), 0);
}

#[test]
fn sql_creates_parent_table_first() {
    let sql = emit_sql(&model(), &EmitOptions::default()).expect("emit sql");

    let authors = sql.find("CREATE TABLE `authors`").expect("authors ddl");
    let books = sql.find("CREATE TABLE `books`").expect("books ddl");
    assert!(authors < books);

    let books_ddl = &sql[books..];
    assert!(books_ddl.contains("  `author_id` INTEGER NOT NULL,\n"));
    assert!(books_ddl.contains("FOREIGN KEY (`author_id`) REFERENCES `authors` (`id`)"));
}

#[test]
fn gateway_navigates_from_books_to_authors() {
    let php = emit_gateway_source(&model(), &EmitOptions::default()).expect("emit gateway");

    let books = php.find("class books {").expect("books class");
    let books_class = &php[books..];
    assert!(books_class.contains("public static function dbLoadAllForauthors(&$pdo, $author_id) {"));
    assert!(books_class.contains("' WHERE `books`.`author_id` = :author_id';"));
    assert!(books_class.contains("public static function dbLoadByPrimaryKey(&$pdo, $id) {"));
    assert!(books_class.contains("throw new AmbiguousQueryError("));

    let authors = php.find("class authors {").expect("authors class");
    let authors_class = &php[authors..books];
    assert!(authors_class.contains("// table has no foreign keys"));
    assert!(authors_class.contains("\t\t$this->name = $arr['name'] ?? $this->name;\n"));
}

#[test]
fn generation_stops_on_broken_model() {
    let mut raw = schema();
    raw["tables"]
        .as_object_mut()
        .expect("tables mapping")
        .remove("authors");
    let model = build_model(&raw).expect("build model");

    assert!(emit_sql(&model, &EmitOptions::default()).is_err());
    assert!(emit_gateway_source(&model, &EmitOptions::default()).is_err());
}
