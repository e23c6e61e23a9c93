use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::CliError;

/// On-disk format of a schema file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    Yaml,
    Json,
    Toml,
}

impl SchemaFormat {
    /// Pick the format from the file extension; anything unrecognised is YAML.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => SchemaFormat::Json,
            Some("toml") => SchemaFormat::Toml,
            _ => SchemaFormat::Yaml,
        }
    }
}

/// Read and decode a schema file into a generic tree.
pub fn load_schema_tree(path: &Path) -> Result<Value, CliError> {
    let contents = fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let format = SchemaFormat::from_path(path);
    tracing::debug!(event = "schema_file_read", path = %path.display(), format = ?format);
    parse_schema_tree(&contents, format)
}

pub fn parse_schema_tree(contents: &str, format: SchemaFormat) -> Result<Value, CliError> {
    let tree = match format {
        SchemaFormat::Yaml => serde_yaml::from_str(contents)?,
        SchemaFormat::Json => serde_json::from_str(contents)?,
        SchemaFormat::Toml => toml::from_str(contents)?,
    };
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_extension() {
        assert_eq!(SchemaFormat::from_path(Path::new("model.yml")), SchemaFormat::Yaml);
        assert_eq!(SchemaFormat::from_path(Path::new("model.JSON")), SchemaFormat::Json);
        assert_eq!(SchemaFormat::from_path(Path::new("model.toml")), SchemaFormat::Toml);
        assert_eq!(SchemaFormat::from_path(Path::new("model")), SchemaFormat::Yaml);
    }

    #[test]
    fn yaml_keeps_declaration_order() {
        let tree = parse_schema_tree(
            "tables:\n  zeta: {}\n  alpha: {}\n",
            SchemaFormat::Yaml,
        )
        .unwrap();
        let keys: Vec<&String> = tree["tables"].as_object().unwrap().keys().collect();
        assert_eq!(keys, ["zeta", "alpha"]);
    }

    #[test]
    fn toml_decodes_into_same_shape() {
        let tree = parse_schema_tree(
            r#"
[typealiases]
id = "INTEGER"

[tables.users]
primarykey = "id"
columns = [{ name = "id", typealias = "id" }]
"#,
            SchemaFormat::Toml,
        )
        .unwrap();
        let model = schemagate_core::build_model(&tree).unwrap();
        assert_eq!(model.table("users").unwrap().column("id").unwrap().db_type, "INTEGER");
    }

    #[test]
    fn malformed_input_is_an_error() {
        assert!(parse_schema_tree("{ not json", SchemaFormat::Json).is_err());
    }
}
