use std::fs;
use std::path::Path;

use schemagate_emit::{EmitOptions, QuoteStyle};
use serde::Deserialize;

use crate::CliError;

/// Generator defaults read from an optional TOML file.
///
/// ```toml
/// quote = "double"
/// page_size = 25
/// timestamp = false
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerateSettings {
    pub quote: Option<QuoteStyle>,
    pub page_size: Option<u32>,
    pub timestamp: Option<bool>,
}

impl GenerateSettings {
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: GenerateSettings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Settings layered under command line overrides.
    pub fn emit_options(
        &self,
        quote: Option<QuoteStyle>,
        page_size: Option<u32>,
        no_timestamp: bool,
    ) -> Result<EmitOptions, CliError> {
        let page_size = page_size.or(self.page_size).unwrap_or(10);
        if page_size == 0 {
            return Err(CliError::InvalidConfig(
                "page size must be greater than zero".to_string(),
            ));
        }
        let with_timestamp = !no_timestamp && self.timestamp.unwrap_or(true);
        let base = if with_timestamp {
            EmitOptions::now()
        } else {
            EmitOptions::default()
        };

        Ok(EmitOptions {
            quote: quote.or(self.quote).unwrap_or_default(),
            default_page_size: page_size,
            ..base
        })
    }
}
