use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How SQL identifiers are quoted in generated text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStyle {
    /// MySQL style: `` `name` ``.
    #[default]
    Backtick,
    /// ANSI style: `"name"`.
    Double,
}

impl QuoteStyle {
    pub fn open(&self) -> &'static str {
        match self {
            QuoteStyle::Backtick => "`",
            QuoteStyle::Double => "\"",
        }
    }

    pub fn close(&self) -> &'static str {
        self.open()
    }

    pub fn quote(&self, ident: &str) -> String {
        format!("{}{}{}", self.open(), ident, self.close())
    }
}

/// Options shared by all emitters.
#[derive(Debug, Clone)]
pub struct EmitOptions {
    /// Timestamp written into the header banner; `None` omits the line.
    pub timestamp: Option<DateTime<Utc>>,
    pub quote: QuoteStyle,
    /// Default page size of generated paged queries.
    pub default_page_size: u32,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            timestamp: None,
            quote: QuoteStyle::Backtick,
            default_page_size: 10,
        }
    }
}

impl EmitOptions {
    /// Options stamped with the current time.
    pub fn now() -> Self {
        Self {
            timestamp: Some(Utc::now()),
            ..Self::default()
        }
    }

    pub(crate) fn generated_on(&self) -> Option<String> {
        self.timestamp
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}
