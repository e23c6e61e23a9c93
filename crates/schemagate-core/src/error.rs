use thiserror::Error;

/// Core error type shared across schemagate crates.
#[derive(Debug, Error)]
pub enum Error {
    /// A required attribute is absent from a declaration.
    #[error("{0} missing")]
    MissingField(String),
    /// A required top-level section is absent from the input.
    #[error("no {0} defined in schema file")]
    MissingSection(String),
    /// A column names a type alias that was never declared.
    #[error("typealias not declared: {0}")]
    UnknownAlias(String),
    /// A table names a column set that was never declared.
    #[error("columnset not declared: {0}")]
    UnknownColumnSet(String),
    /// A name collides with an existing one in a case-insensitive namespace.
    #[error("key has already been set: {0}")]
    DuplicateKey(String),
    /// A primary key entry is not a column of the table.
    #[error("primary key references non-existing column: {0}")]
    InvalidPrimaryKey(String),
    /// An input node has the wrong shape.
    #[error("invalid value for {field}: expected {expected}")]
    InvalidValue {
        field: String,
        expected: &'static str,
    },
    /// A foreign key points at a table or column that does not exist.
    #[error("table {table} references non-existing {target}")]
    UnknownReference { table: String, target: String },
    /// The foreign key graph contains a cycle.
    #[error("cyclic dependencies in tables found: {}", .0.join(" -> "))]
    Cycle(Vec<String>),
    /// Wraps an error with the declaration it occurred in.
    #[error("{context} invalid: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap this error with the enclosing declaration, e.g. `table 'books'`.
    pub fn context(self, context: impl Into<String>) -> Self {
        Error::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error with all context layers removed.
    pub fn root(&self) -> &Error {
        match self {
            Error::Context { source, .. } => source.root(),
            other => other,
        }
    }

    pub(crate) fn invalid_value(field: impl Into<String>, expected: &'static str) -> Self {
        Error::InvalidValue {
            field: field.into(),
            expected,
        }
    }
}

/// Convenience alias for results returned by schemagate crates.
pub type Result<T> = std::result::Result<T, Error>;

/// Attach declaration context to the error side of a result.
pub(crate) trait ResultExt<T> {
    fn context_with<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context_with<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|err| err.context(f()))
    }
}
