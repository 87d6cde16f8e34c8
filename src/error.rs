//! Error types for loading and reconciling the delay sources.
//!
//! Only structural problems are errors here. Unparseable cells and rows are
//! skipped by the loaders and counted, and unresolved delays are ordinary
//! output records.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A local source could not be read.
    #[error("failed to read '{path}'")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A remote source could not be downloaded.
    #[error("failed to fetch '{url}'")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("CSV error in '{file}'")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },

    /// A headed table lacks a column the loader depends on.
    #[error("'{file}' is missing required column '{column}'")]
    MissingColumn { file: String, column: String },

    /// The roster grid does not have the shape the layout describes.
    #[error("roster layout error at row {row}, column {column}: {message}")]
    RosterLayout {
        row: usize,
        column: usize,
        message: String,
    },

    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// A report could not be rendered as JSON.
    #[error("failed to serialize {what} as JSON")]
    Json {
        what: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn csv(file: impl Into<String>, source: csv::Error) -> Self {
        Self::Csv {
            file: file.into(),
            source,
        }
    }

    pub fn missing_column(file: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            file: file.into(),
            column: column.into(),
        }
    }

    pub fn roster_layout(row: usize, column: usize, message: impl Into<String>) -> Self {
        Self::RosterLayout {
            row,
            column,
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn json(what: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            what: what.into(),
            source,
        }
    }
}
