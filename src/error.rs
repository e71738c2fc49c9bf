// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while resolving, loading or reading a data set.
#[derive(Error, Debug)]
pub enum ImporterError {
    /// Unknown profile name with no explicit archive path to fall back on.
    #[error("movielens: unknown data set ({0}), options are: \"small\", \"full\"")]
    Config(String),

    /// The remote archive could not be downloaded or persisted.
    #[error("movielens: failed to retrieve {uri}: {source}")]
    Retrieval {
        uri: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The local file is not a readable zip container.
    #[error("movielens: cannot read archive {path:?}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("movielens: zip does not contain file: {0}")]
    NotFound(String),

    #[error("movielens: filename ({name}) is ambiguous, matches {matches:?}")]
    Ambiguous { name: String, matches: Vec<String> },

    /// Query that needs a loaded archive made before anything loaded one.
    #[error("movielens: no data loaded")]
    State,

    /// An earlier load attempt failed; the importer does not retry.
    #[error("movielens: archive unavailable after failed load: {0}")]
    Unavailable(String),

    #[error("movielens: malformed table {table}: {source}")]
    Parse {
        table: String,
        #[source]
        source: csv::Error,
    },

    #[error("movielens: table {0} is not valid UTF-8")]
    Encoding(String),

    #[error("movielens: table {table} has no {field} column")]
    MissingField { table: String, field: &'static str },
}

pub type Result<T> = std::result::Result<T, ImporterError>;
