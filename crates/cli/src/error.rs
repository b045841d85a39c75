use connectors::StorageError;
use engine_core::EngineError;
use model::error::FilterError;
use planner::error::CompileError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read {}: {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {} as JSON: {source}", .path.display())]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid filter: {0}")]
    Filter(#[from] FilterError),

    #[error("Failed to compile filter: {0}")]
    Compile(#[from] CompileError),

    #[error("Failed to open storage: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("Invalid sort key `{0}`, expected <field>[:asc|:desc]")]
    InvalidOrderBy(String),
}
