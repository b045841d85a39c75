pub mod config;
pub mod engine;
pub mod error;
pub mod operation;
pub mod retry;

pub use config::EngineConfig;
pub use engine::QueryEngine;
pub use error::{EngineError, Result};
pub use operation::{FindManyArgs, UpdateManyOperation};
