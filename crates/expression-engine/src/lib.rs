pub mod context;
pub mod error;
pub mod eval;
pub mod truth;

pub use context::{NoRelations, RelatedRows};
pub use error::{EvalError, Result};
pub use eval::{Evaluator, evaluate};
pub use truth::Truth;
