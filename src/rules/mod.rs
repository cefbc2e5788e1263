pub mod aggregate;
pub mod discovery;
pub mod evaluation;
pub mod types;

// Re-export commonly used types
pub use aggregate::{aggregate, aggregate_sources, load_fragment};
pub use discovery::discover_fragments;
pub use evaluation::{CommandEvaluator, Evaluator, StructuralEvaluator};
pub use types::*;
