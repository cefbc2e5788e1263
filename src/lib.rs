pub mod compiler;
pub mod config;
pub mod errors;
pub mod language;
pub mod overlay;
pub mod project_config;
pub mod report;
pub mod rules;
pub mod sink;

// Re-export commonly used types
pub use compiler::Compiler;
pub use config::CompilerConfig;
pub use errors::{CompileError, OverlayError};
pub use language::Language;
pub use overlay::{OverlayOptions, Translation, apply_overlay, apply_overlay_with};
pub use report::{CompilationReport, ReportFormat, ReportFormatter, Task, TaskOutcome};
pub use rules::{Evaluator, Fragment, RuleSet, aggregate};
pub use sink::{ArtifactSink, JsonFileSink};
