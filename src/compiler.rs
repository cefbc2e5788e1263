//! # Compilation pipeline
//!
//! Aggregation and evaluation run once, in order, and stop the run when they
//! fail. Each target language is then translated and written on its own task;
//! a failing language never prevents the others from being written.

use crate::config::CompilerConfig;
use crate::errors::CompileError;
use crate::language::Language;
use crate::overlay::{Overlaid, OverlayOptions, Translation, apply_overlay_with};
use crate::report::{CompilationReport, Task, TaskOutcome};
use crate::rules::{
    CommandEvaluator, Evaluator, RuleSet, StructuralEvaluator, aggregate_sources, discover_fragments,
};
use crate::sink::{ArtifactSink, JsonFileSink};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;

#[derive(Clone)]
pub struct Compiler {
    config: CompilerConfig,
    evaluator: Arc<dyn Evaluator>,
    sink: Arc<dyn ArtifactSink>,
}

impl Compiler {
    /// Compiler writing JSON files, evaluating with the configured command or
    /// the structural checks.
    pub fn new(config: CompilerConfig) -> Result<Self, CompileError> {
        config.validate()?;

        let evaluator: Arc<dyn Evaluator> = match &config.evaluator_command {
            Some(command) => Arc::new(CommandEvaluator::from_command_line(command)?),
            None => Arc::new(StructuralEvaluator::new(config.root_rule.clone())),
        };
        let sink = Arc::new(JsonFileSink::new(
            config.resolved_output_dir(),
            config.artifact_template.clone(),
        ));

        Ok(Self::with_parts(config, evaluator, sink))
    }

    pub fn with_parts(
        config: CompilerConfig,
        evaluator: Arc<dyn Evaluator>,
        sink: Arc<dyn ArtifactSink>,
    ) -> Self {
        Self {
            config,
            evaluator,
            sink,
        }
    }

    /// Discover the fragments and merge them into the base rule set.
    pub fn aggregate(&self) -> Result<(RuleSet, usize), CompileError> {
        let files = discover_fragments(
            &self.config.root,
            &self.config.fragment_patterns,
            &self.config.exclude_patterns,
        )?;
        let rules = aggregate_sources(&files)?;
        Ok((rules, files.len()))
    }

    /// Run the whole pipeline. Failures are recorded in the report.
    #[tracing::instrument(skip(self), fields(root = %self.config.root.display()))]
    pub async fn run(&self) -> CompilationReport {
        let mut report = CompilationReport::default();

        let base = match self.aggregate() {
            Ok((rules, files)) => {
                report.push(
                    TaskOutcome::succeeded(Task::Aggregation)
                        .with_detail(format!("{} rules from {} files", rules.len(), files)),
                );
                rules
            }
            Err(err) => {
                tracing::error!("{err}");
                report.push(TaskOutcome::failed(Task::Aggregation, err.to_string()));
                return report;
            }
        };

        match self.evaluator.evaluate(&base).await {
            Ok(()) => {
                tracing::info!("Rules evaluated without errors");
                report.push(TaskOutcome::succeeded(Task::Evaluation));
            }
            Err(err) => {
                tracing::error!("{err}");
                let message = match err {
                    CompileError::Evaluation(diagnostic) => diagnostic,
                    other => other.to_string(),
                };
                report.push(TaskOutcome::failed(Task::Evaluation, message));
                return report;
            }
        }

        for outcome in self.compile_all(Arc::new(base)).await {
            report.push(outcome);
        }
        report
    }

    /// Write the source-language artifact and translate every target
    /// concurrently, returning outcomes in the order languages were requested.
    pub async fn compile_all(&self, base: Arc<RuleSet>) -> Vec<TaskOutcome> {
        let source = self.config.source_language;
        let targets = self.config.effective_targets();

        let mut tasks = JoinSet::new();
        for (index, language) in targets.iter().copied().enumerate() {
            let base = Arc::clone(&base);
            let sink = Arc::clone(&self.sink);
            let path = self.config.translation_path(language);
            let options = self.config.overlay;
            tasks.spawn(async move {
                let outcome = compile_language(&base, sink.as_ref(), language, path, options).await;
                (index, outcome)
            });
        }

        let mut outcomes = Vec::with_capacity(targets.len() + 1);
        outcomes.push(write_artifact(self.sink.as_ref(), &base, source).await);

        let mut translated: Vec<Option<TaskOutcome>> = vec![None; targets.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => translated[index] = Some(outcome),
                Err(err) => tracing::error!("Translation task aborted: {err}"),
            }
        }

        // A task that panicked still gets a failed outcome.
        for (language, outcome) in targets.into_iter().zip(translated) {
            outcomes.push(outcome.unwrap_or_else(|| {
                TaskOutcome::failed(Task::Artifact { language }, "translation task aborted")
            }));
        }
        outcomes
    }
}

async fn write_artifact(sink: &dyn ArtifactSink, rules: &RuleSet, language: Language) -> TaskOutcome {
    let task = Task::Artifact { language };
    match sink.write(rules, language).await {
        Ok(destination) => TaskOutcome::succeeded(task).with_destination(destination),
        Err(err) => {
            tracing::error!("{err}");
            TaskOutcome::failed(task, err.to_string())
        }
    }
}

/// Load, apply and write one language. Every failure stays local to it.
#[tracing::instrument(skip(base, sink, path, options), fields(translations = %path.display()))]
async fn compile_language(
    base: &RuleSet,
    sink: &dyn ArtifactSink,
    language: Language,
    path: PathBuf,
    options: OverlayOptions,
) -> TaskOutcome {
    let task = Task::Artifact { language };

    let translation = match Translation::load(&path).await {
        Ok(translation) => translation,
        Err(err) => {
            tracing::error!("{err}");
            return TaskOutcome::failed(task, err.to_string());
        }
    };

    let Overlaid { rules, stats } = match apply_overlay_with(base, &translation, options) {
        Ok(overlaid) => overlaid,
        Err(error) => {
            let err = CompileError::OverlayStructure { language, error };
            tracing::error!("{err}");
            return TaskOutcome::failed(task, err.to_string());
        }
    };

    write_artifact(sink, &rules, language).await.with_stats(stats)
}
