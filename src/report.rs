use crate::language::Language;
use crate::overlay::OverlayStats;
use clap::ValueEnum;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;

/// Lines of an evaluation diagnostic shown in text reports.
pub const EVALUATION_DIAGNOSTIC_LINES: usize = 9;

/// A step of the compilation whose outcome is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Task {
    Aggregation,
    Evaluation,
    Artifact { language: Language },
}

impl Task {
    fn label(&self, markdown: bool) -> String {
        match self {
            Task::Aggregation => "Rules aggregation".to_string(),
            Task::Evaluation => "Rules evaluation".to_string(),
            Task::Artifact { language } if markdown => {
                format!("Rules compilation to JSON for _{language}_")
            }
            Task::Artifact { language } => format!("Rules compilation to JSON for '{language}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Status {
    Succeeded,
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskOutcome {
    pub task: Task,
    #[serde(flatten)]
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<OverlayStats>,
}

impl TaskOutcome {
    pub fn succeeded(task: Task) -> Self {
        Self {
            task,
            status: Status::Succeeded,
            detail: None,
            destination: None,
            stats: None,
        }
    }

    pub fn failed(task: Task, message: impl Into<String>) -> Self {
        Self {
            task,
            status: Status::Failed {
                message: message.into(),
            },
            detail: None,
            destination: None,
            stats: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_destination(mut self, destination: PathBuf) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn with_stats(mut self, stats: OverlayStats) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Succeeded
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.status {
            Status::Succeeded => None,
            Status::Failed { message } => Some(message),
        }
    }
}

/// Outcome of every task of one compilation run, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompilationReport {
    pub outcomes: Vec<TaskOutcome>,
}

impl CompilationReport {
    pub fn push(&mut self, outcome: TaskOutcome) {
        self.outcomes.push(outcome);
    }

    /// True when every task succeeded.
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(TaskOutcome::is_success)
    }

    /// True when aggregation or evaluation failed and nothing was compiled.
    pub fn has_fatal(&self) -> bool {
        self.outcomes.iter().any(|outcome| {
            !outcome.is_success() && matches!(outcome.task, Task::Aggregation | Task::Evaluation)
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.is_success())
    }

    pub fn outcome(&self, task: Task) -> Option<&TaskOutcome> {
        self.outcomes.iter().find(|outcome| outcome.task == task)
    }

    /// Languages whose artifact was written.
    pub fn written_languages(&self) -> Vec<Language> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.is_success())
            .filter_map(|outcome| match outcome.task {
                Task::Artifact { language } => Some(language),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Markdown,
    Json,
}

pub struct ReportFormatter;

impl ReportFormatter {
    pub fn render(report: &CompilationReport, format: ReportFormat) -> String {
        match format {
            ReportFormat::Text => Self::format_text(report),
            ReportFormat::Markdown => Self::format_markdown(report),
            ReportFormat::Json => Self::format_json(report),
        }
    }

    /// Console output, one line per task with the diagnostics of failures.
    pub fn format_text(report: &CompilationReport) -> String {
        let mut output = String::new();

        for outcome in &report.outcomes {
            match &outcome.status {
                Status::Succeeded => {
                    let _ = write!(output, " ✅ {}", outcome.task.label(false));
                    if let Some(destination) = &outcome.destination {
                        let _ = write!(output, " written in: {}", destination.display());
                    } else if let Some(detail) = &outcome.detail {
                        let _ = write!(output, ": {detail}");
                    }
                    output.push('\n');
                }
                Status::Failed { message } => {
                    let _ = writeln!(output, " ❌ {} failed:\n", outcome.task.label(false));
                    let limit = match outcome.task {
                        Task::Evaluation => EVALUATION_DIAGNOSTIC_LINES,
                        _ => usize::MAX,
                    };
                    for line in message.lines().filter(|l| !l.is_empty()).take(limit) {
                        let _ = writeln!(output, "   {line}");
                    }
                    output.push('\n');
                }
            }
        }

        output
    }

    /// Markdown table, suitable for a pull request comment.
    pub fn format_markdown(report: &CompilationReport) -> String {
        let mut output = String::from("| Task | Status | Message |\n|:-----|:------:|:-------:|\n");

        for outcome in &report.outcomes {
            let label = outcome.task.label(true);
            match &outcome.status {
                Status::Succeeded => {
                    let message = outcome.detail.as_deref().unwrap_or("Ø");
                    let _ = writeln!(output, "| {label} | :heavy_check_mark: | {message} |");
                }
                Status::Failed { message } => {
                    let escaped = escape_markdown_cell(message);
                    let _ = writeln!(
                        output,
                        "| {label} | ❌ | <details><summary>See error:</summary><br /><br /><code>{escaped}</code></details> |"
                    );
                }
            }
        }

        output
    }

    pub fn format_json(report: &CompilationReport) -> String {
        serde_json::to_string_pretty(report).unwrap_or_else(|e| {
            serde_json::json!({ "error": format!("Failed to serialize report: {e}") }).to_string()
        })
    }
}

fn escape_markdown_cell(message: &str) -> String {
    message
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('|', "\\|")
        .replace('\n', "<br />")
}
