use super::types::{MOSAIQUE, RuleSet, SUGGESTIONS, describe};
use crate::errors::CompileError;
use async_trait::async_trait;
use serde_yaml::Value;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::{ChildStdin, Command};

/// Go/no-go check run on the aggregated rules before any artifact is produced.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(&self, rules: &RuleSet) -> Result<(), CompileError>;
}

/// Consistency checks that need no knowledge of the formula language.
#[derive(Debug, Clone, Default)]
pub struct StructuralEvaluator {
    root_rule: Option<String>,
}

impl StructuralEvaluator {
    pub fn new(root_rule: Option<String>) -> Self {
        Self {
            root_rule: root_rule.filter(|rule| !rule.is_empty()),
        }
    }

    /// Every problem found, one line each.
    pub fn check(&self, rules: &RuleSet) -> Vec<String> {
        let mut problems = Vec::new();

        if let Some(root) = &self.root_rule {
            if !rules.contains(root) {
                problems.push(format!("root rule '{root}' is not defined"));
            }
        }

        for (name, rule) in rules.iter() {
            match rule {
                Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
                Value::Mapping(attrs) => {
                    if let Some(suggestions) = attrs.get(SUGGESTIONS) {
                        if !suggestions.is_mapping() {
                            problems.push(format!(
                                "rule '{name}': 'suggestions' must be a mapping, found {}",
                                describe(suggestions)
                            ));
                        }
                    }
                    if let Some(mosaique) = attrs.get(MOSAIQUE) {
                        check_mosaique(name, mosaique, &mut problems);
                    }
                }
                other => problems.push(format!(
                    "rule '{name}' must be a mapping or a formula, found {}",
                    describe(other)
                )),
            }
        }

        problems
    }
}

fn check_mosaique(name: &str, mosaique: &Value, problems: &mut Vec<String>) {
    let Some(attrs) = mosaique.as_mapping() else {
        problems.push(format!(
            "rule '{name}': 'mosaique' must be a mapping, found {}",
            describe(mosaique)
        ));
        return;
    };
    if let Some(suggestions) = attrs.get(SUGGESTIONS) {
        if !suggestions.is_mapping() {
            problems.push(format!(
                "rule '{name}': 'mosaique.suggestions' must be a mapping, found {}",
                describe(suggestions)
            ));
        }
    }
}

#[async_trait]
impl Evaluator for StructuralEvaluator {
    async fn evaluate(&self, rules: &RuleSet) -> Result<(), CompileError> {
        let problems = self.check(rules);
        if problems.is_empty() {
            Ok(())
        } else {
            Err(CompileError::Evaluation(problems.join("\n")))
        }
    }
}

/// Delegates evaluation to an external engine.
///
/// The rule set is written as JSON to the program's stdin; a non-zero exit
/// status fails the gate with the program's diagnostics.
#[derive(Debug, Clone)]
pub struct CommandEvaluator {
    program: String,
    args: Vec<String>,
}

impl CommandEvaluator {
    /// Build from a command line, e.g. `["node", "scripts/evaluate.js"]`.
    pub fn from_command_line(command: &[String]) -> Result<Self, CompileError> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| CompileError::Config("Evaluator command is empty".to_string()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

#[async_trait]
impl Evaluator for CommandEvaluator {
    async fn evaluate(&self, rules: &RuleSet) -> Result<(), CompileError> {
        let payload = rules.to_json()?;

        tracing::debug!("Running evaluator {} {:?}", self.program, self.args);
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                CompileError::Evaluation(format!("could not start '{}': {e}", self.program))
            })?;

        // Feed stdin while stdout and stderr are drained, otherwise a program
        // answering before it has read everything blocks on a full pipe.
        let writer = child.stdin.take().map(|stdin| tokio::spawn(feed(stdin, payload)));

        let output = child.wait_with_output().await?;
        if let Some(writer) = writer {
            writer
                .await
                .map_err(|e| CompileError::Evaluation(format!("evaluator input task failed: {e}")))??;
        }
        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let diagnostic = if stderr.trim().is_empty() {
            String::from_utf8_lossy(&output.stdout).into_owned()
        } else {
            stderr.into_owned()
        };
        Err(CompileError::Evaluation(format!(
            "'{}' exited with {}\n{}",
            self.program,
            output.status,
            diagnostic.trim_end()
        )))
    }
}

/// Write the payload and close stdin. The program may exit without reading
/// its input; its exit status decides the outcome then.
async fn feed(mut stdin: ChildStdin, payload: String) -> std::io::Result<()> {
    let written = match stdin.write_all(payload.as_bytes()).await {
        Ok(()) => stdin.shutdown().await,
        Err(e) => Err(e),
    };
    match written {
        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(yaml: &str) -> RuleSet {
        RuleSet::from_yaml_str(yaml).unwrap()
    }

    #[tokio::test]
    async fn test_valid_rules_pass() {
        let rules = rules(
            r#"
bilan:
  formule: transport + alimentation
transport: 12
alimentation:
  mosaique:
    type: nombre
    suggestions:
      végétarien: { viande: 0 }
  suggestions:
    peu: 1
    beaucoup: 3
"#,
        );
        let evaluator = StructuralEvaluator::new(Some("bilan".to_string()));
        assert!(evaluator.evaluate(&rules).await.is_ok());
    }

    #[tokio::test]
    async fn test_collects_every_problem() {
        let rules = rules(
            r#"
a:
  suggestions: [1, 2]
b:
  mosaique:
    suggestions: nope
c: [x]
"#,
        );
        let evaluator = StructuralEvaluator::new(Some("bilan".to_string()));
        let problems = evaluator.check(&rules);
        assert_eq!(problems.len(), 4);
        assert!(problems[0].contains("root rule 'bilan'"));

        let err = evaluator.evaluate(&rules).await.unwrap_err();
        match err {
            CompileError::Evaluation(message) => assert_eq!(message.lines().count(), 4),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_root_rule_disables_check() {
        let rules = rules("transport: 12\n");
        assert!(StructuralEvaluator::new(Some(String::new())).check(&rules).is_empty());
        assert_eq!(StructuralEvaluator::new(Some("bilan".into())).check(&rules).len(), 1);
    }

    #[test]
    fn test_empty_command_rejected() {
        assert!(CommandEvaluator::from_command_line(&[]).is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_evaluator_exit_status() {
        let rules = rules("a: 1\n");

        let ok = CommandEvaluator::from_command_line(&["cat".to_string()]).unwrap();
        assert!(ok.evaluate(&rules).await.is_ok());

        let failing = CommandEvaluator::from_command_line(&[
            "sh".to_string(),
            "-c".to_string(),
            "cat > /dev/null; echo 'unknown reference' >&2; exit 3".to_string(),
        ])
        .unwrap();
        let err = failing.evaluate(&rules).await.unwrap_err();
        assert!(err.to_string().contains("unknown reference"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_evaluator_large_rule_set() {
        let mut rules = RuleSet::new();
        for i in 0..20_000 {
            rules.insert(
                format!("transport . voiture . trajet {i}"),
                serde_yaml::from_str("titre: Trajet\nformule: distance * facteur\n").unwrap(),
            );
        }
        assert!(rules.to_json().unwrap().len() > 1_000_000);

        // `cat` echoes its input while still reading it.
        let echo = CommandEvaluator::from_command_line(&["cat".to_string()]).unwrap();
        let result = tokio::time::timeout(std::time::Duration::from_secs(30), echo.evaluate(&rules))
            .await
            .expect("evaluator did not finish");
        assert!(result.is_ok());
    }
}
