//! Outcome log, run report, and summary rendering.
use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    /// Precondition or contract failure.
    Fail,
    /// Transport fault or harness bug.
    Error,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Pass => "PASS",
            Verdict::Fail => "FAIL",
            Verdict::Error => "ERROR",
        }
    }

    pub fn is_failure(self) -> bool {
        !matches!(self, Verdict::Pass)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable record of one finished scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    pub name: String,
    pub verdict: Verdict,
    /// Failure message, or notes left by a passing scenario.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
    pub duration_ms: u128,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub base_url: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub outcomes: Vec<ScenarioOutcome>,
}

impl RunReport {
    pub fn from_outcomes(base_url: &str, outcomes: Vec<ScenarioOutcome>) -> Self {
        let failed = outcomes
            .iter()
            .filter(|outcome| outcome.verdict.is_failure())
            .count();
        Self {
            base_url: base_url.to_string(),
            total: outcomes.len(),
            passed: outcomes.len() - failed,
            failed,
            outcomes,
        }
    }

    pub fn success(&self) -> bool {
        self.failed == 0
    }

    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        out.push_str("========== TEST SUMMARY ==========\n");
        for outcome in &self.outcomes {
            out.push_str(&format!("{:5} - {}", outcome.verdict.as_str(), outcome.name));
            if !outcome.message.is_empty() {
                out.push_str(&format!(" -> {}", outcome.message));
            }
            out.push('\n');
        }
        out.push_str("==================================\n");
        out.push_str(&format!(
            "Total: {}, Passed: {}, Failed: {}\n",
            self.total, self.passed, self.failed
        ));
        out
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("write run report {}", path.display()))?;
        Ok(())
    }
}
