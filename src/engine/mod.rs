//! Scenario orchestration.
//!
//! The runner walks an ordered catalog, omits scenarios whose role credentials
//! are not configured, checks each scenario's declared context needs, and then
//! invokes it behind a single failure boundary. Whatever happens inside a
//! scenario (assertion failure, transport error, panic) is recorded as that
//! scenario's outcome and the run moves on to the next one.
mod expect;
mod outcome;

pub use expect::{expect_one_of, expect_status};
pub use outcome::{RunReport, ScenarioOutcome, Verdict};

use crate::config::{HarnessConfig, Role};
use crate::context::{keys, ContextStore};
use crate::error::{ScenarioError, ScenarioResult};
use crate::http::ApiClient;
use anyhow::anyhow;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

/// Credential requirement deciding whether a scenario is part of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Open,
    Agent,
    Admin,
}

impl Gate {
    pub fn is_enabled(self, config: &HarnessConfig) -> bool {
        match self {
            Gate::Open => true,
            Gate::Agent => config.credentials(Role::Agent).is_some(),
            Gate::Admin => config.credentials(Role::Admin).is_some(),
        }
    }

    fn skip_notice(self) -> &'static str {
        match self {
            Gate::Open => "",
            Gate::Agent => "Agent tests (AGENT_PHONE / AGENT_PASSWORD not set)",
            Gate::Admin => "Admin tests (ADMIN_PHONE / ADMIN_PASSWORD not set)",
        }
    }
}

/// A named workflow check.
pub struct Scenario {
    pub name: &'static str,
    pub gate: Gate,
    /// Context facts that must exist before the body is invoked.
    pub needs: &'static [&'static str],
    pub run: fn(&mut Session<'_>) -> ScenarioResult,
}

/// Everything a scenario body may touch.
pub struct Session<'a> {
    pub client: &'a ApiClient,
    pub config: &'a HarnessConfig,
    pub ctx: &'a mut ContextStore,
    notes: Vec<String>,
}

impl<'a> Session<'a> {
    pub fn new(
        client: &'a ApiClient,
        config: &'a HarnessConfig,
        ctx: &'a mut ContextStore,
    ) -> Self {
        Self {
            client,
            config,
            ctx,
            notes: Vec::new(),
        }
    }

    /// Access token previously recorded for `role`.
    pub fn token(&self, role: Role) -> ScenarioResult<String> {
        self.ctx.require(keys::access(role))
    }

    /// Attaches a remark to the outcome, e.g. when a degraded path was taken.
    pub fn note(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(note = %message, "scenario note");
        self.notes.push(message);
    }
}

pub struct Runner<'a> {
    client: &'a ApiClient,
    config: &'a HarnessConfig,
    context: ContextStore,
    outcomes: Vec<ScenarioOutcome>,
}

impl<'a> Runner<'a> {
    pub fn new(client: &'a ApiClient, config: &'a HarnessConfig) -> Self {
        Self {
            client,
            config,
            context: ContextStore::new(),
            outcomes: Vec::new(),
        }
    }

    pub fn context(&self) -> &ContextStore {
        &self.context
    }

    /// Runs the enabled part of `catalog` in order. Disabled scenarios are
    /// omitted entirely: they produce no outcome and are not counted.
    pub fn run_all(&mut self, catalog: &[Scenario]) {
        let mut announced: Vec<Gate> = Vec::new();
        for scenario in catalog {
            if scenario.gate.is_enabled(self.config) {
                self.run(scenario);
                continue;
            }
            if !announced.contains(&scenario.gate) {
                announced.push(scenario.gate);
                println!("\n[SKIP] {}", scenario.gate.skip_notice());
            }
            tracing::debug!(scenario = scenario.name, "scenario omitted");
        }
    }

    pub fn run(&mut self, scenario: &Scenario) -> &ScenarioOutcome {
        println!("\n=== {} ===", scenario.name);
        let started = Instant::now();

        let missing = scenario
            .needs
            .iter()
            .find(|key| !self.context.contains(key));
        let (result, notes) = match missing {
            Some(key) => (Err(ScenarioError::missing_fact(key)), Vec::new()),
            None => {
                let mut session = Session::new(self.client, self.config, &mut self.context);
                let body = AssertUnwindSafe(|| (scenario.run)(&mut session));
                let result = panic::catch_unwind(body).unwrap_or_else(|payload| {
                    Err(ScenarioError::Unexpected(anyhow!(
                        "scenario panicked: {}",
                        panic_message(payload.as_ref())
                    )))
                });
                (result, session.notes)
            }
        };

        let (verdict, message) = match result {
            Ok(()) => (Verdict::Pass, notes.join("; ")),
            Err(err) if err.is_assertion() => {
                let message = err.to_string();
                let message = if message.is_empty() {
                    "Assertion failed".to_string()
                } else {
                    message
                };
                (Verdict::Fail, message)
            }
            Err(err) => (Verdict::Error, format!("Unexpected error: {}", error_chain(&err))),
        };

        match verdict {
            Verdict::Pass => println!("[PASS] {}", scenario.name),
            _ => println!("[{verdict}] {}: {message}", scenario.name),
        }
        tracing::debug!(
            scenario = scenario.name,
            %verdict,
            elapsed_ms = started.elapsed().as_millis(),
            "scenario finished"
        );

        self.outcomes.push(ScenarioOutcome {
            name: scenario.name.to_string(),
            verdict,
            message,
            duration_ms: started.elapsed().as_millis(),
        });
        &self.outcomes[self.outcomes.len() - 1]
    }

    pub fn finish(self) -> RunReport {
        RunReport::from_outcomes(&self.config.base_url, self.outcomes)
    }
}

fn error_chain(err: &ScenarioError) -> String {
    match err {
        ScenarioError::Unexpected(inner) => format!("{inner:#}"),
        other => other.to_string(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
