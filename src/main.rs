mod cli;
mod config;
mod context;
mod engine;
mod error;
mod http;
mod normalize;
mod scenarios;
mod util;

use clap::Parser;
use cli::RootArgs;
use config::HarnessConfig;
use engine::Runner;
use http::ApiClient;
use std::process::ExitCode;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> ExitCode {
    let args = RootArgs::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Runs the catalog; `Ok(false)` when any scenario failed.
fn run(args: &RootArgs) -> anyhow::Result<bool> {
    let config = HarnessConfig::from_args(args)?;
    println!("Using BASE_URL = {}", config.base_url);
    tracing::debug!(?config, "harness configuration");

    let client = ApiClient::new(&config);
    let mut runner = Runner::new(&client, &config);
    runner.run_all(&scenarios::catalog());
    let facts: Vec<&str> = runner.context().keys().collect();
    tracing::debug!(?facts, "context facts at end of run");

    let report = runner.finish();
    println!("{}", report.render_summary());
    if let Some(path) = &args.report {
        report.write_json(path)?;
        tracing::info!(path = %path.display(), "wrote run report");
    }
    Ok(report.success())
}

/// Diagnostics go to stderr so stdout stays the PASS/FAIL transcript.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "contract_harness=debug"
    } else {
        "contract_harness=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if let Err(err) = builder.try_init() {
        eprintln!("failed to install tracing subscriber: {err}");
    }
}
