//! CLI argument parsing for the contract harness.
//!
//! The harness is configured from the environment; every variable is also
//! accepted as a long flag so a single run can be overridden without exporting
//! anything. There are no subcommands.
use clap::Parser;
use std::path::PathBuf;

/// Service location used when `BASE_URL` is unset.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Per-request timeout used when `HARNESS_TIMEOUT_SECS` is unset.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "contract-harness",
    version,
    about = "End-to-end contract checks for the waste-management API",
    after_help = "Environment:\n  BASE_URL                    Service root (default http://localhost:3000)\n  ADMIN_PHONE, ADMIN_PASSWORD Enable admin scenarios\n  AGENT_PHONE, AGENT_PASSWORD Enable agent scenarios\n  HOUSEHOLD_PHONE             Pin the household phone number\n  HARNESS_TIMEOUT_SECS        Per-request timeout in seconds\n  STRICT_PASSWORD_CHANGE      Fail when change-password answers 400\n\nExamples:\n  BASE_URL=http://localhost:3000 contract-harness\n  ADMIN_PHONE=+237600000001 ADMIN_PASSWORD=secret contract-harness --report run.json"
)]
pub struct RootArgs {
    /// Root URL of the service under test
    #[arg(long, env = "BASE_URL", value_name = "URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Admin phone number (admin scenarios are omitted without it)
    #[arg(long, env = "ADMIN_PHONE", value_name = "PHONE")]
    pub admin_phone: Option<String>,

    /// Admin password
    #[arg(long, env = "ADMIN_PASSWORD", value_name = "PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,

    /// Agent phone number (agent scenarios are omitted without it)
    #[arg(long, env = "AGENT_PHONE", value_name = "PHONE")]
    pub agent_phone: Option<String>,

    /// Agent password
    #[arg(long, env = "AGENT_PASSWORD", value_name = "PASSWORD", hide_env_values = true)]
    pub agent_password: Option<String>,

    /// Register the household user with this phone instead of a random one
    #[arg(long, env = "HOUSEHOLD_PHONE", value_name = "PHONE")]
    pub household_phone: Option<String>,

    /// Timeout applied to every request, in seconds
    #[arg(
        long,
        env = "HARNESS_TIMEOUT_SECS",
        value_name = "SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    pub timeout_secs: u64,

    /// Treat a 400 from change-password as a failure instead of an early exit
    #[arg(
        long,
        env = "STRICT_PASSWORD_CHANGE",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub strict_password_change: bool,

    /// Write a machine-readable run report to this path
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Emit debug diagnostics on stderr
    #[arg(long)]
    pub verbose: bool,
}
