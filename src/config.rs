//! Run configuration resolved from CLI/environment inputs.
use crate::cli::RootArgs;
use anyhow::{anyhow, Result};
use std::fmt;
use std::time::Duration;

/// Versioned prefix every service route lives under.
pub const API_PREFIX: &str = "/api/v1";

/// Caller role; each role authenticates separately and owns its own token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Household,
    Agent,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Household => "household",
            Role::Agent => "agent",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phone/password pair for a pre-provisioned account.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub phone: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("phone", &self.phone)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub admin: Option<Credentials>,
    pub agent: Option<Credentials>,
    pub household_phone: Option<String>,
    pub strict_password_change: bool,
}

impl HarnessConfig {
    pub fn from_args(args: &RootArgs) -> Result<Self> {
        let base_url = normalize_base_url(&args.base_url);
        if base_url.is_empty() {
            return Err(anyhow!("BASE_URL is empty"));
        }
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            tracing::warn!(%base_url, "BASE_URL should include http:// or https://");
        }
        if args.timeout_secs == 0 {
            return Err(anyhow!("timeout must be at least one second"));
        }
        let household_phone = args
            .household_phone
            .as_deref()
            .map(str::trim)
            .filter(|phone| !phone.is_empty())
            .map(str::to_string);

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(args.timeout_secs),
            admin: pair_credentials(args.admin_phone.as_deref(), args.admin_password.as_deref()),
            agent: pair_credentials(args.agent_phone.as_deref(), args.agent_password.as_deref()),
            household_phone,
            strict_password_change: args.strict_password_change,
        })
    }

    /// Configured credentials for a pre-provisioned role. Households register
    /// themselves during the run and never have configured credentials.
    pub fn credentials(&self, role: Role) -> Option<&Credentials> {
        match role {
            Role::Household => None,
            Role::Agent => self.agent.as_ref(),
            Role::Admin => self.admin.as_ref(),
        }
    }

    /// Absolute URL for a route below the versioned prefix.
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }
}

pub fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

/// Both halves must be present and non-empty; a lone phone or password
/// disables the role.
fn pair_credentials(phone: Option<&str>, password: Option<&str>) -> Option<Credentials> {
    let phone = phone.map(str::trim).filter(|value| !value.is_empty())?;
    let password = password.filter(|value| !value.is_empty())?;
    Some(Credentials {
        phone: phone.to_string(),
        password: password.to_string(),
    })
}
