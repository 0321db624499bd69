//! Per-run fact store shared between scenarios.
//!
//! One store is created empty per run and handed to each scenario in turn.
//! Facts may be overwritten (token rotation) but are never removed.
use crate::error::{ScenarioError, ScenarioResult};
use crate::normalize::id_string;
use serde_json::Value;
use std::collections::BTreeMap;

/// Well-known fact keys.
pub mod keys {
    use crate::config::Role;

    pub const HOUSEHOLD_PHONE: &str = "household_phone";
    pub const HOUSEHOLD_PASSWORD: &str = "household_password";
    pub const HOUSEHOLD_ACCESS: &str = "household_access";
    pub const HOUSEHOLD_REFRESH: &str = "household_refresh";
    pub const HOUSEHOLD_ID: &str = "household_id";
    pub const HOUSEHOLD_PROFILE_ID: &str = "household_profile_id";
    pub const HOUSEHOLD_AUTH_STAGE: &str = "household_auth_stage";

    pub const AGENT_ACCESS: &str = "agent_access";
    pub const AGENT_REFRESH: &str = "agent_refresh";
    pub const AGENT_USER_ID: &str = "agent_user_id";

    pub const ADMIN_ACCESS: &str = "admin_access";
    pub const ADMIN_REFRESH: &str = "admin_refresh";
    pub const ADMIN_USER_ID: &str = "admin_user_id";

    pub const PICKUP_ID: &str = "pickup_id";
    pub const PICKUP_STAGE: &str = "pickup_stage";
    pub const ALERT_ID: &str = "alert_id";
    pub const BIN_ID: &str = "bin_id";
    pub const EDUCATION_ID: &str = "education_id";
    pub const SURVEY_ID: &str = "survey_id";
    pub const SUBSCRIPTION_ID: &str = "subscription_id";

    pub fn access(role: Role) -> &'static str {
        match role {
            Role::Household => HOUSEHOLD_ACCESS,
            Role::Agent => AGENT_ACCESS,
            Role::Admin => ADMIN_ACCESS,
        }
    }

    pub fn refresh(role: Role) -> &'static str {
        match role {
            Role::Household => HOUSEHOLD_REFRESH,
            Role::Agent => AGENT_REFRESH,
            Role::Admin => ADMIN_REFRESH,
        }
    }

    pub fn user_id(role: Role) -> &'static str {
        match role {
            Role::Household => HOUSEHOLD_ID,
            Role::Agent => AGENT_USER_ID,
            Role::Admin => ADMIN_USER_ID,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct ContextStore {
    facts: BTreeMap<String, Value>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        let replaced = self.facts.insert(key.to_string(), value).is_some();
        tracing::debug!(key, replaced, "context fact recorded");
    }

    /// Records the value only when present; an absent optional fact never
    /// clobbers an earlier one.
    pub fn set_if_present(&mut self, key: &str, value: Option<String>) {
        if let Some(value) = value {
            self.set(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.facts.get(key).filter(|value| !value.is_null())
    }

    /// Fact rendered as a string (numbers included), if present.
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.get(key).and_then(id_string)
    }

    /// Fact required by the calling scenario; absence is a precondition failure.
    pub fn require(&self, key: &str) -> ScenarioResult<String> {
        self.get_str(key)
            .ok_or_else(|| ScenarioError::missing_fact(key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get_str(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.facts.keys().map(String::as_str)
    }
}
