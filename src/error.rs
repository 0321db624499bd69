//! Failure categories recognized at the scenario boundary.
use crate::normalize::NormalizeError;
use thiserror::Error;

pub type ScenarioResult<T = ()> = std::result::Result<T, ScenarioError>;

/// Why a scenario stopped.
///
/// `Precondition` and `Contract` are assertion-type failures: the run setup
/// or the service broke an expectation. `Unexpected` covers everything else
/// (transport errors, timeouts, harness bugs) so the two can be told apart in
/// the summary.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("precondition not met: {0}")]
    Precondition(String),
    #[error("{0}")]
    Contract(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl ScenarioError {
    pub fn missing_fact(key: &str) -> Self {
        ScenarioError::Precondition(format!("no {key} in context"))
    }

    pub fn contract(message: impl Into<String>) -> Self {
        ScenarioError::Contract(message.into())
    }

    pub fn is_assertion(&self) -> bool {
        matches!(
            self,
            ScenarioError::Precondition(_) | ScenarioError::Contract(_)
        )
    }
}

/// An unrecognized response shape is a contract violation, not a harness fault.
impl From<NormalizeError> for ScenarioError {
    fn from(err: NormalizeError) -> Self {
        ScenarioError::Contract(err.to_string())
    }
}

/// Fails with a contract violation unless `condition` holds.
pub fn ensure(condition: bool, message: impl Into<String>) -> ScenarioResult {
    if condition {
        Ok(())
    } else {
        Err(ScenarioError::Contract(message.into()))
    }
}
