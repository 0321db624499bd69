//! Status-code assertions against the service contract.
use crate::error::{ScenarioError, ScenarioResult};
use crate::http::ApiResponse;

pub fn expect_status(response: &ApiResponse, expected: u16, label: &str) -> ScenarioResult {
    if response.status == expected {
        return Ok(());
    }
    Err(ScenarioError::contract(format!(
        "{label} expected {expected}, got {}, body={}",
        response.status,
        response.snippet()
    )))
}

/// For endpoints where more than one status is a documented success
/// (create-or-exists, 200-or-201).
pub fn expect_one_of(response: &ApiResponse, accepted: &[u16], label: &str) -> ScenarioResult {
    if let [only] = accepted {
        return expect_status(response, *only, label);
    }
    if accepted.contains(&response.status) {
        return Ok(());
    }
    Err(ScenarioError::contract(format!(
        "{label} expected one of {accepted:?}, got {}, body={}",
        response.status,
        response.snippet()
    )))
}
