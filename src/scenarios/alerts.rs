use crate::config::Role;
use crate::context::keys;
use crate::engine::{expect_status, Session};
use crate::error::ScenarioResult;
use crate::normalize::extract_id;
use serde_json::{json, Value};

pub(super) fn household_alerts(session: &mut Session<'_>) -> ScenarioResult {
    let token = session.token(Role::Household)?;

    let response = session
        .client
        .post("/alerts")
        .bearer(&token)
        .json(json!({
            "type": "ILLEGAL_DUMPING",
            "description": "Test alert from contract harness",
            "photoUrl": "https://example.com/alert_photo.jpg",
            "gpsLat": 4.05,
            "gpsLng": 9.70,
        }))
        .send()?;
    expect_status(&response, 201, "create alert")?;
    let alert_id = extract_id(&response.json_or_null(), &["id"], "alert id")?;
    session.ctx.set(keys::ALERT_ID, alert_id.clone());
    tracing::info!(%alert_id, "alert created");

    let response = session.client.get("/alerts").bearer(&token).send()?;
    expect_status(&response, 200, "alerts list")?;
    let visible = response.json().and_then(Value::as_array).map(Vec::len);
    tracing::info!(?visible, "alerts visible to household");

    let response = session
        .client
        .get(&format!("/alerts/{alert_id}"))
        .bearer(&token)
        .send()?;
    expect_status(&response, 200, "get alert")?;
    Ok(())
}

/// Cross-role visibility: the admin resolves the alert a household raised.
pub(super) fn admin_resolves_alert(session: &mut Session<'_>) -> ScenarioResult {
    let token = session.token(Role::Admin)?;
    let alert_id = session.ctx.require(keys::ALERT_ID)?;

    let response = session
        .client
        .patch(&format!("/alerts/{alert_id}"))
        .bearer(&token)
        .json(json!({
            "status": "RESOLVED",
            "resolutionNotes": "Resolved by admin contract harness.",
        }))
        .send()?;
    expect_status(&response, 200, "update alert status")?;
    tracing::info!(%alert_id, "alert resolved");
    Ok(())
}
