//! Agent session and the pickup lifecycle state machine.
//!
//! A pickup moves `CREATED → ACCEPTED → STARTED → COMPLETED → RATED`; each
//! transition is a role-scoped call that only succeeds from the previous
//! stage. The harness drives the transitions strictly in table order and a
//! rejected transition surfaces as a contract violation naming it.
use super::login_configured;
use crate::config::Role;
use crate::context::{keys, ContextStore};
use crate::engine::{expect_one_of, expect_status, Session};
use crate::error::ScenarioResult;
use crate::http::Method;
use crate::normalize::{extract_id, id_string};
use crate::util::date_offset;
use serde_json::{json, Value};
use std::fmt;

const PICKUP_ID_KEYS: &[&str] = &["id", "pickupId"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickupStage {
    Created,
    Accepted,
    Started,
    Completed,
    Rated,
}

impl PickupStage {
    pub fn as_str(self) -> &'static str {
        match self {
            PickupStage::Created => "CREATED",
            PickupStage::Accepted => "ACCEPTED",
            PickupStage::Started => "STARTED",
            PickupStage::Completed => "COMPLETED",
            PickupStage::Rated => "RATED",
        }
    }
}

impl fmt::Display for PickupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Transition {
    from: PickupStage,
    to: PickupStage,
    actor: Role,
    method: Method,
    /// Route segment below `/pickups/{id}/`.
    action: &'static str,
    label: &'static str,
    accepted: &'static [u16],
}

const LIFECYCLE: [Transition; 4] = [
    Transition {
        from: PickupStage::Created,
        to: PickupStage::Accepted,
        actor: Role::Agent,
        method: Method::Patch,
        action: "accept",
        label: "accept pickup",
        accepted: &[200],
    },
    Transition {
        from: PickupStage::Accepted,
        to: PickupStage::Started,
        actor: Role::Agent,
        method: Method::Patch,
        action: "start",
        label: "start pickup",
        accepted: &[200],
    },
    Transition {
        from: PickupStage::Started,
        to: PickupStage::Completed,
        actor: Role::Agent,
        method: Method::Patch,
        action: "complete",
        label: "complete pickup",
        accepted: &[200, 201],
    },
    Transition {
        from: PickupStage::Completed,
        to: PickupStage::Rated,
        actor: Role::Household,
        method: Method::Post,
        action: "rating",
        label: "rate pickup",
        accepted: &[201],
    },
];

impl Transition {
    fn body(&self, ctx: &ContextStore) -> Option<Value> {
        match self.to {
            PickupStage::Completed => Some(json!({
                "photoProofUrl": "https://example.com/photo.jpg",
                "binId": ctx.get(keys::BIN_ID).cloned().unwrap_or(Value::Null),
                "notes": "Completed by contract harness",
            })),
            PickupStage::Rated => Some(json!({
                "rating": 5,
                "comment": "Excellent service from automated test.",
            })),
            _ => None,
        }
    }
}

pub(super) fn agent_auth_and_stats(session: &mut Session<'_>) -> ScenarioResult {
    let auth = login_configured(session, Role::Agent)?;

    let response = session
        .client
        .get("/agents/me")
        .bearer(&auth.access)
        .send()?;
    expect_status(&response, 200, "agents/me")?;

    let response = session
        .client
        .get("/agents/me/stats")
        .bearer(&auth.access)
        .send()?;
    expect_status(&response, 200, "agents/me/stats")?;
    tracing::info!(stats = %response.snippet(), "agent stats");
    Ok(())
}

/// Household creates, agent accepts/starts/completes, household rates.
pub(super) fn lifecycle(session: &mut Session<'_>) -> ScenarioResult {
    let household_token = session.token(Role::Household)?;
    let agent_token = session.token(Role::Agent)?;

    let response = session
        .client
        .post("/pickups")
        .bearer(&household_token)
        .json(json!({
            "scheduledDate": date_offset(1),
            "timeWindow": "08:00-10:00",
            "notes": "Test pickup from contract harness",
            "wasteType": "MIXED",
        }))
        .send()?;
    expect_status(&response, 201, "create pickup")?;
    let pickup_id = extract_id(&response.json_or_null(), PICKUP_ID_KEYS, "pickup id")?;
    let mut stage = PickupStage::Created;
    session.ctx.set(keys::PICKUP_ID, pickup_id.clone());
    session.ctx.set(keys::PICKUP_STAGE, stage.as_str());
    tracing::info!(%pickup_id, "pickup created");

    let response = session
        .client
        .get("/pickups/available")
        .bearer(&agent_token)
        .send()?;
    expect_status(&response, 200, "pickups/available")?;
    // Listing is advisory; some deployments filter by zone, so accept is
    // attempted regardless.
    let listed = response
        .json()
        .and_then(Value::as_array)
        .is_some_and(|pickups| {
            pickups.iter().any(|pickup| {
                pickup.get("id").and_then(id_string).as_deref() == Some(pickup_id.as_str())
            })
        });
    tracing::info!(%pickup_id, listed, "available pickups");

    for transition in &LIFECYCLE {
        debug_assert_eq!(transition.from, stage);
        let token = session.token(transition.actor)?;
        let path = format!("/pickups/{pickup_id}/{}", transition.action);
        let mut request = session
            .client
            .request(transition.method, &path)
            .bearer(&token);
        if let Some(body) = transition.body(session.ctx) {
            request = request.json(body);
        }
        let response = request.send()?;
        let label = format!(
            "{} ({} -> {})",
            transition.label, transition.from, transition.to
        );
        expect_one_of(&response, transition.accepted, &label)?;

        stage = transition.to;
        session.ctx.set(keys::PICKUP_STAGE, stage.as_str());
        tracing::info!(%pickup_id, %stage, "pickup transition");
    }
    Ok(())
}
