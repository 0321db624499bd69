//! Ordered catalog of workflow scenarios.
//!
//! Scenarios communicate only through the context store: each one reads the
//! facts an earlier scenario recorded (tokens, entity ids) and records its own.
//! Catalog order is therefore part of the contract; see `needs` on each entry.
mod admin;
mod alerts;
mod household;
mod pickup;

use crate::config::Role;
use crate::context::keys;
use crate::engine::{expect_status, Gate, Scenario, Session};
use crate::error::{ScenarioError, ScenarioResult};
use crate::normalize::{extract_auth, AuthResult};
use serde_json::json;

pub fn catalog() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "Health check",
            gate: Gate::Open,
            needs: &[],
            run: household::health_check,
        },
        Scenario {
            name: "Household auth flow",
            gate: Gate::Open,
            needs: &[],
            run: household::auth_flow,
        },
        Scenario {
            name: "Household profile & stats",
            gate: Gate::Open,
            needs: &[keys::HOUSEHOLD_ACCESS],
            run: household::profile_and_stats,
        },
        Scenario {
            name: "Agent auth & stats",
            gate: Gate::Agent,
            needs: &[],
            run: pickup::agent_auth_and_stats,
        },
        Scenario {
            name: "Pickup lifecycle household→agent",
            gate: Gate::Agent,
            needs: &[keys::HOUSEHOLD_ACCESS, keys::AGENT_ACCESS],
            run: pickup::lifecycle,
        },
        Scenario {
            name: "Alerts basic flow (household)",
            gate: Gate::Open,
            needs: &[keys::HOUSEHOLD_ACCESS],
            run: alerts::household_alerts,
        },
        Scenario {
            name: "Admin authentication",
            gate: Gate::Admin,
            needs: &[],
            run: admin::admin_login,
        },
        Scenario {
            name: "Admin updates alert status",
            gate: Gate::Admin,
            needs: &[keys::ADMIN_ACCESS, keys::ALERT_ID],
            run: alerts::admin_resolves_alert,
        },
        Scenario {
            name: "Admin bins management",
            gate: Gate::Admin,
            needs: &[keys::ADMIN_ACCESS],
            run: admin::bins,
        },
        Scenario {
            name: "Education admin & public",
            gate: Gate::Admin,
            needs: &[keys::ADMIN_ACCESS],
            run: admin::education,
        },
        Scenario {
            name: "Surveys flow",
            gate: Gate::Admin,
            needs: &[keys::ADMIN_ACCESS, keys::HOUSEHOLD_ACCESS],
            run: admin::surveys,
        },
        Scenario {
            name: "Subscriptions admin",
            gate: Gate::Admin,
            needs: &[keys::ADMIN_ACCESS, keys::HOUSEHOLD_PROFILE_ID],
            run: admin::subscriptions,
        },
        Scenario {
            name: "Subscriptions /me (household)",
            gate: Gate::Admin,
            needs: &[keys::HOUSEHOLD_ACCESS, keys::HOUSEHOLD_PROFILE_ID],
            run: household::own_subscriptions,
        },
        Scenario {
            name: "Admin update user",
            gate: Gate::Admin,
            needs: &[keys::ADMIN_ACCESS, keys::HOUSEHOLD_ID],
            run: admin::update_user,
        },
        Scenario {
            name: "Stats admin",
            gate: Gate::Admin,
            needs: &[keys::ADMIN_ACCESS],
            run: admin::stats,
        },
        Scenario {
            name: "File upload",
            gate: Gate::Admin,
            needs: &[],
            run: admin::file_upload,
        },
    ]
}

/// Logs in and records the role's token facts.
fn login(
    session: &mut Session<'_>,
    role: Role,
    phone: &str,
    password: &str,
    label: &str,
) -> ScenarioResult<AuthResult> {
    let response = session
        .client
        .post("/auth/login")
        .json(json!({ "phone": phone, "password": password }))
        .send()?;
    expect_status(&response, 200, label)?;
    let auth = extract_auth(&response.json_or_null())?;

    session.ctx.set(keys::access(role), auth.access.clone());
    session
        .ctx
        .set_if_present(keys::refresh(role), auth.refresh.clone());
    session
        .ctx
        .set_if_present(keys::user_id(role), auth.subject_id.clone());
    let name = auth.subject.get("name").and_then(|name| name.as_str());
    tracing::info!(%role, user_id = ?auth.subject_id, ?name, "logged in");
    Ok(auth)
}

/// Logs in with the pre-provisioned credentials configured for `role`.
fn login_configured(session: &mut Session<'_>, role: Role) -> ScenarioResult<AuthResult> {
    let credentials = session.config.credentials(role).cloned().ok_or_else(|| {
        ScenarioError::Precondition(format!("no {role} credentials configured"))
    })?;
    let label = format!("{role} login");
    login(
        session,
        role,
        &credentials.phone,
        &credentials.password,
        &label,
    )
}
