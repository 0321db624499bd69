use super::login_configured;
use crate::config::Role;
use crate::context::keys;
use crate::engine::{expect_one_of, expect_status, Session};
use crate::error::{ensure, ScenarioError, ScenarioResult};
use crate::http::FilePart;
use crate::normalize::extract_id;
use crate::util::date_offset;
use serde_json::{json, Value};

const UPDATED_USER_NAME: &str = "Updated Household User";

pub(super) fn admin_login(session: &mut Session<'_>) -> ScenarioResult {
    login_configured(session, Role::Admin)?;
    Ok(())
}

pub(super) fn bins(session: &mut Session<'_>) -> ScenarioResult {
    let token = session.token(Role::Admin)?;

    let response = session
        .client
        .post("/bins")
        .bearer(&token)
        .json(json!({
            "locationName": "Test Bin Location",
            "gpsLat": 4.05,
            "gpsLng": 9.70,
            "capacityLevel": "LOW",
        }))
        .send()?;
    expect_status(&response, 201, "create bin")?;
    let bin_id = extract_id(&response.json_or_null(), &["id"], "bin id")?;
    session.ctx.set(keys::BIN_ID, bin_id.clone());
    tracing::info!(%bin_id, "bin created");

    // Bin listings are public.
    let response = session.client.get("/bins").send()?;
    expect_status(&response, 200, "list bins")?;

    let path = format!("/bins/{bin_id}");
    let response = session.client.get(&path).send()?;
    expect_status(&response, 200, "get bin")?;

    let response = session
        .client
        .patch(&path)
        .bearer(&token)
        .json(json!({ "capacityLevel": "FULL" }))
        .send()?;
    expect_status(&response, 200, "update bin")?;
    Ok(())
}

pub(super) fn education(session: &mut Session<'_>) -> ScenarioResult {
    let token = session.token(Role::Admin)?;

    let response = session
        .client
        .post("/education")
        .bearer(&token)
        .json(json!({
            "title": "Safe Waste Disposal Basics",
            "contentType": "ARTICLE",
            "body": "Always keep your waste in closed bags and avoid illegal dumping.",
            "language": "EN",
            "targetAudience": "HOUSEHOLD",
        }))
        .send()?;
    expect_status(&response, 201, "create education")?;
    let education_id = extract_id(&response.json_or_null(), &["id"], "education id")?;
    session.ctx.set(keys::EDUCATION_ID, education_id.clone());
    tracing::info!(%education_id, "education content created");

    let response = session
        .client
        .get("/education")
        .query("audience", "HOUSEHOLD")
        .query("language", "EN")
        .send()?;
    expect_status(&response, 200, "list education")?;

    let path = format!("/education/{education_id}");
    let response = session.client.get(&path).send()?;
    expect_status(&response, 200, "get education")?;

    let response = session
        .client
        .put(&path)
        .bearer(&token)
        .json(json!({
            "title": "Updated Safe Waste Disposal",
            "language": "EN",
            "targetAudience": "HOUSEHOLD",
        }))
        .send()?;
    expect_status(&response, 200, "update education")?;
    Ok(())
}

/// Admin publishes a survey, the household answers it, the admin reads the
/// answers back.
pub(super) fn surveys(session: &mut Session<'_>) -> ScenarioResult {
    let admin_token = session.token(Role::Admin)?;
    let household_token = session.token(Role::Household)?;

    let response = session
        .client
        .post("/surveys")
        .bearer(&admin_token)
        .json(json!({
            "title": "Household Feedback Survey",
            "targetGroup": "HOUSEHOLDS",
            "questions": [
                {
                    "id": "q1",
                    "text": "How satisfied are you with the pickup service?",
                    "type": "rating",
                },
                { "id": "q2", "text": "Any suggestions for improvement?", "type": "text" },
            ],
            "isActive": true,
        }))
        .send()?;
    expect_status(&response, 201, "create survey")?;
    let survey_id = extract_id(&response.json_or_null(), &["id"], "survey id")?;
    session.ctx.set(keys::SURVEY_ID, survey_id.clone());
    tracing::info!(%survey_id, "survey created");

    let response = session
        .client
        .get(&format!("/surveys/{survey_id}"))
        .bearer(&admin_token)
        .send()?;
    expect_status(&response, 200, "get single survey")?;

    let response = session
        .client
        .get("/surveys")
        .query("targetGroup", "HOUSEHOLDS")
        .query("active", true)
        .send()?;
    expect_status(&response, 200, "list surveys")?;

    let responses_path = format!("/surveys/{survey_id}/responses");
    let response = session
        .client
        .post(&responses_path)
        .bearer(&household_token)
        .json(json!({
            "answers": { "q1": 5, "q2": "Everything works well so far." },
        }))
        .send()?;
    expect_status(&response, 201, "submit survey response")?;

    let response = session
        .client
        .get(&responses_path)
        .bearer(&admin_token)
        .send()?;
    expect_status(&response, 200, "get survey responses")?;
    Ok(())
}

/// Subscriptions reference the household profile id, not the user id.
pub(super) fn subscriptions(session: &mut Session<'_>) -> ScenarioResult {
    let token = session.token(Role::Admin)?;
    let profile_id = session.ctx.require(keys::HOUSEHOLD_PROFILE_ID)?;

    let response = session
        .client
        .post("/subscriptions")
        .bearer(&token)
        .json(json!({
            "householdId": profile_id,
            "planType": "MONTHLY",
            "startDate": date_offset(0),
            "endDate": date_offset(30),
            "status": "ACTIVE",
        }))
        .send()?;
    expect_status(&response, 201, "create subscription")?;
    // Some deployments answer 201 without echoing the created record.
    let subscription_id = extract_id(
        &response.json_or_null(),
        &["id", "subscriptionId"],
        "subscription id",
    )
    .ok();
    tracing::info!(?subscription_id, "subscription created");
    session
        .ctx
        .set_if_present(keys::SUBSCRIPTION_ID, subscription_id);

    let response = session
        .client
        .get("/subscriptions")
        .bearer(&token)
        .query("householdId", &profile_id)
        .send()?;
    expect_status(&response, 200, "list subscriptions by household")?;
    Ok(())
}

pub(super) fn update_user(session: &mut Session<'_>) -> ScenarioResult {
    let token = session.token(Role::Admin)?;
    let user_id = session.ctx.require(keys::HOUSEHOLD_ID)?;
    let path = format!("/users/{user_id}");

    let response = session
        .client
        .patch(&path)
        .bearer(&token)
        .json(json!({ "name": UPDATED_USER_NAME, "isActive": true }))
        .send()?;
    expect_status(&response, 200, "PATCH /users/:id")?;

    let response = session.client.get(&path).bearer(&token).send()?;
    expect_status(&response, 200, "GET updated user")?;
    let name = response
        .json()
        .and_then(|user| user.get("name"))
        .and_then(Value::as_str);
    ensure(
        name == Some(UPDATED_USER_NAME),
        format!("user name was not updated: {}", response.snippet()),
    )
}

pub(super) fn stats(session: &mut Session<'_>) -> ScenarioResult {
    let token = session.token(Role::Admin)?;

    let response = session
        .client
        .get("/stats/overview")
        .bearer(&token)
        .send()?;
    expect_status(&response, 200, "stats overview")?;

    let response = session
        .client
        .get("/stats/pickups")
        .bearer(&token)
        .query("from", date_offset(-7))
        .query("to", date_offset(0))
        .send()?;
    expect_status(&response, 200, "pickup stats")?;

    let response = session
        .client
        .get("/stats/agents/performance")
        .bearer(&token)
        .send()?;
    expect_status(&response, 200, "agent performance stats")?;
    Ok(())
}

/// Uploads as admin when available, otherwise as the household.
pub(super) fn file_upload(session: &mut Session<'_>) -> ScenarioResult {
    let token = session
        .ctx
        .get_str(keys::ADMIN_ACCESS)
        .or_else(|| session.ctx.get_str(keys::HOUSEHOLD_ACCESS))
        .ok_or_else(|| {
            ScenarioError::Precondition(
                "need admin_access or household_access in context for file upload".to_string(),
            )
        })?;

    let response = session
        .client
        .post("/files/upload")
        .bearer(&token)
        .file(FilePart {
            field: "file".to_string(),
            filename: "test.txt".to_string(),
            content_type: "text/plain".to_string(),
            bytes: b"Hello from automated test".to_vec(),
        })
        .send()?;
    expect_one_of(&response, &[200, 201], "file upload")?;
    tracing::info!(body = %response.snippet(), "file uploaded");
    Ok(())
}
