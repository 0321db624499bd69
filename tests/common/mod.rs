//! Shared test infrastructure for integration tests.
//!
//! `StubServer` is an in-process stand-in for the waste-management API: it
//! keeps accounts, tokens and entities in memory, enforces role checks and the
//! pickup state machine, and exposes fault switches so tests can break one
//! endpoint at a time.

use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::process::Command;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tiny_http::{Header, Method, Request, Response, Server};

pub const ADMIN_PHONE: &str = "+237600000001";
pub const ADMIN_PASSWORD: &str = "admin-secret";
pub const AGENT_PHONE: &str = "+237600000002";
pub const AGENT_PASSWORD: &str = "agent-secret";

/// Variables the harness reads; cleared before each run so the developer's
/// shell cannot leak into a test.
const HARNESS_ENV: &[&str] = &[
    "BASE_URL",
    "ADMIN_PHONE",
    "ADMIN_PASSWORD",
    "AGENT_PHONE",
    "AGENT_PASSWORD",
    "HOUSEHOLD_PHONE",
    "HARNESS_TIMEOUT_SECS",
    "STRICT_PASSWORD_CHANGE",
    "RUST_LOG",
];

/// Fault switches for the stub service.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubOptions {
    /// `GET /households/me` answers 500.
    pub fail_profile: bool,
    /// Accept answers 200 without moving the pickup, so start is rejected.
    pub lazy_accept: bool,
    /// Change-password answers 400.
    pub reject_password_change: bool,
    /// Household login issues no refresh token.
    pub omit_refresh: bool,
}

pub struct StubServer {
    pub base_url: String,
    server: Arc<Server>,
    state: Arc<Mutex<State>>,
    handle: Option<JoinHandle<()>>,
}

impl StubServer {
    pub fn start(options: StubOptions) -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").expect("bind stub server"));
        let addr = server.server_addr().to_ip().expect("ip listener");
        let state = Arc::new(Mutex::new(State::new(options)));
        let handle = {
            let server = Arc::clone(&server);
            let state = Arc::clone(&state);
            thread::spawn(move || {
                for request in server.incoming_requests() {
                    serve(&state, request);
                }
            })
        };
        Self {
            base_url: format!("http://{addr}"),
            server,
            state,
            handle: Some(handle),
        }
    }

    /// Successful `POST /auth/refresh` calls served so far.
    pub fn refresh_count(&self) -> usize {
        self.state.lock().expect("stub state").refreshes
    }

    /// Current password of the account registered under `phone`.
    pub fn password_of(&self, phone: &str) -> Option<String> {
        let state = self.state.lock().expect("stub state");
        state
            .accounts
            .iter()
            .find(|account| account.phone == phone)
            .map(|account| account.password.clone())
    }

    /// Current status of every pickup, in creation order.
    pub fn pickup_stages(&self) -> Vec<String> {
        let state = self.state.lock().expect("stub state");
        state
            .pickups
            .iter()
            .map(|pickup| pickup.stage.to_string())
            .collect()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Captured result of one harness process.
#[derive(Debug)]
pub struct HarnessRun {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl HarnessRun {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// The `[PASS]`/`[FAIL]`/`[ERROR]` line printed for `scenario`.
    pub fn verdict_line(&self, scenario: &str) -> Option<&str> {
        self.stdout.lines().find(|line| {
            ["[PASS] ", "[FAIL] ", "[ERROR] "].iter().any(|prefix| {
                line.strip_prefix(prefix).is_some_and(|rest| {
                    rest == scenario || rest.starts_with(&format!("{scenario}: "))
                })
            })
        })
    }

    pub fn passed(&self, scenario: &str) -> bool {
        self.verdict_line(scenario)
            .is_some_and(|line| line.starts_with("[PASS] "))
    }

    /// Run transcript for assertion messages.
    pub fn transcript(&self) -> String {
        format!("stdout:\n{}\nstderr:\n{}", self.stdout, self.stderr)
    }
}

/// Credentials enabling both gated groups.
pub fn all_roles() -> Vec<(&'static str, &'static str)> {
    vec![
        ("ADMIN_PHONE", ADMIN_PHONE),
        ("ADMIN_PASSWORD", ADMIN_PASSWORD),
        ("AGENT_PHONE", AGENT_PHONE),
        ("AGENT_PASSWORD", AGENT_PASSWORD),
    ]
}

pub fn agent_only() -> Vec<(&'static str, &'static str)> {
    vec![("AGENT_PHONE", AGENT_PHONE), ("AGENT_PASSWORD", AGENT_PASSWORD)]
}

/// Runs the harness binary against `base_url` with a scrubbed environment.
pub fn run_harness(base_url: &str, env: &[(&str, &str)], args: &[&str]) -> HarnessRun {
    let mut command = Command::new(env!("CARGO_BIN_EXE_contract-harness"));
    for key in HARNESS_ENV {
        command.env_remove(key);
    }
    command
        .env("BASE_URL", base_url)
        .env("HARNESS_TIMEOUT_SECS", "5")
        .envs(env.iter().copied())
        .args(args);
    let output = command.output().expect("run contract-harness");
    HarnessRun {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
}

type Reply = (u16, Value);

fn reply(status: u16, body: Value) -> Reply {
    (status, body)
}

fn fail(status: u16, message: &str) -> Reply {
    (status, json!({ "message": message }))
}

fn serve(state: &Mutex<State>, mut request: Request) {
    let mut raw = String::new();
    let _ = request.as_reader().read_to_string(&mut raw);
    let header = |name: &'static str| {
        request
            .headers()
            .iter()
            .find(|h| h.field.equiv(name))
            .map(|h| h.value.as_str().to_string())
    };
    let token = header("Authorization")
        .and_then(|value| value.strip_prefix("Bearer ").map(str::to_string));
    let content_type = header("Content-Type").unwrap_or_default();
    let url = request.url().to_string();
    let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));
    let body = serde_json::from_str::<Value>(&raw).unwrap_or(Value::Null);

    let (status, payload) = match path.strip_prefix("/api/v1") {
        Some(route) => {
            let segments: Vec<&str> = route.trim_matches('/').split('/').collect();
            let call = Call {
                method: request.method().clone(),
                segments: &segments,
                query,
                token: token.as_deref(),
                content_type: &content_type,
                body: &body,
            };
            state.lock().expect("stub state").handle(&call)
        }
        None => fail(404, "not found"),
    };

    let response = Response::from_string(payload.to_string())
        .with_status_code(status)
        .with_header(
            Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                .expect("content-type header"),
        );
    let _ = request.respond(response);
}

struct Call<'a> {
    method: Method,
    segments: &'a [&'a str],
    query: &'a str,
    token: Option<&'a str>,
    content_type: &'a str,
    body: &'a Value,
}

impl Call<'_> {
    fn field(&self, key: &str) -> Result<String, Reply> {
        self.body
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| fail(400, &format!("{key} is required")))
    }

    fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Household,
    Agent,
    Admin,
}

const ANY_ROLE: &[Role] = &[Role::Household, Role::Agent, Role::Admin];

struct Account {
    id: u64,
    phone: String,
    password: String,
    name: String,
    role: Role,
    active: bool,
}

impl Account {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id.to_string(),
            "name": self.name,
            "phone": self.phone,
            "isActive": self.active,
        })
    }
}

struct Pickup {
    id: String,
    household: u64,
    stage: &'static str,
}

#[derive(Default)]
struct State {
    options: StubOptions,
    next_id: u64,
    accounts: Vec<Account>,
    tokens: HashMap<String, u64>,
    /// Refresh token to its user and the access token issued alongside it.
    refresh_tokens: HashMap<String, (u64, String)>,
    refreshes: usize,
    /// Household user id to profile record.
    profiles: HashMap<u64, Value>,
    pickups: Vec<Pickup>,
    alerts: Vec<Value>,
    bins: Vec<Value>,
    education: Vec<Value>,
    surveys: Vec<Value>,
    survey_responses: HashMap<String, Vec<Value>>,
    subscriptions: Vec<Value>,
}

impl State {
    fn new(options: StubOptions) -> Self {
        let mut state = State {
            options,
            next_id: 100,
            ..State::default()
        };
        state.add_account(Role::Admin, ADMIN_PHONE, ADMIN_PASSWORD, "Stub Admin");
        state.add_account(Role::Agent, AGENT_PHONE, AGENT_PASSWORD, "Stub Agent");
        state
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn add_account(&mut self, role: Role, phone: &str, password: &str, name: &str) -> u64 {
        let id = self.next();
        self.accounts.push(Account {
            id,
            phone: phone.to_string(),
            password: password.to_string(),
            name: name.to_string(),
            role,
            active: true,
        });
        id
    }

    fn issue_tokens(&mut self, user_id: u64) -> (String, String) {
        let serial = self.next();
        let access = format!("access-{user_id}-{serial}");
        let refresh = format!("refresh-{user_id}-{serial}");
        self.tokens.insert(access.clone(), user_id);
        self.refresh_tokens
            .insert(refresh.clone(), (user_id, access.clone()));
        (access, refresh)
    }

    /// Authenticated caller's user id, if their role is allowed.
    fn caller(&self, call: &Call<'_>, allowed: &[Role]) -> Result<u64, Reply> {
        let token = call.token.ok_or_else(|| fail(401, "missing bearer token"))?;
        let user_id = *self
            .tokens
            .get(token)
            .ok_or_else(|| fail(401, "invalid token"))?;
        let account = self
            .accounts
            .iter()
            .find(|account| account.id == user_id)
            .ok_or_else(|| fail(401, "unknown user"))?;
        if allowed.contains(&account.role) {
            Ok(user_id)
        } else {
            Err(fail(403, "forbidden"))
        }
    }

    fn handle(&mut self, call: &Call<'_>) -> Reply {
        self.route(call).unwrap_or_else(|reply| reply)
    }

    fn route(&mut self, call: &Call<'_>) -> Result<Reply, Reply> {
        match (call.method.clone(), call.segments) {
            (Method::Get, ["health"]) => Ok(reply(200, json!({ "status": "ok", "db": "up" }))),

            (Method::Post, ["auth", "register"]) => self.register(call),
            (Method::Post, ["auth", "login"]) => self.login(call),
            (Method::Post, ["auth", "refresh"]) => self.refresh(call),
            (Method::Patch, ["auth", "change-password"]) => self.change_password(call),

            (Method::Get, ["households", "me"]) => {
                let user_id = self.caller(call, &[Role::Household])?;
                if self.options.fail_profile {
                    return Err(fail(500, "profile store unavailable"));
                }
                let profile = self
                    .profiles
                    .get(&user_id)
                    .cloned()
                    .ok_or_else(|| fail(404, "profile not found"))?;
                Ok(reply(200, profile))
            }
            (Method::Put, ["households", "me"]) => {
                let user_id = self.caller(call, &[Role::Household])?;
                let profile = self
                    .profiles
                    .get_mut(&user_id)
                    .ok_or_else(|| fail(404, "profile not found"))?;
                merge(profile, call.body);
                Ok(reply(200, profile.clone()))
            }
            (Method::Get, ["households", "me", "stats"]) => {
                let user_id = self.caller(call, &[Role::Household])?;
                let total = self
                    .pickups
                    .iter()
                    .filter(|pickup| pickup.household == user_id)
                    .count();
                Ok(reply(200, json!({ "totalPickups": total })))
            }

            (Method::Get, ["agents", "me"]) => {
                let user_id = self.caller(call, &[Role::Agent])?;
                Ok(reply(200, json!({ "userId": user_id.to_string(), "zone": "Ndokoti" })))
            }
            (Method::Get, ["agents", "me", "stats"]) => {
                self.caller(call, &[Role::Agent])?;
                let completed = self
                    .pickups
                    .iter()
                    .filter(|pickup| matches!(pickup.stage, "COMPLETED" | "RATED"))
                    .count();
                Ok(reply(200, json!({ "completedPickups": completed })))
            }

            (Method::Post, ["pickups"]) => {
                let user_id = self.caller(call, &[Role::Household])?;
                let id = format!("pk-{}", self.next());
                self.pickups.push(Pickup {
                    id: id.clone(),
                    household: user_id,
                    stage: "CREATED",
                });
                let scheduled = call.body.get("scheduledDate").cloned().unwrap_or(Value::Null);
                Ok(reply(
                    201,
                    json!({ "id": id, "status": "CREATED", "scheduledDate": scheduled }),
                ))
            }
            (Method::Get, ["pickups", "available"]) => {
                self.caller(call, &[Role::Agent])?;
                let available: Vec<Value> = self
                    .pickups
                    .iter()
                    .filter(|pickup| pickup.stage == "CREATED")
                    .map(|pickup| json!({ "id": pickup.id, "status": pickup.stage }))
                    .collect();
                Ok(reply(200, Value::Array(available)))
            }
            (Method::Patch, ["pickups", id, action]) => {
                self.caller(call, &[Role::Agent])?;
                self.advance_pickup(id, action)
            }
            (Method::Post, ["pickups", id, "rating"]) => {
                self.caller(call, &[Role::Household])?;
                self.advance_pickup(id, "rating")
            }

            (Method::Post, ["alerts"]) => {
                let user_id = self.caller(call, &[Role::Household])?;
                let id = format!("al-{}", self.next());
                let mut alert = json!({
                    "id": id,
                    "status": "OPEN",
                    "reportedBy": user_id.to_string(),
                });
                merge(&mut alert, call.body);
                self.alerts.push(alert.clone());
                Ok(reply(201, alert))
            }
            (Method::Get, ["alerts"]) => {
                self.caller(call, ANY_ROLE)?;
                Ok(reply(200, Value::Array(self.alerts.clone())))
            }
            (Method::Get, ["alerts", id]) => {
                self.caller(call, ANY_ROLE)?;
                Ok(reply(200, find(&mut self.alerts, id)?.clone()))
            }
            (Method::Patch, ["alerts", id]) => {
                self.caller(call, &[Role::Admin])?;
                let alert = find(&mut self.alerts, id)?;
                merge(alert, call.body);
                Ok(reply(200, alert.clone()))
            }

            (Method::Post, ["bins"]) => {
                self.caller(call, &[Role::Admin])?;
                let bin = self.create("bin", call.body);
                self.bins.push(bin.clone());
                Ok(reply(201, bin))
            }
            (Method::Get, ["bins"]) => Ok(reply(200, Value::Array(self.bins.clone()))),
            (Method::Get, ["bins", id]) => Ok(reply(200, find(&mut self.bins, id)?.clone())),
            (Method::Patch, ["bins", id]) => {
                self.caller(call, &[Role::Admin])?;
                let bin = find(&mut self.bins, id)?;
                merge(bin, call.body);
                Ok(reply(200, bin.clone()))
            }

            (Method::Post, ["education"]) => {
                self.caller(call, &[Role::Admin])?;
                let item = self.create("edu", call.body);
                self.education.push(item.clone());
                Ok(reply(201, item))
            }
            (Method::Get, ["education"]) => {
                let audience = call.query_param("audience");
                let items: Vec<Value> = self
                    .education
                    .iter()
                    .filter(|item| match audience {
                        Some(audience) => item["targetAudience"] == audience,
                        None => true,
                    })
                    .cloned()
                    .collect();
                Ok(reply(200, Value::Array(items)))
            }
            (Method::Get, ["education", id]) => {
                Ok(reply(200, find(&mut self.education, id)?.clone()))
            }
            (Method::Put, ["education", id]) => {
                self.caller(call, &[Role::Admin])?;
                let item = find(&mut self.education, id)?;
                merge(item, call.body);
                Ok(reply(200, item.clone()))
            }

            (Method::Post, ["surveys"]) => {
                self.caller(call, &[Role::Admin])?;
                let survey = self.create("sv", call.body);
                self.surveys.push(survey.clone());
                Ok(reply(201, survey))
            }
            (Method::Get, ["surveys"]) => Ok(reply(200, Value::Array(self.surveys.clone()))),
            (Method::Get, ["surveys", id]) => {
                self.caller(call, ANY_ROLE)?;
                Ok(reply(200, find(&mut self.surveys, id)?.clone()))
            }
            (Method::Post, ["surveys", id, "responses"]) => {
                self.caller(call, &[Role::Household])?;
                find(&mut self.surveys, id)?;
                let response = self.create("resp", call.body);
                self.survey_responses
                    .entry(id.to_string())
                    .or_default()
                    .push(response.clone());
                Ok(reply(201, response))
            }
            (Method::Get, ["surveys", id, "responses"]) => {
                self.caller(call, &[Role::Admin])?;
                let responses = self.survey_responses.get(*id).cloned().unwrap_or_default();
                Ok(reply(200, Value::Array(responses)))
            }

            (Method::Post, ["subscriptions"]) => {
                self.caller(call, &[Role::Admin])?;
                let household = call.field("householdId")?;
                let known = self
                    .profiles
                    .values()
                    .any(|profile| profile["id"] == household.as_str());
                if !known {
                    return Err(fail(400, "unknown household"));
                }
                let subscription = self.create("sub", call.body);
                self.subscriptions.push(subscription.clone());
                Ok(reply(201, subscription))
            }
            (Method::Get, ["subscriptions"]) => {
                self.caller(call, &[Role::Admin])?;
                let household = call.query_param("householdId");
                let matching: Vec<Value> = self
                    .subscriptions
                    .iter()
                    .filter(|sub| match household {
                        Some(household) => sub["householdId"] == household,
                        None => true,
                    })
                    .cloned()
                    .collect();
                Ok(reply(200, Value::Array(matching)))
            }
            (Method::Get, ["subscriptions", "me"]) => {
                let user_id = self.caller(call, &[Role::Household])?;
                let profile_id = self
                    .profiles
                    .get(&user_id)
                    .map(|profile| profile["id"].clone())
                    .unwrap_or(Value::Null);
                let own: Vec<Value> = self
                    .subscriptions
                    .iter()
                    .filter(|sub| sub["householdId"] == profile_id)
                    .cloned()
                    .collect();
                Ok(reply(200, Value::Array(own)))
            }

            (Method::Get, ["users", id]) => {
                self.caller(call, &[Role::Admin])?;
                let account = self
                    .accounts
                    .iter()
                    .find(|account| account.id.to_string() == *id)
                    .ok_or_else(|| fail(404, "user not found"))?;
                Ok(reply(200, account.to_json()))
            }
            (Method::Patch, ["users", id]) => {
                self.caller(call, &[Role::Admin])?;
                let account = self
                    .accounts
                    .iter_mut()
                    .find(|account| account.id.to_string() == *id)
                    .ok_or_else(|| fail(404, "user not found"))?;
                if let Some(name) = call.body.get("name").and_then(Value::as_str) {
                    account.name = name.to_string();
                }
                if let Some(active) = call.body.get("isActive").and_then(Value::as_bool) {
                    account.active = active;
                }
                Ok(reply(200, account.to_json()))
            }

            (Method::Get, ["stats", ..]) => {
                self.caller(call, &[Role::Admin])?;
                Ok(reply(
                    200,
                    json!({
                        "pickups": self.pickups.len(),
                        "alerts": self.alerts.len(),
                        "accounts": self.accounts.len(),
                    }),
                ))
            }

            (Method::Post, ["files", "upload"]) => {
                self.caller(call, ANY_ROLE)?;
                if !call.content_type.starts_with("multipart/form-data") {
                    return Err(fail(400, "expected multipart upload"));
                }
                Ok(reply(201, json!({ "url": "/uploads/test.txt" })))
            }

            _ => Err(fail(404, "route not found")),
        }
    }

    fn register(&mut self, call: &Call<'_>) -> Result<Reply, Reply> {
        let phone = call.field("phone")?;
        let password = call.field("password")?;
        if self.accounts.iter().any(|account| account.phone == phone) {
            return Err(fail(409, "Phone already registered"));
        }
        let name = call
            .body
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("Household");
        let user_id = self.add_account(Role::Household, &phone, &password, name);
        let profile_id = format!("hh-{}", self.next());
        self.profiles.insert(
            user_id,
            json!({ "id": profile_id, "userId": user_id.to_string(), "householdSize": 1 }),
        );
        Ok(reply(
            201,
            json!({ "id": user_id.to_string(), "phone": phone, "role": "HOUSEHOLD" }),
        ))
    }

    /// Each role answers with a different token envelope.
    fn login(&mut self, call: &Call<'_>) -> Result<Reply, Reply> {
        let phone = call.field("phone")?;
        let password = call.field("password")?;
        let account = self
            .accounts
            .iter()
            .find(|account| {
                account.phone == phone && account.password == password && account.active
            })
            .ok_or_else(|| fail(401, "Invalid credentials"))?;
        let (user_id, role, name) = (account.id, account.role, account.name.clone());
        let (access, refresh) = self.issue_tokens(user_id);

        let body = match role {
            Role::Household => {
                let mut body = json!({
                    "accessToken": access,
                    "user": { "id": user_id.to_string(), "name": name, "role": "HOUSEHOLD" },
                });
                if !self.options.omit_refresh {
                    body["refreshToken"] = json!(refresh);
                }
                body
            }
            Role::Agent => json!({
                "token": access,
                "profile": { "userId": user_id.to_string(), "name": name },
            }),
            Role::Admin => json!({
                "access_token": access,
                "refresh_token": refresh,
                "user": { "id": user_id, "name": name },
            }),
        };
        Ok(reply(200, body))
    }

    /// Rotates both tokens; the access token issued with the spent refresh
    /// token stops working.
    fn refresh(&mut self, call: &Call<'_>) -> Result<Reply, Reply> {
        let token = call.field("refreshToken")?;
        let (user_id, previous_access) = self
            .refresh_tokens
            .remove(&token)
            .ok_or_else(|| fail(401, "invalid refresh token"))?;
        self.tokens.remove(&previous_access);
        self.refreshes += 1;
        let (access, refresh) = self.issue_tokens(user_id);
        Ok(reply(
            200,
            json!({ "accessToken": access, "refreshToken": refresh }),
        ))
    }

    fn change_password(&mut self, call: &Call<'_>) -> Result<Reply, Reply> {
        let user_id = self.caller(call, ANY_ROLE)?;
        if self.options.reject_password_change {
            return Err(fail(400, "Password policy not satisfied"));
        }
        let current = call.field("currentPassword")?;
        let new = call.field("newPassword")?;
        let account = self
            .accounts
            .iter_mut()
            .find(|account| account.id == user_id)
            .ok_or_else(|| fail(404, "user not found"))?;
        if account.password != current {
            return Err(fail(400, "Current password is incorrect"));
        }
        account.password = new;
        Ok(reply(200, json!({ "message": "Password updated" })))
    }

    /// Moves a pickup one step; out-of-order transitions are conflicts.
    fn advance_pickup(&mut self, id: &str, action: &str) -> Result<Reply, Reply> {
        let (from, to) = match action {
            "accept" => ("CREATED", "ACCEPTED"),
            "start" => ("ACCEPTED", "STARTED"),
            "complete" => ("STARTED", "COMPLETED"),
            "rating" => ("COMPLETED", "RATED"),
            _ => return Err(fail(404, "unknown pickup action")),
        };
        let lazy = self.options.lazy_accept && action == "accept";
        let pickup = self
            .pickups
            .iter_mut()
            .find(|pickup| pickup.id == id)
            .ok_or_else(|| fail(404, "pickup not found"))?;
        if pickup.stage != from {
            return Err(fail(
                409,
                &format!("cannot {action} pickup in status {}", pickup.stage),
            ));
        }
        if !lazy {
            pickup.stage = to;
        }
        let status = if action == "rating" { 201 } else { 200 };
        Ok(reply(status, json!({ "id": pickup.id, "status": pickup.stage })))
    }

    fn create(&mut self, prefix: &str, body: &Value) -> Value {
        let mut record = json!({ "id": format!("{prefix}-{}", self.next()) });
        merge(&mut record, body);
        record
    }
}

fn find<'a>(items: &'a mut [Value], id: &str) -> Result<&'a mut Value, Reply> {
    items
        .iter_mut()
        .find(|item| item["id"] == id)
        .ok_or_else(|| fail(404, "not found"))
}

/// Shallow-merges the fields of `patch` into `target`, keeping `id`.
fn merge(target: &mut Value, patch: &Value) {
    let (Some(target), Some(patch)) = (target.as_object_mut(), patch.as_object()) else {
        return;
    };
    let fields: Map<String, Value> = patch
        .iter()
        .filter(|(key, _)| key.as_str() != "id")
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    target.extend(fields);
}
