//! Schema-tolerant extraction of tokens and identifiers.
//!
//! The service does not pin field names across endpoints and versions, so each
//! logical field is looked up through an ordered list of candidate keys and the
//! first present, non-empty value wins. Mandatory fields still fail loudly when
//! no candidate matches; a token has to be somewhere.
use crate::util::truncate_string;
use serde_json::{Map, Value};
use thiserror::Error;

pub const ACCESS_TOKEN_KEYS: &[&str] = &["accessToken", "access_token", "token"];
pub const REFRESH_TOKEN_KEYS: &[&str] = &["refreshToken", "refresh_token"];
pub const SUBJECT_KEYS: &[&str] = &["user", "profile"];
pub const SUBJECT_ID_KEYS: &[&str] = &["id", "userId", "user_id"];

/// Bodies quoted in errors are cut to this many bytes.
const MAX_QUOTED_BODY_BYTES: usize = 500;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("{context} response is not a JSON object")]
    NotAnObject { context: &'static str },
    #[error("could not find access token in response: {body}")]
    MissingToken { body: String },
    #[error("could not find {field} in response: {body}")]
    MissingId { field: &'static str, body: String },
}

/// Canonical facts from a login or refresh response.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthResult {
    pub access: String,
    pub refresh: Option<String>,
    pub subject_id: Option<String>,
    pub subject: Value,
}

pub fn extract_auth(body: &Value) -> Result<AuthResult, NormalizeError> {
    let object = as_object(body, "auth")?;

    let access = first_string(object, ACCESS_TOKEN_KEYS).ok_or_else(|| {
        NormalizeError::MissingToken {
            body: quote(body),
        }
    })?;
    let refresh = first_string(object, REFRESH_TOKEN_KEYS);
    let subject = first_present(object, SUBJECT_KEYS)
        .filter(|value| value.is_object())
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()));
    let subject_id = subject
        .as_object()
        .and_then(|subject| first_present(subject, SUBJECT_ID_KEYS))
        .and_then(id_string);

    Ok(AuthResult {
        access,
        refresh,
        subject_id,
        subject,
    })
}

/// Entity id from a creation or lookup response, rendered as a string so it
/// can be spliced into later paths.
pub fn extract_id(
    body: &Value,
    candidates: &[&str],
    field: &'static str,
) -> Result<String, NormalizeError> {
    let object = as_object(body, field)?;
    first_present(object, candidates)
        .and_then(id_string)
        .ok_or_else(|| NormalizeError::MissingId {
            field,
            body: quote(body),
        })
}

/// First candidate whose value is present and non-empty.
pub fn first_present<'a>(object: &'a Map<String, Value>, candidates: &[&str]) -> Option<&'a Value> {
    candidates
        .iter()
        .filter_map(|key| object.get(*key))
        .find(|value| is_present(value))
}

/// Strings and numbers are ids; nested `{ "id": ... }` references are unwrapped.
pub fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Object(object) => object.get("id").and_then(id_string),
        _ => None,
    }
}

fn first_string(object: &Map<String, Value>, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .filter_map(|key| object.get(*key))
        .filter_map(Value::as_str)
        .find(|text| !text.trim().is_empty())
        .map(str::to_string)
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(text) => !text.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
        Value::Bool(true) | Value::Number(_) => true,
    }
}

fn as_object<'a>(
    body: &'a Value,
    context: &'static str,
) -> Result<&'a Map<String, Value>, NormalizeError> {
    body.as_object()
        .ok_or(NormalizeError::NotAnObject { context })
}

fn quote(body: &Value) -> String {
    truncate_string(&body.to_string(), MAX_QUOTED_BODY_BYTES)
}
