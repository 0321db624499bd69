use chrono::{Duration, NaiveDate, Utc};
use rand::distributions::{Alphanumeric, Uniform};
use rand::Rng;

pub fn truncate_string(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut truncated = String::new();
    for ch in text.chars() {
        if truncated.len() + ch.len_utf8() > max_bytes {
            break;
        }
        truncated.push(ch);
    }
    truncated.push_str("...");
    truncated
}

/// Cameroon-style mobile number: `+2376` followed by seven digits.
pub fn random_phone() -> String {
    let digits: String = rand::thread_rng()
        .sample_iter(Uniform::new_inclusive(b'0', b'9'))
        .take(7)
        .map(char::from)
        .collect();
    format!("+2376{digits}")
}

pub fn random_email() -> String {
    let local: String = rand::thread_rng()
        .sample_iter(Alphanumeric)
        .filter(u8::is_ascii_alphabetic)
        .take(8)
        .map(|byte| char::from(byte.to_ascii_lowercase()))
        .collect();
    format!("test_{local}@example.com")
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// `%Y-%m-%d` date `days` away from today (negative for the past).
pub fn date_offset(days: i64) -> String {
    (today() + Duration::days(days)).format("%Y-%m-%d").to_string()
}
