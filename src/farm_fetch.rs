use std::thread;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde_json::Value;

use crate::http_client::http_client;
use crate::state::{AnimalRecord, FieldRecord, FieldState, Snapshot, now_ms};

pub const DEFAULT_API_BASE: &str = "https://tycoon-2epova.users.cfx.re";
const FIELDS_PATH: &str = "/status/farming/fields.json";
const ANIMALS_PATH: &str = "/status/farming/animals.json";
const KEY_HEADER: &str = "X-Tycoon-Key";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("API key missing. Open Settings to enter it.")]
    MissingCredential,

    #[error("Network error: {0}")]
    Transport(String),

    #[error("API Error: Fields {fields}, Animals {animals}")]
    UpstreamStatus { fields: u16, animals: u16 },

    #[error("Invalid response: {0}")]
    Schema(String),
}

/// Status code and body of one sub-request.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub fn api_base() -> String {
    std::env::var("FARM_API_BASE")
        .ok()
        .map(|val| val.trim().trim_end_matches('/').to_string())
        .filter(|val| !val.is_empty())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
}

pub fn fetch_snapshot(api_key: &str) -> Result<Snapshot, FetchError> {
    fetch_snapshot_from(&api_base(), api_key)
}

/// Requests fields and animals concurrently and waits for both before
/// building a snapshot.
pub fn fetch_snapshot_from(base: &str, api_key: &str) -> Result<Snapshot, FetchError> {
    let key = api_key.trim();
    if key.is_empty() {
        return Err(FetchError::MissingCredential);
    }
    let client = http_client().map_err(|err| FetchError::Transport(format!("{err:#}")))?;

    let fields_url = format!("{base}{FIELDS_PATH}");
    let animals_url = format!("{base}{ANIMALS_PATH}");

    let (fields, animals) = thread::scope(|scope| {
        let fields = scope.spawn(|| get_raw(client, &fields_url, key));
        let animals = scope.spawn(|| get_raw(client, &animals_url, key));
        (join_request(fields), join_request(animals))
    });

    snapshot_from_responses(fields?, animals?, now_ms())
}

fn join_request(
    handle: thread::ScopedJoinHandle<'_, Result<RawResponse, FetchError>>,
) -> Result<RawResponse, FetchError> {
    handle
        .join()
        .unwrap_or_else(|_| Err(FetchError::Transport("request thread panicked".to_string())))
}

fn get_raw(client: &Client, url: &str, key: &str) -> Result<RawResponse, FetchError> {
    let resp = client
        .get(url)
        .header(KEY_HEADER, key)
        .send()
        .map_err(|err| FetchError::Transport(err.to_string()))?;
    let status = resp.status().as_u16();
    let body = resp
        .text()
        .map_err(|err| FetchError::Transport(format!("failed reading body: {err}")))?;
    Ok(RawResponse { status, body })
}

/// Combines both sub-responses. Any non-2xx status fails the whole fetch and
/// reports both codes.
pub fn snapshot_from_responses(
    fields: RawResponse,
    animals: RawResponse,
    captured_at_ms: i64,
) -> Result<Snapshot, FetchError> {
    if !fields.is_success() || !animals.is_success() {
        return Err(FetchError::UpstreamStatus {
            fields: fields.status,
            animals: animals.status,
        });
    }
    let fields = parse_fields_json(&fields.body)
        .map_err(|err| FetchError::Schema(format!("fields: {err:#}")))?;
    let animals = parse_animals_json(&animals.body)
        .map_err(|err| FetchError::Schema(format!("animals: {err:#}")))?;
    Ok(Snapshot {
        fields,
        animals,
        captured_at_ms,
    })
}

pub fn parse_fields_json(raw: &str) -> Result<Vec<FieldRecord>> {
    let Some(list) = records_array(raw, "fields")? else {
        return Ok(Vec::new());
    };
    Ok(list.iter().filter_map(parse_field).collect())
}

pub fn parse_animals_json(raw: &str) -> Result<Vec<AnimalRecord>> {
    let Some(list) = records_array(raw, "animals")? else {
        return Ok(Vec::new());
    };
    Ok(list.iter().filter_map(parse_animal).collect())
}

/// Missing or null arrays are empty, not errors. A body that is not a JSON
/// object, or a list key holding anything but an array, is rejected.
fn records_array(raw: &str, key: &str) -> Result<Option<Vec<Value>>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }
    let root: Value = serde_json::from_str(trimmed).context("invalid json")?;
    let Value::Object(mut map) = root else {
        anyhow::bail!("expected a json object");
    };
    match map.remove(key) {
        Some(Value::Array(list)) => Ok(Some(list)),
        None | Some(Value::Null) => Ok(None),
        Some(other) => anyhow::bail!("expected `{key}` to be an array, got {other}"),
    }
}

fn parse_field(entry: &Value) -> Option<FieldRecord> {
    let name = pick_string(entry, &["name"])?;
    let state = pick_string(entry, &["state"])
        .map(|s| FieldState::from_api(&s))
        .unwrap_or_else(|| FieldState::Other(String::new()));
    Some(FieldRecord {
        name,
        crop_name: pick_string(entry, &["crop_name", "crop"]).filter(|s| !s.is_empty()),
        state,
        time_planted: pick_timestamp(entry, &["time_planted", "planted_time"]),
        harvest_time: pick_timestamp(entry, &["harvest_time"]),
        fertilized: pick_bool(entry, &["fertilized", "fertilised"]),
    })
}

fn parse_animal(entry: &Value) -> Option<AnimalRecord> {
    let int_name = pick_string(entry, &["int_name", "name"])?;
    Some(AnimalRecord {
        int_name,
        total: pick_i64(entry, &["total"]).unwrap_or(0).clamp(0, u32::MAX as i64) as u32,
        feed_level: pick_i64(entry, &["feed_level"]).unwrap_or(0),
        feed_max: pick_i64(entry, &["feed_max"]).unwrap_or(0),
        collection_time: pick_timestamp(entry, &["collection_time"]),
    })
}

fn pick_string(value: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        match value.get(*key) {
            Some(Value::String(s)) => return Some(s.trim().to_string()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

fn pick_i64(value: &Value, keys: &[&str]) -> Option<i64> {
    for key in keys {
        if let Some(v) = value.get(*key) {
            if let Some(num) = v.as_i64() {
                return Some(num);
            }
            if let Some(num) = v.as_f64() {
                return Some(num.trunc() as i64);
            }
            if let Some(num) = v.as_str().and_then(|s| s.trim().parse::<i64>().ok()) {
                return Some(num);
            }
        }
    }
    None
}

/// Zero or negative timestamps mean "not set".
fn pick_timestamp(value: &Value, keys: &[&str]) -> Option<i64> {
    pick_i64(value, keys).filter(|ts| *ts > 0)
}

fn pick_bool(value: &Value, keys: &[&str]) -> bool {
    for key in keys {
        match value.get(*key) {
            Some(Value::Bool(b)) => return *b,
            Some(Value::Number(n)) => return n.as_f64().is_some_and(|n| n != 0.0),
            _ => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(body: &str) -> RawResponse {
        RawResponse {
            status: 200,
            body: body.to_string(),
        }
    }

    #[test]
    fn missing_key_fails_before_any_request() {
        let err = fetch_snapshot_from("http://127.0.0.1:9", "   ").expect_err("must fail");
        assert_eq!(err, FetchError::MissingCredential);
    }

    #[test]
    fn non_success_reports_both_codes() {
        let fields = RawResponse {
            status: 500,
            body: String::new(),
        };
        let err = snapshot_from_responses(fields, ok("{}"), 1).expect_err("must fail");
        assert_eq!(
            err,
            FetchError::UpstreamStatus {
                fields: 500,
                animals: 200
            }
        );
        assert_eq!(err.to_string(), "API Error: Fields 500, Animals 200");
    }

    #[test]
    fn missing_arrays_are_empty() {
        let snap = snapshot_from_responses(ok("{}"), ok(r#"{"animals":null}"#), 42).expect("ok");
        assert!(snap.fields.is_empty());
        assert!(snap.animals.is_empty());
        assert_eq!(snap.captured_at_ms, 42);
    }

    #[test]
    fn garbage_body_is_schema_error() {
        let err = snapshot_from_responses(ok("<html>"), ok("{}"), 1).expect_err("must fail");
        assert!(matches!(err, FetchError::Schema(_)));
        let err = snapshot_from_responses(ok("{}"), ok("[1]"), 1).expect_err("must fail");
        assert!(matches!(err, FetchError::Schema(_)));
    }

    #[test]
    fn malformed_record_fields_default_conservatively() {
        let fields = parse_fields_json(
            r#"{"fields":[{"name":"Box","state":"growing","harvest_time":"soon","time_planted":0},{"state":"growing"}]}"#,
        )
        .expect("parse");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].harvest_time, None);
        assert_eq!(fields[0].time_planted, None);
        assert_eq!(fields[0].crop_name, None);
        assert!(!fields[0].fertilized);
    }
}
