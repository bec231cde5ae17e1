use chrono::{DateTime, NaiveDate};
use serde::de::DeserializeOwned;

use crate::ipc::error::HandlerErr;
use crate::ipc::types::Request;

pub fn required_str(req: &Request, key: &str) -> Result<String, HandlerErr> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn optional_str(req: &Request, key: &str) -> Result<Option<String>, HandlerErr> {
    match req.params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => v
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| HandlerErr::bad_params(format!("{} must be a string", key))),
    }
}

pub fn required_f64(req: &Request, key: &str) -> Result<f64, HandlerErr> {
    let Some(v) = req.params.get(key) else {
        return Err(HandlerErr::bad_params(format!("missing {}", key)));
    };
    v.as_f64()
        .filter(|n| n.is_finite())
        .ok_or_else(|| HandlerErr::bad_params(format!("{} must be a number", key)))
}

pub fn optional_f64(req: &Request, key: &str, default: f64) -> Result<f64, HandlerErr> {
    match req.params.get(key) {
        None => Ok(default),
        Some(v) if v.is_null() => Ok(default),
        Some(_) => required_f64(req, key),
    }
}

pub fn required_u32(req: &Request, key: &str) -> Result<u32, HandlerErr> {
    req.params
        .get(key)
        .and_then(|v| v.as_u64())
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| HandlerErr::bad_params(format!("{} must be a non-negative integer", key)))
}

pub fn optional_limit(req: &Request, default: usize) -> Result<usize, HandlerErr> {
    match req.params.get("limit") {
        None => Ok(default),
        Some(v) if v.is_null() => Ok(default),
        Some(v) => v
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| HandlerErr::bad_params("limit must be a non-negative integer")),
    }
}

/// Deserializes the whole params object into `T`.
pub fn params_as<T: DeserializeOwned>(req: &Request) -> Result<T, HandlerErr> {
    serde_json::from_value(req.params.clone())
        .map_err(|e| HandlerErr::bad_params(format!("invalid params: {}", e)))
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, HandlerErr> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| HandlerErr::bad_params(format!("date must be YYYY-MM-DD: {}", raw)))
}

/// Epoch seconds at 00:00:00 UTC of `date`.
pub fn day_start(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

/// Epoch seconds at 23:59:59 UTC of `date`.
pub fn day_end(date: NaiveDate) -> i64 {
    day_start(date) + 86_399
}

pub fn date_of(timestamp: i64) -> Option<String> {
    DateTime::from_timestamp(timestamp, 0).map(|dt| dt.date_naive().format("%Y-%m-%d").to_string())
}

/// `timestamp` if given, else the start of `date`, else `fallback`.
pub fn timestamp_param(req: &Request, fallback: i64) -> Result<i64, HandlerErr> {
    if let Some(v) = req.params.get("timestamp").filter(|v| !v.is_null()) {
        return v
            .as_i64()
            .ok_or_else(|| HandlerErr::bad_params("timestamp must be an integer (epoch seconds)"));
    }
    if let Some(date) = optional_str(req, "date")? {
        return Ok(day_start(parse_date(&date)?));
    }
    Ok(fallback)
}
