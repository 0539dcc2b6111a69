//! Validated run specification

use serde::{Serialize, Serializer};
use serde_json::Value;
use std::time::Duration;

use crate::duration::{format_duration, parse_duration, serde_unit_duration_option};
use crate::error::{ResolveError, ResolveResult};
use crate::merge::MergedConfig;

/// Percentiles reported when the request does not ask for specific ones
pub const DEFAULT_PERCENTILES: &[f64] = &[50.0, 75.0, 90.0, 99.0, 99.9];

/// Literal duration value asking for a run that only ends when stopped
pub const UNTIL_STOPPED: &str = "on";

/// How long a run lasts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunDuration {
    /// Engine configured default
    #[default]
    Default,
    /// Fixed wall clock duration
    For(Duration),
    /// Runs until explicitly stopped
    UntilStopped,
}

impl RunDuration {
    pub fn is_unbounded(&self) -> bool {
        matches!(self, RunDuration::UntilStopped)
    }
}

impl Serialize for RunDuration {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            RunDuration::Default => serializer.serialize_str("default"),
            RunDuration::For(d) => serializer.serialize_str(&format_duration(*d)),
            RunDuration::UntilStopped => serializer.serialize_str("until stopped"),
        }
    }
}

/// Immutable description of one load generation run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RunSpec {
    #[serde(rename = "URL")]
    pub url: String,
    /// Target queries per second; `<= 0` means as fast as possible
    #[serde(rename = "QPS", skip_serializing_if = "Option::is_none")]
    pub qps: Option<f64>,
    pub duration: RunDuration,
    /// Exact number of calls; takes precedence over the duration
    #[serde(rename = "N", skip_serializing_if = "Option::is_none")]
    pub requests: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connections: Option<u32>,
    #[serde(
        with = "serde_unit_duration_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<Duration>,
    pub headers: Vec<String>,
    #[serde(skip_serializing)]
    pub payload: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<String>,
    pub percentiles: Vec<f64>,
    pub save: bool,
    #[serde(rename = "Async")]
    pub run_async: bool,
}

impl RunSpec {
    /// Spec for `url` with every optional field unset
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            qps: None,
            duration: RunDuration::Default,
            requests: None,
            connections: None,
            timeout: None,
            headers: Vec::new(),
            payload: None,
            content_type: None,
            labels: None,
            percentiles: DEFAULT_PERCENTILES.to_vec(),
            save: false,
            run_async: false,
        }
    }

    /// True when nothing but a stop request ends the run
    pub fn runs_until_stopped(&self) -> bool {
        self.duration.is_unbounded() && !self.requests.is_some_and(|n| n > 0)
    }

    /// Header entries split into trimmed `(name, value)` pairs
    pub fn header_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .filter_map(|h| split_header(h))
    }
}

/// Render a merged field as text, the form query parameters arrive in
fn text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

fn text_field(config: &MergedConfig, name: &str) -> Option<String> {
    config.get(name).and_then(text)
}

fn split_header(entry: &str) -> Option<(&str, &str)> {
    let (name, value) = entry.split_once(':')?;
    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    Some((name, value.trim()))
}

fn parse_url(config: &MergedConfig) -> ResolveResult<String> {
    match text_field(config, "url") {
        Some(url) if !url.trim().is_empty() => Ok(url.trim().to_string()),
        _ => Err(ResolveError::validation(
            "URL is required",
            "no url in query parameters or json body",
        )),
    }
}

fn parse_run_duration(config: &MergedConfig) -> ResolveResult<RunDuration> {
    match text_field(config, "t") {
        None => Ok(RunDuration::Default),
        Some(raw) if raw.is_empty() => Ok(RunDuration::Default),
        Some(raw) if raw == UNTIL_STOPPED => Ok(RunDuration::UntilStopped),
        Some(raw) => parse_duration(&raw)
            .map(RunDuration::For)
            .map_err(|e| ResolveError::duration(raw, e)),
    }
}

fn parse_qps(config: &MergedConfig) -> ResolveResult<Option<f64>> {
    let Some(raw) = text_field(config, "qps").filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };
    match raw.trim().parse::<f64>() {
        Ok(qps) if qps.is_finite() => Ok(Some(qps)),
        Ok(_) => Err(ResolveError::validation("invalid qps", format!("{:?} is not finite", raw))),
        Err(e) => Err(ResolveError::validation("invalid qps", format!("{:?}: {}", raw, e))),
    }
}

fn parse_count(config: &MergedConfig, name: &str, message: &str) -> ResolveResult<Option<u64>> {
    let Some(raw) = text_field(config, name).filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if let Ok(count) = trimmed.parse::<u64>() {
        return Ok(Some(count));
    }
    // JSON numbers such as 200.0 are accepted when integral
    match trimmed.parse::<f64>() {
        Ok(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(Some(f as u64)),
        _ => Err(ResolveError::validation(
            message,
            format!("{:?} is not a non-negative integer", raw),
        )),
    }
}

fn parse_timeout(config: &MergedConfig) -> ResolveResult<Option<Duration>> {
    match text_field(config, "timeout").filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(raw) => parse_duration(&raw)
            .map(Some)
            .map_err(|e| ResolveError::duration(raw, e)),
    }
}

fn parse_headers(config: &MergedConfig) -> ResolveResult<Vec<String>> {
    config
        .headers()
        .iter()
        .map(|entry| match entry {
            Value::String(h) if split_header(h).is_some() => Ok(h.clone()),
            other => Err(ResolveError::validation(
                "invalid header",
                format!("expected \"Name: Value\", got {}", other),
            )),
        })
        .collect()
}

fn parse_percentiles(config: &MergedConfig) -> ResolveResult<Vec<f64>> {
    let Some(raw) = text_field(config, "p").filter(|s| !s.trim().is_empty()) else {
        return Ok(DEFAULT_PERCENTILES.to_vec());
    };
    raw.split(',')
        .map(|p| match p.trim().parse::<f64>() {
            Ok(v) if v > 0.0 && v <= 100.0 => Ok(v),
            _ => Err(ResolveError::validation(
                "invalid percentiles (p)",
                format!("{:?} is not a percentile in (0, 100]", p.trim()),
            )),
        })
        .collect()
}

fn parse_flag(config: &MergedConfig, name: &str) -> ResolveResult<bool> {
    let Some(raw) = text_field(config, name) else {
        return Ok(false);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Ok(true),
        "" | "off" | "false" | "0" | "no" => Ok(false),
        _ => Err(ResolveError::validation(
            format!("invalid {} flag", name),
            format!("{:?} is not one of on/off/true/false", raw),
        )),
    }
}

/// Type-check a merged configuration into a [`RunSpec`].
///
/// Fields are checked in a fixed order and the first failure is returned.
pub fn validate(config: &MergedConfig) -> ResolveResult<RunSpec> {
    let url = parse_url(config)?;
    let duration = parse_run_duration(config)?;
    let qps = parse_qps(config)?;
    let requests = parse_count(config, "n", "invalid number of calls (n)")?;
    let connections = match parse_count(config, "c", "invalid connections (c)")? {
        None | Some(0) => None,
        Some(c) => Some(u32::try_from(c).map_err(|_| {
            ResolveError::validation("invalid connections (c)", format!("{} is too large", c))
        })?),
    };
    let timeout = parse_timeout(config)?;
    let headers = parse_headers(config)?;
    let payload = text_field(config, "payload")
        .filter(|p| !p.is_empty())
        .map(String::into_bytes);
    let content_type = text_field(config, "content-type").filter(|c| !c.is_empty());
    let labels = text_field(config, "labels").filter(|l| !l.is_empty());
    let percentiles = parse_percentiles(config)?;
    let save = parse_flag(config, "save")?;
    let run_async = parse_flag(config, "async")?;

    Ok(RunSpec {
        url,
        qps,
        duration,
        requests,
        connections,
        timeout,
        headers,
        payload,
        content_type,
        labels,
        percentiles,
        save,
        run_async,
    })
}
