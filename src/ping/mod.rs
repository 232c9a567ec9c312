//! Provider latency sampling.
//!
//! [`Sampler::ping`] times one `GET /ping/{provider}` round trip and appends
//! the result to a [`LatencySeries`]: the latency in milliseconds on
//! success, the failure sentinel otherwise. [`Sampler::ping_all`] sweeps a
//! provider list strictly one ping at a time. The series feeds the
//! sparkline in [`sparkline`].

pub mod sparkline;

use std::collections::VecDeque;
use std::fmt;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::api::{Api, PingReport};
use crate::http::{ApiError, Payload};
use crate::logging::{Logger, PingRecord};

/// Samples retained by a [`LatencySeries`].
pub const SERIES_CAPACITY: usize = 40;

/// Value a failed ping contributes to the series.
pub const FAILED_SAMPLE: i64 = -1;

// ---------------------------------------------------------------------------
// Samples
// ---------------------------------------------------------------------------

/// One ping result as stored in the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sample {
    /// Round trip in whole milliseconds.
    Latency(u64),
    Failed,
}

impl Sample {
    /// Milliseconds, or [`FAILED_SAMPLE`].
    pub fn value(self) -> i64 {
        match self {
            Self::Latency(ms) => i64::try_from(ms).unwrap_or(i64::MAX),
            Self::Failed => FAILED_SAMPLE,
        }
    }

    pub fn is_failed(self) -> bool {
        matches!(self, Self::Failed)
    }
}

impl Serialize for Sample {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.value())
    }
}

/// The most recent [`SERIES_CAPACITY`] samples, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LatencySeries {
    samples: VecDeque<Sample>,
}

impl LatencySeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample, evicting the oldest beyond capacity.
    pub fn push(&mut self, sample: Sample) {
        self.samples.push_back(sample);
        while self.samples.len() > SERIES_CAPACITY {
            self.samples.pop_front();
        }
    }

    /// Sample values in chronological order.
    pub fn values(&self) -> Vec<i64> {
        self.samples.iter().map(|s| s.value()).collect()
    }

    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        self.samples.iter().copied()
    }

    pub fn last(&self) -> Option<Sample> {
        self.samples.back().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn failures(&self) -> usize {
        self.samples.iter().filter(|s| s.is_failed()).count()
    }
}

// ---------------------------------------------------------------------------
// Sampler
// ---------------------------------------------------------------------------

/// Result of one timed ping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PingOutcome {
    pub provider: String,
    pub ok: bool,
    /// HTTP status, `None` when the request never got a response.
    pub status: Option<u16>,
    pub status_text: String,
    /// Measured wall-clock time, also for failures.
    pub elapsed_ms: u64,
    pub detail: String,
}

impl PingOutcome {
    /// What this outcome contributes to the series.
    pub fn sample(&self) -> Sample {
        if self.ok {
            Sample::Latency(self.elapsed_ms)
        } else {
            Sample::Failed
        }
    }
}

impl fmt::Display for PingOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match (self.status, self.status_text.as_str()) {
            (None, _) => "unreachable".to_string(),
            (Some(code), "") => code.to_string(),
            (Some(code), text) => format!("{code} {text}"),
        };
        write!(
            f,
            "{} → {} ({} ms)",
            self.provider.to_uppercase(),
            status,
            self.elapsed_ms
        )?;
        if !self.detail.is_empty() {
            write!(f, " • {}", self.detail)?;
        }
        Ok(())
    }
}

/// Times provider pings against the backend.
pub struct Sampler<'a> {
    api: &'a Api,
    logger: &'a Logger,
}

impl<'a> Sampler<'a> {
    pub fn new(api: &'a Api, logger: &'a Logger) -> Self {
        Self { api, logger }
    }

    /// Ping one provider and append the result to `series`.
    pub fn ping(&self, series: &mut LatencySeries, provider: &str) -> PingOutcome {
        let started = Instant::now();
        let result = self.api.ping_provider(provider);
        let elapsed_ms = (started.elapsed().as_secs_f64() * 1000.0).round() as u64;

        let outcome = match result {
            Ok(response) => PingOutcome {
                provider: provider.to_string(),
                ok: true,
                status: Some(response.status),
                status_text: response.status_text,
                elapsed_ms,
                detail: reply_detail(&response.payload),
            },
            Err(err) => {
                let api_err = err.downcast_ref::<ApiError>();
                PingOutcome {
                    provider: provider.to_string(),
                    ok: false,
                    status: api_err.and_then(|e| e.status),
                    status_text: api_err.map(|e| e.status_text.clone()).unwrap_or_default(),
                    elapsed_ms,
                    detail: err.to_string(),
                }
            }
        };

        series.push(outcome.sample());
        self.logger.ping(&PingRecord {
            timestamp: Utc::now().to_rfc3339(),
            provider: outcome.provider.clone(),
            ok: outcome.ok,
            status: outcome.status,
            latency_ms: outcome.sample().value(),
            detail: outcome.detail.clone(),
        });

        outcome
    }

    /// Ping each provider in order, each one finishing before the next starts.
    pub fn ping_all(&self, series: &mut LatencySeries, providers: &[String]) -> Vec<PingOutcome> {
        providers
            .iter()
            .map(|provider| self.ping(series, provider))
            .collect()
    }
}

/// `detail` of a parseable ping body, or a bare JSON string; empty otherwise.
fn reply_detail(payload: &Payload) -> String {
    match payload {
        Payload::Json(Value::String(s)) => s.clone(),
        other => PingReport::from_payload(other)
            .map(|report| report.detail)
            .unwrap_or_default(),
    }
}

/// Providers for a sweep: the backend's configured list, or `fallback` when
/// that list is unavailable or empty.
pub fn sweep_providers(api: &Api, fallback: &[String]) -> Vec<String> {
    match api.providers() {
        Ok(providers) if !providers.is_empty() => providers,
        _ => fallback.to_vec(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
