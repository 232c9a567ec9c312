//! Event and ping-history logs under `~/.homehub/`.
//!
//! - `hub.log`: one timestamped line per notable event (tab loads, toasts,
//!   served requests).
//! - `ping-log.jsonl`: one JSON record per provider ping, read back by
//!   `homehub pings`.
//!
//! All writes are best-effort: a log failure never interrupts the dashboard.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::{self, HubConfig};

// ---------------------------------------------------------------------------
// Logger handle
// ---------------------------------------------------------------------------

/// Resolved log destinations. `None` disables the corresponding log.
#[derive(Debug, Clone, Default)]
pub struct Logger {
    event_log: Option<PathBuf>,
    ping_log: Option<PathBuf>,
}

impl Logger {
    /// Logger writing to the default `~/.homehub/` files, honouring `[logging]`.
    pub fn from_config(cfg: &HubConfig) -> Self {
        let dir = config::hub_dir();
        Self {
            event_log: dir
                .as_ref()
                .filter(|_| cfg.logging.enabled)
                .map(|d| d.join("hub.log")),
            ping_log: dir
                .as_ref()
                .filter(|_| cfg.logging.ping_history)
                .map(|d| d.join("ping-log.jsonl")),
        }
    }

    /// Logger writing into an arbitrary directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            event_log: Some(dir.join("hub.log")),
            ping_log: Some(dir.join("ping-log.jsonl")),
        }
    }

    /// Logger that drops everything.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Append `"<rfc3339> [source] message"` to the event log.
    pub fn event(&self, source: &str, message: &str) {
        let Some(path) = &self.event_log else {
            return;
        };
        let line = format!(
            "{} [{}] {}",
            Utc::now().to_rfc3339(),
            source,
            message.replace(['\r', '\n'], " ")
        );
        let _ = append_line(path, &line);
    }

    /// Append a ping record to the JSONL history.
    pub fn ping(&self, record: &PingRecord) {
        let Some(path) = &self.ping_log else {
            return;
        };
        if let Ok(json) = serde_json::to_string(record) {
            let _ = append_line(path, &json);
        }
    }

    /// Path of the event log, if enabled.
    pub fn event_log_path(&self) -> Option<&Path> {
        self.event_log.as_deref()
    }

    /// Path of the ping history, if enabled.
    pub fn ping_log_path(&self) -> Option<&Path> {
        self.ping_log.as_deref()
    }
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Ping history
// ---------------------------------------------------------------------------

/// One line of `ping-log.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingRecord {
    pub timestamp: String,
    pub provider: String,
    pub ok: bool,
    pub status: Option<u16>,
    /// Measured round trip, or `-1` for a failed ping.
    pub latency_ms: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub detail: String,
}

/// Read the newest `limit` records in chronological order.
///
/// Malformed lines are skipped; a missing file yields an empty vec.
pub fn read_ping_history(path: &Path, limit: Option<usize>) -> Vec<PingRecord> {
    let Ok(file) = fs::File::open(path) else {
        return Vec::new();
    };

    let records: Vec<PingRecord> = BufReader::new(file)
        .split(b'\n')
        .map_while(Result::ok)
        .filter_map(|line| serde_json::from_slice::<PingRecord>(&line).ok())
        .collect();

    match limit {
        Some(n) if records.len() > n => records[records.len() - n..].to_vec(),
        _ => records,
    }
}

/// Aggregate view of one provider's ping history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderSummary {
    pub provider: String,
    pub count: usize,
    pub failures: usize,
    pub avg_ms: Option<f64>,
    pub min_ms: Option<i64>,
    pub max_ms: Option<i64>,
}

/// Summarize records per provider, sorted by provider name.
///
/// Latency statistics only cover successful pings.
pub fn summarize(records: &[PingRecord]) -> Vec<ProviderSummary> {
    let mut grouped: BTreeMap<&str, Vec<&PingRecord>> = BTreeMap::new();
    for record in records {
        grouped.entry(record.provider.as_str()).or_default().push(record);
    }

    grouped
        .into_iter()
        .map(|(provider, recs)| {
            let ok: Vec<i64> = recs
                .iter()
                .filter(|r| r.ok && r.latency_ms >= 0)
                .map(|r| r.latency_ms)
                .collect();
            let avg_ms = if ok.is_empty() {
                None
            } else {
                Some(ok.iter().sum::<i64>() as f64 / ok.len() as f64)
            };
            ProviderSummary {
                provider: provider.to_string(),
                count: recs.len(),
                failures: recs.len() - ok.len(),
                avg_ms,
                min_ms: ok.iter().copied().min(),
                max_ms: ok.iter().copied().max(),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
