//! Environment, dashboard summary, uptime, settings, storage and developer
//! tooling.

use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde_json::{Value, json};

use super::{Api, BackendConfig, StorageTestResult, Uptime, segment};
use crate::http::RequestOptions;

impl Api {
    /// `GET /env`.
    pub fn env(&self) -> Result<Value> {
        self.http.value("/env", RequestOptions::get())
    }

    /// `GET /dashboard/{scope}`.
    pub fn dashboard(&self, scope: &str) -> Result<Value> {
        self.http.value(
            &format!("/dashboard/{}", segment(scope)),
            RequestOptions::get(),
        )
    }

    /// `GET /uptime`.
    pub fn uptime(&self) -> Result<Uptime> {
        self.http.json("/uptime", RequestOptions::get())
    }

    /// `GET /config`.
    pub fn backend_config(&self) -> Result<BackendConfig> {
        self.http.json("/config", RequestOptions::get())
    }

    /// `POST /config`.
    pub fn save_backend_config(&self, cfg: &BackendConfig) -> Result<Value> {
        let body = serde_json::to_value(cfg).context("failed to serialize backend config")?;
        self.http.value("/config", RequestOptions::post(body))
    }

    /// `GET /export/config`: connection summary for other devices.
    pub fn export_config(&self) -> Result<Value> {
        self.http.value("/export/config", RequestOptions::get())
    }

    /// `GET /settings/config`.
    pub fn settings(&self) -> Result<Value> {
        self.http.value("/settings/config", RequestOptions::get())
    }

    /// `POST /settings/config`.
    pub fn save_settings(&self, settings: Value) -> Result<Value> {
        self.http
            .value("/settings/config", RequestOptions::post(settings))
    }

    /// `POST /storage/test`: writes a probe file under `path`.
    pub fn storage_test(&self, path: &str) -> Result<StorageTestResult> {
        self.http
            .json("/storage/test", RequestOptions::post(json!({ "path": path })))
    }

    /// `GET /dev/status`.
    pub fn dev_status(&self) -> Result<Value> {
        self.http.value("/dev/status", RequestOptions::get())
    }

    /// `POST /dev/backup`.
    pub fn dev_backup(&self) -> Result<Value> {
        self.http
            .value("/dev/backup", RequestOptions::post(json!({})))
    }

    /// `POST /dev/restore`: `backup` names the snapshot to restore.
    pub fn dev_restore(&self, backup: &str) -> Result<Value> {
        self.http.value(
            "/dev/restore",
            RequestOptions::post(json!({ "backup": backup })),
        )
    }

    /// `GET /dev/toggles`.
    pub fn dev_toggles(&self) -> Result<Value> {
        self.http.value("/dev/toggles", RequestOptions::get())
    }

    /// `POST /dev/toggles`.
    pub fn set_dev_toggle(&self, name: &str, enabled: bool) -> Result<Value> {
        self.http.value(
            "/dev/toggles",
            RequestOptions::post(json!({ "name": name, "enabled": enabled })),
        )
    }

    /// `GET /dev/ping`.
    pub fn dev_ping(&self) -> Result<Value> {
        self.http
            .value("/dev/ping", RequestOptions::get().timeout(self.ping_timeout))
    }

    /// Poll `/uptime` every 500 ms until it answers or `timeout` passes.
    pub fn wait_until_ready(&self, timeout: Duration) -> Result<Uptime> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.uptime() {
                Ok(uptime) => return Ok(uptime),
                Err(err) if Instant::now() >= deadline => {
                    return Err(err.context(format!(
                        "backend at {} not ready after {}s",
                        self.base_url(),
                        timeout.as_secs()
                    )));
                }
                Err(_) => thread::sleep(Duration::from_millis(500)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::transport::{ScriptedReply, ScriptedTransport};
    use std::sync::Arc;

    #[test]
    fn wait_until_ready_retries_until_uptime_answers() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .push(ScriptedReply::NetworkError("connection refused".to_string()))
            .push(ScriptedReply::ok(r#"{"seconds": 12}"#));
        let api = Api::with_transport("http://hub", Box::new(transport.clone()));

        let uptime = api.wait_until_ready(Duration::from_secs(5)).unwrap();
        assert_eq!(uptime.seconds, 12);
        assert_eq!(transport.requests().len(), 2);
    }

    #[test]
    fn wait_until_ready_gives_up() {
        let transport = Arc::new(ScriptedTransport::new());
        let api = Api::with_transport("http://hub", Box::new(transport));
        let err = api.wait_until_ready(Duration::from_millis(0)).unwrap_err();
        assert!(format!("{err:#}").contains("not ready"));
    }

    #[test]
    fn storage_test_parses_written_path() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push(ScriptedReply::ok(r#"{"wrote": "/srv/hub/hub_test_1.txt"}"#));
        let api = Api::with_transport("http://hub", Box::new(transport));
        assert_eq!(
            api.storage_test("/srv/hub").unwrap().wrote,
            "/srv/hub/hub_test_1.txt"
        );
    }
}
