//! Sensor telemetry.

use anyhow::Result;
use serde_json::Value;

use super::{Api, into_items, segment};
use crate::http::RequestOptions;

impl Api {
    /// `GET /sensors`.
    pub fn sensors(&self) -> Result<Vec<Value>> {
        let value = self.http.value("/sensors", RequestOptions::get())?;
        Ok(into_items(value))
    }

    /// `GET /sensors/{id}/readings?limit=N`.
    pub fn readings(&self, sensor_id: &str, limit: usize) -> Result<Vec<Value>> {
        let value = self.http.value(
            &format!("/sensors/{}/readings?limit={limit}", segment(sensor_id)),
            RequestOptions::get(),
        )?;
        Ok(into_items(value))
    }
}
