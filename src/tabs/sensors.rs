//! Sensors and their recent readings.

use anyhow::Result;
use serde_json::Value;

use super::{TabContext, TabController};
use crate::api::record_id;
use crate::store::{SensorsSlice, Shared};
use crate::view::{Node, display_value, el, empty_state, format_datetime, record_title, table};

/// Readings fetched for the selected sensor.
pub const READINGS_LIMIT: usize = 50;

impl TabController for SensorsSlice {
    fn load(&mut self, cx: &mut TabContext<'_>) -> Result<()> {
        let sensors = cx.api.sensors()?;
        let readings = match &self.selected {
            Some(id) => Some(cx.api.readings(id, READINGS_LIMIT)?),
            None => None,
        };
        self.sensors = sensors;
        if let Some(readings) = readings {
            self.readings = readings;
        }
        Ok(())
    }

    fn render(&self, _shared: &Shared) -> Node {
        let sensors = if self.sensors.is_empty() {
            empty_state("No sensors reporting.")
        } else {
            el("ul").children(self.sensors.iter().map(|s| {
                let id = record_id(s);
                let mut li = el("li").text(record_title(s));
                if let Some(value) = s.get("last_value").or_else(|| s.get("value")) {
                    li = li.text(format!(": {}{}", display_value(value), unit(s)));
                }
                if id.is_some() && id == self.selected {
                    li = li.class("active");
                }
                li
            }))
        };

        let readings = match &self.selected {
            None => el("div").class("readings").hidden(true),
            Some(_) if self.readings.is_empty() => empty_state("No readings yet."),
            Some(id) => {
                let unit = self
                    .sensors
                    .iter()
                    .find(|s| record_id(s).as_deref() == Some(id.as_str()))
                    .map(unit)
                    .unwrap_or_default();
                let rows = self
                    .readings
                    .iter()
                    .map(|r| {
                        let at = ["ts", "timestamp", "time"]
                            .iter()
                            .find_map(|k| r.get(*k).and_then(Value::as_str))
                            .map(format_datetime)
                            .unwrap_or_else(|| "—".to_string());
                        let value = r.get("value").map(display_value).unwrap_or_default();
                        vec![at, format!("{value}{unit}")]
                    })
                    .collect();
                table(&["Time", "Value"], rows).class("readings")
            }
        };

        el("section")
            .class("sensors")
            .child(el("h2").text("Sensors"))
            .child(sensors)
            .child(el("h3").text("Readings"))
            .child(readings)
            .into()
    }
}

impl SensorsSlice {
    /// Select a sensor and fetch its readings.
    pub fn select(&mut self, cx: &mut TabContext<'_>, sensor_id: &str) {
        let readings = cx.api.readings(sensor_id, READINGS_LIMIT);
        if let Some(readings) = cx.guard("Failed to load readings", readings) {
            self.selected = Some(sensor_id.to_string());
            self.readings = readings;
        }
    }
}

fn unit(sensor: &Value) -> String {
    match sensor.get("unit").and_then(Value::as_str) {
        Some(u) if u.starts_with('°') || u == "%" => u.to_string(),
        Some(u) if !u.is_empty() => format!(" {u}"),
        _ => String::new(),
    }
}
