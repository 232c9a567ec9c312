//! Home overview: dashboard summary, environment, uptime clock, provider
//! pings and the latency sparkline.

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use serde_json::Value;

use super::{TabContext, TabController};
use crate::api::segment;
use crate::logging::Logger;
use crate::ping::sparkline::{block_sparkline, sparkline_svg};
use crate::ping::{PingOutcome, Sampler, sweep_providers};
use crate::store::{HomeSlice, Shared};
use crate::view::{Node, display_value, el, empty_state, format_uptime, table};

/// Ping lines kept on the home panel.
const PING_LINES: usize = 10;

const SPARK_WIDTH: f64 = 600.0;
const SPARK_HEIGHT: f64 = 60.0;

impl TabController for HomeSlice {
    fn load(&mut self, cx: &mut TabContext<'_>) -> Result<()> {
        let dashboard = cx.api.dashboard(&cx.config.dashboard.scope)?;
        let uptime = cx.api.uptime()?;
        let env = cx.api.env()?;
        self.providers = sweep_providers(cx.api, &cx.config.providers.fallback);
        self.dashboard = dashboard;
        self.env = env;

        let now = Utc::now();
        self.uptime = Some(uptime);
        self.uptime_at = Some(now);
        self.clock = Some(now);
        Ok(())
    }

    fn render(&self, shared: &Shared) -> Node {
        let uptime = self
            .uptime_seconds()
            .map(format_uptime)
            .unwrap_or_else(|| "—".to_string());
        let clock = self
            .clock
            .map(|c| c.with_timezone(&Local).format("%a %b %-d, %H:%M").to_string())
            .unwrap_or_else(|| "—".to_string());

        let values = shared.series.values();
        let sparkline = Node::Raw {
            html: sparkline_svg(&values, SPARK_WIDTH, SPARK_HEIGHT),
            text: format!("Latency: {}", block_sparkline(&values)),
        };

        let pings = if self.pings.is_empty() {
            empty_state("No pings yet.")
        } else {
            el("ul")
                .class("pings")
                .children(self.pings.iter().map(ping_line))
        };

        el("section")
            .class("home")
            .child(el("h2").text("Home"))
            .child(
                el("div")
                    .class("status")
                    .child(el("p").id("clock").text(clock))
                    .child(el("p").text("Uptime: ").child(el("span").id("uptime").text(uptime))),
            )
            .child(el("h3").text("Overview"))
            .child(summary_table(&self.dashboard))
            .child(el("h3").text("Environment"))
            .child(summary_table(&self.env))
            .child(el("h3").text("Providers"))
            .child(
                el("div")
                    .class("row")
                    .children(
                        self.providers.iter().map(|p| {
                            post_button(&format!("/ping/{}", segment(p)), &format!("Ping {p}"))
                        }),
                    )
                    .child(post_button("/ping-all", "Test All")),
            )
            .child(el("h3").text("Ping Sparkline"))
            .child(sparkline)
            .child(pings)
            .into()
    }
}

impl HomeSlice {
    /// Move the clock to `now` once `every_secs` have passed since the last
    /// tick. Returns whether it moved.
    pub fn tick(&mut self, now: DateTime<Utc>, every_secs: u64) -> bool {
        let due = match self.clock {
            Some(last) => now.signed_duration_since(last).num_seconds() >= every_secs as i64,
            None => true,
        };
        if due {
            self.clock = Some(now);
        }
        due
    }

    /// Backend uptime as of the clock.
    pub fn uptime_seconds(&self) -> Option<u64> {
        let uptime = self.uptime?;
        let elapsed = match (self.uptime_at, self.clock) {
            (Some(at), Some(clock)) => clock.signed_duration_since(at).num_seconds().max(0) as u64,
            _ => 0,
        };
        Some(uptime.seconds + elapsed)
    }

    /// Ping one provider into the shared series.
    pub fn ping(&mut self, cx: &mut TabContext<'_>, provider: &str) -> PingOutcome {
        let outcome = Sampler::new(cx.api, cx.logger).ping(&mut cx.shared.series, provider);
        log_ping(cx.logger, &outcome);
        self.record(outcome.clone());
        outcome
    }

    /// Sequential sweep over the backend's providers.
    pub fn ping_all(&mut self, cx: &mut TabContext<'_>) -> Vec<PingOutcome> {
        let providers = sweep_providers(cx.api, &cx.config.providers.fallback);
        let outcomes =
            Sampler::new(cx.api, cx.logger).ping_all(&mut cx.shared.series, &providers);
        for outcome in &outcomes {
            log_ping(cx.logger, outcome);
            self.record(outcome.clone());
        }
        self.providers = providers;
        outcomes
    }

    fn record(&mut self, outcome: PingOutcome) {
        self.pings.push(outcome);
        if self.pings.len() > PING_LINES {
            let excess = self.pings.len() - PING_LINES;
            self.pings.drain(..excess);
        }
    }
}

fn log_ping(logger: &Logger, outcome: &PingOutcome) {
    logger.event("ping", &outcome.to_string());
}

pub(super) fn post_button(action: &str, label: &str) -> crate::view::Element {
    el("form")
        .class("inline")
        .attr("method", "post")
        .attr("action", action)
        .child(el("button").attr("type", "submit").text(label))
}

fn ping_line(outcome: &PingOutcome) -> crate::view::Element {
    let pill = if outcome.ok { "pill ok" } else { "pill err" };
    let status = match outcome.status {
        Some(code) => format!("{code} {}", outcome.status_text).trim_end().to_string(),
        None => "unreachable".to_string(),
    };
    let mut line = el("li")
        .text(format!("{} → ", outcome.provider.to_uppercase()))
        .child(el("span").class(pill).text(status))
        .text(format!(" ({} ms)", outcome.elapsed_ms));
    if !outcome.detail.is_empty() {
        line = line.child(el("span").class("meta").text(format!(" • {}", outcome.detail)));
    }
    line
}

/// Key/value rows of a JSON object; arrays show their length.
pub(super) fn summary_table(value: &Value) -> crate::view::Element {
    let Value::Object(map) = value else {
        return empty_state("Nothing to show.");
    };
    if map.is_empty() {
        return empty_state("Nothing to show.");
    }
    let rows = map
        .iter()
        .map(|(k, v)| {
            let shown = match v {
                Value::Array(items) => format!("{} items", items.len()),
                other => display_value(other),
            };
            vec![k.clone(), shown]
        })
        .collect();
    table(&["Key", "Value"], rows)
}
