//! Local HTML preview of the dashboard.
//!
//! A lightweight HTTP server (sync, via `tiny_http`) that renders the
//! dashboard view-model as HTML and exposes a JSON snapshot of the store:
//! - `GET /`, `GET /tab/{id}`: the page, activating (and lazily loading) tabs
//! - `GET /api/state`: active tab, load states, latency series, toasts
//! - `POST /ping/{provider}`, `POST /ping-all`: latency sampling
//! - `POST /vault/unlock`, `POST /vault/lock`, `POST /dev/backup`,
//!   `POST /dev/ping`: the panel forms
//!
//! Launched via `homehub web` (default: `http://127.0.0.1:9750`). Form posts
//! from a browser get a `303` back to the page; other clients get JSON.

mod frontend;

use std::io::{Cursor, Read};

use anyhow::Result;
use chrono::Utc;
use serde_json::{Value, json};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use url::form_urlencoded;

use crate::tabs::{Dashboard, TabId};

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Bind `addr` and serve until the process is stopped.
pub fn serve(dashboard: &mut Dashboard, addr: &str) -> Result<()> {
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    println!("homehub preview running at http://{addr}");
    println!("Backend: {}", dashboard.api().base_url());
    println!("Press Ctrl+C to stop.\n");

    run(&server, dashboard);
    Ok(())
}

/// Handle requests one at a time until the server is unblocked.
pub fn run(server: &Server, dashboard: &mut Dashboard) {
    for mut request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();
        let wants_html = accepts_html(&request);

        let body = if matches!(method, Method::Put | Method::Post | Method::Patch) {
            let mut buf = String::new();
            let _ = request.as_reader().read_to_string(&mut buf);
            Some(buf)
        } else {
            None
        };

        let reply = dispatch(dashboard, &method, &url, body.as_deref(), wants_html)
            .unwrap_or_else(|e| Reply::json(500, &json!({ "error": format!("{e:#}") })));
        let status = reply.status;
        let _ = request.respond(reply.into_response());

        dashboard
            .logger()
            .event("web", &format!("{method} {url} {status}"));
        println!(
            "{} {} {} {}",
            method,
            url,
            status,
            chrono::Local::now().format("%H:%M:%S")
        );
    }
}

fn accepts_html(request: &Request) -> bool {
    request
        .headers()
        .iter()
        .any(|h| h.field.equiv("Accept") && h.value.as_str().contains("text/html"))
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

fn dispatch(
    dashboard: &mut Dashboard,
    method: &Method,
    url: &str,
    body: Option<&str>,
    wants_html: bool,
) -> Result<Reply> {
    let path = url.split('?').next().unwrap_or(url);

    match (method, path) {
        (&Method::Get, "/") | (&Method::Get, "/index.html") => {
            let tab = dashboard.active();
            Ok(show(dashboard, tab))
        }
        (&Method::Get, p) if p.starts_with("/tab/") => match p["/tab/".len()..].parse::<TabId>() {
            Ok(tab) => Ok(show(dashboard, tab)),
            Err(_) => Ok(not_found()),
        },
        (&Method::Get, "/api/state") => Ok(Reply::json(200, &dashboard.store().snapshot())),

        (&Method::Post, "/ping-all") => {
            let outcomes = dashboard.act(|tabs, cx| tabs.home.ping_all(cx));
            Ok(after_action(wants_html, "/tab/home", json!({ "outcomes": outcomes })))
        }
        (&Method::Post, p) if p.starts_with("/ping/") => {
            let provider = decode_segment(&p["/ping/".len()..]);
            if provider.is_empty() {
                return Ok(not_found());
            }
            let outcome = dashboard.act(|tabs, cx| tabs.home.ping(cx, &provider));
            Ok(after_action(wants_html, "/tab/home", serde_json::to_value(&outcome)?))
        }

        (&Method::Post, "/vault/unlock") => {
            let pin = body.and_then(|b| form_field(b, "pin")).unwrap_or_default();
            dashboard.activate(TabId::Vault);
            let unlocked = dashboard.act(|tabs, cx| tabs.vault.unlock(cx, &pin));
            Ok(after_action(wants_html, "/tab/vault", json!({ "unlocked": unlocked })))
        }
        (&Method::Post, "/vault/lock") => {
            dashboard.act(|tabs, _| tabs.vault.lock());
            Ok(after_action(wants_html, "/tab/vault", json!({ "unlocked": false })))
        }

        (&Method::Post, "/dev/backup") => {
            dashboard.activate(TabId::Dev);
            let result = dashboard.act(|tabs, cx| {
                tabs.dev.backup(cx);
                tabs.dev.last_result.clone()
            });
            Ok(after_action(wants_html, "/tab/dev", json!({ "result": result })))
        }
        (&Method::Post, "/dev/ping") => {
            dashboard.activate(TabId::Dev);
            let result = dashboard.act(|tabs, cx| {
                tabs.dev.ping(cx);
                tabs.dev.last_result.clone()
            });
            Ok(after_action(wants_html, "/tab/dev", json!({ "result": result })))
        }

        _ => Ok(not_found()),
    }
}

/// Activate `tab` and render the whole page. Toasts are shown once.
fn show(dashboard: &mut Dashboard, tab: TabId) -> Reply {
    dashboard.activate(tab);
    dashboard.tick(Utc::now());
    let html = frontend::page(
        &format!("{} · homehub", tab.title()),
        &dashboard.render().render_html(),
    );
    dashboard.drain_toasts();
    Reply::html(html)
}

fn after_action(wants_html: bool, location: &str, body: Value) -> Reply {
    if wants_html {
        Reply::redirect(location)
    } else {
        Reply::json(200, &body)
    }
}

// ---------------------------------------------------------------------------
// Form decoding
// ---------------------------------------------------------------------------

/// Value of `key` in an `application/x-www-form-urlencoded` or JSON body.
fn form_field(body: &str, key: &str) -> Option<String> {
    let body = body.trim();
    if body.starts_with('{') {
        let value: Value = serde_json::from_str(body).ok()?;
        return value.get(key).and_then(Value::as_str).map(str::to_string);
    }
    form_urlencoded::parse(body.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// Decode one percent-encoded path segment; invalid UTF-8 is kept verbatim.
fn decode_segment(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// A response before it is handed to `tiny_http`.
#[derive(Debug)]
struct Reply {
    status: u16,
    content_type: &'static str,
    location: Option<String>,
    body: Vec<u8>,
}

impl Reply {
    fn json(status: u16, value: &Value) -> Self {
        Self {
            status,
            content_type: "application/json; charset=utf-8",
            location: None,
            body: value.to_string().into_bytes(),
        }
    }

    fn html(html: String) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=utf-8",
            location: None,
            body: html.into_bytes(),
        }
    }

    fn redirect(location: &str) -> Self {
        Self {
            status: 303,
            content_type: "text/plain; charset=utf-8",
            location: Some(location.to_string()),
            body: Vec::new(),
        }
    }

    fn into_response(self) -> Response<Cursor<Vec<u8>>> {
        let mut response = Response::from_data(self.body)
            .with_header(header("Content-Type", self.content_type))
            .with_status_code(StatusCode(self.status));
        if let Some(location) = &self.location {
            response.add_header(header("Location", location));
        }
        response
    }
}

/// 404 response.
fn not_found() -> Reply {
    Reply::json(404, &json!({ "error": "not found" }))
}

fn header(name: &str, value: &str) -> Header {
    Header::from_bytes(name, value).unwrap()
}
