//! End-to-end tests against an in-process mock backend.
//!
//! The mock is a `tiny_http` server on an ephemeral port, answering from a
//! route closure and recording every request it sees. The client side is
//! the production stack: `Api::from_config` over `ureq`.

use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use serde_json::{Value, json};
use tiny_http::{Header, Response, Server, StatusCode};

use homehub::api::{Api, Resource};
use homehub::config::HubConfig;
use homehub::http::{ApiError, RequestOptions};
use homehub::logging::Logger;
use homehub::tabs::{Dashboard, TabId};
use homehub::view::ToastLevel;

// ---------------------------------------------------------------------------
// Mock backend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Seen {
    method: String,
    path: String,
    headers: Vec<(String, String)>,
    body: String,
}

impl Seen {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

struct Canned {
    status: u16,
    body: String,
}

fn reply(status: u16, body: &str) -> Canned {
    Canned {
        status,
        body: body.to_string(),
    }
}

struct MockBackend {
    base_url: String,
    server: Arc<Server>,
    seen: Arc<Mutex<Vec<Seen>>>,
    handle: Option<JoinHandle<()>>,
}

impl MockBackend {
    fn start(routes: impl Fn(&Seen) -> Canned + Send + 'static) -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").unwrap());
        let port = server.server_addr().to_ip().unwrap().port();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let handle = {
            let server = Arc::clone(&server);
            let seen = Arc::clone(&seen);
            thread::spawn(move || {
                for mut request in server.incoming_requests() {
                    let mut body = String::new();
                    let _ = request.as_reader().read_to_string(&mut body);
                    let entry = Seen {
                        method: request.method().to_string(),
                        path: request.url().to_string(),
                        headers: request
                            .headers()
                            .iter()
                            .map(|h| (h.field.to_string(), h.value.to_string()))
                            .collect(),
                        body,
                    };
                    let canned = routes(&entry);
                    seen.lock().unwrap().push(entry);

                    let response = Response::from_string(canned.body)
                        .with_status_code(StatusCode(canned.status))
                        .with_header(
                            Header::from_bytes("Content-Type", "application/json").unwrap(),
                        );
                    let _ = request.respond(response);
                }
            })
        };

        Self {
            base_url: format!("http://127.0.0.1:{port}"),
            server,
            seen,
            handle: Some(handle),
        }
    }

    fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    fn config(&self) -> HubConfig {
        let mut cfg = HubConfig::default();
        cfg.server.base_url = self.base_url.clone();
        cfg.server.timeout_ms = 5_000;
        cfg
    }

    fn api(&self) -> Api {
        Api::from_config(&self.config())
    }

    fn dashboard(&self) -> Dashboard {
        Dashboard::new(self.api(), self.config(), Logger::disabled())
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn api_error(err: &anyhow::Error) -> &ApiError {
    err.downcast_ref::<ApiError>().expect("root cause is ApiError")
}

// ---------------------------------------------------------------------------
// JSON façade
// ---------------------------------------------------------------------------

#[test]
fn structured_404_surfaces_detail() {
    let backend = MockBackend::start(|_| reply(404, r#"{"detail":"not found"}"#));
    let err = backend.api().list(Resource::Projects).unwrap_err();

    let api_err = api_error(&err);
    assert_eq!(api_err.status, Some(404));
    assert_eq!(api_err.message, "not found");
    assert_eq!(err.to_string(), "not found");
}

#[test]
fn unstructured_500_surfaces_status_text() {
    let backend = MockBackend::start(|_| reply(500, "oops"));
    let err = backend.api().env().unwrap_err();

    let api_err = api_error(&err);
    assert_eq!(api_err.status, Some(500));
    assert_eq!(api_err.message, "Internal Server Error");
}

#[test]
fn json_body_gets_content_type_and_compact_encoding() {
    let backend = MockBackend::start(|_| reply(200, r#"{"ok":true}"#));
    backend
        .api()
        .http()
        .value("/echo", RequestOptions::post(json!({"a": 1})))
        .unwrap();

    let seen = backend.seen();
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].header("Content-Type"), Some("application/json"));
    assert_eq!(seen[0].body, r#"{"a":1}"#);
}

#[test]
fn unreachable_backend_is_a_transport_error() {
    let port = {
        let probe = Server::http("127.0.0.1:0").unwrap();
        probe.server_addr().to_ip().unwrap().port()
    };
    let mut cfg = HubConfig::default();
    cfg.server.base_url = format!("http://127.0.0.1:{port}");
    cfg.server.timeout_ms = 2_000;

    let err = Api::from_config(&cfg).uptime().unwrap_err();
    assert_eq!(api_error(&err).status, None);
}

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

fn vault_routes(seen: &Seen) -> Canned {
    let pin = serde_json::from_str::<Value>(&seen.body)
        .ok()
        .and_then(|b| b.get("pin").and_then(Value::as_str).map(str::to_string));
    match (seen.path.as_str(), pin.as_deref()) {
        ("/vault/auth", Some("2468")) => reply(200, r#"{"ok":true}"#),
        ("/vault/auth", _) => reply(401, r#"{"detail":"Invalid PIN"}"#),
        ("/vault/items/list", Some("2468")) => {
            reply(200, r#"{"items":[{"id":1,"label":"Wi-Fi"},{"id":2,"label":"Alarm code"}]}"#)
        }
        _ => reply(403, r#"{"detail":"forbidden"}"#),
    }
}

#[test]
fn vault_unlock_with_correct_pin_reveals_items() {
    let backend = MockBackend::start(vault_routes);
    let mut dash = backend.dashboard();

    dash.activate(TabId::Vault);
    assert!(backend.seen().is_empty());

    let unlocked = dash.act(|tabs, cx| tabs.vault.unlock(cx, "2468"));
    assert!(unlocked);

    let page = dash.render();
    let secure = page.find_id("vault-secure").unwrap();
    assert!(!secure.is_hidden());
    let text = page.render_text();
    assert!(text.contains("Wi-Fi"), "{text}");
    assert!(text.contains("Alarm code"), "{text}");

    let paths: Vec<String> = backend.seen().iter().map(|s| s.path.clone()).collect();
    assert_eq!(paths, vec!["/vault/auth", "/vault/items/list"]);
    assert_eq!(dash.store().vault_pin(), Some("2468"));
}

#[test]
fn vault_unlock_with_wrong_pin_stays_hidden() {
    let backend = MockBackend::start(vault_routes);
    let mut dash = backend.dashboard();

    let unlocked = dash.act(|tabs, cx| tabs.vault.unlock(cx, "1111"));
    assert!(!unlocked);

    assert!(dash.render().find_id("vault-secure").unwrap().is_hidden());
    let toast = dash.store().shared.toasts.last().unwrap();
    assert_eq!(toast.level, ToastLevel::Danger);
    assert!(toast.message.contains("Invalid PIN"));
    assert_eq!(backend.seen().len(), 1);
}

// ---------------------------------------------------------------------------
// Tabs
// ---------------------------------------------------------------------------

#[test]
fn tabs_load_once_on_first_activation() {
    let backend = MockBackend::start(|seen| match seen.path.as_str() {
        "/sensors" => reply(200, r#"[{"id":"t1","name":"Attic","unit":"°C","last_value":19.5}]"#),
        _ => reply(404, r#"{"detail":"not found"}"#),
    });
    let mut dash = backend.dashboard();

    assert!(dash.activate(TabId::Sensors));
    assert!(!dash.activate(TabId::Sensors));
    assert_eq!(backend.seen().len(), 1);

    let text = dash.render_tab(TabId::Sensors).render_text();
    assert!(text.contains("Attic: 19.5°C"), "{text}");
}

#[test]
fn mutation_refetches_the_whole_tab() {
    let backend = MockBackend::start(|seen| match (seen.method.as_str(), seen.path.as_str()) {
        ("POST", "/notes") => reply(200, r#"{"id":9}"#),
        (_, "/projects") | (_, "/tasks") => reply(200, "[]"),
        (_, "/notes") => reply(200, r#"[{"id":9,"title":"Boiler service"}]"#),
        _ => reply(404, "{}"),
    });
    let mut dash = backend.dashboard();

    dash.act(|tabs, cx| {
        tabs.projects
            .create(cx, Resource::Notes, json!({"title": "Boiler service"}))
    });

    let mut paths: Vec<String> = backend.seen().iter().map(|s| s.path.clone()).collect();
    assert_eq!(paths.remove(0), "/notes");
    paths.sort();
    assert_eq!(paths, vec!["/notes", "/projects", "/tasks"]);
    assert_eq!(dash.store().tabs.projects.notes.len(), 1);
    assert_eq!(dash.store().shared.toasts.last().unwrap().message, "Note created");
}

#[test]
fn chat_streams_reply_into_transcript() {
    let backend = MockBackend::start(|seen| match seen.path.as_str() {
        "/chat" => reply(200, "Bonjour, ça va? 🌍"),
        "/models/ollama" => reply(200, r#"{"models":[{"id":"llama3","name":"Llama 3"}]}"#),
        _ => reply(404, "{}"),
    });
    let mut dash = backend.dashboard();

    let mut streamed = String::new();
    let full = dash
        .act(|tabs, cx| {
            tabs.assistant.select_provider(cx, "ollama");
            tabs.assistant
                .chat(cx, "hello", &mut |chunk| streamed.push_str(chunk))
        })
        .unwrap();

    assert_eq!(full, "Bonjour, ça va? 🌍");
    assert_eq!(streamed, full);
    let transcript = &dash.store().tabs.assistant.transcript;
    assert_eq!(transcript[1].text, full);
    assert_eq!(transcript[1].meta, "Provider: ollama • Model: llama3");

    let chat = backend.seen().into_iter().find(|s| s.path == "/chat").unwrap();
    let body: Value = serde_json::from_str(&chat.body).unwrap();
    assert_eq!(body, json!({"provider": "ollama", "model": "llama3", "message": "hello"}));
}

#[test]
fn chat_error_becomes_a_system_line() {
    let backend = MockBackend::start(|_| reply(503, r#"{"detail":"OpenAI key missing"}"#));
    let mut dash = backend.dashboard();

    let result = dash.act(|tabs, cx| {
        tabs.assistant.provider = "openai".to_string();
        tabs.assistant.model = "gpt-4o".to_string();
        tabs.assistant.chat(cx, "hello", &mut |_| {})
    });

    assert!(result.is_err());
    let last = dash.store().tabs.assistant.transcript.last().unwrap();
    assert_eq!(last.author, "System");
    assert_eq!(last.text, "❌ 503 Service Unavailable");
    assert_eq!(last.meta, "OpenAI key missing");
}

#[test]
fn ping_sweep_uses_backend_providers() {
    let backend = MockBackend::start(|seen| match seen.path.as_str() {
        "/assistant/providers" => reply(200, r#"{"providers":["ollama","qwen"]}"#),
        "/ping/ollama" => reply(200, r#"{"provider":"ollama","ok":true,"status":200}"#),
        "/ping/qwen" => reply(503, r#"{"provider":"qwen","ok":false,"detail":"Qwen key missing"}"#),
        _ => reply(404, "{}"),
    });
    let mut dash = backend.dashboard();

    let outcomes = dash.act(|tabs, cx| tabs.home.ping_all(cx));

    let providers: Vec<&str> = outcomes.iter().map(|o| o.provider.as_str()).collect();
    assert_eq!(providers, vec!["ollama", "qwen"]);
    let series = dash.store().shared.series.values();
    assert_eq!(series.len(), 2);
    assert!(series[0] >= 0);
    assert_eq!(series[1], -1);
    assert_eq!(
        outcomes[1].to_string(),
        format!("QWEN → 503 Service Unavailable ({} ms) • Qwen key missing", outcomes[1].elapsed_ms)
    );
}

// ---------------------------------------------------------------------------
// Preview server
// ---------------------------------------------------------------------------

#[test]
fn preview_server_serves_state_and_pages() {
    let backend = MockBackend::start(|seen| match seen.path.as_str() {
        "/sensors" => reply(200, r#"[{"id":"t1","name":"Attic"}]"#),
        _ => reply(404, "{}"),
    });
    let mut dash = backend.dashboard();

    let preview = Arc::new(Server::http("127.0.0.1:0").unwrap());
    let port = preview.server_addr().to_ip().unwrap().port();
    let handle = {
        let preview = Arc::clone(&preview);
        thread::spawn(move || homehub::web::run(&preview, &mut dash))
    };
    let url = format!("http://127.0.0.1:{port}");

    let page = ureq::get(&format!("{url}/tab/sensors"))
        .call()
        .unwrap()
        .into_string()
        .unwrap();
    assert!(page.contains("Attic"));

    let state: Value = ureq::get(&format!("{url}/api/state"))
        .call()
        .unwrap()
        .into_json()
        .unwrap();
    assert_eq!(state["active"], "sensors");
    assert_eq!(state["load"]["sensors"], "loaded");

    match ureq::get(&format!("{url}/nope")).call() {
        Err(ureq::Error::Status(code, response)) => {
            assert_eq!(code, 404);
            let body: Value = response.into_json().unwrap();
            assert_eq!(body["error"], "not found");
        }
        other => panic!("expected 404, got {other:?}"),
    }

    preview.unblock();
    handle.join().unwrap();
}
