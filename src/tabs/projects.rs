//! Projects, tasks and notes.

use std::thread;

use anyhow::{Result, anyhow};
use serde_json::Value;

use super::{TabContext, TabController, finish_mutation};
use crate::api::{Api, Resource, record_id};
use crate::store::{ProjectsSlice, Shared};
use crate::view::{Element, Node, display_value, el, empty_state, format_date, record_title};

impl TabController for ProjectsSlice {
    /// Projects, tasks and notes are fetched concurrently and joined. Nothing
    /// is replaced unless all three succeed.
    fn load(&mut self, cx: &mut TabContext<'_>) -> Result<()> {
        let (projects, tasks, notes) = fetch_all(cx.api);
        let (projects, tasks, notes) = (projects?, tasks?, notes?);
        self.projects = projects;
        self.tasks = tasks;
        self.notes = notes;
        Ok(())
    }

    fn render(&self, _shared: &Shared) -> Node {
        el("section")
            .class("projects")
            .child(el("h2").text("Projects"))
            .child(list(&self.projects, "No projects yet.", project_item))
            .child(el("h3").text("Tasks"))
            .child(list(&self.tasks, "No tasks yet.", task_item))
            .child(el("h3").text("Notes"))
            .child(list(&self.notes, "No notes yet.", note_item))
            .into()
    }
}

type Fetched = Result<Vec<Value>>;

fn fetch_all(api: &Api) -> (Fetched, Fetched, Fetched) {
    thread::scope(|s| {
        let projects = s.spawn(|| api.list(Resource::Projects));
        let tasks = s.spawn(|| api.list(Resource::Tasks));
        let notes = api.list(Resource::Notes);
        (joined(projects), joined(tasks), notes)
    })
}

fn joined(handle: thread::ScopedJoinHandle<'_, Fetched>) -> Fetched {
    handle
        .join()
        .unwrap_or_else(|_| Err(anyhow!("fetch thread panicked")))
}

impl ProjectsSlice {
    pub fn create(&mut self, cx: &mut TabContext<'_>, resource: Resource, record: Value) {
        let result = cx.api.create(resource, record);
        self.finish(cx, resource, "create", result);
    }

    pub fn update(&mut self, cx: &mut TabContext<'_>, resource: Resource, id: &str, record: Value) {
        let result = cx.api.update(resource, id, record);
        self.finish(cx, resource, "update", result);
    }

    pub fn delete(&mut self, cx: &mut TabContext<'_>, resource: Resource, id: &str) {
        let result = cx.api.delete(resource, id);
        self.finish(cx, resource, "delete", result);
    }

    /// Mark a task done or open again.
    pub fn toggle_task(&mut self, cx: &mut TabContext<'_>, id: &str) {
        let done = self
            .tasks
            .iter()
            .find(|t| record_id(t).as_deref() == Some(id))
            .map(is_done)
            .unwrap_or(false);
        self.update(cx, Resource::Tasks, id, serde_json::json!({ "done": !done }));
    }

    fn finish(&mut self, cx: &mut TabContext<'_>, resource: Resource, verb: &str, result: Result<Value>) {
        finish_mutation(self, cx, resource.noun(), verb, result);
    }
}

fn is_done(task: &Value) -> bool {
    match task.get("done").or_else(|| task.get("completed")) {
        Some(Value::Bool(b)) => *b,
        _ => task.get("status").and_then(Value::as_str) == Some("done"),
    }
}

fn list(records: &[Value], empty: &str, item: fn(&Value) -> Element) -> Element {
    if records.is_empty() {
        empty_state(empty)
    } else {
        el("ul").children(records.iter().map(item))
    }
}

fn project_item(project: &Value) -> Element {
    let mut li = el("li").child(el("strong").text(record_title(project)));
    if let Some(status) = project.get("status").filter(|v| !v.is_null()) {
        li = li.text(format!(" ({})", display_value(status)));
    }
    li
}

fn task_item(task: &Value) -> Element {
    let mark = if is_done(task) { "[x] " } else { "[ ] " };
    let mut li = el("li").class(if is_done(task) { "done" } else { "open" });
    li = li.text(format!("{mark}{}", record_title(task)));
    if let Some(due) = task.get("due").and_then(Value::as_str) {
        li = li.child(el("span").class("meta").text(format!(" due {}", format_date(due))));
    }
    li
}

fn note_item(note: &Value) -> Element {
    let body = note
        .get("body")
        .or_else(|| note.get("content"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    let preview: String = body.chars().take(80).collect();
    el("li")
        .child(el("strong").text(record_title(note)))
        .text(if preview.is_empty() { String::new() } else { format!(": {preview}") })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HubConfig;
    use crate::http::Method;
    use crate::http::transport::{ScriptedReply, ScriptedTransport};
    use crate::logging::Logger;
    use crate::view::ToastLevel;
    use serde_json::json;
    use std::sync::Arc;

    fn script_lists(transport: &ScriptedTransport) {
        transport
            .push_for("/projects", ScriptedReply::ok(r#"[{"id":1,"title":"Garden","status":"active"}]"#))
            .push_for("/tasks", ScriptedReply::ok(r#"[{"id":2,"title":"Buy seeds","done":false,"due":"2026-10-20"}]"#))
            .push_for("/notes", ScriptedReply::ok(r#"{"notes":[{"id":3,"title":"Ideas","body":"tomatoes"}]}"#));
    }

    #[test]
    fn load_fans_out_to_all_three_lists() {
        let transport = Arc::new(ScriptedTransport::new());
        script_lists(&transport);
        let api = Api::with_transport("http://hub", Box::new(transport.clone()));
        let (config, logger, mut shared) = (HubConfig::default(), Logger::disabled(), Shared::default());
        let mut tab = ProjectsSlice::default();

        let mut cx = TabContext {
            api: &api,
            config: &config,
            logger: &logger,
            shared: &mut shared,
        };
        tab.load(&mut cx).unwrap();

        assert_eq!((tab.projects.len(), tab.tasks.len(), tab.notes.len()), (1, 1, 1));
        let mut urls: Vec<String> = transport.requests().iter().map(|r| r.url.clone()).collect();
        urls.sort();
        assert_eq!(urls, vec!["http://hub/notes", "http://hub/projects", "http://hub/tasks"]);

        let text = tab.render(&shared).render_text();
        assert!(text.contains("Garden (active)"), "{text}");
        assert!(text.contains("[ ] Buy seeds due Oct 20, 2026"), "{text}");
        assert!(text.contains("Ideas: tomatoes"), "{text}");
    }

    #[test]
    fn one_failed_list_leaves_every_list_untouched() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .push_for("/projects", ScriptedReply::ok("[]"))
            .push_for("/tasks", ScriptedReply::status(500, "Internal Server Error", ""))
            .push_for("/notes", ScriptedReply::ok("[]"));
        let api = Api::with_transport("http://hub", Box::new(transport.clone()));
        let (config, logger, mut shared) = (HubConfig::default(), Logger::disabled(), Shared::default());
        let mut tab = ProjectsSlice {
            projects: vec![json!({"id": 1})],
            tasks: vec![json!({"id": 2})],
            notes: vec![json!({"id": 3})],
        };

        let mut cx = TabContext {
            api: &api,
            config: &config,
            logger: &logger,
            shared: &mut shared,
        };
        assert!(tab.load(&mut cx).is_err());

        assert_eq!((tab.projects.len(), tab.tasks.len(), tab.notes.len()), (1, 1, 1));
    }

    #[test]
    fn toggling_a_task_updates_then_refetches() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_for("/tasks/2", ScriptedReply::ok(r#"{"id":2,"done":true}"#));
        script_lists(&transport);
        let api = Api::with_transport("http://hub", Box::new(transport.clone()));
        let (config, logger, mut shared) = (HubConfig::default(), Logger::disabled(), Shared::default());
        let mut tab = ProjectsSlice {
            tasks: vec![json!({"id": 2, "title": "Buy seeds", "done": false})],
            ..ProjectsSlice::default()
        };

        let mut cx = TabContext {
            api: &api,
            config: &config,
            logger: &logger,
            shared: &mut shared,
        };
        tab.toggle_task(&mut cx, "2");

        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::Put);
        assert_eq!(requests[0].body_text(), Some(r#"{"done":true}"#));
        assert_eq!(requests.len(), 4);
        assert_eq!(shared.toasts.last().unwrap().message, "Task updated");
    }

    #[test]
    fn failed_delete_leaves_lists_untouched() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push(ScriptedReply::status(404, "Not Found", r#"{"detail":"not found"}"#));
        let api = Api::with_transport("http://hub", Box::new(transport.clone()));
        let (config, logger, mut shared) = (HubConfig::default(), Logger::disabled(), Shared::default());
        let mut tab = ProjectsSlice {
            notes: vec![json!({"id": 3})],
            ..ProjectsSlice::default()
        };

        let mut cx = TabContext {
            api: &api,
            config: &config,
            logger: &logger,
            shared: &mut shared,
        };
        tab.delete(&mut cx, Resource::Notes, "3");

        assert_eq!(tab.notes.len(), 1);
        assert_eq!(transport.requests().len(), 1);
        let toast = shared.toasts.last().unwrap();
        assert_eq!(toast.level, ToastLevel::Danger);
        assert_eq!(toast.message, "Failed to delete note: not found");
    }
}
