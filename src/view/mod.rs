//! View-model layer: data in, declarative node tree out.
//!
//! Tab controllers build a [`Node`] tree from store data. The tree renders
//! as escaped HTML for the preview server ([`Node::render_html`]) or as a
//! plain terminal outline for the CLI ([`Node::render_text`]). Nothing here
//! performs I/O, so rendering is unit-testable.

pub mod format;
pub mod toast;

use serde_json::Value;

pub use format::{format_date, format_datetime, format_money, format_time, format_uptime};
pub use toast::{Toast, ToastLevel, Toasts};

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// One node of a view tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    /// Pre-rendered markup with a terminal fallback (used for the sparkline).
    Raw { html: String, text: String },
}

/// An element: tag, classes, attributes and children.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub classes: Vec<String>,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

/// Start an element.
pub fn el(tag: &str) -> Element {
    Element {
        tag: tag.to_string(),
        classes: Vec::new(),
        attrs: Vec::new(),
        children: Vec::new(),
    }
}

/// A text node.
pub fn text(value: impl Into<String>) -> Node {
    Node::Text(value.into())
}

impl Element {
    pub fn class(mut self, class: &str) -> Self {
        self.classes
            .extend(class.split_whitespace().map(str::to_string));
        self
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    /// Set an attribute, replacing an earlier value of the same name.
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.retain(|(k, _)| k != name);
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    /// Add the `hidden` attribute when `hidden` is true.
    pub fn hidden(self, hidden: bool) -> Self {
        if hidden { self.attr("hidden", "") } else { self }
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<I, N>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Append a text child.
    pub fn text(self, value: impl Into<String>) -> Self {
        self.child(Node::Text(value.into()))
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn is_hidden(&self) -> bool {
        self.get_attr("hidden").is_some()
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::Text(value.to_string())
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::Text(value)
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

impl Node {
    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(t) => out.push_str(t),
            Node::Raw { text, .. } => out.push_str(text),
            Node::Element(e) => e.children.iter().for_each(|c| c.collect_text(out)),
        }
    }

    /// First element (depth-first) with the given `id` attribute.
    pub fn find_id(&self, id: &str) -> Option<&Element> {
        self.find(&|e| e.get_attr("id") == Some(id))
    }

    /// All elements carrying `class`, in document order.
    pub fn find_class(&self, class: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        self.walk(&mut |e| {
            if e.has_class(class) {
                found.push(e);
            }
        });
        found
    }

    fn find(&self, pred: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        let Node::Element(e) = self else {
            return None;
        };
        if pred(e) {
            return Some(e);
        }
        e.children.iter().find_map(|c| c.find(pred))
    }

    fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Element)) {
        if let Node::Element(e) = self {
            visit(e);
            for child in &e.children {
                child.walk(visit);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// HTML
// ---------------------------------------------------------------------------

const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "meta", "link"];

impl Node {
    /// Serialize as HTML. Text and attribute values are escaped.
    pub fn render_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Text(t) => out.push_str(&escape_html(t)),
            Node::Raw { html, .. } => out.push_str(html),
            Node::Element(e) => {
                out.push('<');
                out.push_str(&e.tag);
                if !e.classes.is_empty() {
                    out.push_str(&format!(" class=\"{}\"", escape_html(&e.classes.join(" "))));
                }
                for (name, value) in &e.attrs {
                    if value.is_empty() {
                        out.push_str(&format!(" {name}"));
                    } else {
                        out.push_str(&format!(" {name}=\"{}\"", escape_html(value)));
                    }
                }
                out.push('>');
                if VOID_TAGS.contains(&e.tag.as_str()) {
                    return;
                }
                for child in &e.children {
                    child.write_html(out);
                }
                out.push_str(&format!("</{}>", e.tag));
            }
        }
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Terminal text
// ---------------------------------------------------------------------------

const BLOCK_TAGS: &[&str] = &[
    "div", "section", "article", "header", "footer", "main", "nav", "p", "ul", "ol", "table",
    "thead", "tbody", "form", "details", "summary", "pre", "label",
];

const SKIPPED_TAGS: &[&str] = &["input", "select", "textarea", "script", "style", "canvas"];

#[derive(Default)]
struct TextWriter {
    lines: Vec<String>,
    current: String,
}

impl TextWriter {
    fn push(&mut self, s: &str) {
        self.current.push_str(s);
    }

    fn break_line(&mut self) {
        let line = self.current.trim_end();
        if !line.trim().is_empty() {
            self.lines.push(line.to_string());
        }
        self.current.clear();
    }
}

impl Node {
    /// Render a readable outline: headings, bullets, `a | b` table rows.
    /// Hidden elements and form controls are left out.
    pub fn render_text(&self) -> String {
        let mut w = TextWriter::default();
        self.write_text(&mut w);
        w.break_line();
        w.lines.join("\n")
    }

    fn write_text(&self, w: &mut TextWriter) {
        let e = match self {
            Node::Text(t) => return w.push(t),
            Node::Raw { text, .. } => {
                w.break_line();
                w.push(text);
                return w.break_line();
            }
            Node::Element(e) => e,
        };
        if e.is_hidden() || SKIPPED_TAGS.contains(&e.tag.as_str()) {
            return;
        }

        match e.tag.as_str() {
            tag @ ("h1" | "h2" | "h3" | "h4") => {
                let level = tag[1..].parse::<usize>().unwrap_or(1);
                w.break_line();
                w.push(&format!("{} ", "#".repeat(level)));
                e.children.iter().for_each(|c| c.write_text(w));
                w.break_line();
            }
            "li" => {
                w.break_line();
                w.push("  • ");
                e.children.iter().for_each(|c| c.write_text(w));
                w.break_line();
            }
            "tr" => {
                w.break_line();
                let cells: Vec<String> = e
                    .children
                    .iter()
                    .map(|c| c.text_content().trim().to_string())
                    .collect();
                w.push(&cells.join(" | "));
                w.break_line();
            }
            "br" | "hr" => w.break_line(),
            "button" => w.push(&format!("[{}]", self.text_content().trim())),
            tag if BLOCK_TAGS.contains(&tag) => {
                w.break_line();
                e.children.iter().for_each(|c| c.write_text(w));
                w.break_line();
            }
            _ => e.children.iter().for_each(|c| c.write_text(w)),
        }
    }
}

// ---------------------------------------------------------------------------
// Record helpers
// ---------------------------------------------------------------------------

/// Human text for an opaque JSON field.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "—".to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(true) => "yes".to_string(),
        Value::Bool(false) => "no".to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Best display title of a backend record.
pub fn record_title(record: &Value) -> String {
    ["title", "name", "label", "filename", "id"]
        .iter()
        .find_map(|k| match record.get(*k) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_else(|| "(untitled)".to_string())
}

/// `<table>` with a header row and one row per record.
pub fn table(headers: &[&str], rows: Vec<Vec<String>>) -> Element {
    let head = el("tr").children(headers.iter().map(|h| el("th").text(*h)));
    el("table").child(el("thead").child(head)).child(
        el("tbody").children(
            rows.into_iter()
                .map(|cells| el("tr").children(cells.into_iter().map(|c| el("td").text(c)))),
        ),
    )
}

/// Muted placeholder for an empty list.
pub fn empty_state(message: &str) -> Element {
    el("p").class("empty").text(message)
}
