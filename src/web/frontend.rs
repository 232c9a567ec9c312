//! Page shell for the preview server.
//!
//! The stylesheet is compiled into the binary; the body is the rendered
//! dashboard view-model. No scripts, no external assets.

const STYLE: &str = r#"
:root {
  --bg: #0d1117;
  --surface: #161b22;
  --border: #30363d;
  --text: #e6edf3;
  --text-muted: #8b949e;
  --accent: #4b9fff;
  --green: #3fb950;
  --yellow: #d29922;
  --red: #f85149;
  --radius: 8px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
}

* { margin: 0; padding: 0; box-sizing: border-box; }
body {
  background: var(--bg);
  color: var(--text);
  font-family: var(--font);
  font-size: 14px;
  line-height: 1.5;
}

main.hub { max-width: 1100px; margin: 0 auto; padding: 24px; }

nav.tabs {
  display: flex;
  gap: 4px;
  margin-bottom: 20px;
  border-bottom: 1px solid var(--border);
}
.tab-link {
  color: var(--text-muted);
  text-decoration: none;
  padding: 8px 14px;
  border-bottom: 2px solid transparent;
}
.tab-link.active { color: var(--text); border-bottom-color: var(--accent); }

.tab-panel section > * + * { margin-top: 12px; }
h2 { font-size: 20px; font-weight: 600; }
h3 { font-size: 15px; font-weight: 600; color: var(--text-muted); }

table {
  width: 100%;
  border-collapse: collapse;
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
}
th, td { text-align: left; padding: 6px 10px; border-bottom: 1px solid var(--border); }
th { color: var(--text-muted); font-weight: 500; }

ul, ol { padding-left: 20px; }
.empty, .meta { color: var(--text-muted); }
.row { display: flex; flex-wrap: wrap; gap: 8px; }
form.inline { display: inline; }

button {
  background: var(--surface);
  color: var(--text);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 6px 12px;
  cursor: pointer;
}
button:hover { border-color: var(--accent); }
input { background: var(--bg); color: var(--text); border: 1px solid var(--border); padding: 6px; }

.pill { padding: 1px 8px; border-radius: 999px; font-size: 12px; background: var(--border); }
.pill.ok { background: var(--green); color: #000; }
.pill.err { background: var(--red); color: #000; }

.sparkline { width: 100%; height: 60px; background: var(--surface); border-radius: var(--radius); }

.toasts { position: fixed; right: 16px; bottom: 16px; display: flex; flex-direction: column; gap: 6px; }
.toast { padding: 8px 12px; border-radius: var(--radius); background: var(--surface); border-left: 4px solid var(--accent); }
.toast-success { border-left-color: var(--green); }
.toast-warning { border-left-color: var(--yellow); }
.toast-danger { border-left-color: var(--red); }
"#;

/// Wrap rendered dashboard markup in a complete document.
pub fn page(title: &str, body_html: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body_html}\n</body>\n</html>\n",
        title = crate::view::escape_html(title),
    )
}
