//! `GET /`: human-readable status page listing active topics.

use std::collections::BTreeMap;
use std::fmt::Write;

use axum::extract::State;
use axum::response::Html;

use super::AppState;

const API_REFERENCE: &str = r#"    <hr>
    <h3>API Endpoints:</h3>
    <ul>
      <li><strong>POST /publish</strong> - Publish a message
        <br>Body: {"topic": "...", "payload": "...", "publisher": "..."}</li>
      <li><strong>GET /subscribe?topic=...</strong> - Get messages from a topic
        <br>Optional: &amp;since=timestamp (get only new messages)</li>
      <li><strong>DELETE /clear?topic=...</strong> - Clear messages from a topic</li>
    </ul>
"#;

/// Escapes the characters that matter inside HTML text content.
fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Renders the status page for a topic -> message count snapshot.
#[must_use]
pub fn render_status_page(stats: &BTreeMap<String, usize>) -> String {
    let mut html = String::from(
        "<html>\n<head><title>Tidings Broker</title></head>\n<body>\n  \
         <h1>Tidings HTTP Broker</h1>\n  <h2>Active Topics</h2>\n",
    );

    if stats.is_empty() {
        html.push_str("  <p>No messages yet</p>\n");
    } else {
        html.push_str("  <ul>\n");
        for (topic, count) in stats {
            let _ = writeln!(
                html,
                "    <li><strong>{}</strong>: {count} messages</li>",
                escape_html(topic)
            );
        }
        html.push_str("  </ul>\n");
    }

    html.push_str(API_REFERENCE);
    html.push_str("</body>\n</html>\n");
    html
}

/// Handles `GET /`.
pub async fn status_handler(State(state): State<AppState>) -> Html<String> {
    Html(render_status_page(&state.store.stats()))
}
