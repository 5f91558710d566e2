//! HTML output for [`ChatView`].
//!
//! The page works without JavaScript. The input bar is a plain form, so Enter
//! submits it exactly like the send button. While a request is outstanding the
//! page refreshes itself once a second until the answer has arrived.
//!
//! With JavaScript the refresh is replaced by a small inline script. It waits
//! on the session's view stream and reloads once, carrying over anything
//! typed in the meantime.

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

use super::render::{ChatView, THINKING};

const TITLE: &str = "Jarvis Assistant";
const SUBTITLE: &str = "Self-hosted LLM + Pinecone RAG";
const INPUT_PLACEHOLDER: &str = "Type your message and press Enter";

const STYLES: &str = r"
body { margin: 0; font-family: system-ui, sans-serif; background: #f8fafc; color: #0f172a; }
.wrap { max-width: 56rem; margin: 0 auto; padding: 1rem; }
header, .input-bar { background: #fff; border-bottom: 1px solid #e2e8f0; }
.input-bar { border-top: 1px solid #e2e8f0; border-bottom: none; }
h1 { font-size: 1.5rem; font-weight: 600; margin: 0; }
.subtitle { font-size: .875rem; color: #64748b; margin: .25rem 0 0; }
.panel { background: #fff; border: 1px solid #e2e8f0; border-radius: .5rem; padding: 1rem; margin-bottom: 1rem; }
.conversation { height: 60vh; overflow-y: auto; }
.row { margin: .75rem 0; }
.row-right { text-align: right; }
.row-left { text-align: left; }
.bubble { display: inline-block; padding: .5rem .75rem; border-radius: .5rem; white-space: pre-wrap; }
.bubble-user { background: #2563eb; color: #fff; }
.bubble-assistant { background: #f1f5f9; }
.muted { color: #64748b; }
.thinking { color: #94a3b8; }
.sources li { font-size: .875rem; color: #475569; }
.score { color: #94a3b8; }
form { display: flex; gap: .5rem; }
input[type=text] { flex: 1; border: 1px solid #cbd5e1; border-radius: .5rem; padding: .5rem .75rem; }
button { background: #2563eb; color: #fff; border: none; border-radius: .5rem; padding: .5rem 1rem; }
button:disabled { opacity: .5; }
";

/// Reloads the page when the outstanding request finishes and restores the
/// draft typed while waiting.
const SCRIPT: &str = r#"
(function () {
    var form = document.getElementById("chat-form");
    var field = form.elements.message;
    var key = "draft:" + form.getAttribute("action");
    var draft = sessionStorage.getItem(key);
    sessionStorage.removeItem(key);
    if (draft !== null && field.value === "") { field.value = draft; }
    if (!document.querySelector(".thinking")) { return; }

    function reload() {
        if (field.value !== "") { sessionStorage.setItem(key, field.value); }
        window.location.reload();
    }
    if (!window.EventSource) { setTimeout(reload, 1000); return; }

    var events = new EventSource(form.dataset.stream);
    events.addEventListener("view", function (event) {
        if (JSON.parse(event.data).thinking) { return; }
        events.close();
        reload();
    });
})();
"#;

/// Render the full chat page for a session.
#[must_use]
pub fn page(session_id: &str, view: &ChatView) -> String {
    let refresh = if view.thinking {
        r#"<noscript><meta http-equiv="refresh" content="1"></noscript>"#
    } else {
        ""
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    {refresh}
    <title>{TITLE}</title>
    <style>{STYLES}</style>
</head>
<body>
    <header>
        <div class="wrap">
            <h1>{TITLE}</h1>
            <p class="subtitle">{SUBTITLE}</p>
        </div>
    </header>
    <main class="wrap">
        {conversation}
        {sources}
    </main>
    {input_bar}
    <script>{SCRIPT}</script>
</body>
</html>"#,
        conversation = conversation(view),
        sources = sources(view),
        input_bar = input_bar(session_id, view),
    )
}

/// The conversation panel: placeholder or bubbles, then the thinking line.
#[must_use]
pub fn conversation(view: &ChatView) -> String {
    let mut out = String::from(r#"<div id="conversation" class="panel conversation">"#);

    if let Some(placeholder) = view.placeholder {
        out.push_str(&format!(r#"<div class="muted">{}</div>"#, text(placeholder)));
    }
    for bubble in &view.bubbles {
        out.push_str(&format!(
            r#"<div class="{}"><div class="{}">{}</div></div>"#,
            bubble.alignment.classes(),
            bubble.style.classes(),
            text(&bubble.text),
        ));
    }
    if view.thinking {
        out.push_str(&format!(r#"<div class="thinking">{THINKING}</div>"#));
    }

    out.push_str("</div>");
    out
}

/// The source list, or nothing when there are no sources.
#[must_use]
pub fn sources(view: &ChatView) -> String {
    if view.sources.is_empty() {
        return String::new();
    }

    let items: String = view
        .sources
        .iter()
        .map(|line| {
            format!(
                r#"<li>{} <span class="score">(score {})</span></li>"#,
                text(&line.source),
                text(&line.score),
            )
        })
        .collect();

    format!(
        r#"<div id="sources" class="panel sources"><div><strong>Sources</strong></div><ul>{items}</ul></div>"#
    )
}

/// The input form. Enter inside the text field submits it through the button,
/// so both post `via=button`.
#[must_use]
pub fn input_bar(session_id: &str, view: &ChatView) -> String {
    let disabled = if view.input.send_disabled {
        " disabled"
    } else {
        ""
    };

    format!(
        r#"<div class="input-bar"><div class="wrap">
        <form id="chat-form" method="post" action="/sessions/{id}/send" data-stream="/api/sessions/{id}/stream">
            <input type="text" name="message" value="{value}" placeholder="{INPUT_PLACEHOLDER}" autocomplete="off" autofocus>
            <button type="submit" name="via" value="button"{disabled}>Send</button>
        </form>
    </div></div>"#,
        id = attr(session_id),
        value = attr(&view.input.value),
    )
}
