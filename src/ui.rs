//! Server-rendered HTML: page shell and small markup helpers.
//!
//! Fragments are swapped in by htmx; live list updates arrive over the
//! session's SSE stream via the htmx `sse` extension.

use std::fmt::Write as _;

/// Example identifiers offered as click-to-fill helpers under the form.
pub const HELPER_EXAMPLES: &[&str] = &["7707083893", "500100732259", "7830002293"];

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape(raw: &str) -> String {
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

/// Generate the HTML shell for a page.
pub fn html_shell(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="ru">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
    <script src="https://unpkg.com/htmx.org@2.0.8/dist/htmx.min.js"></script>
    <script src="https://unpkg.com/htmx-ext-sse@2.2.2/sse.js"></script>
    <link rel="stylesheet" href="/static/app.css">
</head>
<body>
    <main id="app">
        {content}
    </main>
</body>
</html>"#,
        title = escape(title),
    )
}

/// Main page body for one session.
///
/// With a `token`, every htmx request from the section carries it as a bearer
/// header, and the stream URL carries it as `?token=` since `EventSource`
/// cannot set headers.
pub fn index_content(session_id: &str, form_html: &str, list_html: &str, token: Option<&str>) -> String {
    let id = escape(session_id);
    let (stream_url, auth_headers) = match token {
        Some(t) => {
            let encoded: String = url::form_urlencoded::byte_serialize(t.as_bytes()).collect();
            let headers = serde_json::json!({ "Authorization": format!("Bearer {t}") });
            (
                format!("/sessions/{id}/stream?token={encoded}"),
                format!(r#" hx-headers="{}""#, escape(&headers.to_string())),
            )
        }
        None => (format!("/sessions/{id}/stream"), String::new()),
    };

    let mut helpers = String::new();
    for example in HELPER_EXAMPLES {
        let example = escape(example);
        let _ = write!(
            helpers,
            r##"<a href="#" class="inn-input-helper" hx-post="/sessions/{id}/helper" hx-vals='{{"value":"{example}"}}' hx-target="#inn-form" hx-swap="outerHTML">{example}</a> "##
        );
    }

    format!(
        r#"<section hx-ext="sse" sse-connect="{stream_url}"{auth_headers}>
    <h1>Проверка ИНН</h1>
    <div id="inn-form-slot" sse-swap="form">{form_html}</div>
    <p class="inn-helpers">{helpers}</p>
    <ul id="inn-list" sse-swap="list">{list_html}</ul>
</section>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
        assert_eq!(escape("7707083893"), "7707083893");
    }

    #[test]
    fn test_index_content_wires_stream_and_helpers() {
        let html = index_content("abc", "<form></form>", "", Some("t0k"));
        assert!(html.contains(r#"sse-connect="/sessions/abc/stream?token=t0k""#));
        assert!(html.contains(r#"hx-headers="{&quot;Authorization&quot;:&quot;Bearer t0k&quot;}""#));
        assert!(html.contains(r#"id="inn-list""#));
        for example in HELPER_EXAMPLES {
            assert!(html.contains(example));
        }
    }

    #[test]
    fn test_index_content_without_token() {
        let html = index_content("abc", "", "", None);
        assert!(html.contains(r#"sse-connect="/sessions/abc/stream""#));
        assert!(!html.contains("hx-headers"));
    }

    #[test]
    fn test_stream_token_is_percent_encoded() {
        let html = index_content("abc", "", "", Some("a+b="));
        assert!(html.contains("stream?token=a%2Bb%3D"));
    }

    #[test]
    fn test_html_shell_embeds_content() {
        let page = html_shell("ИНН", "<p>body</p>");
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<p>body</p>"));
    }
}
