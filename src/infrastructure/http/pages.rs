//! 浏览器直接访问时的错误页面

use axum::http::StatusCode;

/// HTML 转义，用于把错误信息放进页面
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn render(title: &str, heading: &str, body_html: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <style>
    body {{ font-family: Arial, sans-serif; text-align: center; padding: 50px; }}
    h1 {{ color: #e74c3c; }}
    code {{ background: #f4f4f4; padding: 2px 6px; }}
  </style>
</head>
<body>
  <h1>{heading}</h1>
  {body_html}
</body>
</html>"#
    )
}

pub fn not_found_page() -> (StatusCode, String) {
    (
        StatusCode::NOT_FOUND,
        render(
            "Preview unavailable",
            "Preview not found",
            "<p>This preview has expired or does not exist.</p>",
        ),
    )
}

pub fn expired_page() -> (StatusCode, String) {
    (
        StatusCode::GONE,
        render(
            "Preview expired",
            "Preview expired",
            "<p>This preview link is no longer valid. Request a new preview to continue.</p>",
        ),
    )
}

pub fn missing_file_page(requested_file: &str, resolved_path: &str) -> (StatusCode, String) {
    let body = format!(
        "<p>The requested file could not be found.</p>\n  <p>Requested: <code>{}</code></p>\n  <p>Resolved: <code>{}</code></p>",
        escape_html(requested_file),
        escape_html(resolved_path)
    );
    (
        StatusCode::NOT_FOUND,
        render("File not found", "File not found", &body),
    )
}

pub fn error_page(status: StatusCode, message: &str) -> (StatusCode, String) {
    let body = format!("<p>{}</p>", escape_html(message));
    (status, render("Preview error", "Preview failed", &body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#39;y&#39;&lt;/script&gt;"
        );
    }

    #[test]
    fn test_missing_file_page_escapes_paths() {
        let (status, html) = missing_file_page("<x>.css", "site/<x>.css");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(html.contains("&lt;x&gt;.css"));
        assert!(!html.contains("<x>"));
    }
}
