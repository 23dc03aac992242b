//! HTML 改写
//!
//! 对会话内返回的 HTML 文档做两处插入，其余字节保持原样：
//! 1. `<head>` 的第一个子节点插入 `<base href>`，让所有相对/根相对路径回到当前会话
//! 2. `</body>` 之前插入离开页面时通知过期的 beacon 脚本
//!
//! 标签查找基于字符串，大小写不敏感，允许标签带属性，不会把 `<header>` 当成 `<head>`。

/// beacon 脚本标记属性，便于识别已注入的脚本
pub const BEACON_MARKER: &str = "data-preview-expire";

/// 生成 base 标签
pub fn base_tag(base_href: &str) -> String {
    format!(r#"<base href="{}">"#, base_href)
}

/// 生成离开页面时调用过期接口的脚本
///
/// 每个页面生命周期最多触发一次，请求失败直接忽略。
pub fn expire_beacon_script(expire_url: &str) -> String {
    format!(
        r#"<script {marker}>
(function () {{
  var expireUrl = '{url}';
  var fired = false;
  function expirePreview() {{
    if (fired) return;
    fired = true;
    try {{
      if (navigator.sendBeacon && navigator.sendBeacon(expireUrl)) return;
    }} catch (e) {{}}
    fetch(expireUrl, {{
      method: 'POST',
      keepalive: true,
      headers: {{ 'Content-Type': 'application/json' }}
    }}).catch(function () {{}});
  }}
  window.addEventListener('beforeunload', expirePreview);
  document.addEventListener('visibilitychange', function () {{
    if (document.visibilityState === 'hidden') expirePreview();
  }});
  window.addEventListener('pagehide', expirePreview);
  window.addEventListener('unload', expirePreview);
}})();
</script>"#,
        marker = BEACON_MARKER,
        url = expire_url
    )
}

/// 向 HTML 文档注入 base 标签与过期脚本
///
/// 按字节处理，注入内容都是 ASCII，文档原有编码（如 EUC-KR）不受影响。
/// 文档自带的 `<base>` 会被移除，保证输出中只有一个 base。
pub fn inject_preview_markup(html: &[u8], base_href: &str, expire_url: &str) -> Vec<u8> {
    let stripped = strip_base_tags(html);
    let mut out = insert_base_tag(&stripped, base_tag(base_href).as_bytes());
    let script = expire_beacon_script(expire_url);

    let lower = out.to_ascii_lowercase();
    match rfind_bytes(&lower, b"</body") {
        Some(pos) => {
            out.splice(pos..pos, script.bytes());
        }
        None => out.extend_from_slice(script.as_bytes()),
    }
    out
}

fn insert_base_tag(html: &[u8], base: &[u8]) -> Vec<u8> {
    // to_ascii_lowercase 逐字节映射，下标可直接用于原文
    let lower = html.to_ascii_lowercase();
    let mut out = Vec::with_capacity(html.len() + base.len() + 16);

    if let Some((_, end)) = find_open_tag(&lower, b"head", 0) {
        out.extend_from_slice(&html[..end]);
        out.extend_from_slice(base);
        out.extend_from_slice(&html[end..]);
    } else {
        let at = find_open_tag(&lower, b"html", 0)
            .map(|(_, end)| end)
            .or_else(|| doctype_end(&lower))
            .unwrap_or(0);
        out.extend_from_slice(&html[..at]);
        out.extend_from_slice(b"<head>");
        out.extend_from_slice(base);
        out.extend_from_slice(b"</head>");
        out.extend_from_slice(&html[at..]);
    }
    out
}

/// 去掉所有 `<base ...>` 开始标签
fn strip_base_tags(html: &[u8]) -> Vec<u8> {
    let lower = html.to_ascii_lowercase();
    let mut out = Vec::with_capacity(html.len());
    let mut from = 0;

    while let Some((start, end)) = find_open_tag(&lower, b"base", from) {
        out.extend_from_slice(&html[from..start]);
        from = end;
    }
    out.extend_from_slice(&html[from..]);
    out
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn rfind_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

/// 从 `from` 起查找开始标签 `<name ...>`，返回 (`<` 的下标, `>` 之后的下标)
fn find_open_tag(lower: &[u8], name: &[u8], from: usize) -> Option<(usize, usize)> {
    let mut needle = Vec::with_capacity(name.len() + 1);
    needle.push(b'<');
    needle.extend_from_slice(name);
    let mut from = from;

    while let Some(rel) = lower.get(from..).and_then(|rest| find_bytes(rest, &needle)) {
        let start = from + rel;
        let after = start + needle.len();
        match lower.get(after) {
            Some(b'>') => return Some((start, after + 1)),
            Some(b) if b.is_ascii_whitespace() || *b == b'/' => {
                return find_bytes(&lower[after..], b">").map(|i| (start, after + i + 1));
            }
            _ => from = after,
        }
    }
    None
}

/// 文档以 `<!DOCTYPE ...>` 开头时返回其结束位置
fn doctype_end(lower: &[u8]) -> Option<usize> {
    let start = lower.iter().position(|b| !b.is_ascii_whitespace())?;
    if lower[start..].starts_with(b"<!doctype") {
        find_bytes(&lower[start..], b">").map(|i| start + i + 1)
    } else {
        None
    }
}
