//! 内容类型判定
//!
//! 以文件扩展名为准，存储后端上报的类型只作为未知扩展名的兜底。

const HTML: &str = "text/html; charset=utf-8";
const OCTET_STREAM: &str = "application/octet-stream";

/// 取路径最后一段的扩展名（小写）
pub fn extension_of(path: &str) -> Option<String> {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext.to_ascii_lowercase()),
        _ => None,
    }
}

/// 扩展名为 html/htm 或没有扩展名时视为 HTML 文档
pub fn is_html_path(path: &str) -> bool {
    match extension_of(path) {
        None => true,
        Some(ext) => ext == "html" || ext == "htm",
    }
}

fn known_content_type(ext: &str) -> Option<&'static str> {
    let ct = match ext {
        "html" | "htm" => HTML,
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "application/javascript; charset=utf-8",
        "json" => "application/json; charset=utf-8",
        "txt" => "text/plain; charset=utf-8",
        "xml" => "application/xml; charset=utf-8",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "eot" => "application/vnd.ms-fontobject",
        _ => return None,
    };
    Some(ct)
}

/// 根据请求路径决定响应的 Content-Type
pub fn content_type_for(path: &str, upstream: Option<&str>) -> String {
    match extension_of(path) {
        None => HTML.to_string(),
        Some(ext) => known_content_type(&ext)
            .map(str::to_string)
            .or_else(|| upstream.filter(|ct| !ct.is_empty()).map(str::to_string))
            .unwrap_or_else(|| OCTET_STREAM.to_string()),
    }
}

/// 改写后 HTML 的 Content-Type
///
/// 字符集取存储上报的 charset 参数；没有时只在正文是合法 UTF-8 时声明 utf-8，
/// 否则不声明，交给文档内的 `<meta charset>`。
pub fn html_content_type(upstream: Option<&str>, body: &[u8]) -> String {
    let upstream_charset = upstream.and_then(|ct| {
        ct.split(';')
            .skip(1)
            .filter_map(|param| param.split_once('='))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("charset"))
            .map(|(_, value)| value.trim().trim_matches('"').to_string())
            .filter(|value| !value.is_empty())
    });

    match upstream_charset {
        Some(charset) => format!("text/html; charset={}", charset),
        None if std::str::from_utf8(body).is_ok() => HTML.to_string(),
        None => "text/html".to_string(),
    }
}
