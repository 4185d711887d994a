//! Content-Type lookup by file extension

/// Fallback for unknown or missing extensions
pub const DEFAULT_MIME: &str = "application/octet-stream";

/// Returns the Content-Type for `path`, keyed on its lowercased extension
pub fn lookup(path: &str) -> &'static str {
    let Some(dot) = path.rfind('.') else {
        return DEFAULT_MIME;
    };
    match path[dot + 1..].to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html; charset=UTF-8",
        "txt" => "text/plain; charset=UTF-8",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        _ => DEFAULT_MIME,
    }
}
