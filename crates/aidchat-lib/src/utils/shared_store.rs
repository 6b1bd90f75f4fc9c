// Shared Store Module
// App identifier, data directory resolution and error sanitisation shared by
// the library and the terminal client.

use std::path::PathBuf;

/// Directory name used under the platform data directory
pub const APP_IDENTIFIER: &str = "com.aidchat.AidChat";

/// Get the application data directory
pub fn get_app_data_dir() -> Result<PathBuf, String> {
    dirs::data_dir()
        .map(|p| p.join(APP_IDENTIFIER))
        .ok_or_else(|| "Could not determine application data directory".to_string())
}

/// Sanitize error messages before they are shown or logged
///
/// Replaces the home directory with `~` so local paths do not leak into
/// user-facing text.
pub fn sanitize_error(error: &str) -> String {
    let home_dir = dirs::home_dir()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut sanitized = error.to_string();
    if !home_dir.is_empty() {
        sanitized = sanitized.replace(&home_dir, "~");
    }

    sanitized.replace("/Users/", "~/").replace("/home/", "~/")
}

/// Shorten text for log lines
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        out.push('…');
    }
    out
}
