//! Workspace and download name generation

/// Longest sanitized app name kept in directory and file names
pub const MAX_NAME_LEN: usize = 64;

/// Reduce an untrusted app name to a token safe for directory and file names
///
/// - ASCII letters, digits, `-` and `_` are kept
/// - Inner spaces are kept (collapsed to one)
/// - Everything else (path separators, dots, reserved or control characters,
///   non-ASCII) becomes `_`
/// - Separator runs are collapsed and trimmed from both ends
///
/// Returns `None` when nothing usable is left.
pub fn sanitize_app_name(input: &str) -> Option<String> {
    let mut out = String::with_capacity(input.len().min(MAX_NAME_LEN));

    for c in input.chars() {
        let mapped = match c {
            c if c.is_ascii_alphanumeric() || c == '-' => c,
            ' ' => ' ',
            _ => '_',
        };

        // Collapse runs like "__", "  " or "_ _" into the first separator.
        if is_separator(mapped) && out.chars().last().is_some_and(is_separator) {
            continue;
        }
        out.push(mapped);
    }

    let trimmed: String = out
        .trim_matches(is_separator)
        .chars()
        .take(MAX_NAME_LEN)
        .collect();
    let trimmed = trimmed.trim_end_matches(is_separator);

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '_' | '-')
}

/// Generate a workspace directory name for a sanitized app name
///
/// Format: `<sanitized>-<uuid>`; the uuid keeps concurrent requests with the
/// same app name apart.
pub fn generate_workspace_name(sanitized: &str) -> String {
    format!("{}-{}", sanitized, uuid::Uuid::new_v4().as_simple())
}

/// Suggested download file name for a sanitized app name
pub fn download_file_name(sanitized: &str) -> String {
    format!("{}.zip", sanitized)
}

/// Cache key used by the generated service worker
///
/// Lowercase, spaces replaced with hyphens.
pub fn cache_name(sanitized: &str) -> String {
    let slug: String = sanitized
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' { '-' } else { c })
        .collect();
    format!("{}-cache-v1", slug)
}
