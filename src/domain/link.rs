/// Separator between links in the input text. The text arrives pre-escaped,
/// so this is a backslash followed by `n`, not a newline.
pub const LINK_SEPARATOR: &str = "\\n";

/// Splits `content` into candidate lines and keeps those that start with
/// `host_prefix`. Matching is case-sensitive and nothing is trimmed.
pub fn extract_links<'a>(content: &'a str, host_prefix: &str) -> Vec<&'a str> {
    if content.is_empty() {
        return Vec::new();
    }

    content
        .split(LINK_SEPARATOR)
        .filter(|line| line.starts_with(host_prefix))
        .collect()
}

/// Returns the final `/`-separated segment of `link`. A trailing slash yields
/// an empty id, which the tracker then rejects.
pub fn issue_id_from_link(link: &str) -> &str {
    link.rsplit('/').next().unwrap_or(link)
}
