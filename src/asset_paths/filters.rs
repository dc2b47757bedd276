use std::sync::OnceLock;

use regex::Regex;

/// References the rewrite pass never resolves against the source tree.
///
/// - `scheme://` and `//host` URLs are served from elsewhere, so there is no local file
///   to bundle or minify.
/// - `data:` URIs carry their payload inline.
/// - `mailto:` links are not assets at all.
const EXTERNAL_REFERENCES: [&str; 4] = [
    r"(?i)^[a-z][a-z0-9+.-]*://",
    r"^//",
    r"(?i)^data:",
    r"(?i)^mailto:",
];

fn external_reference_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        EXTERNAL_REFERENCES
            .iter()
            .map(|pattern| Regex::new(pattern).expect("invalid external reference regex"))
            .collect()
    })
}

/// Whether an HTML asset reference points outside the project tree and must be kept
/// verbatim.
pub fn should_ignore_asset_reference(value: &str) -> bool {
    let value = value.trim();
    external_reference_patterns()
        .iter()
        .any(|pattern| pattern.is_match(value))
}

#[cfg(test)]
mod tests {
    use super::should_ignore_asset_reference;

    #[test]
    fn ignores_network_urls() {
        assert!(should_ignore_asset_reference("https://cdn.example.com/lib.js"));
        assert!(should_ignore_asset_reference("HTTP://example.com/site.css"));
        assert!(should_ignore_asset_reference("//cdn.example.com/lib.js"));
    }

    #[test]
    fn ignores_data_uris() {
        assert!(should_ignore_asset_reference("data:text/css;base64,abc"));
    }

    #[test]
    fn ignores_mailto_links() {
        assert!(should_ignore_asset_reference("mailto:user@example.com"));
    }

    #[test]
    fn keeps_relative_paths() {
        assert!(!should_ignore_asset_reference("js/app.js"));
        assert!(!should_ignore_asset_reference("./css/site.css"));
        assert!(!should_ignore_asset_reference("/js/app.js"));
    }
}
