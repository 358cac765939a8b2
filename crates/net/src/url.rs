//! Input classification, canonicalization, and relative resolution.
//!
//! Canonical URLs are one of three shapes: an http(s) URL re-emitted from
//! its parsed structure, a `file:` URL over an absolute lexically
//! normalized path, or a `data:` URL passed through verbatim.

use ::url::Url;
use std::path::{Component, Path, PathBuf};

/// How a navigation input was classified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputType {
    /// Nothing matched.
    #[default]
    Unknown,
    /// Absolute URL with an authority.
    HttpUrl,
    /// `file:` URL.
    FileUrl,
    /// An existing local filesystem path.
    LocalPath,
    /// `data:` URL.
    DataUrl,
}

/// Wire name of an input type, used in diagnostics.
#[must_use]
pub const fn input_type_name(input_type: InputType) -> &'static str {
    match input_type {
        InputType::Unknown => "unknown",
        InputType::HttpUrl => "http_url",
        InputType::FileUrl => "file_url",
        InputType::LocalPath => "local_path",
        InputType::DataUrl => "data_url",
    }
}

/// True for `file:` inputs, scheme compared case-insensitively.
#[must_use]
pub fn is_file_url(value: &str) -> bool {
    value.len() >= 5 && value[..5].eq_ignore_ascii_case("file:")
}

/// True for `data:` inputs, scheme compared case-insensitively.
#[must_use]
pub fn is_data_url(value: &str) -> bool {
    value.len() >= 5 && value[..5].eq_ignore_ascii_case("data:")
}

/// Collapse `.` and `..` components without touching the filesystem.
fn lexically_normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(normalized.components().next_back(), Some(Component::Normal(_))) {
                    normalized.pop();
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Absolute, lexically normalized form of a path.
fn normalize_file_path(path: &Path) -> Result<PathBuf, String> {
    let absolute = std::path::absolute(path)
        .map_err(|err| format!("Failed to inspect local path '{}': {err}", path.display()))?;
    Ok(lexically_normalize(&absolute))
}

/// Emit a `file:` URL for an absolute path.
pub fn path_to_file_url(path: &Path) -> Result<String, String> {
    Url::from_file_path(path)
        .map(|file_url| file_url.to_string())
        .map_err(|()| format!("Path is not absolute: {}", path.display()))
}

/// Extract the filesystem path from a `file:` URL.
pub fn file_url_to_path(file_url: &str) -> Result<PathBuf, String> {
    let parsed =
        Url::parse(file_url).map_err(|err| format!("Invalid file URL '{file_url}': {err}"))?;
    parsed
        .to_file_path()
        .map_err(|()| format!("File URL has no usable path: {file_url}"))
}

/// Canonical `file:` URL for a `file:` input: absolute, normalized path.
fn to_normalized_file_url(file_url: &str) -> Result<String, String> {
    let path = file_url_to_path(file_url)?;
    let normalized = normalize_file_path(&path)?;
    path_to_file_url(&normalized)
}

/// Canonical `file:` URL for an existing local path.
fn local_path_to_file_url(input: &str) -> Result<String, String> {
    let candidate = Path::new(input);
    if !candidate.exists() {
        return Err(format!("Local path does not exist: {input}"));
    }
    let normalized = normalize_file_path(candidate)?;
    path_to_file_url(&normalized)
}

/// Parse an absolute URL with an authority; rejects scheme-only forms.
fn parse_authority_url(input: &str) -> Result<Url, String> {
    let parsed = Url::parse(input).map_err(|err| format!("Invalid URL '{input}': {err}"))?;
    if !parsed.has_authority() {
        return Err(format!("URL has no authority: {input}"));
    }
    Ok(parsed)
}

/// Classify a navigation input. Order matters: `file:`, `data:`, absolute
/// URL with authority, existing local path, then unknown.
#[must_use]
pub fn classify_input(input: &str) -> InputType {
    if input.is_empty() {
        return InputType::Unknown;
    }
    if is_file_url(input) {
        return InputType::FileUrl;
    }
    if is_data_url(input) {
        return InputType::DataUrl;
    }
    if parse_authority_url(input).is_ok() {
        return InputType::HttpUrl;
    }
    if Path::new(input).exists() {
        return InputType::LocalPath;
    }
    InputType::Unknown
}

/// Canonicalize any loadable input to its canonical URL string.
pub fn canonicalize_load_target_url(input: &str) -> Result<String, String> {
    if is_file_url(input) {
        return to_normalized_file_url(input);
    }
    if is_data_url(input) {
        return Ok(input.to_owned());
    }

    let parse_error = match parse_authority_url(input) {
        Ok(parsed) => return Ok(parsed.to_string()),
        Err(err) => err,
    };

    match local_path_to_file_url(input) {
        Ok(file_url) => Ok(file_url),
        Err(path_error) => {
            // A bare path-looking input reads better with the path error.
            if input.contains("://") {
                Err(parse_error)
            } else {
                Err(path_error)
            }
        }
    }
}

/// Resolve a (possibly relative) resource reference against a base URL
/// and canonicalize the result.
pub fn resolve_resource_url(base_url: &str, raw_reference: &str) -> Result<String, String> {
    let reference = raw_reference.trim();
    if reference.is_empty() {
        return Err("Resource URL is empty".to_owned());
    }

    let base = Url::parse(base_url).map_err(|err| format!("Invalid base URL '{base_url}': {err}"))?;
    let resolved = base
        .join(reference)
        .map_err(|err| format!("Failed to resolve resource URL '{reference}': {err}"))?
        .to_string();

    if is_file_url(&resolved) {
        return to_normalized_file_url(&resolved);
    }
    if is_data_url(&resolved) {
        return Ok(resolved);
    }

    parse_authority_url(&resolved).map(|parsed| parsed.to_string())
}

/// Resolve a `<base href>` value against the document URL. `data:` bases
/// are rejected; `file:` bases must have a usable path.
pub fn resolve_base_href_url(document_url: &str, raw_base_href: &str) -> Result<String, String> {
    let base_href = raw_base_href.trim();
    if base_href.is_empty() {
        return Err("Base href is empty".to_owned());
    }

    let document = Url::parse(document_url)
        .map_err(|err| format!("Invalid document URL '{document_url}': {err}"))?;
    let resolved = document
        .join(base_href)
        .map_err(|err| format!("Failed to resolve base href '{base_href}': {err}"))?
        .to_string();

    if is_file_url(&resolved) {
        file_url_to_path(&resolved)?;
        return Ok(resolved);
    }
    if is_data_url(&resolved) {
        return Err("Unsupported base URL scheme: data".to_owned());
    }

    parse_authority_url(&resolved).map(|parsed| parsed.to_string())
}

#[cfg(test)]
mod tests {
    use super::{
        InputType, canonicalize_load_target_url, classify_input, lexically_normalize,
        resolve_resource_url,
    };
    use std::path::Path;

    #[test]
    fn classification_order() {
        assert_eq!(classify_input(""), InputType::Unknown);
        assert_eq!(classify_input("file:///tmp/x.html"), InputType::FileUrl);
        assert_eq!(classify_input("DATA:text/html,hi"), InputType::DataUrl);
        assert_eq!(classify_input("https://example.com/a"), InputType::HttpUrl);
        assert_eq!(classify_input("mailto:user"), InputType::Unknown);
        assert_eq!(classify_input("no/such/path/anywhere"), InputType::Unknown);
    }

    #[test]
    fn lexical_normalization_collapses_dots() {
        assert_eq!(
            lexically_normalize(Path::new("/a/b/../c/./d")),
            Path::new("/a/c/d")
        );
        assert_eq!(lexically_normalize(Path::new("/../x")), Path::new("/x"));
    }

    #[test]
    fn canonicalization_is_idempotent() {
        let first = canonicalize_load_target_url("https://example.com/a/../b?q=1").expect("url");
        let second = canonicalize_load_target_url(&first).expect("url");
        assert_eq!(first, second);
    }

    #[test]
    fn relative_references_resolve_against_base() {
        let resolved =
            resolve_resource_url("https://example.com/dir/page.html", "style.css").expect("css");
        assert_eq!(resolved, "https://example.com/dir/style.css");

        let absolute =
            resolve_resource_url("https://example.com/dir/", "https://other.net/x.css").expect("x");
        assert_eq!(absolute, "https://other.net/x.css");
    }

    #[test]
    fn empty_reference_is_rejected() {
        assert!(resolve_resource_url("https://example.com/", "  ").is_err());
    }
}
