//! Text resource loading with per-fetch timing diagnostics and the
//! per-run cache.

use crate::data_url::parse_data_text_url;
use crate::fetcher::Fetcher;
use crate::url::{canonicalize_load_target_url, file_url_to_path, is_data_url, is_file_url};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Fetches at or past this duration get a "slow fetch" diagnostic.
pub const SLOW_HTTP_FETCH_THRESHOLD_SECONDS: f64 = 2.0;

/// Outcome of loading one text resource.
#[derive(Debug, Clone, Default)]
pub struct LoadResult {
    /// True when `text` holds the resource content.
    pub ok: bool,
    /// Loaded text, when `ok`.
    pub text: String,
    /// Canonical final URL (post-redirect for HTTP).
    pub final_url: String,
    /// Failure description, when not `ok`.
    pub error: String,
    /// Fetch duration; zero for non-HTTP loads.
    pub total_duration_seconds: f64,
    /// True when the fetch timed out.
    pub timed_out: bool,
    /// Timing diagnostic independent of success; empty when unremarkable.
    pub fetch_diagnostic: String,
}

/// Format a duration for diagnostics: `0` when non-positive, whole
/// seconds when the millisecond remainder is zero, otherwise a trimmed
/// three-digit fraction (`2.5`, `1.002`).
#[must_use]
pub fn format_duration_seconds(seconds: f64) -> String {
    if seconds <= 0.0 {
        return "0".to_owned();
    }

    let total_milliseconds = (seconds * 1000.0 + 0.5).floor() as i64;
    let whole_seconds = total_milliseconds / 1000;
    let fractional_milliseconds = total_milliseconds % 1000;
    if fractional_milliseconds == 0 {
        return whole_seconds.to_string();
    }

    let mut fractional = format!("{fractional_milliseconds:03}");
    while fractional.ends_with('0') {
        fractional.pop();
    }
    format!("{whole_seconds}.{fractional}")
}

/// Timing diagnostic for one fetch; empty when the fetch was fast.
#[must_use]
pub fn make_fetch_timing_diagnostic(url: &str, total_duration_seconds: f64, timed_out: bool) -> String {
    if timed_out {
        let mut diagnostic = String::from("HTTP fetch timed out");
        if total_duration_seconds > 0.0 {
            diagnostic.push_str(" after ");
            diagnostic.push_str(&format_duration_seconds(total_duration_seconds));
            diagnostic.push('s');
        }
        diagnostic.push_str(": ");
        diagnostic.push_str(url);
        return diagnostic;
    }

    if total_duration_seconds >= SLOW_HTTP_FETCH_THRESHOLD_SECONDS {
        return format!(
            "Slow HTTP fetch ({}s): {url}",
            format_duration_seconds(total_duration_seconds)
        );
    }

    String::new()
}

/// Read a file as text.
fn read_text_file(path: &Path) -> Result<String, String> {
    let mut file =
        File::open(path).map_err(|_| format!("Unable to open file: {}", path.display()))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|_| format!("Failed to read file: {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Load the text behind any canonicalizable URL.
pub fn load_text_resource(url: &str, fetcher: &dyn Fetcher) -> LoadResult {
    let mut result = LoadResult::default();

    let canonical_url = match canonicalize_load_target_url(url) {
        Ok(canonical_url) => canonical_url,
        Err(err) => {
            result.error = err;
            return result;
        }
    };

    if is_file_url(&canonical_url) {
        let path = match file_url_to_path(&canonical_url) {
            Ok(path) => path,
            Err(err) => {
                result.error = err;
                return result;
            }
        };
        match read_text_file(&path) {
            Ok(text) => {
                result.ok = true;
                result.text = text;
                result.final_url = canonical_url;
            }
            Err(err) => result.error = err,
        }
        return result;
    }

    if is_data_url(&canonical_url) {
        match parse_data_text_url(&canonical_url) {
            Ok(text) => {
                result.ok = true;
                result.text = text;
                result.final_url = canonical_url;
            }
            Err(err) => result.error = err,
        }
        return result;
    }

    let response = fetcher.fetch(&canonical_url);
    result.total_duration_seconds = response.total_duration_seconds;
    result.timed_out = response.timed_out;

    let diagnostic_url = if response.final_url.is_empty() {
        canonical_url.as_str()
    } else {
        response.final_url.as_str()
    };
    result.fetch_diagnostic = make_fetch_timing_diagnostic(
        diagnostic_url,
        result.total_duration_seconds,
        result.timed_out,
    );

    if !response.error.is_empty() {
        result.error = format!("Fetch failed: {}", response.error);
        if !result.fetch_diagnostic.is_empty() {
            result.error = format!("{} [{}]", result.error, result.fetch_diagnostic);
        }
        return result;
    }
    if !(200..300).contains(&response.status_code) {
        result.error = format!("HTTP status {} {}", response.status_code, response.reason);
        if !result.fetch_diagnostic.is_empty() {
            result.error = format!("{} [{}]", result.error, result.fetch_diagnostic);
        }
        return result;
    }

    result.ok = true;
    result.text = response.body;
    result.final_url = if response.final_url.is_empty() {
        canonical_url
    } else {
        response.final_url
    };
    result
}

/// Canonical cache key for a resource URL; unresolvable inputs key as
/// themselves so repeated failures also hit the cache.
#[must_use]
pub fn canonical_resource_url(url: &str) -> String {
    canonicalize_load_target_url(url).unwrap_or_else(|_| url.to_owned())
}

/// Per-run cache mapping canonical URLs to load results. Entries never
/// expire within a run.
#[derive(Default)]
pub struct ResourceCache {
    entries: HashMap<String, LoadResult>,
}

impl ResourceCache {
    /// Empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load through the cache, keyed by canonical URL.
    pub fn load_cached(&mut self, resolved_url: &str, fetcher: &dyn Fetcher) -> LoadResult {
        let cache_key = canonical_resource_url(resolved_url);
        if let Some(cached) = self.entries.get(&cache_key) {
            return cached.clone();
        }

        let loaded = load_text_resource(&cache_key, fetcher);
        self.entries.insert(cache_key, loaded.clone());
        loaded
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been loaded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
