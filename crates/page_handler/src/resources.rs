//! Resource orchestration: base-URL resolution, script execution, and
//! stylesheet collection with transitive `@import` expansion.

use css::imports::parse_top_level_imports;
use html::dom::Document;
use html::queries::query_all_by_tag;
use html::NodeId;
use log::debug;
use net::fetcher::Fetcher;
use net::loader::{LoadResult, ResourceCache, canonical_resource_url};
use net::url::{resolve_base_href_url, resolve_resource_url};
use script::execute_script;
use std::collections::HashSet;

/// Append a non-empty fetch-timing diagnostic to the warning list.
fn append_fetch_diagnostic_warning(resource: &LoadResult, warnings: &mut Vec<String>) {
    if !resource.fetch_diagnostic.is_empty() {
        warnings.push(resource.fetch_diagnostic.clone());
    }
}

/// True when the node sits under a `head` or `body` ancestor.
fn is_within_head_or_body(document: &Document, node: NodeId) -> bool {
    let mut current = document.parent(node);
    while let Some(ancestor) = current {
        if matches!(document.tag(ancestor), Some("head" | "body")) {
            return true;
        }
        current = document.parent(ancestor);
    }
    false
}

/// Resolve the resource base URL: the first usable `<base href>` under
/// head or body wins; a bad one falls back to the document URL with a
/// warning.
pub(crate) fn resolve_resource_base_url(
    document: &Document,
    document_url: &str,
    warnings: &mut Vec<String>,
) -> String {
    for base_node in query_all_by_tag(document, document.root(), "base") {
        if !is_within_head_or_body(document, base_node) {
            continue;
        }
        let Some(href) = document.attribute(base_node, "href") else {
            continue;
        };

        match resolve_base_href_url(document_url, href) {
            Ok(resolved) => return resolved,
            Err(err) => {
                warnings.push(format!(
                    "Base href ignored for resource resolution ('{href}'): {err}"
                ));
                return document_url.to_owned();
            }
        }
    }

    document_url.to_owned()
}

/// Script `type` values that run; anything else is skipped.
fn is_javascript_script_type(document: &Document, script_node: NodeId) -> bool {
    let Some(script_type) = document.attribute(script_node, "type") else {
        return true;
    };
    let lowered = script_type.trim().to_ascii_lowercase();
    lowered.is_empty()
        || lowered == "text/javascript"
        || lowered == "application/javascript"
        || lowered == "module"
}

/// `type` filter for `<style>` and stylesheet `<link>` nodes.
fn is_css_type(document: &Document, node: NodeId) -> bool {
    let Some(node_type) = document.attribute(node, "type") else {
        return true;
    };
    let lowered = node_type.trim().to_ascii_lowercase();
    lowered.is_empty() || lowered == "text/css"
}

fn is_media_token_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_'
}

/// True when `media_value` contains `token` at word boundaries.
fn media_value_contains_token(media_value: &str, token: &str) -> bool {
    if media_value.is_empty() || token.is_empty() {
        return false;
    }

    let bytes = media_value.as_bytes();
    let mut search_from = 0;
    while let Some(offset) = media_value[search_from..].find(token) {
        let start = search_from + offset;
        let end = start + token.len();
        let left_boundary = start == 0 || !is_media_token_byte(bytes[start - 1]);
        let right_boundary = end >= bytes.len() || !is_media_token_byte(bytes[end]);
        if left_boundary && right_boundary {
            return true;
        }
        search_from = end;
    }
    false
}

/// `media` filter: absent/empty, or mentions `all` or `screen`.
fn is_stylesheet_media_supported(document: &Document, node: NodeId) -> bool {
    let Some(media) = document.attribute(node, "media") else {
        return true;
    };
    let lowered = media.trim().to_ascii_lowercase();
    if lowered.is_empty() {
        return true;
    }
    media_value_contains_token(&lowered, "all") || media_value_contains_token(&lowered, "screen")
}

/// `rel` values are comma/whitespace separated tokens.
fn is_stylesheet_rel(rel_value: &str) -> bool {
    rel_value
        .to_ascii_lowercase()
        .split(|character: char| character == ',' || character.is_ascii_whitespace())
        .any(|token| token == "stylesheet")
}

/// Run every runnable `<script>` against the DOM in document order.
/// Failures become warnings; later scripts still run.
pub(crate) fn execute_scripts(
    document: &mut Document,
    resource_base_url: &str,
    warnings: &mut Vec<String>,
    cache: &mut ResourceCache,
    fetcher: &dyn Fetcher,
) {
    let script_nodes = query_all_by_tag(document, document.root(), "script");

    for (index, script_node) in script_nodes.into_iter().enumerate() {
        let script_index = index + 1;
        if !is_javascript_script_type(document, script_node) {
            continue;
        }

        let source = match document.attribute(script_node, "src") {
            Some(src) if !src.trim().is_empty() => {
                let resolved_url = match resolve_resource_url(resource_base_url, src) {
                    Ok(resolved) => resolved,
                    Err(err) => {
                        warnings.push(format!("Script #{script_index} resolution failed: {err}"));
                        continue;
                    }
                };
                let loaded = cache.load_cached(&resolved_url, fetcher);
                if !loaded.ok {
                    warnings.push(format!(
                        "Script #{script_index} load failed: {}",
                        loaded.error
                    ));
                    continue;
                }
                append_fetch_diagnostic_warning(&loaded, warnings);
                loaded.text
            }
            _ => document.inner_text(script_node),
        };

        if source.trim().is_empty() {
            continue;
        }

        let result = execute_script(document, &source);
        if !result.ok {
            warnings.push(format!(
                "Script #{script_index} execution failed: {}",
                result.message
            ));
        }
    }
}

/// Join stylesheet blocks with newlines, skipping empties.
fn append_text_block(destination: &mut String, block_text: &str) {
    if block_text.is_empty() {
        return;
    }
    if !destination.is_empty() {
        destination.push('\n');
    }
    destination.push_str(block_text);
}

/// FNV-1a over the stylesheet text; part of the content visit key.
fn hash_css_content(css: &str) -> u64 {
    const FNV_OFFSET_BASIS: u64 = 14_695_981_039_346_656_037;
    const FNV_PRIME: u64 = 1_099_511_628_211;

    let mut hash = FNV_OFFSET_BASIS;
    for byte in css.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn make_css_content_visit_key(css_text: &str) -> String {
    format!("css-content:{}:{}", css_text.len(), hash_css_content(css_text))
}

fn make_css_url_visit_key(css_url: &str) -> String {
    format!("css-url:{}", canonical_resource_url(css_url))
}

/// Inline every top-level `@import` at its statement site, recursively.
/// The visited set (URL keys and content keys) stops cycles and repeated
/// content; each skip produces one warning.
fn expand_css_imports(
    css_text: &str,
    css_base_url: &str,
    css_origin_label: &str,
    warnings: &mut Vec<String>,
    cache: &mut ResourceCache,
    visited_css_keys: &mut HashSet<String>,
    fetcher: &dyn Fetcher,
) -> String {
    let imports = parse_top_level_imports(css_text, css_origin_label, warnings);
    if imports.is_empty() {
        return css_text.to_owned();
    }

    let mut expanded = String::with_capacity(css_text.len());
    let mut cursor = 0;

    for import_rule in imports {
        if import_rule.begin > cursor {
            expanded.push_str(&css_text[cursor..import_rule.begin]);
        }
        cursor = import_rule.end;

        let resolved_import_url =
            match resolve_resource_url(css_base_url, &import_rule.reference) {
                Ok(resolved) => resolved,
                Err(err) => {
                    warnings.push(format!(
                        "CSS @import resolution failed for '{}' in '{css_origin_label}': {err}",
                        import_rule.reference
                    ));
                    continue;
                }
            };

        if !visited_css_keys.insert(make_css_url_visit_key(&resolved_import_url)) {
            warnings.push(format!(
                "CSS @import skipped to avoid cycle/reload: {resolved_import_url}"
            ));
            continue;
        }

        let imported = cache.load_cached(&resolved_import_url, fetcher);
        if !imported.ok {
            warnings.push(format!(
                "CSS @import load failed for '{resolved_import_url}': {}",
                imported.error
            ));
            continue;
        }
        append_fetch_diagnostic_warning(&imported, warnings);

        if !visited_css_keys.insert(make_css_content_visit_key(&imported.text)) {
            warnings.push(format!(
                "CSS @import skipped to avoid repeated content from '{resolved_import_url}'"
            ));
            continue;
        }

        let nested_base_url = if imported.final_url.is_empty() {
            resolved_import_url.clone()
        } else {
            imported.final_url.clone()
        };
        let expanded_import = expand_css_imports(
            &imported.text,
            &nested_base_url,
            &resolved_import_url,
            warnings,
            cache,
            visited_css_keys,
            fetcher,
        );
        append_text_block(&mut expanded, &expanded_import);
    }

    if cursor < css_text.len() {
        expanded.push_str(&css_text[cursor..]);
    }

    expanded
}

/// Collect stylesheet text in document order: `<style>` blocks and
/// `<link rel="stylesheet">` resources, filtered by type and media, each
/// with its `@import`s expanded in place.
pub(crate) fn collect_style_text(
    document: &Document,
    resource_base_url: &str,
    warnings: &mut Vec<String>,
    cache: &mut ResourceCache,
    fetcher: &dyn Fetcher,
) -> String {
    let mut combined_css = String::new();
    let mut visited_css_keys: HashSet<String> = HashSet::new();
    let mut inline_style_index = 0usize;

    for node in document.descendants(document.root()) {
        match document.tag(node) {
            Some("style") => {
                inline_style_index += 1;
                if !is_css_type(document, node) {
                    if let Some(style_type) = document.attribute(node, "type") {
                        warnings.push(format!(
                            "Inline <style> #{inline_style_index} skipped due to unsupported type '{}'",
                            style_type.trim()
                        ));
                    }
                    continue;
                }
                if !is_stylesheet_media_supported(document, node) {
                    if let Some(media) = document.attribute(node, "media") {
                        warnings.push(format!(
                            "Inline <style> #{inline_style_index} skipped due to non-screen media '{}'",
                            media.trim()
                        ));
                    }
                    continue;
                }

                let block_css = document.inner_text(node);
                visited_css_keys.insert(make_css_content_visit_key(&block_css));
                let expanded = expand_css_imports(
                    &block_css,
                    resource_base_url,
                    &format!("inline <style> #{inline_style_index}"),
                    warnings,
                    cache,
                    &mut visited_css_keys,
                    fetcher,
                );
                append_text_block(&mut combined_css, &expanded);
            }
            Some("link") => {
                let Some(rel) = document.attribute(node, "rel") else {
                    continue;
                };
                let Some(href) = document.attribute(node, "href") else {
                    continue;
                };
                if !is_stylesheet_rel(rel) {
                    continue;
                }
                if !is_css_type(document, node) {
                    if let Some(link_type) = document.attribute(node, "type") {
                        warnings.push(format!(
                            "Stylesheet link skipped due to unsupported type '{}' for href '{href}'",
                            link_type.trim()
                        ));
                    }
                    continue;
                }
                if !is_stylesheet_media_supported(document, node) {
                    if let Some(media) = document.attribute(node, "media") {
                        warnings.push(format!(
                            "Stylesheet link skipped due to non-screen media '{}' for href '{href}'",
                            media.trim()
                        ));
                    }
                    continue;
                }

                let resolved_url = match resolve_resource_url(resource_base_url, href) {
                    Ok(resolved) => resolved,
                    Err(err) => {
                        warnings.push(format!(
                            "Stylesheet resolution failed for '{href}': {err}"
                        ));
                        continue;
                    }
                };

                let stylesheet = cache.load_cached(&resolved_url, fetcher);
                if !stylesheet.ok {
                    warnings.push(format!(
                        "Stylesheet load failed for '{resolved_url}': {}",
                        stylesheet.error
                    ));
                    continue;
                }
                append_fetch_diagnostic_warning(&stylesheet, warnings);

                let stylesheet_base_url = if stylesheet.final_url.is_empty() {
                    resolved_url.clone()
                } else {
                    stylesheet.final_url.clone()
                };
                visited_css_keys.insert(make_css_url_visit_key(&stylesheet_base_url));
                visited_css_keys.insert(make_css_content_visit_key(&stylesheet.text));
                let expanded = expand_css_imports(
                    &stylesheet.text,
                    &stylesheet_base_url,
                    &stylesheet_base_url,
                    warnings,
                    cache,
                    &mut visited_css_keys,
                    fetcher,
                );
                append_text_block(&mut combined_css, &expanded);
            }
            _ => {}
        }
    }

    debug!(
        "collect_style_text: {} bytes of css, {} visit keys",
        combined_css.len(),
        visited_css_keys.len()
    );
    combined_css
}

#[cfg(test)]
mod tests {
    use super::{hash_css_content, is_stylesheet_rel, media_value_contains_token};

    #[test]
    fn rel_tokens_split_on_commas_and_whitespace() {
        assert!(is_stylesheet_rel("stylesheet"));
        assert!(is_stylesheet_rel("preload, stylesheet"));
        assert!(is_stylesheet_rel("ICON StyleSheet"));
        assert!(!is_stylesheet_rel("icon"));
    }

    #[test]
    fn media_tokens_respect_word_boundaries() {
        assert!(media_value_contains_token("screen and (color)", "screen"));
        assert!(media_value_contains_token("all", "all"));
        assert!(!media_value_contains_token("screenreader", "screen"));
        assert!(!media_value_contains_token("print", "screen"));
    }

    #[test]
    fn content_hash_is_stable() {
        assert_eq!(hash_css_content(""), 14_695_981_039_346_656_037);
        assert_eq!(hash_css_content("a"), hash_css_content("a"));
        assert_ne!(hash_css_content("a"), hash_css_content("b"));
    }
}
