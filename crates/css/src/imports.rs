//! Top-level `@import` recognition.
//!
//! Recognised forms, each optionally followed by a media query and
//! terminated by `;`:
//!
//! ```css
//! @import "url";
//! @import 'url';
//! @import url("url");
//! @import url('url');
//! @import url(bare-url);
//! ```
//!
//! Only statements outside any brace block count. Comments and string
//! literals are skipped so stray braces inside them cannot confuse the
//! scan. The byte ranges let callers splice replacement text exactly at
//! the statement site.

/// One recognised `@import` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssImportRule {
    /// Byte offset of the `@`.
    pub begin: usize,
    /// Byte offset one past the terminating `;` (or end of input).
    pub end: usize,
    /// The import reference exactly as written.
    pub reference: String,
}

enum ImportParse {
    /// An `@`-rule that is not `@import`.
    NotImport,
    /// A well-formed `@import`.
    Parsed(CssImportRule),
    /// Something that started as `@import` but does not scan.
    Malformed(&'static str),
}

fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

fn is_css_identifier_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_'
}

fn starts_with_ascii_case_insensitive(text: &str, pos: usize, expected: &str) -> bool {
    text.get(pos..pos + expected.len())
        .is_some_and(|candidate| candidate.eq_ignore_ascii_case(expected))
}

fn skip_whitespace_and_comments(css: &str, cursor: &mut usize) {
    let bytes = css.as_bytes();
    while *cursor < bytes.len() {
        if is_space(bytes[*cursor]) {
            *cursor += 1;
            continue;
        }
        if bytes[*cursor] == b'/' && bytes.get(*cursor + 1) == Some(&b'*') {
            match css[*cursor + 2..].find("*/") {
                Some(offset) => *cursor = *cursor + 2 + offset + 2,
                None => *cursor = bytes.len(),
            }
            continue;
        }
        break;
    }
}

/// Consume a quoted string token at `cursor`, handling `\` escapes and
/// line continuations. Returns the decoded value, or `None` when the
/// string is unterminated.
fn parse_string_token(css: &str, cursor: &mut usize) -> Option<String> {
    let bytes = css.as_bytes();
    if *cursor >= bytes.len() || !matches!(bytes[*cursor], b'"' | b'\'') {
        return None;
    }

    let quote = bytes[*cursor];
    *cursor += 1;
    let mut value = String::new();

    while *cursor < bytes.len() {
        let byte = bytes[*cursor];

        if byte == quote {
            *cursor += 1;
            return Some(value);
        }

        if byte == b'\\' {
            *cursor += 1;
            if *cursor >= bytes.len() {
                return None;
            }
            match bytes[*cursor] {
                b'\n' => *cursor += 1,
                b'\r' => {
                    *cursor += 1;
                    if bytes.get(*cursor) == Some(&b'\n') {
                        *cursor += 1;
                    }
                }
                _ => {
                    let escaped = css[*cursor..].chars().next()?;
                    value.push(escaped);
                    *cursor += escaped.len_utf8();
                }
            }
            continue;
        }

        let character = css[*cursor..].chars().next()?;
        value.push(character);
        *cursor += character.len_utf8();
    }

    None
}

/// Consume `url(...)` starting at `cursor` and return the reference.
fn parse_url_function_reference(css: &str, cursor: &mut usize) -> Option<String> {
    let bytes = css.as_bytes();
    let mut local = *cursor;
    if !starts_with_ascii_case_insensitive(css, local, "url") {
        return None;
    }
    local += 3;

    skip_whitespace_and_comments(css, &mut local);
    if bytes.get(local) != Some(&b'(') {
        return None;
    }
    local += 1;

    skip_whitespace_and_comments(css, &mut local);
    if local >= bytes.len() {
        return None;
    }

    if matches!(bytes[local], b'"' | b'\'') {
        let reference = parse_string_token(css, &mut local)?;
        skip_whitespace_and_comments(css, &mut local);
        if bytes.get(local) != Some(&b')') {
            return None;
        }
        local += 1;
        *cursor = local;
        return (!reference.is_empty()).then_some(reference);
    }

    let mut raw = String::new();
    while local < bytes.len() {
        let byte = bytes[local];
        if byte == b')' {
            break;
        }
        if byte == b'\\' {
            local += 1;
            let escaped = css[local..].chars().next()?;
            raw.push(escaped);
            local += escaped.len_utf8();
            continue;
        }
        let character = css[local..].chars().next()?;
        raw.push(character);
        local += character.len_utf8();
    }

    if bytes.get(local) != Some(&b')') {
        return None;
    }
    local += 1;

    let reference = raw.trim().to_owned();
    if reference.is_empty() {
        return None;
    }
    *cursor = local;
    Some(reference)
}

/// Find the end of the current statement (one past the `;`). Returns
/// `None` when a top-level `{` appears first, meaning the `;` is missing.
fn find_statement_end(css: &str, mut cursor: usize) -> Option<usize> {
    let bytes = css.as_bytes();
    let mut paren_depth = 0;
    while cursor < bytes.len() {
        if bytes[cursor] == b'/' && bytes.get(cursor + 1) == Some(&b'*') {
            match css[cursor + 2..].find("*/") {
                Some(offset) => cursor = cursor + 2 + offset + 2,
                None => return Some(bytes.len()),
            }
            continue;
        }

        if matches!(bytes[cursor], b'"' | b'\'') {
            if parse_string_token(css, &mut cursor).is_none() {
                return Some(bytes.len());
            }
            continue;
        }

        match bytes[cursor] {
            b'(' => paren_depth += 1,
            b')' => paren_depth = i32::max(0, paren_depth - 1),
            b';' if paren_depth == 0 => return Some(cursor + 1),
            b'{' if paren_depth == 0 => return None,
            _ => {}
        }
        cursor += 1;
    }
    Some(bytes.len())
}

/// Try to scan an `@import` statement starting at the `@` at `at_pos`.
fn parse_top_level_import_rule(css: &str, at_pos: usize) -> ImportParse {
    let bytes = css.as_bytes();
    if bytes.get(at_pos) != Some(&b'@') {
        return ImportParse::NotImport;
    }

    let mut cursor = at_pos + 1;
    if !starts_with_ascii_case_insensitive(css, cursor, "import") {
        return ImportParse::NotImport;
    }
    cursor += 6;

    if cursor < bytes.len() && is_css_identifier_byte(bytes[cursor]) {
        return ImportParse::NotImport;
    }

    skip_whitespace_and_comments(css, &mut cursor);
    if cursor >= bytes.len() {
        return ImportParse::Malformed("missing import URL");
    }

    let reference = if matches!(bytes[cursor], b'"' | b'\'') {
        match parse_string_token(css, &mut cursor) {
            Some(reference) if !reference.is_empty() => reference,
            _ => return ImportParse::Malformed("invalid quoted import URL"),
        }
    } else {
        match parse_url_function_reference(css, &mut cursor) {
            Some(reference) => reference,
            None => return ImportParse::Malformed("unsupported import URL syntax"),
        }
    };

    let Some(statement_end) = find_statement_end(css, cursor) else {
        return ImportParse::Malformed("missing ';' after @import");
    };

    ImportParse::Parsed(CssImportRule {
        begin: at_pos,
        end: statement_end,
        reference,
    })
}

/// Scan a stylesheet for top-level `@import` statements. Malformed
/// imports append a warning naming `origin_label` and are otherwise
/// ignored.
#[must_use]
pub fn parse_top_level_imports(
    css: &str,
    origin_label: &str,
    warnings: &mut Vec<String>,
) -> Vec<CssImportRule> {
    let bytes = css.as_bytes();
    let mut imports = Vec::new();
    let mut cursor = 0;
    let mut brace_depth = 0;

    while cursor < bytes.len() {
        if bytes[cursor] == b'/' && bytes.get(cursor + 1) == Some(&b'*') {
            match css[cursor + 2..].find("*/") {
                Some(offset) => cursor = cursor + 2 + offset + 2,
                None => break,
            }
            continue;
        }

        if matches!(bytes[cursor], b'"' | b'\'') {
            if parse_string_token(css, &mut cursor).is_none() {
                break;
            }
            continue;
        }

        if brace_depth == 0 && bytes[cursor] == b'@' {
            match parse_top_level_import_rule(css, cursor) {
                ImportParse::Parsed(rule) => {
                    cursor = rule.end;
                    imports.push(rule);
                    continue;
                }
                ImportParse::Malformed(reason) => {
                    warnings
                        .push(format!("Ignoring malformed CSS @import in '{origin_label}': {reason}"));
                }
                ImportParse::NotImport => {}
            }
        }

        match bytes[cursor] {
            b'{' => brace_depth += 1,
            b'}' if brace_depth > 0 => brace_depth -= 1,
            _ => {}
        }
        cursor += 1;
    }

    imports
}

/// Remove all top-level `@import` statements from `css`, returning the
/// stripped text and the import references in source order.
#[must_use]
pub fn strip_imports(css: &str) -> (String, Vec<String>) {
    let mut ignored_warnings = Vec::new();
    let imports = parse_top_level_imports(css, "stylesheet", &mut ignored_warnings);
    if imports.is_empty() {
        return (css.to_owned(), Vec::new());
    }

    let mut stripped = String::with_capacity(css.len());
    let mut references = Vec::with_capacity(imports.len());
    let mut cursor = 0;
    for import in imports {
        if import.begin > cursor {
            stripped.push_str(&css[cursor..import.begin]);
        }
        references.push(import.reference);
        cursor = import.end;
    }
    if cursor < css.len() {
        stripped.push_str(&css[cursor..]);
    }

    (stripped, references)
}

#[cfg(test)]
mod tests {
    use super::{parse_top_level_imports, strip_imports};

    #[test]
    fn quoted_and_url_forms_are_recognised() {
        let css = "@import \"a.css\";\n@import url('b.css');\n@import url(c.css) screen;\np { color: red; }";
        let (stripped, references) = strip_imports(css);
        assert_eq!(references, vec!["a.css", "b.css", "c.css"]);
        assert!(stripped.contains("p { color: red; }"));
        assert!(!stripped.contains("@import"));
    }

    #[test]
    fn imports_inside_blocks_are_left_alone() {
        let css = "p { background: url(x.png); }";
        let (stripped, references) = strip_imports(css);
        assert_eq!(stripped, css);
        assert!(references.is_empty());
    }

    #[test]
    fn malformed_import_reports_origin() {
        let mut warnings = Vec::new();
        let imports = parse_top_level_imports("@import ;", "inline <style> #1", &mut warnings);
        assert!(imports.is_empty());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("inline <style> #1"));
    }

    #[test]
    fn other_at_rules_are_not_imports() {
        let mut warnings = Vec::new();
        let imports = parse_top_level_imports("@media screen { p { color: red; } }", "x", &mut warnings);
        assert!(imports.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn comments_and_strings_do_not_confuse_the_scan() {
        let css = "/* @import \"fake.css\"; */ p::before { content: \"@import 'nope';\" } @import \"real.css\";";
        let (_, references) = strip_imports(css);
        assert_eq!(references, vec!["real.css"]);
    }
}
