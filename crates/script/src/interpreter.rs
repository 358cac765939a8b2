//! The restricted statement interpreter.
//!
//! Scripts are split into statements on top-level `;` and newlines, then
//! each statement must match exactly one of a closed set of shapes:
//!
//! - `document.title = "…"`
//! - `document.body.<op>`
//! - `document.getElementById("id").<op>`
//! - `document.querySelector("#id").<op>`
//! - `console.log("…")`
//!
//! Dispatch is a cascade of prefix tests; the grammar is closed and fixed,
//! so there is no expression evaluation anywhere.

use css::cascade::{parse_inline_style, serialize_inline_style};
use html::NodeId;
use html::dom::Document;
use html::queries::{query_first_by_id, query_first_by_tag};
use log::debug;

/// Result of running one script source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptResult {
    /// False when any statement failed; execution stops at the first failure.
    pub ok: bool,
    /// "OK", "Empty script", or a failure description.
    pub message: String,
}

/// One parsed element operation, target-independent.
enum ElementOp {
    /// `.style.<property> = "…"` with the property already normalized.
    StyleProperty { property: String, value: String },
    /// `.style = "…"`
    StyleString(String),
    /// `.className = "…"`
    ClassName(String),
    /// `.id = "…"`
    Id(String),
    /// `.setAttribute("name", "value")`
    SetAttribute { name: String, value: String },
    /// `.removeAttribute("name")`
    RemoveAttribute(String),
    /// `.innerText = "…"` / `.textContent = "…"`
    SetText(String),
}

fn is_identifier_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_'
}

fn is_identifier_continue(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

fn skip_whitespace(statement: &str, pos: &mut usize) {
    let bytes = statement.as_bytes();
    while *pos < bytes.len() && bytes[*pos].is_ascii_whitespace() {
        *pos += 1;
    }
}

/// Parse a quoted string literal at `pos`. `\x` escapes produce `x`
/// verbatim; a literal string may not contain a bare closing quote.
fn parse_string_literal(statement: &str, pos: &mut usize) -> Result<String, String> {
    skip_whitespace(statement, pos);
    let bytes = statement.as_bytes();
    if *pos >= bytes.len() {
        return Err("Expected string literal".to_owned());
    }

    let quote = bytes[*pos];
    if quote != b'"' && quote != b'\'' {
        return Err("Expected quoted string literal".to_owned());
    }
    *pos += 1;

    let mut value = String::new();
    while *pos < bytes.len() {
        let byte = bytes[*pos];
        if byte == b'\\' {
            let Some(escaped) = statement[*pos + 1..].chars().next() else {
                return Err("Invalid escape sequence".to_owned());
            };
            value.push(escaped);
            *pos += 1 + escaped.len_utf8();
            continue;
        }
        if byte == quote {
            *pos += 1;
            return Ok(value);
        }
        let Some(character) = statement[*pos..].chars().next() else {
            break;
        };
        value.push(character);
        *pos += character.len_utf8();
    }

    Err("Unterminated string literal".to_owned())
}

fn parse_member_identifier(statement: &str, pos: &mut usize) -> Option<String> {
    let bytes = statement.as_bytes();
    if *pos >= bytes.len() || !is_identifier_start(bytes[*pos]) {
        return None;
    }
    let start = *pos;
    *pos += 1;
    while *pos < bytes.len() && is_identifier_continue(bytes[*pos]) {
        *pos += 1;
    }
    Some(statement[start..*pos].to_owned())
}

/// Parse `= "…"` and require end of statement.
fn parse_string_assignment(
    statement: &str,
    pos: &mut usize,
    assignment_name: &str,
) -> Result<String, String> {
    skip_whitespace(statement, pos);
    let bytes = statement.as_bytes();
    if bytes.get(*pos) != Some(&b'=') {
        return Err(format!("{assignment_name} is missing '='"));
    }
    *pos += 1;

    let value = parse_string_literal(statement, pos)?;

    skip_whitespace(statement, pos);
    if *pos != bytes.len() {
        return Err(format!("Unexpected trailing characters in {assignment_name}"));
    }
    Ok(value)
}

fn has_assignment_operator(statement: &str, mut pos: usize) -> bool {
    skip_whitespace(statement, &mut pos);
    statement.as_bytes().get(pos) == Some(&b'=')
}

fn consume_prefix(statement: &str, pos: &mut usize, prefix: &str) -> bool {
    if statement[*pos..].starts_with(prefix) {
        *pos += prefix.len();
        return true;
    }
    false
}

fn expect_byte(
    statement: &str,
    pos: &mut usize,
    expected: u8,
    error: impl FnOnce() -> String,
) -> Result<(), String> {
    skip_whitespace(statement, pos);
    if statement.as_bytes().get(*pos) != Some(&expected) {
        return Err(error());
    }
    *pos += 1;
    Ok(())
}

/// `.setAttribute("name", "value")`; `None` when the prefix is absent.
fn parse_set_attribute_call(
    statement: &str,
    pos: &mut usize,
    operation_name: &str,
) -> Option<Result<(String, String), String>> {
    if !consume_prefix(statement, pos, ".setAttribute") {
        return None;
    }

    let parsed = (|| {
        expect_byte(statement, pos, b'(', || {
            format!("{operation_name}.setAttribute call is missing '('")
        })?;
        let name = parse_string_literal(statement, pos)?;
        expect_byte(statement, pos, b',', || {
            format!("{operation_name}.setAttribute call is missing ','")
        })?;
        let value = parse_string_literal(statement, pos)?;
        expect_byte(statement, pos, b')', || {
            format!("{operation_name}.setAttribute call is missing ')'")
        })?;
        skip_whitespace(statement, pos);
        if *pos != statement.len() {
            return Err(format!(
                "Unexpected trailing characters in {operation_name}.setAttribute call"
            ));
        }
        Ok((name, value))
    })();
    Some(parsed)
}

/// `.removeAttribute("name")`; `None` when the prefix is absent.
fn parse_remove_attribute_call(
    statement: &str,
    pos: &mut usize,
    operation_name: &str,
) -> Option<Result<String, String>> {
    if !consume_prefix(statement, pos, ".removeAttribute") {
        return None;
    }

    let parsed = (|| {
        expect_byte(statement, pos, b'(', || {
            format!("{operation_name}.removeAttribute call is missing '('")
        })?;
        let name = parse_string_literal(statement, pos)?;
        expect_byte(statement, pos, b')', || {
            format!("{operation_name}.removeAttribute call is missing ')'")
        })?;
        skip_whitespace(statement, pos);
        if *pos != statement.len() {
            return Err(format!(
                "Unexpected trailing characters in {operation_name}.removeAttribute call"
            ));
        }
        Ok(name)
    })();
    Some(parsed)
}

/// Map the explicit alias table to canonical property names.
fn map_aliased_style_property(property: &str) -> Option<&'static str> {
    let mapped = match property {
        "background" => "background",
        "backgroundColor" => "background-color",
        "border" => "border",
        "borderColor" => "border-color",
        "borderWidth" => "border-width",
        "borderStyle" => "border-style",
        "color" => "color",
        _ => return None,
    };
    Some(mapped)
}

/// camelCase identifier to kebab-case; rejects non-identifier input.
fn normalize_identifier_style_property(property: &str) -> Option<String> {
    let bytes = property.as_bytes();
    if bytes.is_empty() || !is_identifier_start(bytes[0]) {
        return None;
    }

    let mut normalized = String::with_capacity(property.len() + 4);
    for &byte in bytes {
        if !is_identifier_continue(byte) {
            return None;
        }
        if byte.is_ascii_uppercase() {
            if !normalized.is_empty() {
                normalized.push('-');
            }
            normalized.push(byte.to_ascii_lowercase() as char);
        } else {
            normalized.push(byte as char);
        }
    }
    Some(normalized)
}

/// Normalize a scripted style property to its CSS name.
pub(crate) fn normalize_style_property(property: &str) -> Option<String> {
    map_aliased_style_property(property)
        .map(str::to_owned)
        .or_else(|| normalize_identifier_style_property(property))
}

/// Replace all children of `element` with one text node.
pub(crate) fn set_element_text(document: &mut Document, element: NodeId, text: &str) {
    document.replace_children_with_text(element, text);
}

/// Set one inline-style property, re-serializing the style attribute.
pub(crate) fn set_inline_style_property(
    document: &mut Document,
    element: NodeId,
    property: &str,
    value: &str,
) {
    let mut style_map = document
        .attribute(element, "style")
        .map(parse_inline_style)
        .unwrap_or_default();
    style_map.insert(property.to_owned(), value.to_owned());
    let serialized = serialize_inline_style(&style_map);
    document.set_attribute(element, "style", &serialized);
}

/// Re-parse and canonically serialize an assigned style string.
pub(crate) fn set_inline_style_string(document: &mut Document, element: NodeId, style_text: &str) {
    let style_map = parse_inline_style(style_text);
    let serialized = serialize_inline_style(&style_map);
    document.set_attribute(element, "style", &serialized);
}

/// Set an attribute, routing `style` through the style parser.
pub(crate) fn set_element_attribute(
    document: &mut Document,
    element: NodeId,
    name: &str,
    value: &str,
) {
    if name == "style" {
        set_inline_style_string(document, element, value);
        return;
    }
    document.set_attribute(element, name, value);
}

fn ensure_head_element(document: &mut Document) -> NodeId {
    if let Some(head) = query_first_by_tag(document, document.root(), "head") {
        return head;
    }
    let container =
        query_first_by_tag(document, document.root(), "html").unwrap_or(document.root());
    let head = document.create_element("head");
    document.append_child(container, head);
    head
}

fn set_document_title(document: &mut Document, title: &str) {
    let title_node = match query_first_by_tag(document, document.root(), "title") {
        Some(existing) => existing,
        None => {
            let head = ensure_head_element(document);
            let created = document.create_element("title");
            document.append_child(head, created);
            created
        }
    };
    set_element_text(document, title_node, title);
}

/// Parse the `.<op>` tail shared by body/getElementById/querySelector.
fn parse_element_operation(
    statement: &str,
    pos: &mut usize,
    operation_name: &str,
) -> Result<ElementOp, String> {
    skip_whitespace(statement, pos);

    if statement[*pos..].starts_with(".style.") {
        *pos += ".style.".len();
        let Some(property) = parse_member_identifier(statement, pos) else {
            return Err(format!(
                "{operation_name}.style assignment is missing property name"
            ));
        };
        let Some(css_property) = normalize_style_property(&property) else {
            return Err(format!(
                "Unsupported {operation_name}.style property: {property}"
            ));
        };
        let value =
            parse_string_assignment(statement, pos, &format!("{operation_name}.style assignment"))?;
        return Ok(ElementOp::StyleProperty {
            property: css_property,
            value,
        });
    }

    if statement[*pos..].starts_with(".style") && has_assignment_operator(statement, *pos + 6) {
        *pos += ".style".len();
        let value =
            parse_string_assignment(statement, pos, &format!("{operation_name}.style assignment"))?;
        return Ok(ElementOp::StyleString(value));
    }

    if statement[*pos..].starts_with(".className")
        && has_assignment_operator(statement, *pos + ".className".len())
    {
        *pos += ".className".len();
        let value = parse_string_assignment(
            statement,
            pos,
            &format!("{operation_name}.className assignment"),
        )?;
        return Ok(ElementOp::ClassName(value));
    }

    if statement[*pos..].starts_with(".id") && has_assignment_operator(statement, *pos + 3) {
        *pos += ".id".len();
        let value =
            parse_string_assignment(statement, pos, &format!("{operation_name}.id assignment"))?;
        return Ok(ElementOp::Id(value));
    }

    if let Some(parsed) = parse_set_attribute_call(statement, pos, operation_name) {
        let (name, value) = parsed?;
        return Ok(ElementOp::SetAttribute { name, value });
    }

    if let Some(parsed) = parse_remove_attribute_call(statement, pos, operation_name) {
        let name = parsed?;
        return Ok(ElementOp::RemoveAttribute(name));
    }

    for text_property in [".innerText", ".textContent"] {
        if statement[*pos..].starts_with(text_property) {
            *pos += text_property.len();
            let value = parse_string_assignment(
                statement,
                pos,
                &format!("{operation_name}{text_property} assignment"),
            )?;
            return Ok(ElementOp::SetText(value));
        }
    }

    if statement[*pos..].starts_with(".style") {
        return Err(format!("Unsupported {operation_name}.style operation"));
    }
    Err(format!("Unsupported {operation_name} operation"))
}

fn apply_element_operation(document: &mut Document, element: NodeId, operation: &ElementOp) {
    match operation {
        ElementOp::StyleProperty { property, value } => {
            set_inline_style_property(document, element, property, value);
        }
        ElementOp::StyleString(style_text) => {
            set_inline_style_string(document, element, style_text);
        }
        ElementOp::ClassName(class_name) => {
            document.set_attribute(element, "class", class_name);
        }
        ElementOp::Id(id_value) => set_element_attribute(document, element, "id", id_value),
        ElementOp::SetAttribute { name, value } => {
            set_element_attribute(document, element, name, value);
        }
        ElementOp::RemoveAttribute(name) => document.remove_attribute(element, name),
        ElementOp::SetText(text) => set_element_text(document, element, text),
    }
}

fn parse_document_title_statement(
    document: &mut Document,
    statement: &str,
) -> Option<Result<(), String>> {
    let mut pos = 0;
    if !consume_prefix(statement, &mut pos, "document.title") {
        return None;
    }

    let outcome = (|| {
        skip_whitespace(statement, &mut pos);
        if statement.as_bytes().get(pos) != Some(&b'=') {
            return Err("document.title assignment is missing '='".to_owned());
        }
        pos += 1;

        let value = parse_string_literal(statement, &mut pos)?;
        skip_whitespace(statement, &mut pos);
        if pos != statement.len() {
            return Err("Unexpected trailing characters in document.title assignment".to_owned());
        }

        set_document_title(document, &value);
        Ok(())
    })();
    Some(outcome)
}

fn parse_document_body_statement(
    document: &mut Document,
    statement: &str,
) -> Option<Result<(), String>> {
    let mut pos = 0;
    if !consume_prefix(statement, &mut pos, "document.body") {
        return None;
    }

    let outcome = (|| {
        let Some(body) = query_first_by_tag(document, document.root(), "body") else {
            return Err("document.body is not available".to_owned());
        };
        let operation = parse_element_operation(statement, &mut pos, "document.body")?;
        apply_element_operation(document, body, &operation);
        Ok(())
    })();
    Some(outcome)
}

fn parse_call_argument(
    statement: &str,
    pos: &mut usize,
    call_name: &str,
) -> Result<String, String> {
    expect_byte(statement, pos, b'(', || {
        format!("{call_name} call is missing '('")
    })?;
    let argument = parse_string_literal(statement, pos)?;
    expect_byte(statement, pos, b')', || {
        format!("{call_name} call is missing ')'")
    })?;
    Ok(argument)
}

fn parse_get_element_by_id_statement(
    document: &mut Document,
    statement: &str,
) -> Option<Result<(), String>> {
    let mut pos = 0;
    if !consume_prefix(statement, &mut pos, "document.getElementById") {
        return None;
    }

    let outcome = (|| {
        let element_id = parse_call_argument(statement, &mut pos, "document.getElementById")?;
        let operation =
            parse_element_operation(statement, &mut pos, "document.getElementById(...)")?;

        let Some(element) = query_first_by_id(document, document.root(), &element_id) else {
            return Err(format!(
                "document.getElementById could not find element: {element_id}"
            ));
        };
        apply_element_operation(document, element, &operation);
        Ok(())
    })();
    Some(outcome)
}

fn parse_query_selector_statement(
    document: &mut Document,
    statement: &str,
) -> Option<Result<(), String>> {
    let mut pos = 0;
    if !consume_prefix(statement, &mut pos, "document.querySelector") {
        return None;
    }

    let outcome = (|| {
        let selector = parse_call_argument(statement, &mut pos, "document.querySelector")?;

        let supported = selector.len() >= 2
            && selector.starts_with('#')
            && selector[1..]
                .bytes()
                .all(|byte| byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-');
        if !supported {
            return Err(format!(
                "Unsupported document.querySelector selector (only '#id' is supported): {selector}"
            ));
        }
        let element_id = selector[1..].to_owned();

        let operation =
            parse_element_operation(statement, &mut pos, "document.querySelector(...)")?;

        let Some(element) = query_first_by_id(document, document.root(), &element_id) else {
            return Err(format!(
                "document.querySelector could not find element: {selector}"
            ));
        };
        apply_element_operation(document, element, &operation);
        Ok(())
    })();
    Some(outcome)
}

fn parse_console_log_statement(statement: &str) -> Option<Result<(), String>> {
    let mut pos = 0;
    if !consume_prefix(statement, &mut pos, "console.log") {
        return None;
    }

    let outcome = (|| {
        let message = parse_call_argument(statement, &mut pos, "console.log")?;
        skip_whitespace(statement, &mut pos);
        if pos != statement.len() {
            return Err("Unexpected trailing characters in console.log call".to_owned());
        }
        // The literal echo to stderr is part of the statement's contract.
        eprintln!("{message}");
        Ok(())
    })();
    Some(outcome)
}

/// Split a script into statements on top-level `;` and newlines,
/// respecting quoted strings and their escapes.
fn split_statements(script_source: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaping = false;

    let mut flush = |current: &mut String, statements: &mut Vec<String>| {
        let trimmed = current.trim();
        if !trimmed.is_empty() {
            statements.push(trimmed.to_owned());
        }
        current.clear();
    };

    for character in script_source.chars() {
        if let Some(active) = quote {
            current.push(character);
            if escaping {
                escaping = false;
                continue;
            }
            if character == '\\' {
                escaping = true;
                continue;
            }
            if character == active {
                quote = None;
            }
            continue;
        }

        if character == '"' || character == '\'' {
            quote = Some(character);
            current.push(character);
            continue;
        }

        if matches!(character, ';' | '\n' | '\r') {
            flush(&mut current, &mut statements);
            continue;
        }

        current.push(character);
    }

    flush(&mut current, &mut statements);
    statements
}

/// Try each statement shape in order; `None` means nothing matched.
fn dispatch_statement(document: &mut Document, statement: &str) -> Option<Result<(), String>> {
    if let Some(outcome) = parse_document_title_statement(document, statement) {
        return Some(outcome);
    }
    if let Some(outcome) = parse_document_body_statement(document, statement) {
        return Some(outcome);
    }
    if let Some(outcome) = parse_get_element_by_id_statement(document, statement) {
        return Some(outcome);
    }
    if let Some(outcome) = parse_query_selector_statement(document, statement) {
        return Some(outcome);
    }
    parse_console_log_statement(statement)
}

/// Execute a script against the document. Statements run in order; the
/// first failure stops execution and is reported in the result message.
pub fn execute_script(document: &mut Document, script_source: &str) -> ScriptResult {
    let statements = split_statements(script_source);
    debug!("execute_script: {} statement(s)", statements.len());
    if statements.is_empty() {
        return ScriptResult {
            ok: true,
            message: "Empty script".to_owned(),
        };
    }

    for (index, statement) in statements.iter().enumerate() {
        match dispatch_statement(document, statement) {
            None => {
                return ScriptResult {
                    ok: false,
                    message: format!("Unsupported script statement {}: {statement}", index + 1),
                };
            }
            Some(Err(err)) => {
                return ScriptResult {
                    ok: false,
                    message: format!("Script statement {} failed: {err}", index + 1),
                };
            }
            Some(Ok(())) => {}
        }
    }

    ScriptResult {
        ok: true,
        message: "OK".to_owned(),
    }
}
